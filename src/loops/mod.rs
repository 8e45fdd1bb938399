//! # Control loop abstractions.
//!
//! This module provides the types a supervisor is driven by:
//! - [`Namespace`] - opaque partition name, one loop per entry
//! - [`ControlLoop`] - trait for a one-shot, cancelable reconciliation loop
//! - [`LoopFn`] - function-backed loop implementation
//! - [`LoopFactory`] - builds the loop (and its scoped clients) for a namespace
//! - [`FactoryFn`] - closure-backed factory

mod control;
mod factory;
mod namespace;

pub use control::{BoxLoopFuture, ControlLoop, LoopFn, LoopRef};
pub use factory::{FactoryFn, FactoryRef, LoopFactory};
pub use namespace::Namespace;
