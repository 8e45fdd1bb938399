//! # Control loop abstraction and function-backed implementation.
//!
//! This module defines the [`ControlLoop`] trait (async, cancelable, one-shot)
//! and a convenient function-backed implementation [`LoopFn`].
//! The common handle type is [`LoopRef`], a `Box<dyn ControlLoop>` handed from
//! a [`LoopFactory`](crate::LoopFactory) to the supervisor.
//!
//! A loop receives a [`CancellationToken`] and must check it cooperatively at
//! bounded intervals. It runs until it observes the token (return `Ok(())` or
//! `Err(LoopError::Canceled)`) or until it hits an unrecoverable error.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use nsvisor::{LoopError, LoopFn, LoopRef};
//!
//! let l: LoopRef = LoopFn::boxed(|stop: CancellationToken| async move {
//!     stop.cancelled().await;
//!     Ok::<_, LoopError>(())
//! });
//! # drop(l);
//! ```

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::error::LoopError;

/// Future returned by [`ControlLoop::run`].
pub type BoxLoopFuture = Pin<Box<dyn Future<Output = Result<(), LoopError>> + Send + 'static>>;

/// Owned handle to a ready-to-run loop.
pub type LoopRef = Box<dyn ControlLoop>;

/// # One long-running reconciliation loop bound to a single namespace.
///
/// The loop is consumed by [`run`](ControlLoop::run): it executes exactly once
/// and is never restarted by the supervisor.
pub trait ControlLoop: Send + 'static {
    /// Runs the loop until `stop` is observed or an error occurs.
    fn run(self: Box<Self>, stop: CancellationToken) -> BoxLoopFuture;
}

/// Function-backed control loop.
///
/// Wraps a closure `F: FnOnce(CancellationToken) -> Fut`; the closure usually
/// captures the namespace-scoped clients built by the factory.
pub struct LoopFn<F> {
    f: F,
}

impl<F> LoopFn<F> {
    /// Creates a new function-backed loop.
    ///
    /// Prefer [`LoopFn::boxed`] when you immediately need a [`LoopRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, Fut> LoopFn<F>
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), LoopError>> + Send + 'static,
{
    /// Creates the loop and returns it as an owned handle.
    pub fn boxed(f: F) -> LoopRef {
        Box::new(Self::new(f))
    }
}

impl<F, Fut> ControlLoop for LoopFn<F>
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), LoopError>> + Send + 'static,
{
    fn run(self: Box<Self>, stop: CancellationToken) -> BoxLoopFuture {
        Box::pin((self.f)(stop))
    }
}
