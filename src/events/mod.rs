//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the supervisor, the
//! fail-fast coordinator, loop actors and the runner.
//!
//! The bus is the supervisor's diagnostic sink: nothing in the runtime logs
//! through global state, everything is published here and handed to the
//! subscribers passed at construction.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`

mod bus;
mod event;

pub use bus::Bus;
pub(crate) use event::loop_label;
pub use event::{Event, EventKind};
