//! Runtime core: fan-out, failure routing and lifecycle.
//!
//! The public API from this module is [`Supervisor`], its builder, its
//! configuration, the [`SupervisionHandle`] returned by `start`, and the
//! OS-signal helpers in [`shutdown`].
//!
//! Internal modules:
//! - [`runner`]: builds and runs one loop, separates failures from stop-induced exits;
//! - [`actor`]: the per-namespace Loop Handle, reports a failure exactly once;
//! - [`supervisor`]: launches actors, wires the failure policy, runs the fail-fast coordinator;
//! - [`handle`]: stop / wait / graceful shutdown of one run;
//! - [`alive`]: tracks running loops from lifecycle events;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod actor;
mod alive;
mod builder;
mod config;
mod handle;
mod runner;
pub mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use handle::SupervisionHandle;
pub use supervisor::Supervisor;
