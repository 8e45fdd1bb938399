//! # nsvisor
//!
//! **nsvisor** supervises a fleet of independent, long-running reconciliation
//! loops, one per namespace of a shared resource space, and coordinates their
//! startup, error reporting and shutdown.
//!
//! It is the supervision layer underneath a Kubernetes-style controller: it
//! does not reconcile anything itself. What one loop watches and how it reacts
//! is opaque; nsvisor only launches loops, routes their failures and stops them.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Namespace   │   │  Namespace   │   │  Namespace   │
//!     │   "team-a"   │   │   "team-b"   │   │   "team-c"   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor::start(namespaces, stop)                              │
//! │  - LoopFactory (builds scoped clients + loop, once per namespace) │
//! │  - FailurePolicy (ContinueOnError | FailFast)                     │
//! │  - Bus + SubscriberSet (explicit diagnostic sink)                 │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  LoopActor   │   │  LoopActor   │   │  LoopActor   │
//!     │ stop = child │   │ stop = child │   │ stop = child │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ failure          │ failure          │ failure
//!            ▼                  ▼                  ▼
//!     ContinueOnError: ──────► ErrorSink ──────► caller's ErrorStream
//!     FailFast:        ──────► coordinator ──► first error ─► ErrorSink
//!                                          └─► cancel all ─► close sink
//! ```
//!
//! ### Failure policies
//! ```text
//! ContinueOnError:
//!   loop fails ─► forward error (namespace embedded) ─► siblings keep running
//!
//! FailFast (race resolved by whichever event tokio::select! observes first):
//!   first failure ─► forward it ─► cancel every loop ─► close the error channel
//!   external stop ─► cancel every loop              ─► channel stays open
//! ```
//!
//! A loop that exits because it observed its stop signal never reports anything,
//! even if it returned an error while being stopped.
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                         |
//! |-------------------|-------------------------------------------------------------|--------------------------------------------|
//! | **Supervision**   | Fan out one loop per namespace, stop, drain with grace.     | [`Supervisor`], [`SupervisionHandle`]      |
//! | **Policies**      | Isolate failures or fail fast.                              | [`FailurePolicy`]                          |
//! | **Loops**         | Opaque per-namespace loops and the factory that builds them.| [`LoopFactory`], [`ControlLoop`], [`LoopFn`] |
//! | **Errors**        | Error channel and typed errors.                             | [`ErrorStream`], [`LoopError`]             |
//! | **Diagnostics**   | Lifecycle events delivered to subscribers.                  | [`Subscribe`], [`LogWriter`], [`Event`]    |
//! | **Configuration** | Centralized settings.                                       | [`SupervisorConfig`]                       |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use nsvisor::{FactoryFn, FailurePolicy, LogWriter, LoopError, LoopFn, Namespace, Supervisor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let factory = FactoryFn::arc(|ns: &Namespace| {
//!         let ns = ns.clone();
//!         Ok(LoopFn::boxed(move |stop: CancellationToken| async move {
//!             if ns.as_str() == "broken" {
//!                 return Err(LoopError::failed(ns, "watch closed"));
//!             }
//!             stop.cancelled().await;
//!             Ok(())
//!         }))
//!     });
//!
//!     let sup = Supervisor::builder(factory)
//!         .with_policy(FailurePolicy::FailFast)
//!         .with_subscriber(Arc::new(LogWriter::new()))
//!         .build();
//!
//!     let stop = CancellationToken::new();
//!     let (_handle, mut errors) = sup.start(["team-a", "broken", "team-c"], stop);
//!
//!     let first = errors.recv().await.unwrap();
//!     assert!(first.to_string().contains("broken"));
//!     assert!(errors.recv().await.is_none()); // fail-fast closed the channel
//! }
//! ```
mod core;
mod error;
pub mod events;
mod loops;
mod policies;
mod sink;
mod subscribers;

// ---- Public re-exports ----

pub use core::shutdown;
pub use core::{SupervisionHandle, Supervisor, SupervisorBuilder, SupervisorConfig};
pub use error::{LoopError, RuntimeError, SinkError};
pub use events::{Event, EventKind};
pub use loops::{
    BoxLoopFuture, ControlLoop, FactoryFn, FactoryRef, LoopFactory, LoopFn, LoopRef, Namespace,
};
pub use policies::FailurePolicy;
pub use sink::{ErrorSink, ErrorStream, error_channel};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
