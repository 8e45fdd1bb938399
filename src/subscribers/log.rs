//! # LogWriter: structured diagnostics through `tracing`.
//!
//! A subscriber that turns every [`Event`] into a `tracing` record. Install any
//! `tracing` subscriber (e.g. `tracing-subscriber::fmt`) in the binary to see them.
//!
//! ## Levels
//! - `error`: `LoopFailed`, `FactoryFailed`, `FailFastTriggered`, `GraceExceeded`
//! - `warn`: `ErrorDropped`, `SubscriberOverflow`, `SubscriberPanicked`
//! - `info`: `SupervisorStarted`, `StopRequested`, `SinkClosed`, `AllStoppedWithin`
//! - `debug`: `LoopStarting`, `LoopStopped`, `ErrorForwarded`

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let ns = e.namespace.as_ref().map(|n| n.as_str()).unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::LoopStarting => {
                debug!(
                    namespace = ns,
                    slot = ?e.slot,
                    run = ?e.run,
                    seq = e.seq,
                    "starting control loop"
                );
            }
            EventKind::LoopStopped => {
                debug!(
                    namespace = ns,
                    slot = ?e.slot,
                    run = ?e.run,
                    seq = e.seq,
                    "control loop stopped"
                );
            }
            EventKind::LoopFailed => {
                error!(
                    namespace = ns,
                    slot = ?e.slot,
                    run = ?e.run,
                    error = reason,
                    "control loop failed"
                );
            }
            EventKind::FactoryFailed => {
                error!(
                    namespace = ns,
                    slot = ?e.slot,
                    run = ?e.run,
                    error = reason,
                    "failed to start control loop for namespace, skipping"
                );
            }
            EventKind::ErrorForwarded => {
                debug!(namespace = ns, error = reason, "error forwarded to caller");
            }
            EventKind::ErrorDropped => {
                warn!(namespace = ns, error = reason, "error not delivered");
            }
            EventKind::FailFastTriggered => {
                error!(
                    namespace = ns,
                    error = reason,
                    "fail-fast: cancelling all control loops"
                );
            }
            EventKind::SupervisorStarted => {
                info!(
                    run = ?e.run,
                    policy = e.policy.map(|p| p.as_label()).unwrap_or("-"),
                    loops = ?e.loops,
                    "supervisor started"
                );
            }
            EventKind::StopRequested => {
                info!(run = ?e.run, "stop requested");
            }
            EventKind::SinkClosed => {
                info!(run = ?e.run, "error sink closed");
            }
            EventKind::AllStoppedWithin => {
                info!("all control loops stopped within grace");
            }
            EventKind::GraceExceeded => {
                error!(grace_ms = ?e.timeout_ms, "grace exceeded");
            }
            EventKind::SubscriberOverflow => {
                warn!(info = reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                warn!(info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
