//! # SupervisionHandle: control over one `start` call.
//!
//! The handle owns the internal stop token and the join handles of every loop
//! launched by [`Supervisor::start`](crate::Supervisor::start). Dropping it does
//! **not** stop the loops; they keep running until the external stop token
//! fires or (fail-fast) a loop fails.
//!
//! ## Shutdown path
//! ```text
//! handle.shutdown()
//!   └─► internal.cancel()          → propagates to every loop's stop token
//!   └─► wait up to grace:
//!          ├─ all joined   → publish AllStoppedWithin → Ok(())
//!          └─ timeout      → publish GraceExceeded    → Err(GraceExceeded { stuck })
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::alive::AliveTracker;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::FailurePolicy;

/// Join handle of one launched loop with its `namespace#slot` label.
pub(crate) struct LoopTask {
    pub(crate) label: String,
    pub(crate) join: JoinHandle<()>,
}

/// Handle to the loops launched by one `start` call.
pub struct SupervisionHandle {
    run: u64,
    policy: FailurePolicy,
    stop: CancellationToken,
    loops: VecDeque<LoopTask>,
    launched: usize,
    grace: Duration,
    bus: Bus,
    alive: Arc<AliveTracker>,
}

impl SupervisionHandle {
    pub(crate) fn new(
        run: u64,
        policy: FailurePolicy,
        stop: CancellationToken,
        loops: VecDeque<LoopTask>,
        grace: Duration,
        bus: Bus,
        alive: Arc<AliveTracker>,
    ) -> Self {
        let launched = loops.len();
        Self {
            run,
            policy,
            stop,
            loops,
            launched,
            grace,
            bus,
            alive,
        }
    }

    /// Identifier of the `start` call, as carried by this run's events.
    pub fn run_id(&self) -> u64 {
        self.run
    }

    /// Failure policy the loops were launched with.
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Triggers the internal stop signal shared by all loops. Idempotent.
    ///
    /// Counts as a voluntary stop: the error channel is left open.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// True once the internal stop signal fired (external stop, `stop()`, or fail-fast).
    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Returns a clone of the internal stop token.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Number of loops launched by this `start` call.
    pub fn len(&self) -> usize {
        self.launched
    }

    /// True if `start` was called with no namespaces.
    pub fn is_empty(&self) -> bool {
        self.launched == 0
    }

    /// Labels (`namespace#slot`) of this run's loops that are currently alive.
    ///
    /// Eventually consistent: based on lifecycle events processed so far.
    pub async fn running(&self) -> Vec<String> {
        self.alive.running(self.run).await
    }

    /// Waits until every loop task has returned.
    pub async fn wait(&mut self) {
        while let Some(task) = self.loops.front_mut() {
            let _ = (&mut task.join).await;
            self.loops.pop_front();
        }
    }

    /// Stops all loops and waits up to the configured grace period.
    pub async fn shutdown(self) -> Result<(), RuntimeError> {
        let grace = self.grace;
        self.shutdown_within(grace).await
    }

    /// Stops all loops and waits up to `grace` for them to return.
    ///
    /// Returns [`RuntimeError::GraceExceeded`] listing the loops still running.
    pub async fn shutdown_within(mut self, grace: Duration) -> Result<(), RuntimeError> {
        self.stop();
        match tokio::time::timeout(grace, self.wait()).await {
            Ok(()) => {
                self.bus
                    .publish(Event::new(EventKind::AllStoppedWithin).with_run(self.run));
                Ok(())
            }
            Err(_elapsed) => {
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded)
                        .with_run(self.run)
                        .with_timeout(grace),
                );
                let stuck = self
                    .loops
                    .iter()
                    .filter(|t| !t.join.is_finished())
                    .map(|t| t.label.clone())
                    .collect();
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}
