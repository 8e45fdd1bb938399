//! # LoopActor: the Loop Handle of one namespace.
//!
//! One actor exists per launched namespace entry. It owns:
//! - the namespace it serves and its slot in the launched sequence,
//! - a private stop token (child of the supervisor's internal token),
//! - the path its failure is reported on.
//!
//! ## Flow
//! ```text
//! Supervisor ──► tokio::spawn(LoopActor::run(stop))
//!
//! run_loop(factory, ns, stop)
//!   ├─ Stopped        → exit, nothing reported
//!   └─ Failed(err)    → report exactly once, then exit
//!                         ├─ Report::Sink        → caller's ErrorSink    (continue-on-error)
//!                         └─ Report::Coordinator → fail-fast coordinator
//! ```
//!
//! ## Rules
//! - An actor reports **at most once** and never runs after reporting.
//! - Report delivery gives up when the actor's stop token fires, so a stopped
//!   supervisor never leaves actors blocked on a full channel.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    core::runner::{LoopOutcome, run_loop},
    error::LoopError,
    events::{Bus, Event, EventKind},
    loops::{FactoryRef, Namespace},
    sink::ErrorSink,
};

/// A failure handed from an actor to the fail-fast coordinator.
#[derive(Debug)]
pub struct Failure {
    pub namespace: Namespace,
    pub slot: usize,
    pub error: LoopError,
}

/// Where an actor reports its failure.
///
/// Every actor holds a clone until it returns; once all clones are dropped the
/// receiving side (stop watcher or coordinator) sees its channel close.
#[derive(Clone)]
pub enum Report {
    /// Forward straight to the caller's sink (continue-on-error).
    Sink {
        sink: ErrorSink,
        _finished: mpsc::Sender<()>,
    },
    /// Hand to the coordinator racing failures against the stop signal (fail-fast).
    Coordinator(mpsc::Sender<Failure>),
}

/// Runs and reports one namespace's control loop.
pub struct LoopActor {
    /// Namespace served by this actor.
    pub namespace: Namespace,
    /// Position in the launched namespace sequence (distinguishes duplicates).
    pub slot: usize,
    /// Identifier of the `start` call that launched this actor.
    pub run: u64,
    /// Factory invoked exactly once by [`run`](LoopActor::run).
    pub factory: FactoryRef,
    /// Internal event bus.
    pub bus: Bus,
    /// Failure path.
    pub report: Report,
}

impl LoopActor {
    /// Runs the loop until it stops or fails; reports a failure exactly once.
    pub async fn run(self, stop: CancellationToken) {
        let outcome = run_loop(
            self.factory.as_ref(),
            &self.namespace,
            self.slot,
            self.run,
            &stop,
            &self.bus,
        )
        .await;

        if let LoopOutcome::Failed(error) = outcome {
            self.report(error, &stop).await;
        }
    }

    async fn report(&self, error: LoopError, stop: &CancellationToken) {
        let reason = error.to_string();
        let delivered = match &self.report {
            Report::Sink { sink, .. } => {
                tokio::select! {
                    biased;
                    res = sink.send(error) => res.is_ok(),
                    _ = stop.cancelled() => false,
                }
            }
            Report::Coordinator(tx) => {
                let failure = Failure {
                    namespace: self.namespace.clone(),
                    slot: self.slot,
                    error,
                };
                tokio::select! {
                    biased;
                    res = tx.send(failure) => res.is_ok(),
                    _ = stop.cancelled() => false,
                }
            }
        };

        let kind = match (&self.report, delivered) {
            (_, false) => EventKind::ErrorDropped,
            (Report::Sink { .. }, true) => EventKind::ErrorForwarded,
            // the coordinator publishes the forward (or drop) itself
            (Report::Coordinator(_), true) => return,
        };
        self.bus.publish(
            Event::new(kind)
                .with_namespace(&self.namespace)
                .with_slot(self.slot)
                .with_run(self.run)
                .with_reason(reason),
        );
    }
}
