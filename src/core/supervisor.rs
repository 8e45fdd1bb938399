//! # Supervisor: fans out one control loop per namespace and applies a failure policy.
//!
//! The [`Supervisor`] owns the event bus, a [`SubscriberSet`], the alive tracker
//! and the [`LoopFactory`](crate::LoopFactory). Every call to
//! [`start`](Supervisor::start) launches one loop actor per namespace entry and
//! wires failures according to [`FailurePolicy`].
//!
//! ## High-level architecture
//! ```text
//! Inputs to start():
//!   [ns0, ns1, ..., nsN-1], external stop token, ErrorSink
//!
//! Tokens:
//!   external ──child──► internal ──child──► loop stop (one per actor)
//!
//! Spawn actors (no ordering between them):
//!   ns[0]  ns[1]  ...  ns[N-1]
//!     │      │            │
//!     └──► LoopActor { ns, slot, factory, report }  ──► tokio::spawn(actor.run(loop_stop))
//!
//! ContinueOnError:
//!   actor failure ──► ErrorSink (inline, per actor)            siblings untouched
//!   stop watcher  ──► StopRequested, or exit once every actor returned
//!
//! FailFast:
//!   actor failure ──► [failure bus] ──► coordinator
//!                                         select! {
//!                                           first failure ─► sink.send(err)
//!                                                           ─► internal.cancel()
//!                                                           ─► sink.close()
//!                                           stop observed ─► StopRequested
//!                                                           (sink left open)
//!                                           all loops done ─► exit
//!                                         }
//!                                         leftover failures ─► ErrorDropped
//! ```
//!
//! ## Rules
//! - `start` never fails; every failure surfaces asynchronously on the error channel.
//! - An empty namespace sequence launches nothing and returns immediately.
//! - Duplicate namespaces are not deduplicated; each gets its own loop.
//! - Every `start` gets its own run id; lifecycle events carry it so runs
//!   sharing a supervisor never mix up their loops.
//! - Under fail-fast, simultaneous "first failure" and "stop" are resolved by
//!   `tokio::select!` random branch choice: neither is guaranteed to win.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::{
    actor::{Failure, LoopActor, Report},
    alive::AliveTracker,
    builder::SupervisorBuilder,
    config::SupervisorConfig,
    handle::{LoopTask, SupervisionHandle},
};
use crate::events::{Bus, Event, EventKind, loop_label};
use crate::loops::{FactoryRef, Namespace};
use crate::policies::FailurePolicy;
use crate::sink::{ErrorSink, ErrorStream, error_channel};
use crate::subscribers::SubscriberSet;

/// Launches and coordinates one control loop per namespace.
pub struct Supervisor {
    cfg: SupervisorConfig,
    factory: FactoryRef,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    alive: Arc<AliveTracker>,
    flush_tx: mpsc::Sender<oneshot::Sender<()>>,
    next_run: AtomicU64,
}

impl Supervisor {
    /// Creates a builder around the given loop factory.
    pub fn builder(factory: FactoryRef) -> SupervisorBuilder {
        SupervisorBuilder::new(factory)
    }

    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        factory: FactoryRef,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        alive: Arc<AliveTracker>,
        flush_tx: mpsc::Sender<oneshot::Sender<()>>,
    ) -> Self {
        Self {
            cfg,
            factory,
            bus,
            subs,
            alive,
            flush_tx,
            next_run: AtomicU64::new(1),
        }
    }

    /// Returns the configuration this supervisor was built with.
    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }

    /// Returns the failure policy applied by [`start`](Supervisor::start).
    pub fn policy(&self) -> FailurePolicy {
        self.cfg.policy
    }

    /// Creates a receiver of runtime events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Waits until every subscriber has handled the events published before this call.
    ///
    /// Call it before exiting the process so the last diagnostics are not lost.
    pub async fn flush(&self) {
        let (done, ack) = oneshot::channel();
        if self.flush_tx.send(done).await.is_ok() {
            let _ = ack.await;
        }
    }

    /// Launches one loop per namespace and returns the handle plus the error stream.
    ///
    /// The error channel is created with `error_capacity` slots and the
    /// supervisor holds its only senders. Under continue-on-error it is never
    /// closed explicitly; it ends once every loop has returned. Under fail-fast
    /// it is closed after the first failure.
    ///
    /// `recv()` returning `None` therefore does not by itself mean fail-fast
    /// fired: after a voluntary stop the senders are dropped too. Check
    /// [`ErrorStream::is_closed`], which is `true` only for the fail-fast close,
    /// or use [`start_with_sink`](Supervisor::start_with_sink) and keep a sink
    /// clone so the stream stays open until you close it.
    pub fn start<I, N>(
        &self,
        namespaces: I,
        stop: CancellationToken,
    ) -> (SupervisionHandle, ErrorStream)
    where
        I: IntoIterator<Item = N>,
        N: Into<Namespace>,
    {
        let (sink, stream) = error_channel(self.cfg.error_capacity_clamped());
        (self.start_with_sink(namespaces, stop, sink), stream)
    }

    /// Launches one loop per namespace, reporting failures on the caller's `sink`.
    ///
    /// The caller keeps ownership of the channel: after a voluntary stop the
    /// supervisor leaves `sink` open. Only the fail-fast failure path closes it.
    pub fn start_with_sink<I, N>(
        &self,
        namespaces: I,
        stop: CancellationToken,
        sink: ErrorSink,
    ) -> SupervisionHandle
    where
        I: IntoIterator<Item = N>,
        N: Into<Namespace>,
    {
        let namespaces: Vec<Namespace> = namespaces.into_iter().map(Into::into).collect();
        let internal = stop.child_token();
        let run = self.next_run.fetch_add(1, Ordering::Relaxed);

        if namespaces.is_empty() {
            return self.handle(run, internal, VecDeque::new());
        }

        let report = if self.cfg.policy.cancels_siblings() {
            let (tx, rx) = mpsc::channel(self.cfg.error_capacity_clamped());
            tokio::spawn(fail_fast(rx, internal.clone(), sink, self.bus.clone(), run));
            Report::Coordinator(tx)
        } else {
            let (finished, all_returned) = mpsc::channel(1);
            tokio::spawn(watch_stop(internal.clone(), all_returned, self.bus.clone(), run));
            Report::Sink {
                sink,
                _finished: finished,
            }
        };

        self.bus.publish(
            Event::new(EventKind::SupervisorStarted)
                .with_run(run)
                .with_policy(self.cfg.policy)
                .with_loops(namespaces.len()),
        );

        let loops = self.spawn_loops(run, namespaces, &internal, report);
        self.handle(run, internal, loops)
    }

    /// Spawns one actor per namespace entry, each with a private child token.
    fn spawn_loops(
        &self,
        run: u64,
        namespaces: Vec<Namespace>,
        internal: &CancellationToken,
        report: Report,
    ) -> VecDeque<LoopTask> {
        namespaces
            .into_iter()
            .enumerate()
            .map(|(slot, namespace)| {
                let label = loop_label(&namespace, slot);
                let actor = LoopActor {
                    namespace,
                    slot,
                    run,
                    factory: Arc::clone(&self.factory),
                    bus: self.bus.clone(),
                    report: report.clone(),
                };
                let join = tokio::spawn(actor.run(internal.child_token()));
                LoopTask { label, join }
            })
            .collect()
    }

    fn handle(
        &self,
        run: u64,
        internal: CancellationToken,
        loops: VecDeque<LoopTask>,
    ) -> SupervisionHandle {
        SupervisionHandle::new(
            run,
            self.cfg.policy,
            internal,
            loops,
            self.cfg.grace,
            self.bus.clone(),
            Arc::clone(&self.alive),
        )
    }

    /// Forwards bus events to the alive tracker and the subscriber set, and
    /// answers flush requests once every earlier event was handed over.
    ///
    /// Called once by the builder.
    pub(crate) fn spawn_event_listener(
        &self,
        mut flushes: mpsc::Receiver<oneshot::Sender<()>>,
    ) {
        let mut rx = self.bus.subscribe();
        let subs = Arc::clone(&self.subs);
        let alive = Arc::clone(&self.alive);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => {
                            alive.update(&ev).await;
                            subs.emit(&ev);
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "event listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    Some(done) = flushes.recv() => {
                        subs.flush().await;
                        let _ = done.send(());
                    }
                }
            }
        });
    }
}

/// Continue-on-error: reports an observed stop, or ends once every actor returned.
async fn watch_stop(
    internal: CancellationToken,
    mut all_returned: mpsc::Receiver<()>,
    bus: Bus,
    run: u64,
) {
    tokio::select! {
        _ = internal.cancelled() => {
            bus.publish(Event::new(EventKind::StopRequested).with_run(run));
        }
        _ = all_returned.recv() => {}
    }
}

/// Fail-fast coordinator: acts on whichever of {first failure, stop} comes first.
///
/// Exits without touching the sink when every loop returned cleanly, which
/// drops the last sender so the caller's stream ends. Failures that lost the
/// race and are still buffered are reported as `ErrorDropped`.
async fn fail_fast(
    mut failures: mpsc::Receiver<Failure>,
    internal: CancellationToken,
    sink: ErrorSink,
    bus: Bus,
    run: u64,
) {
    tokio::select! {
        first = failures.recv() => {
            if let Some(first) = first {
                forward_first(first, run, &internal, &sink, &bus).await;
            }
        }
        _ = internal.cancelled() => {
            bus.publish(Event::new(EventKind::StopRequested).with_run(run));
        }
    }

    failures.close();
    while let Some(late) = failures.recv().await {
        bus.publish(
            loop_event(EventKind::ErrorDropped, &late.namespace, late.slot, run)
                .with_reason(late.error.to_string()),
        );
    }
}

/// Forwards the winning failure, cancels every loop and closes the sink.
async fn forward_first(
    first: Failure,
    run: u64,
    internal: &CancellationToken,
    sink: &ErrorSink,
    bus: &Bus,
) {
    let Failure {
        namespace,
        slot,
        error,
    } = first;
    let reason = error.to_string();
    bus.publish(
        loop_event(EventKind::FailFastTriggered, &namespace, slot, run)
            .with_reason(reason.as_str()),
    );

    let delivered = tokio::select! {
        biased;
        res = sink.send(error) => res.is_ok(),
        _ = internal.cancelled() => false,
    };
    let kind = if delivered {
        EventKind::ErrorForwarded
    } else {
        EventKind::ErrorDropped
    };
    bus.publish(loop_event(kind, &namespace, slot, run).with_reason(reason));

    internal.cancel();
    sink.close();
    bus.publish(Event::new(EventKind::SinkClosed).with_run(run));
}

fn loop_event(kind: EventKind, namespace: &Namespace, slot: usize, run: u64) -> Event {
    Event::new(kind)
        .with_namespace(namespace)
        .with_slot(slot)
        .with_run(run)
}
