//! # SubscriberSet: the supervisor's diagnostic fan-out.
//!
//! Every [`Event`] the supervisor publishes is copied once into an `Arc` and
//! queued for each subscriber. Each subscriber drains its own bounded queue on
//! a dedicated worker task, so a slow log shipper never delays a loop actor or
//! the fail-fast coordinator.
//!
//! ```text
//! emit(&Event) ──► Arc<Event> ──try_send──► queue[LogWriter] ──► worker ──► on_event
//!                             └─try_send──► queue[custom]    ──► worker ──► on_event
//!                                   │
//!                                   └─ full / closed ─► warn! + SubscriberOverflow
//! ```
//!
//! A subscriber sees events in publish order. Two subscribers are not ordered
//! relative to each other. A panic inside `on_event` is contained to that one
//! event: the worker logs it, publishes `SubscriberPanicked` and keeps going.
//!
//! [`flush`](SubscriberSet::flush) queues a marker behind everything already
//! queued and resolves once every worker has reached it.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tracing::warn;

use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

enum Msg {
    Event(Arc<Event>),
    Flush(oneshot::Sender<()>),
}

/// One subscriber's queue. Its worker task ends once the queue is dropped.
struct Worker {
    name: &'static str,
    queue: mpsc::Sender<Msg>,
}

/// Delivers events to the subscribers passed at construction.
pub struct SubscriberSet {
    workers: Vec<Worker>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber. Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let workers = subs
            .into_iter()
            .map(|sub| spawn_worker(sub, bus.clone()))
            .collect();
        Self { workers, bus }
    }

    /// Queues `event` for every subscriber without waiting.
    ///
    /// A subscriber whose queue is full (or whose worker is gone) misses the
    /// event. That is reported as `SubscriberOverflow`, except when the missed
    /// event is itself a subscriber-health event.
    pub fn emit(&self, event: &Event) {
        let shared = Arc::new(event.clone());
        for w in &self.workers {
            let reason = match w.queue.try_send(Msg::Event(Arc::clone(&shared))) {
                Ok(()) => continue,
                Err(TrySendError::Full(_)) => "full",
                Err(TrySendError::Closed(_)) => "closed",
            };
            warn!(subscriber = w.name, reason, seq = shared.seq, "subscriber missed event");
            if !shared.is_subscriber_event() {
                self.bus.publish(Event::subscriber_overflow(w.name, reason));
            }
        }
    }

    /// Waits until every subscriber has handled the events queued before this call.
    ///
    /// Unlike [`emit`](SubscriberSet::emit) this waits for queue capacity.
    pub async fn flush(&self) {
        let acks = self.workers.iter().map(|w| async move {
            let (done, ack) = oneshot::channel();
            if w.queue.send(Msg::Flush(done)).await.is_ok() {
                let _ = ack.await;
            }
        });
        futures::future::join_all(acks).await;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

fn spawn_worker(sub: Arc<dyn Subscribe>, bus: Bus) -> Worker {
    let name = sub.name();
    let (queue, mut rx) = mpsc::channel::<Msg>(sub.queue_capacity().max(1));
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let ev = match msg {
                Msg::Event(ev) => ev,
                Msg::Flush(done) => {
                    let _ = done.send(());
                    continue;
                }
            };
            let handled = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await;
            if let Err(payload) = handled {
                let info = panic_message(&*payload);
                warn!(subscriber = name, seq = ev.seq, %info, "subscriber panicked");
                bus.publish(Event::subscriber_panicked(name, info));
            }
        }
    });
    Worker { name, queue }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    match payload.downcast_ref::<&'static str>() {
        Some(msg) => (*msg).to_string(),
        None => payload
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_else(|| "unknown panic".to_string()),
    }
}
