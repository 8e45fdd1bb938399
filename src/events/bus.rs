//! # Bus: where actors, the runner and the coordinator publish events.
//!
//! One `Bus` per supervisor. Publishing is synchronous and never waits, so a
//! loop actor can report lifecycle changes from any point without yielding.
//! The supervisor's event listener is the normal receiver; tests and callers
//! may attach extra receivers through [`Supervisor::subscribe`](crate::Supervisor::subscribe).
//!
//! ```text
//! runner / LoopActor / fail-fast coordinator / handle
//!        │ publish(Event)
//!        ▼
//!   broadcast ring (capacity = bus_capacity)
//!        │
//!        ├──► event listener ──► AliveTracker, SubscriberSet
//!        └──► extra receivers
//! ```
//!
//! A receiver that falls more than `capacity` events behind gets
//! `RecvError::Lagged` and loses the oldest ones. Events published while no
//! receiver exists are discarded.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable publisher handle over a `broadcast` channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// `capacity` is raised to 1 if zero.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes `ev`; dropped silently when nobody listens.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
