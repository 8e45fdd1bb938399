//! # Runtime events emitted by the supervisor and its loop actors.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Loop lifecycle**: one namespace's loop (starting, stopped, failed, factory failed)
//! - **Error routing**: what happened to a failure (forwarded, dropped, sink closed)
//! - **Shutdown**: stop requests, fail-fast trigger, drain outcome
//! - **Subscriber health**: overflow and panics inside diagnostic subscribers
//!
//! The [`Event`] struct carries metadata such as timestamps, namespace, loop
//! slot and error text.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use nsvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::LoopFailed)
//!     .with_namespace("tenant-a")
//!     .with_slot(2)
//!     .with_reason("watch closed");
//!
//! assert_eq!(ev.kind, EventKind::LoopFailed);
//! assert_eq!(ev.namespace.as_ref().map(|n| n.as_str()), Some("tenant-a"));
//! assert_eq!(ev.label().as_deref(), Some("tenant-a#2"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::loops::Namespace;
use crate::policies::FailurePolicy;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: subscriber name and panic info
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `reason`: subscriber name and drop reason ("full", "closed")
    SubscriberOverflow,

    // === Supervisor events ===
    /// Supervisor launched its loops.
    ///
    /// Sets:
    /// - `run`: identifier of the `start` call
    /// - `policy`: failure policy in effect
    /// - `loops`: number of loops launched
    SupervisorStarted,

    /// External stop signal observed (or `SupervisionHandle::stop` called).
    ///
    /// Sets:
    /// - `run`
    StopRequested,

    /// Fail-fast: the first failure won the race; all loops are being cancelled.
    ///
    /// Sets:
    /// - `namespace`, `slot`, `run`: the failing loop
    /// - `reason`: failure message
    FailFastTriggered,

    /// The supervisor closed the caller's error sink.
    ///
    /// Sets:
    /// - `run`
    SinkClosed,

    /// All loops returned within the configured grace period.
    ///
    /// Sets:
    /// - `run`
    AllStoppedWithin,

    /// Grace period exceeded; some loops did not return in time.
    ///
    /// Sets:
    /// - `run`
    /// - `timeout_ms`: the grace period
    GraceExceeded,

    // === Loop lifecycle events ===
    /// A loop is being built by the factory and started.
    ///
    /// Sets:
    /// - `namespace`, `slot`, `run`
    LoopStarting,

    /// A loop returned after observing its stop signal (no error reported).
    ///
    /// Sets:
    /// - `namespace`, `slot`, `run`
    /// - `reason`: stop-induced error text, if the loop returned one
    LoopStopped,

    /// A loop terminated with a reportable error.
    ///
    /// Sets:
    /// - `namespace`, `slot`, `run`
    /// - `reason`: failure message
    LoopFailed,

    /// The factory could not build the loop for a namespace.
    ///
    /// Sets:
    /// - `namespace`, `slot`, `run`
    /// - `reason`: factory error message
    FactoryFailed,

    // === Error routing events ===
    /// A failure was written to the caller's error sink.
    ///
    /// Sets:
    /// - `namespace`, `slot`, `run` (when known)
    /// - `reason`: failure message
    ErrorForwarded,

    /// A failure could not be delivered (sink closed, or discarded after fail-fast).
    ///
    /// Sets:
    /// - `namespace`, `slot`, `run`
    /// - `reason`: failure message
    ErrorDropped,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Namespace of the loop, if applicable.
    pub namespace: Option<Namespace>,
    /// Position of the loop in the launched namespace sequence.
    pub slot: Option<usize>,
    /// Identifier of the `start` call the loop belongs to.
    pub run: Option<u64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Failure policy (only for `SupervisorStarted`).
    pub policy: Option<FailurePolicy>,
    /// Number of loops (only for `SupervisorStarted`).
    pub loops: Option<usize>,
    /// Duration in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            namespace: None,
            slot: None,
            run: None,
            reason: None,
            policy: None,
            loops: None,
            timeout_ms: None,
        }
    }

    /// Attaches a namespace.
    #[inline]
    pub fn with_namespace(mut self, ns: impl Into<Namespace>) -> Self {
        self.namespace = Some(ns.into());
        self
    }

    /// Attaches the loop slot.
    #[inline]
    pub fn with_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Attaches the run identifier.
    #[inline]
    pub fn with_run(mut self, run: u64) -> Self {
        self.run = Some(run);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the failure policy.
    #[inline]
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Attaches a loop count.
    #[inline]
    pub fn with_loops(mut self, n: usize) -> Self {
        self.loops = Some(n);
        self
    }

    /// Attaches a duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Returns the `namespace#slot` label of the loop this event is about.
    pub fn label(&self) -> Option<String> {
        match (&self.namespace, self.slot) {
            (Some(ns), Some(slot)) => Some(loop_label(ns, slot)),
            (Some(ns), None) => Some(ns.to_string()),
            _ => None,
        }
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

/// Formats the stable label of one loop: `namespace#slot`.
pub(crate) fn loop_label(ns: &Namespace, slot: usize) -> String {
    format!("{ns}#{slot}")
}
