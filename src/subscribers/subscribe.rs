//! # Subscribe: plug-in point for diagnostics.
//!
//! Anything that wants to observe a supervisor (structured logs, metrics,
//! alerting) implements [`Subscribe`] and is handed to
//! [`SupervisorBuilder::with_subscriber`](crate::SupervisorBuilder::with_subscriber).
//! The [`SubscriberSet`](crate::SubscriberSet) drives it from its own task
//! through a bounded queue whose size the subscriber picks itself.

use async_trait::async_trait;

use crate::events::Event;

/// Receives supervisor events.
///
/// `on_event` may be slow; only this subscriber's queue backs up. When the
/// queue is full further events are skipped for this subscriber.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use async_trait::async_trait;
/// use nsvisor::{Event, EventKind, Subscribe};
///
/// #[derive(Default)]
/// struct FailedNamespaces(AtomicUsize);
///
/// #[async_trait]
/// impl Subscribe for FailedNamespaces {
///     async fn on_event(&self, ev: &Event) {
///         if matches!(ev.kind, EventKind::LoopFailed | EventKind::FactoryFailed) {
///             self.0.fetch_add(1, Ordering::Relaxed);
///         }
///     }
///
///     fn name(&self) -> &'static str {
///         "failed-namespaces"
///     }
/// }
/// ```
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Called once per event, in publish order.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow and panic diagnostics. Defaults to the type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
