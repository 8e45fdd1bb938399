//! # Run one namespace's control loop.
//!
//! [`run_loop`] is the adapter around the opaque reconciliation logic: it asks
//! the factory for the loop, runs it against the loop's stop token, and decides
//! whether the way it ended is a **reportable failure** or a **graceful stop**.
//!
//! ## Event flow
//!
//! ```text
//! Success / stop observed:
//!   publish LoopStarting → factory.build() → loop.run(stop) → Ok(()) → publish LoopStopped
//!
//! Stop-induced error:
//!   loop.run(stop) → Err(_) with stop cancelled → publish LoopStopped (not reported)
//!
//! Factory failure:
//!   factory.build() → Err(e) → publish FactoryFailed → Failed(LoopError::Factory)
//!
//! Loop failure:
//!   loop.run(stop) → Err(e) with stop live → publish LoopFailed → Failed(e)
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event per loop.
//! - `LoopError::Canceled` is always a graceful stop.
//! - Any error returned after the stop token fired is treated as a consequence
//!   of being stopped and is never reported.
//! - Panics in the factory or the loop are caught and reported as failures.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio_util::sync::CancellationToken;

use crate::{
    error::LoopError,
    events::{Bus, Event, EventKind},
    loops::{LoopFactory, Namespace},
    subscribers::panic_message,
};

/// How a single loop ended.
#[derive(Debug, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The loop returned because it observed its stop signal (or finished on its own).
    Stopped,
    /// The factory or the loop failed; the error must be reported.
    Failed(LoopError),
}

/// Builds and runs the loop for `namespace`, publishing lifecycle events to `bus`.
///
/// `run` identifies the `start` call and `slot` the position in its namespace list.
pub async fn run_loop<F: LoopFactory + ?Sized>(
    factory: &F,
    namespace: &Namespace,
    slot: usize,
    run: u64,
    stop: &CancellationToken,
    bus: &Bus,
) -> LoopOutcome {
    let at = LoopAt {
        namespace,
        slot,
        run,
    };
    bus.publish(at.event(EventKind::LoopStarting));

    let built = match AssertUnwindSafe(factory.build(namespace))
        .catch_unwind()
        .await
    {
        Ok(res) => res,
        Err(panic_err) => Err(LoopError::factory(
            namespace,
            format!("factory panicked: {}", panic_message(&*panic_err)),
        )),
    };

    let control = match built {
        Ok(control) => control,
        Err(e) if e.is_stop_induced() || stop.is_cancelled() => {
            publish_stopped(bus, &at, Some(&e));
            return LoopOutcome::Stopped;
        }
        Err(e) => {
            let e = as_factory_error(namespace, e);
            publish_failed(bus, EventKind::FactoryFailed, &at, &e);
            return LoopOutcome::Failed(e);
        }
    };

    let res = match AssertUnwindSafe(control.run(stop.clone()))
        .catch_unwind()
        .await
    {
        Ok(res) => res,
        Err(panic_err) => Err(LoopError::failed(
            namespace,
            format!("loop panicked: {}", panic_message(&*panic_err)),
        )),
    };

    match res {
        Ok(()) => {
            publish_stopped(bus, &at, None);
            LoopOutcome::Stopped
        }
        Err(e) if e.is_stop_induced() || stop.is_cancelled() => {
            publish_stopped(bus, &at, Some(&e));
            LoopOutcome::Stopped
        }
        Err(e) => {
            publish_failed(bus, EventKind::LoopFailed, &at, &e);
            LoopOutcome::Failed(e)
        }
    }
}

/// Re-tags a non-factory error returned by a factory so it reads as a start failure.
fn as_factory_error(namespace: &Namespace, e: LoopError) -> LoopError {
    match e {
        LoopError::Factory { .. } => e,
        LoopError::Failed { error, .. } => LoopError::factory(namespace, error),
        other => LoopError::factory(namespace, other.to_string()),
    }
}

/// Identity stamped on every lifecycle event of one loop.
struct LoopAt<'a> {
    namespace: &'a Namespace,
    slot: usize,
    run: u64,
}

impl LoopAt<'_> {
    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind)
            .with_namespace(self.namespace)
            .with_slot(self.slot)
            .with_run(self.run)
    }
}

/// Publishes `LoopStopped` (graceful exit, optionally with the swallowed error).
fn publish_stopped(bus: &Bus, at: &LoopAt<'_>, swallowed: Option<&LoopError>) {
    let mut ev = at.event(EventKind::LoopStopped);
    if let Some(e) = swallowed {
        ev = ev.with_reason(e.to_string());
    }
    bus.publish(ev);
}

/// Publishes `LoopFailed` / `FactoryFailed` with error details.
fn publish_failed(bus: &Bus, kind: EventKind, at: &LoopAt<'_>, err: &LoopError) {
    bus.publish(at.event(kind).with_reason(err.to_string()));
}
