//! # Loop liveness tracker.
//!
//! Maintains the set of control loops that are currently running, keyed by
//! the `start` call they belong to (`run`) and their `namespace#slot` label.
//! One tracker is shared by every run of a supervisor, so the run id keeps two
//! runs over the same namespaces apart.
//!
//! ## Architecture
//! ```text
//! run_loop ──► Bus ──► event_listener() ──► AliveTracker::update()
//!                                                  │
//!                                                  ▼
//!                                   HashMap<(run, label), start seq>
//! ```
//!
//! ## Rules
//! - `LoopStarting` inserts; `LoopStopped` / `LoopFailed` / `FactoryFailed` remove
//! - A terminal event older than the recorded start (`seq <=`) is ignored
//! - Events without `run`, `namespace` or `slot` are ignored
//! - `running` is **eventually consistent**

use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::events::{Event, EventKind};

type Key = (u64, String);

/// Thread-safe tracker of running loops.
#[derive(Default)]
pub struct AliveTracker {
    started: RwLock<HashMap<Key, u64>>,
}

impl AliveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one lifecycle event. Returns `true` if the tracked set changed.
    pub async fn update(&self, ev: &Event) -> bool {
        let starting = match ev.kind {
            EventKind::LoopStarting => true,
            EventKind::LoopStopped | EventKind::LoopFailed | EventKind::FactoryFailed => false,
            _ => return false,
        };
        let (Some(run), Some(label)) = (ev.run, ev.label()) else {
            return false;
        };
        if ev.slot.is_none() {
            return false;
        }

        let mut started = self.started.write().await;
        let key = (run, label);
        if starting {
            started.insert(key, ev.seq);
            return true;
        }
        match started.get(&key) {
            Some(&seq) if ev.seq > seq => started.remove(&key).is_some(),
            _ => false,
        }
    }

    /// Returns the sorted labels of `run`'s loops currently alive.
    pub async fn running(&self, run: u64) -> Vec<String> {
        let started = self.started.read().await;
        let mut alive: Vec<String> = started
            .keys()
            .filter(|(r, _)| *r == run)
            .map(|(_, label)| label.clone())
            .collect();
        alive.sort_unstable();
        alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(kind: EventKind, run: u64, slot: usize) -> Event {
        Event::new(kind).with_namespace("ns").with_slot(slot).with_run(run)
    }

    #[tokio::test]
    async fn test_start_then_stop_removes_entry() {
        let t = AliveTracker::new();
        assert!(t.update(&ev(EventKind::LoopStarting, 1, 0)).await);
        assert!(t.update(&ev(EventKind::LoopStarting, 1, 1)).await);
        assert_eq!(t.running(1).await, vec!["ns#0".to_string(), "ns#1".to_string()]);

        assert!(t.update(&ev(EventKind::LoopFailed, 1, 0)).await);
        assert_eq!(t.running(1).await, vec!["ns#1".to_string()]);
        assert!(t.update(&ev(EventKind::LoopStopped, 1, 1)).await);
        assert!(t.started.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_runs_do_not_share_labels() {
        let t = AliveTracker::new();
        t.update(&ev(EventKind::LoopStarting, 1, 0)).await;
        t.update(&ev(EventKind::LoopStarting, 2, 0)).await;

        assert!(t.update(&ev(EventKind::LoopStopped, 2, 0)).await);
        assert_eq!(t.running(1).await, vec!["ns#0".to_string()]);
        assert!(t.running(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_stale_terminal_event_is_ignored() {
        let t = AliveTracker::new();
        let stopped = ev(EventKind::LoopStopped, 1, 0);
        let starting = ev(EventKind::LoopStarting, 1, 0);

        t.update(&starting).await;
        assert!(!t.update(&stopped).await);
        assert_eq!(t.running(1).await, vec!["ns#0".to_string()]);
    }

    #[tokio::test]
    async fn test_unrelated_events_are_ignored() {
        let t = AliveTracker::new();
        assert!(!t.update(&Event::new(EventKind::StopRequested).with_run(1)).await);
        assert!(!t.update(&Event::new(EventKind::LoopStarting).with_namespace("ns")).await);
        assert!(t.started.read().await.is_empty());
    }
}
