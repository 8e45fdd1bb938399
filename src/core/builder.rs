use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::{
    events::Bus,
    loops::FactoryRef,
    policies::FailurePolicy,
    subscribers::{Subscribe, SubscriberSet},
};
use super::{alive::AliveTracker, config::SupervisorConfig, supervisor::Supervisor};

/// Builder for constructing a [`Supervisor`].
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    factory: FactoryRef,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the default configuration.
    pub fn new(factory: FactoryRef) -> Self {
        Self {
            cfg: SupervisorConfig::default(),
            factory,
            subscribers: Vec::new(),
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, cfg: SupervisorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the failure policy.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.cfg.policy = policy;
        self
    }

    /// Sets the default shutdown grace period.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.cfg.grace = grace;
        self
    }

    /// Sets the diagnostic subscribers.
    ///
    /// Subscribers receive runtime events (loop lifecycle, failures, routing)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one diagnostic subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds and returns the Supervisor instance.
    ///
    /// Spawns the subscriber workers and the event listener, so this must be
    /// called from inside a tokio runtime.
    pub fn build(self) -> Arc<Supervisor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let alive = Arc::new(AliveTracker::new());
        let (flush_tx, flush_rx) = mpsc::channel(1);

        let sup = Arc::new(Supervisor::new_internal(
            self.cfg,
            self.factory,
            bus,
            subs,
            alive,
            flush_tx,
        ));
        sup.spawn_event_listener(flush_rx);
        sup
    }
}
