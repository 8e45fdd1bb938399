//! # Supervisor configuration.
//!
//! Provides [`SupervisorConfig`], centralized settings for one supervisor.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1
//! - `error_capacity = 0` → clamped to 1
//! - `grace = 0s` → `SupervisionHandle::shutdown` does not wait at all

use std::time::Duration;

use crate::policies::FailurePolicy;

/// Global configuration for a supervisor.
///
/// ## Field semantics
/// - `policy`: what one loop's failure means for its siblings
/// - `grace`: default drain window used by `SupervisionHandle::shutdown`
/// - `bus_capacity`: event bus ring buffer size
/// - `error_capacity`: buffer of the error channel created by `Supervisor::start`,
///   and of the internal fail-fast failure bus
///
/// All fields are public; prefer the accessors to avoid sprinkling sentinel checks.
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Failure policy applied to every loop launched by this supervisor.
    pub policy: FailurePolicy,

    /// Maximum time to wait for loops to return once stop was triggered.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow listeners that lag behind more than `bus_capacity` messages skip older items.
    pub bus_capacity: usize,

    /// Capacity of the error channels owned by the supervisor.
    ///
    /// Writers wait for capacity; errors are never dropped because of it.
    pub error_capacity: usize,
}

impl SupervisorConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns an error channel capacity clamped to a minimum of 1.
    #[inline]
    pub fn error_capacity_clamped(&self) -> usize {
        self.error_capacity.max(1)
    }
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `policy = FailurePolicy::ContinueOnError`
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    /// - `error_capacity = 64`
    fn default() -> Self {
        Self {
            policy: FailurePolicy::default(),
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
            error_capacity: 64,
        }
    }
}
