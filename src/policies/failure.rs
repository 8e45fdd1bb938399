//! # Failure policies for a supervised namespace set.
//!
//! [`FailurePolicy`] decides what one loop's failure means for its siblings.
//!
//! - [`FailurePolicy::ContinueOnError`] the failure is forwarded; siblings keep running (default).
//! - [`FailurePolicy::FailFast`] the first failure is forwarded, every sibling is cancelled,
//!   and the error channel is closed.
//!
//! ## Choosing the right policy
//!
//! **Independent tenants** (one bad namespace must not take down the rest):
//! ```text
//! FailurePolicy::ContinueOnError  → failing namespace stops being served,
//!                                   all others continue (degraded state)
//! ```
//!
//! **All-or-nothing resource set** (an outer orchestrator restarts the process):
//! ```text
//! FailurePolicy::FailFast         → first failure → cancel all → close channel
//!                                   external stop → cancel all, channel stays open
//! ```
//!
//! Neither policy restarts a failed loop.

/// Policy controlling how a loop failure affects sibling loops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Report every failure; never touch sibling loops (default).
    #[default]
    ContinueOnError,
    /// Report the first failure only, then cancel all loops and close the error channel.
    FailFast,
}

impl FailurePolicy {
    /// True if a single failure must cancel every sibling loop.
    #[inline]
    pub fn cancels_siblings(&self) -> bool {
        matches!(self, FailurePolicy::FailFast)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FailurePolicy::ContinueOnError => "continue_on_error",
            FailurePolicy::FailFast => "fail_fast",
        }
    }
}
