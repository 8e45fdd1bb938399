//! Failure policies.
//!
//! This module groups the knob that controls **what happens to sibling loops**
//! when one namespace's loop fails.
//!
//! ## Contents
//! - [`FailurePolicy`] continue-on-error / fail-fast
//!
//! ## Quick wiring
//! ```text
//! SupervisorConfig { policy: FailurePolicy, .. }
//!      └─► core::supervisor::Supervisor uses:
//!           - ContinueOnError → each loop actor forwards its own failure
//!           - FailFast        → a coordinator races {first failure, external stop}
//! ```
//!
//! ## Defaults
//! - `FailurePolicy::ContinueOnError`.

mod failure;

pub use failure::FailurePolicy;
