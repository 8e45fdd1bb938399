//! Error types used by the nsvisor runtime and by supervised control loops.
//!
//! This module defines three error enums:
//!
//! - [`LoopError`]: errors raised while building or running one per-namespace loop.
//! - [`SinkError`]: errors raised when writing to a closed [`ErrorSink`](crate::ErrorSink).
//! - [`RuntimeError`]: errors raised by the supervisor while draining its loops.
//!
//! [`LoopError`] and [`RuntimeError`] provide helper methods (`as_label`, `as_message`)
//! for logging/metrics.

use std::time::Duration;
use thiserror::Error;

use crate::loops::Namespace;

/// # Errors produced by a supervised control loop.
///
/// Every reportable variant embeds the namespace that produced it, because the
/// error channel carries no other metadata.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoopError {
    /// The loop factory could not build the namespace-scoped clients.
    #[error("failed to start control loop for namespace {namespace}: {error}")]
    Factory {
        /// Namespace the factory was invoked for.
        namespace: Namespace,
        /// The underlying error message.
        error: String,
    },

    /// The reconciliation logic terminated abnormally.
    #[error("control loop for namespace {namespace} failed: {error}")]
    Failed {
        /// Namespace the loop was serving.
        namespace: Namespace,
        /// The underlying error message.
        error: String,
    },

    /// The loop exited because it observed its stop signal.
    ///
    /// This is a graceful exit, never forwarded to the error channel.
    #[error("control loop stopped")]
    Canceled,
}

impl LoopError {
    /// Builds a [`LoopError::Failed`] for `namespace`.
    pub fn failed(namespace: impl Into<Namespace>, error: impl ToString) -> Self {
        LoopError::Failed {
            namespace: namespace.into(),
            error: error.to_string(),
        }
    }

    /// Builds a [`LoopError::Factory`] for `namespace`.
    pub fn factory(namespace: impl Into<Namespace>, error: impl ToString) -> Self {
        LoopError::Factory {
            namespace: namespace.into(),
            error: error.to_string(),
        }
    }

    /// Returns the namespace this error belongs to, if any.
    pub fn namespace(&self) -> Option<&Namespace> {
        match self {
            LoopError::Factory { namespace, .. } | LoopError::Failed { namespace, .. } => {
                Some(namespace)
            }
            LoopError::Canceled => None,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use nsvisor::LoopError;
    ///
    /// let err = LoopError::failed("tenant-a", "watch closed");
    /// assert_eq!(err.as_label(), "loop_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LoopError::Factory { .. } => "loop_factory_failed",
            LoopError::Failed { .. } => "loop_failed",
            LoopError::Canceled => "loop_canceled",
        }
    }

    /// Returns a human-readable message without the namespace prefix.
    pub fn as_message(&self) -> String {
        match self {
            LoopError::Factory { error, .. } => format!("factory: {error}"),
            LoopError::Failed { error, .. } => format!("error: {error}"),
            LoopError::Canceled => "stopped".to_string(),
        }
    }

    /// True for the graceful-stop variant, which must never reach the caller.
    pub fn is_stop_induced(&self) -> bool {
        matches!(self, LoopError::Canceled)
    }
}

/// # Errors produced when writing to the error channel.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    /// The sink was closed, or the receiving stream was dropped.
    #[error("error sink closed")]
    Closed,
}

/// # Errors produced by the nsvisor runtime.
///
/// These represent failures of the supervisor itself while stopping its loops.
/// Starting a supervisor never fails.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some loops did not return in time.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Labels of the loops that were still running.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use nsvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck loops={stuck:?}")
            }
        }
    }
}
