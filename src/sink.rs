//! # Error channel between the supervisor and its caller.
//!
//! [`error_channel`] returns an outbound-only pair:
//! - [`ErrorSink`] the writing side, cloneable, safe for concurrent unordered writers;
//! - [`ErrorStream`] the reading side, owned by the caller.
//!
//! ## Close semantics
//! Unlike a bare `mpsc` channel, the sink can be **closed explicitly** even while
//! other sender clones are still alive. This is what the fail-fast policy does
//! after forwarding its single error:
//! ```text
//! sink.send(err) ──► [buffer] ──► stream.recv() = Some(err)
//! sink.close()   ──────────────► stream.recv() = None
//! sink.send(..)  ──► Err(SinkError::Closed)
//! ```
//! Errors buffered before the close are still delivered. Closing twice is a no-op.
//!
//! The stream also ends (returns `None`) when every sink clone has been dropped.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{LoopError, SinkError};

/// Creates a bounded error channel.
///
/// Writers wait for capacity instead of dropping errors. `capacity` is clamped to 1.
pub fn error_channel(capacity: usize) -> (ErrorSink, ErrorStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let closed = CancellationToken::new();
    (
        ErrorSink {
            tx,
            closed: closed.clone(),
        },
        ErrorStream { rx, closed },
    )
}

/// Writing side of the error channel.
#[derive(Clone, Debug)]
pub struct ErrorSink {
    tx: mpsc::Sender<LoopError>,
    closed: CancellationToken,
}

impl ErrorSink {
    /// Sends one error, waiting for capacity if the buffer is full.
    ///
    /// Returns [`SinkError::Closed`] if the sink was closed (before or while
    /// waiting) or if the stream was dropped.
    pub async fn send(&self, err: LoopError) -> Result<(), SinkError> {
        if self.closed.is_cancelled() {
            return Err(SinkError::Closed);
        }
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(SinkError::Closed),
            res = self.tx.send(err) => res.map_err(|_| SinkError::Closed),
        }
    }

    /// Closes the channel for every sink clone. Idempotent.
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// True if the sink was closed or the stream was dropped.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled() || self.tx.is_closed()
    }
}

/// Reading side of the error channel.
#[derive(Debug)]
pub struct ErrorStream {
    rx: mpsc::Receiver<LoopError>,
    closed: CancellationToken,
}

impl ErrorStream {
    /// Receives the next error.
    ///
    /// Returns `None` once the sink is closed and the buffer is drained, or once
    /// every sink clone has been dropped.
    pub async fn recv(&mut self) -> Option<LoopError> {
        tokio::select! {
            biased;
            msg = self.rx.recv() => msg,
            _ = self.closed.cancelled() => {
                self.rx.close();
                self.rx.try_recv().ok()
            }
        }
    }

    /// Returns a buffered error without waiting.
    pub fn try_recv(&mut self) -> Option<LoopError> {
        self.rx.try_recv().ok()
    }

    /// True if the sink side closed the channel explicitly.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}
