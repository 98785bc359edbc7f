//! Error types for the sequencer.
//!
//! The sequencer is an in-memory coordination primitive: it has no I/O and
//! no partial failure modes. The only runtime failures it can surface are a
//! cooperative cancellation of a waiting barrier (`Alerted`) and a timed
//! wait expiring (`Timeout`); everything else is an argument-validation
//! error raised at construction or claim time.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SequencerError>;

/// Errors produced by the sequencer, its strategies, and its barriers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequencerError {
    /// A constructor or operation received an argument that violates an
    /// invariant (capacity not a power of two, batch larger than capacity,
    /// negative size, empty gating set where one is required).
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Human-readable description of the violated constraint.
        message: String,
    },

    /// A barrier wait was cancelled because the barrier was alerted.
    #[error("sequence barrier was alerted")]
    Alerted,

    /// A timed wait exceeded its deadline before the target sequence became
    /// available.
    #[error("timed out waiting for sequence")]
    Timeout,
}

impl SequencerError {
    /// Build an [`SequencerError::InvalidArgument`] from anything stringly.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        SequencerError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Whether a caller can reasonably retry after this error.
    ///
    /// `Alerted` and `Timeout` both stem from external cancellation or
    /// scheduling, not from malformed input, so callers may legitimately
    /// clear the alert (or back off) and try again. `InvalidArgument`
    /// reflects a programming error and retrying with the same arguments
    /// will not help.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SequencerError::Alerted | SequencerError::Timeout)
    }
}
