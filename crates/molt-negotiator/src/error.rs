//! Error types for the negotiation engine.

use thiserror::Error;

/// Result type for negotiation engine operations.
pub type Result<T> = std::result::Result<T, NegotiationError>;

/// Errors that can occur in the negotiation engine.
///
/// None of these are recovered locally: a silently wrong utility threshold
/// can make the agent accept a harmful deal, so every error is surfaced to
/// the caller at the point of detection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NegotiationError {
    /// Input rejected before any computation (empty candidate set, empty ranking, ...).
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Description of why the input is invalid.
        reason: String,
    },

    /// Operation called outside its contract (unknown issue, bid arity mismatch, ...).
    #[error("precondition violated: {reason}")]
    PreconditionViolation {
        /// Description of the violated precondition.
        reason: String,
    },

    /// The computation would be undefined (zero total time, zero weight mass, ...).
    #[error("degenerate state: {reason}")]
    DegenerateState {
        /// Description of the degenerate state.
        reason: String,
    },

    /// Configuration value outside its documented domain.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of why the configuration is invalid.
        reason: String,
    },
}

impl NegotiationError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn precondition(reason: impl Into<String>) -> Self {
        Self::PreconditionViolation {
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateState {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
