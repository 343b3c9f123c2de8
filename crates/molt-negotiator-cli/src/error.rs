//! CLI error types.

use molt_negotiator::NegotiationError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Error, Debug)]
pub enum CliError {
    /// The scenario file is malformed or inconsistent.
    #[error("scenario error: {0}")]
    Scenario(String),

    /// The engine rejected an operation.
    #[error("negotiation error: {0}")]
    Negotiation(#[from] NegotiationError),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
