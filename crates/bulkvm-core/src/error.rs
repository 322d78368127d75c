//! Unified error handling for bulkvm-core
//!
//! Request-level failures (transport, validation, throttling) surface
//! through this type. Operation-level failures never do: a terminal
//! operation with a non-empty error payload is returned as data so the
//! caller can apply domain policy over the full entry list.

use std::time::Duration;

use thiserror::Error;

use crate::compute::ComputeError;
use crate::config::ConfigError;

/// Core error type for client, poller, and workflow failures.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Error from the compute API (transport or request rejection).
    #[error("compute API error: {0}")]
    Compute(#[from] ComputeError),

    /// The poll deadline elapsed before the operation reached `DONE`.
    #[error("operation timed out after {0:?}")]
    OperationTimeout(Duration),

    /// The caller's cancellation signal fired before the operation
    /// reached `DONE`. Distinct from both success and operation-level
    /// failure.
    #[error("operation cancelled")]
    Cancelled,

    /// A fallback workflow ran out of alternatives to try.
    #[error("no acceptable configuration succeeded: tried {0}")]
    ExhaustedAlternatives(String),

    /// Validation error raised before any request was sent.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Returns true if this is a "not found" error (404).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::Compute(e) if e.is_not_found())
    }

    /// Returns true if this is an authentication/authorization error.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CoreError::Compute(e) if e.is_unauthorized())
    }

    /// Returns true if this is a rate limiting error.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CoreError::Compute(e) if e.is_rate_limited())
    }

    /// Returns true if this is a timeout outcome.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, CoreError::OperationTimeout(_))
    }

    /// Returns true if the caller cancelled the operation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }

    /// Returns true if this is a bad request error.
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        match self {
            CoreError::Compute(e) => e.is_bad_request(),
            CoreError::Validation(_) => true,
            _ => false,
        }
    }

    /// Returns true if this error is potentially retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Compute(e) => e.is_retryable(),
            // A fresh attempt with a longer deadline may succeed.
            CoreError::OperationTimeout(_) => true,
            _ => false,
        }
    }
}
