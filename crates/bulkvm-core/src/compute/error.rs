//! Request-level errors for the compute API client
//!
//! These cover the transport/validation failure channel: the request
//! itself failed before a terminal operation could be produced.
//! Operation-level failures are data on [`super::types::Operation`] and
//! are never raised through this type.

use thiserror::Error;

/// Errors raised by [`super::ComputeClient`] and its handlers.
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Malformed request rejected by the service (HTTP 400). Never
    /// retryable; the request itself must be fixed.
    #[error("invalid request ({reason}): {message}")]
    BadRequest { reason: String, message: String },

    /// Credentials missing or rejected (HTTP 401).
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Authenticated but not allowed (HTTP 403).
    #[error("forbidden: {message}")]
    Forbidden { message: String },

    /// Resource or operation does not exist (HTTP 404).
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Request rate exceeded (HTTP 429, or 403 with a rate-limit reason).
    /// Retryable with backoff.
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    /// Provider-side failure (HTTP 5xx). Retryable.
    #[error("server error: {message}")]
    ServerError { message: String },

    /// Any other non-success status.
    #[error("API error (HTTP {code}, {reason}): {message}")]
    Api {
        code: u16,
        reason: String,
        message: String,
    },

    /// The HTTP request could not be sent or the response body could not
    /// be read (network failure, timeout, bad TLS, malformed JSON).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Local validation rejected the request before it was sent.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Result type alias for compute client operations.
pub type ComputeResult<T> = std::result::Result<T, ComputeError>;

impl ComputeError {
    /// Returns true if this is a "not found" error (404).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ComputeError::NotFound { .. })
    }

    /// Returns true if this is an authentication/authorization error (401/403).
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ComputeError::AuthenticationFailed { .. } | ComputeError::Forbidden { .. }
        )
    }

    /// Returns true if this is a rate limiting error.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ComputeError::RateLimited { .. })
    }

    /// Returns true if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, ComputeError::ServerError { .. })
    }

    /// Returns true if this is a bad request error (400 or local validation).
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            ComputeError::BadRequest { .. } | ComputeError::Validation(_)
        )
    }

    /// Returns true if the request-level reason signals capacity exhaustion
    /// (stockout), which upstream flows treat as "try another configuration".
    #[must_use]
    pub fn is_resource_exhausted(&self) -> bool {
        match self {
            ComputeError::BadRequest { reason, .. } | ComputeError::Api { reason, .. } => {
                reason == "RESOURCE_EXHAUSTED" || reason == "ZONE_RESOURCE_POOL_EXHAUSTED"
            }
            _ => false,
        }
    }

    /// Returns true if this error is worth retrying with backoff.
    ///
    /// Transport failures (connection reset, timeout) and throttling are
    /// transient; malformed requests and rejected credentials are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ComputeError::RateLimited { .. } | ComputeError::ServerError { .. } => true,
            ComputeError::Request(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }
}
