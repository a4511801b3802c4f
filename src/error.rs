//! Precis error types

use std::time::Duration;

/// Precis error types
#[derive(Debug, thiserror::Error)]
pub enum PrecisError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),

    /// The remote call "succeeded" but returned nothing usable.
    #[error("invalid response from model: {0}")]
    InvalidResponse(String),

    // Admission
    #[error("quota exceeded")]
    QuotaExceeded,

    // Shared store errors (never surfaced past the cache or limiter)
    #[error("store error: {0}")]
    Store(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Coarse classification of a failed remote summarization call.
///
/// Used for logging and to decide retry eligibility. See
/// [`FailureClass::is_retryable`] for the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Provider throttled us (HTTP 429).
    RateLimited,
    /// Server-side or transport failure (5xx, connection reset).
    RemoteApi,
    /// The call did not finish inside the provider timeout.
    Timeout,
    /// Degenerate or undecodable response.
    InvalidResponse,
    /// The provider refused the request itself (bad key, bad request).
    Rejected,
}

impl FailureClass {
    /// Retry eligibility table.
    ///
    /// | class             | retried |
    /// |-------------------|---------|
    /// | `RateLimited`     | yes     |
    /// | `RemoteApi`       | yes     |
    /// | `Timeout`         | no      |
    /// | `InvalidResponse` | no      |
    /// | `Rejected`        | no      |
    pub fn is_retryable(self) -> bool {
        match self {
            FailureClass::RateLimited | FailureClass::RemoteApi => true,
            FailureClass::Timeout | FailureClass::InvalidResponse | FailureClass::Rejected => false,
        }
    }

    /// Stable label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureClass::RateLimited => "rate_limited",
            FailureClass::RemoteApi => "remote_api",
            FailureClass::Timeout => "timeout",
            FailureClass::InvalidResponse => "invalid_response",
            FailureClass::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PrecisError {
    /// Classify a remote-call failure.
    ///
    /// Returns `None` for errors that never come out of a provider call
    /// (quota, store, configuration, input validation).
    pub fn class(&self) -> Option<FailureClass> {
        match self {
            PrecisError::RateLimited { .. } => Some(FailureClass::RateLimited),
            PrecisError::Api { status, .. } if *status >= 500 => Some(FailureClass::RemoteApi),
            PrecisError::Api { .. } | PrecisError::AuthenticationFailed => {
                Some(FailureClass::Rejected)
            }
            PrecisError::Http(_) => Some(FailureClass::RemoteApi),
            PrecisError::Timeout(_) => Some(FailureClass::Timeout),
            PrecisError::InvalidResponse(_) | PrecisError::Json(_) => {
                Some(FailureClass::InvalidResponse)
            }
            PrecisError::QuotaExceeded
            | PrecisError::Store(_)
            | PrecisError::InvalidInput(_)
            | PrecisError::Configuration(_) => None,
        }
    }

    /// Whether the retry loop should try again after this error.
    pub fn is_retryable(&self) -> bool {
        self.class().is_some_and(FailureClass::is_retryable)
    }

    /// Provider-supplied backoff hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            PrecisError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for PrecisError {
    fn from(err: redis::RedisError) -> Self {
        PrecisError::Store(err.to_string())
    }
}

/// Result type alias for Precis operations
pub type Result<T> = std::result::Result<T, PrecisError>;
