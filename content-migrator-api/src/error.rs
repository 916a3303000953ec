//! Error taxonomy for management API calls.
//!
//! Classification drives the retry policy: transport failures and 5xx
//! responses without a platform error body are retryable, a platform error
//! is retryable only when it is the rate-limit code, and 404s are surfaced
//! as [`ApiError::NotFound`] so callers can tolerate them in lookups.

use thiserror::Error;

/// Platform error code returned when the request rate is exceeded.
pub const RATE_LIMIT_ERROR_CODE: i64 = 10000;

/// Platform error code returned when a schedule cancellation has nothing
/// to cancel.
pub const NOTHING_SCHEDULED_ERROR_CODE: i64 = 40000;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("platform error {code}: {message}")]
    Platform { code: i64, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server error: HTTP {status}")]
    Server { status: u16 },

    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl ApiError {
    /// Create a not-found error for the given resource description.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Retryable iff the response carries no platform error code, or
    /// carries exactly the rate-limit code.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) | ApiError::Server { .. } => true,
            ApiError::Platform { code, .. } => *code == RATE_LIMIT_ERROR_CODE,
            ApiError::NotFound(_) | ApiError::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = ApiError::Platform {
            code: RATE_LIMIT_ERROR_CODE,
            message: "rate exceeded".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_other_platform_codes_are_not_retryable() {
        let err = ApiError::Platform {
            code: 219,
            message: "validation failed".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_server_errors_are_retryable() {
        assert!(ApiError::Server { status: 502 }.is_retryable());
    }

    #[test]
    fn test_not_found_is_not_retryable() {
        assert!(!ApiError::not_found("item 'x'").is_retryable());
    }
}
