//! Error types shared by the Berez collaborators.

use thiserror::Error;

/// Result type for backend and geolocation calls.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors raised while talking to the backend or the IP geolocation service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout)
    #[error("request failed: {0}")]
    Transport(String),

    /// Non-2xx response; `detail` is the backend's message when it sent one
    #[error("server responded {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("fountain {0} not found")]
    NotFound(i64),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid rating {0}: ratings run from 1 to 5")]
    InvalidRating(u8),

    /// Rejected locally before any I/O happened
    #[error("invalid request: {0}")]
    Invalid(String),
}

impl ApiError {
    /// Whether retrying the same call later can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            ApiError::NotFound(_)
            | ApiError::Decode(_)
            | ApiError::InvalidRating(_)
            | ApiError::Invalid(_) => false,
        }
    }
}

/// Why the precise (GPS) position could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    Unavailable(String),

    #[error("timed out waiting for a position fix")]
    Timeout,

    #[error("no precise position source on this platform")]
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        let err = ApiError::Status {
            status: 503,
            detail: "busy".to_string(),
        };
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "server responded 503: busy");
    }

    #[test]
    fn client_errors_are_not_retryable() {
        let err = ApiError::Status {
            status: 422,
            detail: "bad payload".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(!ApiError::NotFound(4).is_retryable());
        assert!(ApiError::Transport("connection refused".to_string()).is_retryable());
    }
}
