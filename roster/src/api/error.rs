//! API error types

use std::time::Duration;
use thiserror::Error;

use crate::batch::FailureReason;

/// Errors that can occur talking to the roster backend
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Check if retrying the same call could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Api { status, .. } => matches!(*status, 408 | 429) || *status >= 500,
            ApiError::Network(_) => true,
            ApiError::Timeout(_) => true,
            ApiError::InvalidResponse(_) => false,
            ApiError::InvalidUrl(_) => false,
            ApiError::Json(_) => false,
        }
    }
}

impl From<ApiError> for FailureReason {
    fn from(err: ApiError) -> Self {
        if err.is_retryable() {
            FailureReason::new(err.to_string())
        } else {
            FailureReason::permanent(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(
            ApiError::Api {
                status: 503,
                message: "Unavailable".to_string()
            }
            .is_retryable()
        );

        assert!(
            ApiError::Api {
                status: 429,
                message: "Slow down".to_string()
            }
            .is_retryable()
        );

        assert!(
            !ApiError::Api {
                status: 400,
                message: "Bad request".to_string()
            }
            .is_retryable()
        );

        assert!(ApiError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(!ApiError::InvalidResponse("Bad JSON".to_string()).is_retryable());
    }

    #[test]
    fn test_failure_reason_keeps_message() {
        let reason: FailureReason = ApiError::Api {
            status: 404,
            message: "Member not found".to_string(),
        }
        .into();
        assert_eq!(reason.message, "API error 404: Member not found");
        assert!(!reason.retryable);

        let reason: FailureReason = ApiError::Api {
            status: 502,
            message: "Unknown error".to_string(),
        }
        .into();
        assert!(reason.retryable);
    }
}
