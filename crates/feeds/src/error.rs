//! Error types for exchange feed operations.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the exchange.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Request failed: {0}")]
    ConnectionFailed(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Exchange API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("HTTP status {0}")]
    Http(u16),

    #[error("Identifier not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::ParseError(err.to_string())
    }
}

impl From<url::ParseError> for FeedError {
    fn from(err: url::ParseError) -> Self {
        FeedError::InvalidConfig(err.to_string())
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(err.to_string())
        } else if err.is_decode() {
            FeedError::ParseError(err.to_string())
        } else {
            FeedError::ConnectionFailed(err.to_string())
        }
    }
}

impl FeedError {
    /// Returns true if this error is transient and likely to succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FeedError::ConnectionFailed(_)
                | FeedError::Timeout(_)
                | FeedError::RateLimitExceeded
                | FeedError::NotFound(_)
        ) || matches!(self, FeedError::Http(status) if *status >= 500)
    }

    /// Returns a suggested retry delay for this error type, if applicable.
    /// Returns None for errors that should not be retried.
    pub fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            FeedError::RateLimitExceeded => Some(Duration::from_secs(60)),
            FeedError::ConnectionFailed(_) => Some(Duration::from_secs(5)),
            FeedError::Timeout(_) => Some(Duration::from_secs(2)),
            FeedError::NotFound(_) => Some(Duration::from_secs(1)),
            FeedError::Http(status) if *status >= 500 => Some(Duration::from_secs(5)),
            FeedError::Http(_)
            | FeedError::Api { .. }
            | FeedError::ParseError(_)
            | FeedError::InvalidConfig(_) => None,
        }
    }
}

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;
