//! Retry policy and error classification for registry and download requests.

use std::time::Duration;

use reqwest::StatusCode;

/// Errors that will not succeed on a later attempt.
#[derive(Debug, thiserror::Error)]
pub enum NonRetryableError {
    /// HTTP 429 from the registry
    #[error("Rate limit exceeded: {0}. Wait a minute before retrying.")]
    RateLimitExceeded(String),
    /// HTTP 401
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    /// HTTP 404
    #[error("Not found: {0}")]
    NotFound(String),
    /// HTTP 403
    #[error("Access forbidden: {0}")]
    Forbidden(String),
    /// Any other 4xx
    #[error("Request error: {0}")]
    ClientError(String),
}

/// How many times, and how far apart, a request is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no delay.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

/// Classifies an error as retryable or non-retryable.
/// Returns Ok(()) if the error is retryable.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    let Some(status) = error.status() else {
        // Connection errors, timeouts, etc.
        return Ok(());
    };

    match status {
        StatusCode::UNAUTHORIZED => Err(NonRetryableError::AuthenticationFailed(
            "the registry rejected the request credentials".to_string(),
        )),
        StatusCode::FORBIDDEN => Err(NonRetryableError::Forbidden(
            "the registry refused access to this resource".to_string(),
        )),
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimitExceeded(
            "too many requests".to_string(),
        )),
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound(
            error
                .url()
                .map(|u| u.path().to_string())
                .unwrap_or_else(|| "the requested resource".to_string()),
        )),
        s if s.is_client_error() => Err(NonRetryableError::ClientError(format!(
            "HTTP {}",
            s.as_u16()
        ))),
        // 5xx
        _ => Ok(()),
    }
}

/// Maps an error from `error_for_status()` to either the original error
/// (retryable) or a [`NonRetryableError`].
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}
