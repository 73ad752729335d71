use async_trait::async_trait;
use chrono::Duration;
use thiserror::Error;

use crate::payloads::{DeliveryStatus, NotificationRequest};
use crate::types::NotificationChannel;

/// Base trait that all notification providers must implement
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    /// Get the channel this provider handles
    fn channel(&self) -> NotificationChannel;

    /// Send a notification through this provider.
    ///
    /// Best effort: the caller learns whether delivery succeeded, and how many
    /// attempts were spent, but nothing is queued for later.
    async fn send_notification(
        &self,
        request: NotificationRequest,
    ) -> Result<DeliveryStatus, ProviderError>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool, ProviderError>;
}

/// Provider error types
#[derive(Debug, Error)]
pub enum ProviderError {
    // Retryable errors
    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimitExceeded { retry_after: Duration },

    #[error("Network timeout")]
    NetworkTimeout,

    #[error("Service unavailable")]
    ServiceUnavailable,

    #[error("Temporary failure: {message}")]
    TemporaryFailure { message: String },

    // Non-retryable errors
    #[error("Invalid API key or authentication")]
    InvalidAuthentication,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Permanent failure: {message}")]
    PermanentFailure { message: String },

    #[error("Delivery failed after {attempts} attempt(s): {last_error}")]
    RetriesExhausted {
        attempts: u32,
        last_error: Box<ProviderError>,
    },

    // System errors
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

impl ProviderError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimitExceeded { .. }
                | ProviderError::NetworkTimeout
                | ProviderError::ServiceUnavailable
                | ProviderError::TemporaryFailure { .. }
        )
    }

    /// Get retry delay if the service asked for one
    pub fn retry_delay(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimitExceeded { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// The innermost error, looking through retry exhaustion
    pub fn root_cause(&self) -> &ProviderError {
        match self {
            ProviderError::RetriesExhausted { last_error, .. } => last_error.root_cause(),
            other => other,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.root_cause(), ProviderError::NetworkTimeout)
    }
}
