use thiserror::Error;

/// Failures talking to the chat-completion service
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("advisor request timed out")]
    Timeout,

    #[error("advisor rejected the API key")]
    Authentication,

    #[error("advisor rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("advisor service unavailable (status {status})")]
    Unavailable { status: u16 },

    #[error("malformed advisor exchange: {0}")]
    Malformed(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid advisor configuration: {0}")]
    InvalidConfiguration(String),
}

impl AdvisorError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AdvisorError::Timeout)
    }

    /// Stable short code for API responses and logs
    pub fn kind(&self) -> &'static str {
        match self {
            AdvisorError::Timeout => "timeout",
            AdvisorError::Authentication => "auth",
            AdvisorError::RateLimited { .. } => "rate_limit",
            AdvisorError::Unavailable { .. } => "unavailable",
            AdvisorError::Malformed(_) => "malformed",
            AdvisorError::Network(_) => "network",
            AdvisorError::InvalidConfiguration(_) => "configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(AdvisorError::Timeout.kind(), "timeout");
        assert!(AdvisorError::Timeout.is_timeout());
        assert_eq!(AdvisorError::RateLimited { retry_after_secs: 3 }.kind(), "rate_limit");
        assert!(!AdvisorError::Authentication.is_timeout());
    }
}
