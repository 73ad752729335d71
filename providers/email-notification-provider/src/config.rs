use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use notification_common::RetryConfig;

pub const DEFAULT_RESEND_BASE_URL: &str = "https://api.resend.com";
pub const DEFAULT_FROM_NAME: &str = "Claims Insight";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
pub const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 5000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resend delivery settings. Sender and recipient are deployment secrets;
/// defaults leave them empty so `validate` catches a missing value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    #[serde(skip_serializing)]
    pub resend_api_key: String,
    pub resend_base_url: Option<String>,
    pub from_email: String,
    pub from_name: String,
    pub to_email: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: String::new(),
            resend_base_url: None,
            from_email: String::new(),
            from_name: DEFAULT_FROM_NAME.to_string(),
            to_email: String::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            max_retry_delay_ms: DEFAULT_MAX_RETRY_DELAY_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl EmailConfig {
    /// Create configuration from a flat properties map
    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let resend_api_key = props
            .get("resend_api_key")
            .or_else(|| props.get("RESEND_API_KEY"))
            .cloned()
            .ok_or_else(|| ConfigError::Message("resend_api_key is required".to_string()))?;

        Ok(Self {
            resend_api_key,
            resend_base_url: props.get("resend_base_url").cloned(),
            from_email: props.get("from_email").cloned().unwrap_or_default(),
            from_name: props
                .get("from_name")
                .cloned()
                .unwrap_or_else(|| DEFAULT_FROM_NAME.to_string()),
            to_email: props.get("to_email").cloned().unwrap_or_default(),
            max_retries: parse_property(props, "max_retries", DEFAULT_MAX_RETRIES)?,
            retry_delay_ms: parse_property(props, "retry_delay_ms", DEFAULT_RETRY_DELAY_MS)?,
            max_retry_delay_ms: parse_property(props, "max_retry_delay_ms", DEFAULT_MAX_RETRY_DELAY_MS)?,
            timeout_secs: parse_property(props, "timeout_secs", DEFAULT_TIMEOUT_SECS)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.resend_base_url
            .as_deref()
            .unwrap_or(DEFAULT_RESEND_BASE_URL)
    }

    /// Total attempts is the first send plus `max_retries`.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(
            self.max_retries + 1,
            self.retry_delay_ms,
            self.max_retry_delay_ms.max(self.retry_delay_ms),
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.resend_api_key.is_empty() {
            return Err("Resend API key is required".to_string());
        }

        if self.from_email.is_empty() {
            return Err("Sender email is required".to_string());
        }

        if !email_address::EmailAddress::is_valid(&self.from_email) {
            return Err(format!("Invalid sender email: {}", self.from_email));
        }

        if self.to_email.is_empty() {
            return Err("Recipient email is required".to_string());
        }

        if !email_address::EmailAddress::is_valid(&self.to_email) {
            return Err(format!("Invalid recipient email: {}", self.to_email));
        }

        if self.max_retries > 10 {
            return Err("Max retries should not exceed 10".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Numeric property in its target type; out-of-range values are rejected, not wrapped.
fn parse_property<T: FromStr>(
    props: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match props.get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Message(format!("{key} must be an integer, got '{raw}'"))),
        None => Ok(default),
    }
}
