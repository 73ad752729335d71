//! Thin client for the Resend `/emails` endpoint.
//!
//! Every non-success status is classified into a [`ProviderError`] so the
//! provider can decide whether another attempt makes sense.

use crate::formatter::EmailPayload;
use notification_common::provider_base::ProviderError;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Wait applied when a 429 carries no usable `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: i64 = 60;

/// Accepted-delivery receipt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    pub message_id: Option<String>,
    pub status_code: u16,
}

#[derive(Debug, Deserialize)]
struct AcceptedBody {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RejectedBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct OutgoingEmail {
    from: String,
    to: Vec<String>,
    subject: String,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<OutgoingAttachment>,
}

#[derive(Debug, Serialize)]
struct OutgoingAttachment {
    filename: String,
    content: String,
}

impl OutgoingEmail {
    fn new(from_name: &str, payload: EmailPayload) -> Self {
        Self {
            from: format!("{} <{}>", from_name, payload.from),
            to: vec![payload.to],
            subject: payload.subject,
            text: payload.text_content,
            html: payload.html_content,
            attachments: payload
                .attachments
                .into_iter()
                .map(|a| OutgoingAttachment {
                    filename: a.filename,
                    content: a.content,
                })
                .collect(),
        }
    }
}

pub struct ResendClient {
    http: Client,
    api_key: String,
    base_url: String,
    from_name: String,
}

impl ResendClient {
    pub fn new(
        api_key: String,
        base_url: String,
        from_name: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::InvalidConfiguration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            from_name,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// One delivery attempt. Retrying is the caller's business.
    pub async fn send(&self, payload: EmailPayload) -> Result<SendReceipt, ProviderError> {
        let email = OutgoingEmail::new(&self.from_name, payload);

        let response = self
            .http
            .post(self.endpoint("emails"))
            .bearer_auth(&self.api_key)
            .json(&email)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            let accepted: AcceptedBody = response.json().await.map_err(|e| {
                ProviderError::ExternalServiceError(format!("unreadable Resend reply: {}", e))
            })?;
            debug!(status = status.as_u16(), message_id = ?accepted.id, "Resend accepted email");
            return Ok(SendReceipt {
                message_id: accepted.id,
                status_code: status.as_u16(),
            });
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok());
        let body = response.text().await.unwrap_or_default();

        let err = classify_rejection(status, retry_after, &body);
        if err.is_retryable() {
            warn!(status = status.as_u16(), "Resend refused email, may retry: {}", err);
        } else {
            error!(status = status.as_u16(), "Resend refused email: {}", err);
        }
        Err(err)
    }

    /// True when the key is accepted. Resend has no ping route, listing domains stands in.
    pub async fn health_check(&self) -> Result<bool, ProviderError> {
        let response = self
            .http
            .get(self.endpoint("domains"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        Ok(response.status() == StatusCode::OK)
    }
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        warn!("Resend request timed out");
        ProviderError::NetworkTimeout
    } else {
        warn!("Resend request failed: {}", err);
        ProviderError::NetworkError(err.to_string())
    }
}

/// Map a non-2xx reply onto the provider error taxonomy
fn classify_rejection(status: StatusCode, retry_after: Option<i64>, body: &str) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED => ProviderError::InvalidAuthentication,
        StatusCode::FORBIDDEN => ProviderError::ExternalServiceError(
            "sender domain not verified or key lacks permission".to_string(),
        ),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded {
            retry_after: chrono::Duration::seconds(retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS)),
        },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            let message = serde_json::from_str::<RejectedBody>(body)
                .ok()
                .map(|b| b.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "email rejected as invalid".to_string());
            ProviderError::MalformedPayload(message)
        }
        s if s.is_server_error() => ProviderError::ServiceUnavailable,
        s => ProviderError::ExternalServiceError(format!("unexpected Resend status {}", s)),
    }
}
