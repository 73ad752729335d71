use async_trait::async_trait;
use claims_common::AdvisorRequestV1;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::prompt::render_messages;
use crate::Advisor;

pub use crate::prompt::ChatMessage;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatErrorEnvelope {
    error: ChatErrorBody,
}

#[derive(Debug, Deserialize)]
struct ChatErrorBody {
    #[serde(default)]
    message: String,
}

/// Minimal OpenAI-compatible `POST {base_url}/chat/completions` client
pub struct ChatCompletionClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatCompletionClient {
    pub fn new(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                AdvisorError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AdvisorError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach advisor: {}", e);
                if e.is_timeout() {
                    AdvisorError::Timeout
                } else {
                    AdvisorError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let body: ChatCompletionResponse = response.json().await.map_err(|e| {
                    if e.is_timeout() {
                        AdvisorError::Timeout
                    } else {
                        AdvisorError::Malformed(format!("invalid response body: {}", e))
                    }
                })?;
                let answer = body
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .filter(|content| !content.trim().is_empty())
                    .ok_or_else(|| AdvisorError::Malformed("reply has no content".to_string()))?;
                debug!("Advisor replied with {} characters", answer.chars().count());
                Ok(answer)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("Advisor authentication failed ({})", status);
                Err(AdvisorError::Authentication)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Advisor rate limit exceeded, retry after {}s", retry_after_secs);
                Err(AdvisorError::RateLimited { retry_after_secs })
            }
            StatusCode::GATEWAY_TIMEOUT => {
                warn!("Advisor upstream timed out");
                Err(AdvisorError::Timeout)
            }
            status if status.is_server_error() => {
                error!("Advisor service error: {}", status);
                Err(AdvisorError::Unavailable {
                    status: status.as_u16(),
                })
            }
            _ => {
                let raw = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ChatErrorEnvelope>(&raw)
                    .map(|e| e.error.message)
                    .unwrap_or_else(|_| format!("unexpected status {}", status));
                error!("Advisor rejected request ({}): {}", status, message);
                Err(AdvisorError::Malformed(message))
            }
        }
    }
}

/// [`Advisor`] backed by a chat-completion endpoint
pub struct ChatAdvisor {
    client: ChatCompletionClient,
    system_role: String,
    max_prompt_claims: usize,
}

impl ChatAdvisor {
    pub fn new(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        config
            .validate()
            .map_err(AdvisorError::InvalidConfiguration)?;

        info!("🧠 Advisor ready (model: {}, endpoint: {})", config.model, config.base_url);

        Ok(Self {
            client: ChatCompletionClient::new(config)?,
            system_role: config.system_role.clone(),
            max_prompt_claims: config.max_prompt_claims,
        })
    }
}

#[async_trait]
impl Advisor for ChatAdvisor {
    #[instrument(skip_all, fields(claims = request.claims.len()))]
    async fn ask(&self, request: AdvisorRequestV1) -> Result<String, AdvisorError> {
        let messages = render_messages(&request, &self.system_role, self.max_prompt_claims);
        self.client.complete(&messages).await
    }
}
