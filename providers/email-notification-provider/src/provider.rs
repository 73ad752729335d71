use crate::{client::ResendClient, config::EmailConfig, formatter::EmailFormatter};
use async_trait::async_trait;
use notification_common::{
    provider_base::{NotificationProvider, ProviderError},
    retry_with_backoff, DeliveryStatus, NotificationChannel, NotificationRequest, RetryConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

pub struct EmailProvider {
    client: Arc<ResendClient>,
    formatter: EmailFormatter,
    retry_config: RetryConfig,
}

impl EmailProvider {
    pub fn new(config: EmailConfig) -> Result<Self, ProviderError> {
        config.validate().map_err(|e| {
            ProviderError::InvalidConfiguration(format!("Config validation failed: {}", e))
        })?;

        let client = Arc::new(ResendClient::new(
            config.resend_api_key.clone(),
            config.base_url().to_string(),
            config.from_name.clone(),
            Duration::from_secs(config.timeout_secs),
        )?);
        let formatter = EmailFormatter::new(&config)?;

        info!(
            "📧 Email provider ready (from: {}, to: {}, max_retries: {})",
            config.from_email, config.to_email, config.max_retries
        );

        Ok(Self {
            client,
            formatter,
            retry_config: config.retry_config(),
        })
    }

    /// Replace the retry policy, e.g. to shorten delays in tests
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }
}

#[async_trait]
impl NotificationProvider for EmailProvider {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Email
    }

    #[instrument(skip(self, request), fields(notification_id = %request.notification_id))]
    async fn send_notification(
        &self,
        request: NotificationRequest,
    ) -> Result<DeliveryStatus, ProviderError> {
        let payload = self.formatter.format_message(&request)?;

        let outcome = retry_with_backoff(&self.retry_config, || {
            let client = self.client.clone();
            let payload = payload.clone();
            async move { client.send(payload).await }
        })
        .await;

        let retries = outcome.retries();
        match outcome.result {
            Ok(response) => {
                info!(
                    "Email sent successfully: {:?} ({} retries)",
                    response.message_id, retries
                );
                Ok(DeliveryStatus::delivered(
                    &request,
                    response.message_id,
                    retries,
                ))
            }
            Err(e) if e.is_retryable() => {
                error!("Email send gave up after {} attempts: {}", outcome.attempts, e);
                Err(ProviderError::RetriesExhausted {
                    attempts: outcome.attempts,
                    last_error: Box::new(e),
                })
            }
            Err(e) => {
                error!("Email send failed: {}", e);
                Err(e)
            }
        }
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        self.client.health_check().await
    }
}
