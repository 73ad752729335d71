use base64::{engine::general_purpose::STANDARD, Engine as _};
use handlebars::Handlebars;
use notification_common::{provider_base::ProviderError, NotificationRequest};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::config::EmailConfig;

const NOTIFICATION_TEMPLATE: &str = "notification_email";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailPayload {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text_content: String,
    pub html_content: Option<String>,
    pub attachments: Vec<EmailAttachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAttachment {
    pub filename: String,
    pub content: String, // Base64 encoded
    pub content_type: String,
}

/// Turns a channel-neutral notification into a Resend-ready payload.
pub struct EmailFormatter {
    templates: Handlebars<'static>,
    from_email: String,
    from_name: String,
    to_email: String,
}

impl EmailFormatter {
    pub fn new(config: &EmailConfig) -> Result<Self, ProviderError> {
        let mut templates = Handlebars::new();
        templates.set_strict_mode(false);
        templates
            .register_template_string(
                NOTIFICATION_TEMPLATE,
                include_str!("../templates/notification_email.hbs"),
            )
            .map_err(|e| {
                ProviderError::InvalidConfiguration(format!("Invalid email template: {}", e))
            })?;

        Ok(Self {
            templates,
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
            to_email: config.to_email.clone(),
        })
    }

    pub fn format_message(&self, request: &NotificationRequest) -> Result<EmailPayload, ProviderError> {
        let subject = match request.priority.subject_prefix() {
            Some(prefix) => format!("{} {}", prefix, request.subject),
            None => request.subject.clone(),
        };

        let attachments = request
            .attachments
            .iter()
            .map(|att| EmailAttachment {
                filename: att.filename.clone(),
                content: STANDARD.encode(&att.content),
                content_type: att.content_type.clone(),
            })
            .collect::<Vec<_>>();

        let payload = EmailPayload {
            to: self.to_email.clone(),
            from: self.from_email.clone(),
            html_content: self.render_html(&subject, request),
            subject,
            text_content: request.body.clone(),
            attachments,
        };

        self.validate_payload(&payload)?;

        Ok(payload)
    }

    /// HTML alternative of the plain-text body. Handlebars escapes every value.
    fn render_html(&self, subject: &str, request: &NotificationRequest) -> Option<String> {
        let attachment_names: Vec<&str> = request
            .attachments
            .iter()
            .map(|att| att.filename.as_str())
            .collect();
        let context = json!({
            "subject": subject,
            "body": request.body,
            "attachments": attachment_names,
            "from_name": self.from_name,
        });

        match self.templates.render(NOTIFICATION_TEMPLATE, &context) {
            Ok(html) => Some(html),
            Err(e) => {
                warn!("Failed to render HTML email, sending text only: {}", e);
                None
            }
        }
    }

    pub fn validate_payload(&self, payload: &EmailPayload) -> Result<(), ProviderError> {
        if !email_address::EmailAddress::is_valid(&payload.to) {
            return Err(ProviderError::MalformedPayload(format!(
                "Invalid email address: {}",
                payload.to
            )));
        }

        if !email_address::EmailAddress::is_valid(&payload.from) {
            return Err(ProviderError::MalformedPayload(format!(
                "Invalid email address: {}",
                payload.from
            )));
        }

        if payload.subject.trim().is_empty() {
            return Err(ProviderError::MalformedPayload(
                "Email subject cannot be empty".to_string(),
            ));
        }

        if payload.text_content.trim().is_empty() {
            return Err(ProviderError::MalformedPayload(
                "Email body cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
