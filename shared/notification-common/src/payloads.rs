//! Notification payload structures
//!
//! A notification is a subject plus a plain-text body, optionally carrying
//! binary attachments such as an exported report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{NotificationChannel, NotificationPriority};

/// Notification request handed to a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub notification_id: Uuid,
    pub channel: NotificationChannel,
    pub priority: NotificationPriority,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub attachments: Vec<NotificationAttachment>,
    pub timestamp: DateTime<Utc>,
}

impl NotificationRequest {
    pub fn new(
        channel: NotificationChannel,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            notification_id: Uuid::new_v4(),
            channel,
            priority: NotificationPriority::default(),
            subject: subject.into(),
            body: body.into(),
            attachments: vec![],
            timestamp: Utc::now(),
        }
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_attachment(mut self, attachment: NotificationAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Raw attachment bytes; channels encode them as they need
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationAttachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// Status of a notification delivery attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatus {
    pub notification_id: Uuid,
    pub channel: NotificationChannel,
    pub delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub provider_message_id: Option<String>,
    /// Attempts made beyond the first one
    pub retry_count: u32,
}

impl DeliveryStatus {
    pub fn delivered(
        request: &NotificationRequest,
        provider_message_id: Option<String>,
        retry_count: u32,
    ) -> Self {
        Self {
            notification_id: request.notification_id,
            channel: request.channel,
            delivered: true,
            delivered_at: Some(Utc::now()),
            error_message: None,
            provider_message_id,
            retry_count,
        }
    }
}
