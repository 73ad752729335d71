use serde::{Deserialize, Serialize};

/// Delivery channels a provider can handle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
}

impl NotificationChannel {
    /// Get channel name as lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Email => "email",
        }
    }
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification priority levels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Critical,
    High,
    Normal,
    Low,
}

impl NotificationPriority {
    /// Subject prefix used by text channels, if any
    pub fn subject_prefix(&self) -> Option<&'static str> {
        match self {
            NotificationPriority::Critical => Some("[CRITICAL]"),
            NotificationPriority::High => Some("[HIGH]"),
            _ => None,
        }
    }
}

impl Default for NotificationPriority {
    fn default() -> Self {
        NotificationPriority::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_serializes_lowercase() {
        let value = serde_json::to_value(NotificationChannel::Email).unwrap();
        assert_eq!(value, serde_json::json!("email"));
        assert_eq!(NotificationChannel::Email.to_string(), "email");
    }

    #[test]
    fn test_subject_prefix() {
        assert_eq!(
            NotificationPriority::Critical.subject_prefix(),
            Some("[CRITICAL]")
        );
        assert_eq!(NotificationPriority::High.subject_prefix(), Some("[HIGH]"));
        assert_eq!(NotificationPriority::Normal.subject_prefix(), None);
    }
}
