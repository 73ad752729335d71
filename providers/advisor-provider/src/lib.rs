//! Advisor collaborator: renders a structured claims question into chat
//! messages and relays the model's reply as opaque text.

pub mod client;
pub mod config;
pub mod error;
pub mod prompt;

use async_trait::async_trait;
use claims_common::AdvisorRequestV1;
#[cfg(test)]
use mockall::automock;

pub use client::{ChatAdvisor, ChatCompletionClient, ChatMessage};
pub use config::AdvisorConfig;
pub use error::AdvisorError;

/// Answers free-form questions about the loaded claims.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn ask(&self, request: AdvisorRequestV1) -> Result<String, AdvisorError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims_common::ExternalEvent;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_advisor_is_usable_as_trait_object() {
        let mut mock = MockAdvisor::new();
        mock.expect_ask()
            .withf(|request| request.question == "Which region costs most?")
            .times(1)
            .returning(|_| Ok("Attica".to_string()));

        let advisor: Arc<dyn Advisor> = Arc::new(mock);
        let request = AdvisorRequestV1::new(
            "Which region costs most?",
            vec![],
            vec![],
            ExternalEvent::new("Flood", "Attica"),
        );

        assert_eq!(advisor.ask(request).await.unwrap(), "Attica");
    }
}
