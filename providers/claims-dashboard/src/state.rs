use advisor_provider::{Advisor, ChatAdvisor};
use anyhow::{Context, Result};
use chrono::Duration;
use claims_analytics::{EventFeed, PolicyRegistry, StaticEventFeed, StaticPolicyRegistry};
use email_notification_provider::EmailProvider;
use notification_common::NotificationProvider;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{AuthProvider, ConfiguredCredentials};
use crate::config::DashboardConfig;
use crate::session::SessionStore;
use crate::templates::Templates;

/// Collaborators shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DashboardConfig>,
    pub auth: Arc<dyn AuthProvider>,
    pub sessions: SessionStore,
    pub registry: Arc<dyn PolicyRegistry>,
    pub events: Arc<dyn EventFeed>,
    pub advisor: Option<Arc<dyn Advisor>>,
    pub notifier: Option<Arc<dyn NotificationProvider>>,
    pub templates: Arc<Templates>,
}

impl AppState {
    pub fn new(
        config: DashboardConfig,
        auth: Arc<dyn AuthProvider>,
        registry: Arc<dyn PolicyRegistry>,
        events: Arc<dyn EventFeed>,
    ) -> Result<Self> {
        let templates = Templates::new().context("Failed to compile dashboard templates")?;

        Ok(Self {
            config: Arc::new(config),
            auth,
            sessions: SessionStore::new(),
            registry,
            events,
            advisor: None,
            notifier: None,
            templates: Arc::new(templates),
        })
    }

    pub fn with_advisor(mut self, advisor: Arc<dyn Advisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationProvider>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Wire the production collaborators described by `config`
    pub fn from_config(config: DashboardConfig) -> Result<Self> {
        let auth = Arc::new(ConfiguredCredentials::new(
            config.auth.username.clone(),
            config.auth.password.clone(),
            Duration::minutes(config.auth.session_ttl_minutes),
        ));

        let registry: Arc<dyn PolicyRegistry> = match &config.registry.policies_path {
            Some(path) => Arc::new(
                StaticPolicyRegistry::from_json_file(path)
                    .with_context(|| format!("Failed to load policy registry from {}", path))?,
            ),
            None => {
                info!("📋 No policy registry file configured, using the built-in sample registry");
                Arc::new(StaticPolicyRegistry::sample())
            }
        };

        let events: Arc<dyn EventFeed> = match &config.registry.event_path {
            Some(path) => Arc::new(
                StaticEventFeed::from_json_file(path)
                    .with_context(|| format!("Failed to load external event from {}", path))?,
            ),
            None => Arc::new(StaticEventFeed::sample()),
        };

        let advisor: Option<Arc<dyn Advisor>> = if config.advisor_enabled() {
            let advisor = ChatAdvisor::new(&config.advisor).context("Failed to create advisor client")?;
            info!("🤖 Advisor enabled (model: {})", config.advisor.model);
            Some(Arc::new(advisor))
        } else {
            warn!("⚠️ ADVISOR_API_KEY not set, advisor questions will be refused");
            None
        };

        let notifier: Option<Arc<dyn NotificationProvider>> = if config.email_enabled() {
            let provider =
                EmailProvider::new(config.email.clone()).context("Failed to create email provider")?;
            info!("📧 Email notifications enabled (recipient: {})", config.email.to_email);
            Some(Arc::new(provider))
        } else {
            warn!("⚠️ RESEND_API_KEY not set, email notifications will be refused");
            None
        };

        let mut state = Self::new(config, auth, registry, events)?;
        state.advisor = advisor;
        state.notifier = notifier;
        Ok(state)
    }

    pub fn default_threshold(&self) -> f64 {
        self.config.analysis.threshold.default
    }
}
