//! Policy registry and external event feed collaborators.
//!
//! The dashboard only sees the traits. The static defaults carry a small fixed
//! registry and one event; both can be replaced by JSON files at deploy time.

use std::fs;
use std::path::Path;

use claims_common::{ExternalEvent, PolicyRecord, NATURAL_DISASTER_COVERAGE};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

/// Source of the policies checked for exposure.
pub trait PolicyRegistry: Send + Sync {
    fn policies(&self) -> Vec<PolicyRecord>;
}

/// Source of the external event exposure is estimated against.
pub trait EventFeed: Send + Sync {
    fn current_event(&self) -> ExternalEvent;
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticPolicyRegistry {
    policies: Vec<PolicyRecord>,
}

impl StaticPolicyRegistry {
    pub fn new(policies: Vec<PolicyRecord>) -> Self {
        Self { policies }
    }

    /// Built-in registry used when no registry file is configured.
    pub fn sample() -> Self {
        Self::new(vec![
            PolicyRecord::new("P-1001", "Attica", NATURAL_DISASTER_COVERAGE, true),
            PolicyRecord::new("P-1002", "Attica", "collision", true),
            PolicyRecord::new("P-1003", "Crete", NATURAL_DISASTER_COVERAGE, true),
            PolicyRecord::new("P-1004", "Attica", NATURAL_DISASTER_COVERAGE, false),
            PolicyRecord::new("P-1005", "Attica", NATURAL_DISASTER_COVERAGE, true),
            PolicyRecord::new("P-1006", "Central Macedonia", "theft", true),
        ])
    }

    /// Load a JSON array of policy records.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let policies: Vec<PolicyRecord> = read_json(path.as_ref())?;
        if let Some(blank) = policies.iter().position(|p| p.policy_id.trim().is_empty()) {
            return Err(RegistryError::Invalid(format!(
                "policy at index {blank} has an empty policy_id"
            )));
        }
        info!(count = policies.len(), path = %path.as_ref().display(), "Loaded policy registry");
        Ok(Self::new(policies))
    }
}

impl PolicyRegistry for StaticPolicyRegistry {
    fn policies(&self) -> Vec<PolicyRecord> {
        self.policies.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticEventFeed {
    event: ExternalEvent,
}

impl StaticEventFeed {
    pub fn new(event: ExternalEvent) -> Self {
        Self { event }
    }

    pub fn sample() -> Self {
        Self::new(ExternalEvent::new("Flood", "Attica"))
    }

    /// Load a single JSON event object.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let event: ExternalEvent = read_json(path.as_ref())?;
        info!(event = %event.describe(), "Loaded external event");
        Ok(Self::new(event))
    }
}

impl EventFeed for StaticEventFeed {
    fn current_event(&self) -> ExternalEvent {
        self.event.clone()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, RegistryError> {
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| RegistryError::Json {
        path: display,
        source,
    })
}
