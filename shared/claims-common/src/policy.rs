use serde::{Deserialize, Serialize};

/// Coverage category a policy must carry to be exposed to an external event.
pub const NATURAL_DISASTER_COVERAGE: &str = "natural disaster";

/// An insurance contract as known to the policy registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub policy_id: String,
    pub region: String,
    pub coverage: String,
    pub active: bool,
}

impl PolicyRecord {
    pub fn new(
        policy_id: impl Into<String>,
        region: impl Into<String>,
        coverage: impl Into<String>,
        active: bool,
    ) -> Self {
        Self {
            policy_id: policy_id.into(),
            region: region.into(),
            coverage: coverage.into(),
            active,
        }
    }

    /// True when this policy is exposed to `event`: same region as the event
    /// location, natural-disaster coverage, and currently active.
    pub fn is_exposed_to(&self, event: &ExternalEvent) -> bool {
        self.active && self.region == event.location && self.coverage == NATURAL_DISASTER_COVERAGE
    }
}

/// A triggering condition from an external feed (e.g. a flood in a region).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalEvent {
    pub disaster_type: String,
    pub location: String,
}

impl ExternalEvent {
    pub fn new(disaster_type: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            disaster_type: disaster_type.into(),
            location: location.into(),
        }
    }

    pub fn describe(&self) -> String {
        format!("{} in {}", self.disaster_type, self.location)
    }
}
