use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::ClaimMetrics;
use crate::claim::ClaimRecord;
use crate::policy::{ExternalEvent, PolicyRecord};

/// Structured question for the advisor collaborator.
///
/// The advisor provider decides how to render this into prompt text; callers
/// only supply data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorRequestV1 {
    pub schema_version: String,
    pub question: String,
    pub claims: Vec<ClaimRecord>,
    pub policies: Vec<PolicyRecord>,
    pub event: ExternalEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ClaimMetrics>,
}

impl AdvisorRequestV1 {
    pub fn new(
        question: impl Into<String>,
        claims: Vec<ClaimRecord>,
        policies: Vec<PolicyRecord>,
        event: ExternalEvent,
    ) -> Self {
        Self {
            schema_version: advisor_request_schema_version_v1(),
            question: question.into(),
            claims,
            policies,
            event,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Option<ClaimMetrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

pub fn advisor_request_schema_version_v1() -> String {
    "advisor_request_v1".to_string()
}

/// A question and the advisor's opaque reply, as shown in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
    pub answered_at: DateTime<Utc>,
}

impl QaPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            answered_at: Utc::now(),
        }
    }
}
