use serde::{Deserialize, Serialize};

use crate::claim::ClaimRecord;
use crate::policy::ExternalEvent;

/// Aggregate statistics over a non-empty claims table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimMetrics {
    pub claim_count: usize,
    pub total_amount: f64,
    pub average_amount: f64,
    pub max_amount: f64,
    pub min_amount: f64,
    /// Region with the highest summed amount; ties resolve to the region seen first.
    pub top_region: String,
}

/// Summed claim amount for one region, used as a bar-chart series point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionTotal {
    pub region: String,
    pub total_amount: f64,
    pub claim_count: usize,
}

/// Claims whose amount is strictly above `threshold`, in upload order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSet {
    pub threshold: f64,
    pub claims: Vec<ClaimRecord>,
    pub total_amount: f64,
}

impl AlertSet {
    /// An empty set means "no alert", not a failure.
    pub fn is_triggered(&self) -> bool {
        !self.claims.is_empty()
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

/// Financial exposure of the registry to one external event.
///
/// `average_claim` and `estimated_exposure` are `None` (JSON `null`) when no
/// claims are loaded: the exposure is undefined, not zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureEstimate {
    pub event: ExternalEvent,
    pub matching_policies: usize,
    pub matching_policy_ids: Vec<String>,
    pub average_claim: Option<f64>,
    pub estimated_exposure: Option<f64>,
}

impl ExposureEstimate {
    pub fn is_defined(&self) -> bool {
        self.estimated_exposure.is_some()
    }
}
