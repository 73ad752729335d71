use claims_common::{AlertSet, ClaimMetrics, ExposureEstimate, ExternalEvent, PolicyRecord, RegionTotal};
use serde::Serialize;
use tracing::instrument;

use crate::alerts::filter_alerts;
use crate::error::AnalysisError;
use crate::exposure::estimate_exposure;
use crate::metrics::{compute_metrics, region_totals};
use crate::table::ClaimsTable;

/// Every derived view of one claims table, computed in pipeline order
/// (metrics, alerts, exposure).
///
/// Used by the report and notification paths, which need the whole picture
/// even when the table is empty; `metrics` is then `None` and the reason
/// is recorded in `warnings`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSnapshot {
    pub source_name: String,
    pub claim_count: usize,
    pub metrics: Option<ClaimMetrics>,
    pub region_totals: Vec<RegionTotal>,
    pub alerts: AlertSet,
    pub exposure: ExposureEstimate,
    pub warnings: Vec<String>,
}

impl AnalysisSnapshot {
    #[instrument(skip_all, fields(source = table.source_name(), rows = table.len(), threshold = threshold))]
    pub fn compute(
        table: &ClaimsTable,
        threshold: f64,
        policies: &[PolicyRecord],
        event: &ExternalEvent,
    ) -> Result<Self, AnalysisError> {
        let mut warnings = Vec::new();
        let metrics = match compute_metrics(table) {
            Ok(metrics) => Some(metrics),
            Err(err @ AnalysisError::InsufficientData { .. }) => {
                warnings.push(err.to_string());
                None
            }
            Err(err) => return Err(err),
        };
        let exposure = estimate_exposure(policies, event, table)?;
        if !exposure.is_defined() {
            warnings.push("exposure is undefined: no claims loaded".to_string());
        }

        Ok(Self {
            source_name: table.source_name().to_string(),
            claim_count: table.len(),
            metrics,
            region_totals: region_totals(table)?,
            alerts: filter_alerts(table, threshold)?,
            exposure,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims_common::ClaimRecord;
    use pretty_assertions::assert_eq;

    use crate::registry::{EventFeed, PolicyRegistry, StaticEventFeed, StaticPolicyRegistry};

    #[test]
    fn test_snapshot_of_reference_table() {
        let table = ClaimsTable::from_records(
            "claims.csv",
            vec![
                ClaimRecord::new("C1", 1000.0, "Flood", "Attica"),
                ClaimRecord::new("C2", 5000.0, "Fire", "Crete"),
                ClaimRecord::new("C3", 2000.0, "Hail", "Attica"),
            ],
        )
        .unwrap();

        let snapshot = AnalysisSnapshot::compute(
            &table,
            3000.0,
            &StaticPolicyRegistry::sample().policies(),
            &StaticEventFeed::sample().current_event(),
        )
        .unwrap();

        assert_eq!(snapshot.claim_count, 3);
        assert_eq!(snapshot.metrics.as_ref().map(|m| m.total_amount), Some(8000.0));
        assert_eq!(snapshot.alerts.len(), 1);
        assert_eq!(snapshot.region_totals.len(), 2);
        assert_eq!(snapshot.exposure.matching_policies, 2);
        assert!(snapshot.warnings.is_empty());
    }

    #[test]
    fn test_snapshot_of_empty_table_warns() {
        let snapshot = AnalysisSnapshot::compute(
            &ClaimsTable::empty("empty.csv"),
            3000.0,
            &StaticPolicyRegistry::sample().policies(),
            &StaticEventFeed::sample().current_event(),
        )
        .unwrap();

        assert_eq!(snapshot.metrics, None);
        assert!(!snapshot.exposure.is_defined());
        assert_eq!(snapshot.warnings.len(), 2);
    }
}
