use claims_common::{ExposureEstimate, ExternalEvent, PolicyRecord};
use tracing::debug;

use crate::error::AnalysisError;
use crate::metrics::average_amount;
use crate::table::ClaimsTable;

/// Exposure of `policies` to `event`: matching policy count times the global
/// mean claim of `table`.
///
/// With no claims loaded the mean is undefined, so `average_claim` and
/// `estimated_exposure` are `None` even when policies match.
pub fn estimate_exposure(
    policies: &[PolicyRecord],
    event: &ExternalEvent,
    table: &ClaimsTable,
) -> Result<ExposureEstimate, AnalysisError> {
    let matching_policy_ids: Vec<String> = policies
        .iter()
        .filter(|policy| policy.is_exposed_to(event))
        .map(|policy| policy.policy_id.clone())
        .collect();
    let matching_policies = matching_policy_ids.len();

    let average_claim = average_amount(table)?;
    let estimated_exposure = average_claim.map(|avg| matching_policies as f64 * avg);

    debug!(
        event = %event.describe(),
        matching_policies,
        ?estimated_exposure,
        "Estimated exposure"
    );

    Ok(ExposureEstimate {
        event: event.clone(),
        matching_policies,
        matching_policy_ids,
        average_claim,
        estimated_exposure,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims_common::{ClaimRecord, NATURAL_DISASTER_COVERAGE};
    use pretty_assertions::assert_eq;

    fn policies() -> Vec<PolicyRecord> {
        vec![
            PolicyRecord::new("P-1", "Attica", NATURAL_DISASTER_COVERAGE, true),
            PolicyRecord::new("P-2", "Attica", NATURAL_DISASTER_COVERAGE, false),
            PolicyRecord::new("P-3", "Attica", "collision", true),
            PolicyRecord::new("P-4", "Crete", NATURAL_DISASTER_COVERAGE, true),
            PolicyRecord::new("P-5", "Attica", NATURAL_DISASTER_COVERAGE, true),
        ]
    }

    #[test]
    fn test_counts_only_fully_matching_policies() {
        let table = ClaimsTable::from_records(
            "claims.csv",
            vec![
                ClaimRecord::new("C1", 1000.0, "Flood", "Attica"),
                ClaimRecord::new("C2", 3000.0, "Flood", "Crete"),
            ],
        )
        .unwrap();

        let estimate = estimate_exposure(&policies(), &ExternalEvent::new("Flood", "Attica"), &table).unwrap();

        assert_eq!(estimate.matching_policies, 2);
        assert_eq!(estimate.matching_policy_ids, vec!["P-1", "P-5"]);
        assert_eq!(estimate.average_claim, Some(2000.0));
        assert_eq!(estimate.estimated_exposure, Some(4000.0));
    }

    #[test]
    fn test_empty_table_leaves_exposure_undefined() {
        let estimate = estimate_exposure(
            &policies(),
            &ExternalEvent::new("Flood", "Attica"),
            &ClaimsTable::empty("empty.csv"),
        )
        .unwrap();

        assert_eq!(estimate.matching_policies, 2);
        assert_eq!(estimate.average_claim, None);
        assert_eq!(estimate.estimated_exposure, None);
        assert!(!estimate.is_defined());
    }

    #[test]
    fn test_no_matches_is_zero_exposure() {
        let table = ClaimsTable::from_records(
            "claims.csv",
            vec![ClaimRecord::new("C1", 1000.0, "Flood", "Attica")],
        )
        .unwrap();

        let estimate = estimate_exposure(&policies(), &ExternalEvent::new("Flood", "Rhodes"), &table).unwrap();
        assert_eq!(estimate.matching_policies, 0);
        assert_eq!(estimate.estimated_exposure, Some(0.0));
    }
}
