use claims_common::{AlertSet, AMOUNT_COLUMN};
use polars::prelude::{col, lit, IntoLazy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AnalysisError;
use crate::table::{frame_records, ClaimsTable};

pub const DEFAULT_ALERT_THRESHOLD: f64 = 3000.0;
pub const MIN_ALERT_THRESHOLD: f64 = 500.0;
pub const MAX_ALERT_THRESHOLD: f64 = 10_000.0;

/// Claims strictly above `threshold`, in upload order.
pub fn filter_alerts(table: &ClaimsTable, threshold: f64) -> Result<AlertSet, AnalysisError> {
    let matched = table
        .frame()
        .clone()
        .lazy()
        .filter(col(AMOUNT_COLUMN).gt(lit(threshold)))
        .collect()?;

    let total_amount = matched.column(AMOUNT_COLUMN)?.sum::<f64>()?;
    let claims = frame_records(&matched)?;

    debug!(threshold, matched = claims.len(), "Filtered threshold alerts");

    Ok(AlertSet {
        threshold,
        claims,
        total_amount,
    })
}

/// Accepted range for the alert threshold, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl Default for ThresholdRange {
    fn default() -> Self {
        Self {
            min: MIN_ALERT_THRESHOLD,
            max: MAX_ALERT_THRESHOLD,
            default: DEFAULT_ALERT_THRESHOLD,
        }
    }
}

impl ThresholdRange {
    pub fn contains(&self, threshold: f64) -> bool {
        threshold.is_finite() && threshold >= self.min && threshold <= self.max
    }

    /// Returns the threshold unchanged when in range, otherwise a message for the caller.
    pub fn validate(&self, threshold: f64) -> Result<f64, String> {
        if self.contains(threshold) {
            Ok(threshold)
        } else {
            Err(format!(
                "threshold {} is outside the allowed range {}..={}",
                threshold, self.min, self.max
            ))
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max && self.contains(self.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims_common::ClaimRecord;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn reference_table() -> ClaimsTable {
        ClaimsTable::from_records(
            "claims.csv",
            vec![
                ClaimRecord::new("C1", 1000.0, "Flood", "A"),
                ClaimRecord::new("C2", 5000.0, "Fire", "B"),
                ClaimRecord::new("C3", 2000.0, "Hail", "A"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_reference_threshold() {
        let alerts = filter_alerts(&reference_table(), 3000.0).unwrap();
        assert_eq!(alerts.claims, vec![ClaimRecord::new("C2", 5000.0, "Fire", "B")]);
        assert_eq!(alerts.total_amount, 5000.0);
        assert!(alerts.is_triggered());
    }

    #[test]
    fn test_threshold_is_strict() {
        let alerts = filter_alerts(&reference_table(), 5000.0).unwrap();
        assert!(alerts.is_empty());
        assert!(!alerts.is_triggered());
    }

    #[test]
    fn test_keeps_upload_order() {
        let alerts = filter_alerts(&reference_table(), 500.0).unwrap();
        let ids: Vec<_> = alerts.claims.iter().map(|c| c.claim_id.as_str()).collect();
        assert_eq!(ids, vec!["C1", "C2", "C3"]);
    }

    #[test]
    fn test_empty_table_has_no_alerts() {
        let alerts = filter_alerts(&ClaimsTable::empty("empty.csv"), 500.0).unwrap();
        assert!(alerts.is_empty());
        assert_eq!(alerts.total_amount, 0.0);
    }

    #[rstest]
    #[case(500.0, true)]
    #[case(10_000.0, true)]
    #[case(3000.0, true)]
    #[case(499.99, false)]
    #[case(10_000.01, false)]
    #[case(f64::NAN, false)]
    fn test_threshold_range(#[case] threshold: f64, #[case] accepted: bool) {
        assert_eq!(ThresholdRange::default().validate(threshold).is_ok(), accepted);
    }

    #[test]
    fn test_default_range_is_consistent() {
        assert!(ThresholdRange::default().is_consistent());
        let broken = ThresholdRange {
            min: 100.0,
            max: 50.0,
            default: 75.0,
        };
        assert!(!broken.is_consistent());
    }
}
