use claims_common::{ClaimMetrics, RegionTotal, AMOUNT_COLUMN, REGION_COLUMN};
use polars::prelude::{col, DataType, IntoLazy};
use tracing::debug;

use crate::error::AnalysisError;
use crate::table::ClaimsTable;

const REGION_TOTAL_ALIAS: &str = "total_amount";
const REGION_COUNT_ALIAS: &str = "claim_count";

/// Summary statistics for a claims table.
///
/// An empty table has no mean, max or min, so it fails with
/// [`AnalysisError::InsufficientData`] instead of reporting zeros.
pub fn compute_metrics(table: &ClaimsTable) -> Result<ClaimMetrics, AnalysisError> {
    if table.is_empty() {
        return Err(AnalysisError::insufficient("metrics"));
    }

    let amounts = table.frame().column(AMOUNT_COLUMN)?;
    let total_amount = amounts.sum::<f64>()?;
    let average_amount = amounts.mean().ok_or_else(|| AnalysisError::insufficient("metrics"))?;
    let max_amount = amounts
        .max::<f64>()?
        .ok_or_else(|| AnalysisError::insufficient("metrics"))?;
    let min_amount = amounts
        .min::<f64>()?
        .ok_or_else(|| AnalysisError::insufficient("metrics"))?;

    let claim_count = table.len();
    let top_region = top_region(&region_totals(table)?)
        .map(|r| r.region.clone())
        .unwrap_or_default();

    debug!(claim_count, total_amount, %top_region, "Computed claim metrics");

    Ok(ClaimMetrics {
        claim_count,
        total_amount,
        average_amount,
        max_amount,
        min_amount,
        top_region,
    })
}

/// Per-region sums in the order each region first appears.
pub fn region_totals(table: &ClaimsTable) -> Result<Vec<RegionTotal>, AnalysisError> {
    let grouped = table
        .frame()
        .clone()
        .lazy()
        .group_by_stable([col(REGION_COLUMN)])
        .agg([
            col(AMOUNT_COLUMN).sum().alias(REGION_TOTAL_ALIAS),
            col(AMOUNT_COLUMN).count().alias(REGION_COUNT_ALIAS),
        ])
        .collect()?;

    let regions = grouped.column(REGION_COLUMN)?.str()?;
    let totals = grouped.column(REGION_TOTAL_ALIAS)?.f64()?;
    let counts = grouped.column(REGION_COUNT_ALIAS)?.cast(&DataType::UInt64)?;
    let counts = counts.u64()?;

    Ok(regions
        .into_iter()
        .zip(totals)
        .zip(counts)
        .filter_map(|((region, total), count)| {
            Some(RegionTotal {
                region: region?.to_string(),
                total_amount: total.unwrap_or_default(),
                claim_count: count.unwrap_or_default() as usize,
            })
        })
        .collect())
}

/// Highest total wins; on a tie the earlier region is kept.
pub fn top_region(totals: &[RegionTotal]) -> Option<&RegionTotal> {
    totals.iter().fold(None, |best: Option<&RegionTotal>, candidate| match best {
        Some(current) if candidate.total_amount <= current.total_amount => Some(current),
        _ => Some(candidate),
    })
}

/// Global mean claim amount, `None` for an empty table.
pub fn average_amount(table: &ClaimsTable) -> Result<Option<f64>, AnalysisError> {
    Ok(table.frame().column(AMOUNT_COLUMN)?.mean())
}
