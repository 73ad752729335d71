use std::collections::HashSet;

use chrono::{DateTime, Utc};
use claims_common::{ClaimRecord, AMOUNT_COLUMN, CLAIM_ID_COLUMN, DAMAGE_TYPE_COLUMN, REGION_COLUMN};
use polars::prelude::{
    DataFrame, DataType, Field, NamedFrom, PolarsError, PolarsResult, Schema, Series,
};
use serde::Serialize;

use crate::error::UnreadableFile;

/// Claims loaded from one upload, in file order.
///
/// Immutable once built: every record has a non-negative amount and a claim id
/// unique within the table. The records are mirrored into a Polars frame with
/// the four required columns, which the aggregations query.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimsTable {
    source_name: String,
    loaded_at: DateTime<Utc>,
    records: Vec<ClaimRecord>,
    #[serde(skip)]
    frame: DataFrame,
}

impl ClaimsTable {
    /// Validate `records` and wrap them. Row numbers in errors are 1-based data rows.
    pub fn from_records(
        source_name: impl Into<String>,
        records: Vec<ClaimRecord>,
    ) -> Result<Self, UnreadableFile> {
        validate_records(&records)?;
        let frame = claims_frame(&records).map_err(|e| UnreadableFile::Parse {
            format: "table",
            message: e.to_string(),
        })?;

        Ok(Self {
            source_name: source_name.into(),
            loaded_at: Utc::now(),
            records,
            frame,
        })
    }

    pub fn empty(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            loaded_at: Utc::now(),
            records: Vec::new(),
            frame: DataFrame::from(&claims_schema()),
        }
    }

    pub fn records(&self) -> &[ClaimRecord] {
        &self.records
    }

    /// Columns `Claim_ID`, `Amount_EUR` (f64), `Damage_Type` and `Region`, one row per record.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClaimRecord> {
        self.records.iter()
    }
}

// The frame is derived from the records.
impl PartialEq for ClaimsTable {
    fn eq(&self, other: &Self) -> bool {
        self.source_name == other.source_name
            && self.loaded_at == other.loaded_at
            && self.records == other.records
    }
}

fn claims_schema() -> Schema {
    Schema::from_iter([
        Field::new(CLAIM_ID_COLUMN, DataType::String),
        Field::new(AMOUNT_COLUMN, DataType::Float64),
        Field::new(DAMAGE_TYPE_COLUMN, DataType::String),
        Field::new(REGION_COLUMN, DataType::String),
    ])
}

fn claims_frame(records: &[ClaimRecord]) -> PolarsResult<DataFrame> {
    let ids: Vec<&str> = records.iter().map(|r| r.claim_id.as_str()).collect();
    let amounts: Vec<f64> = records.iter().map(|r| r.amount_eur).collect();
    let damage_types: Vec<&str> = records.iter().map(|r| r.damage_type.as_str()).collect();
    let regions: Vec<&str> = records.iter().map(|r| r.region.as_str()).collect();

    DataFrame::new(vec![
        Series::new(CLAIM_ID_COLUMN, ids),
        Series::new(AMOUNT_COLUMN, amounts),
        Series::new(DAMAGE_TYPE_COLUMN, damage_types),
        Series::new(REGION_COLUMN, regions),
    ])
}

/// Rebuild records from a frame with the claims schema, e.g. a filtered view of [`ClaimsTable::frame`].
pub(crate) fn frame_records(df: &DataFrame) -> PolarsResult<Vec<ClaimRecord>> {
    let ids = df.column(CLAIM_ID_COLUMN)?.str()?;
    let amounts = df.column(AMOUNT_COLUMN)?.f64()?;
    let damage_types = df.column(DAMAGE_TYPE_COLUMN)?.str()?;
    let regions = df.column(REGION_COLUMN)?.str()?;

    ids.into_iter()
        .zip(amounts)
        .zip(damage_types)
        .zip(regions)
        .map(|(((id, amount), damage_type), region)| match (id, amount, damage_type, region) {
            (Some(id), Some(amount), Some(damage_type), Some(region)) => {
                Ok(ClaimRecord::new(id, amount, damage_type, region))
            }
            _ => Err(PolarsError::ComputeError("null cell in claims frame".into())),
        })
        .collect()
}

fn validate_records(records: &[ClaimRecord]) -> Result<(), UnreadableFile> {
    let mut seen = HashSet::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        let row = idx + 1;
        if record.claim_id.trim().is_empty() {
            return Err(UnreadableFile::InvalidCell {
                row,
                column: CLAIM_ID_COLUMN,
                reason: "is empty".to_string(),
            });
        }
        if !record.amount_eur.is_finite() || record.amount_eur < 0.0 {
            return Err(UnreadableFile::InvalidCell {
                row,
                column: AMOUNT_COLUMN,
                reason: format!("must be a non-negative number (got {})", record.amount_eur),
            });
        }
        if !seen.insert(record.claim_id.as_str()) {
            return Err(UnreadableFile::DuplicateClaimId {
                row,
                claim_id: record.claim_id.clone(),
            });
        }
    }
    Ok(())
}

impl<'a> IntoIterator for &'a ClaimsTable {
    type Item = &'a ClaimRecord;
    type IntoIter = std::slice::Iter<'a, ClaimRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
