use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use claims_common::{
    ClaimRecord, AMOUNT_COLUMN, CLAIM_ID_COLUMN, DAMAGE_TYPE_COLUMN, REGION_COLUMN,
    REQUIRED_COLUMNS,
};
use polars::prelude::{CsvReader, DataFrame, DataType, NamedFrom, SerReader, Series};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{AnalysisError, UnreadableFile};
use crate::table::ClaimsTable;

/// Declared format of an uploaded claims file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    Csv,
    /// Any workbook calamine can open: xlsx, xlsm, xlsb, xls, ods
    Spreadsheet,
}

impl DatasetFormat {
    /// Infer the format from a file name's extension.
    pub fn from_filename(name: &str) -> Result<Self, UnreadableFile> {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        extension.parse()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetFormat::Csv => "csv",
            DatasetFormat::Spreadsheet => "spreadsheet",
        }
    }
}

impl FromStr for DatasetFormat {
    type Err = UnreadableFile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(DatasetFormat::Csv),
            "spreadsheet" | "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => {
                Ok(DatasetFormat::Spreadsheet)
            }
            other => Err(UnreadableFile::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadLimits {
    pub max_file_bytes: usize,
    pub max_rows: usize,
    pub max_columns: usize,
}

impl Default for LoadLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 25 * 1024 * 1024,
            max_rows: 100_000,
            max_columns: 256,
        }
    }
}

/// Parse an uploaded claims file into a validated [`ClaimsTable`].
///
/// A file with a header row and no data rows yields an empty table; columns
/// other than the four required ones are ignored.
#[instrument(skip(bytes, limits), fields(bytes = bytes.len(), format = format.as_str()))]
pub fn load_claims(
    source_name: &str,
    bytes: &[u8],
    format: DatasetFormat,
    limits: &LoadLimits,
) -> Result<ClaimsTable, AnalysisError> {
    if bytes.len() > limits.max_file_bytes {
        return Err(UnreadableFile::TooLarge(format!(
            "{} bytes (max {})",
            bytes.len(),
            limits.max_file_bytes
        ))
        .into());
    }

    let df = match format {
        DatasetFormat::Csv => read_csv_frame(bytes)?,
        DatasetFormat::Spreadsheet => read_workbook_frame(bytes)?,
    };
    debug!(rows = df.height(), columns = df.width(), "Decoded claims frame");

    validate_shape(&df, limits)?;
    let records = frame_to_records(&df)?;
    let table = ClaimsTable::from_records(source_name, records)?;

    info!(rows = table.len(), source = source_name, "Loaded claims table");
    Ok(table)
}

/// Every CSV column is read as text so ids and regions keep their spelling
/// (`007`, `01`); only the amount column is cast to numbers afterwards.
fn read_csv_frame(bytes: &[u8]) -> Result<DataFrame, UnreadableFile> {
    CsvReader::new(Cursor::new(bytes))
        .has_header(true)
        .infer_schema(Some(0))
        .finish()
        .map_err(|e| UnreadableFile::Parse {
            format: "csv",
            message: e.to_string(),
        })
}

fn read_workbook_frame(bytes: &[u8]) -> Result<DataFrame, UnreadableFile> {
    let parse_error = |message: String| UnreadableFile::Parse {
        format: "spreadsheet",
        message,
    };

    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|e| parse_error(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(UnreadableFile::EmptyWorkbook)?
        .map_err(|e| parse_error(e.to_string()))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };

    let names: Vec<String> = header
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();
    let mut columns: Vec<Vec<Data>> = vec![Vec::new(); names.len()];

    for row in rows {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        for (idx, column) in columns.iter_mut().enumerate() {
            column.push(row.get(idx).cloned().unwrap_or(Data::Empty));
        }
    }

    let series: Vec<Series> = names
        .iter()
        .zip(columns.iter())
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, cells)| cells_to_series(name, cells))
        .collect();

    DataFrame::new(series).map_err(|e| parse_error(e.to_string()))
}

/// Pick the narrowest column type that holds every cell: integers (so numeric
/// ids stay `17`, not `17.0`), then floats, then text.
fn cells_to_series(name: &str, cells: &[Data]) -> Series {
    let numeric = cells
        .iter()
        .all(|cell| matches!(cell, Data::Int(_) | Data::Float(_) | Data::Empty));

    if numeric {
        let integral = cells.iter().all(|cell| match cell {
            Data::Float(f) => f.fract() == 0.0 && f.abs() < i64::MAX as f64,
            _ => true,
        });
        if integral {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(i) => Some(*i),
                    Data::Float(f) => Some(*f as i64),
                    _ => None,
                })
                .collect();
            return Series::new(name, values);
        }

        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|cell| match cell {
                Data::Int(i) => Some(*i as f64),
                Data::Float(f) => Some(*f),
                _ => None,
            })
            .collect();
        return Series::new(name, values);
    }

    let values: Vec<Option<String>> = cells
        .iter()
        .map(|cell| match cell {
            Data::Empty => None,
            Data::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
            other => Some(other.to_string()),
        })
        .collect();
    Series::new(name, values)
}

fn validate_shape(df: &DataFrame, limits: &LoadLimits) -> Result<(), UnreadableFile> {
    if df.height() > limits.max_rows {
        return Err(UnreadableFile::TooLarge(format!(
            "{} rows (max {})",
            df.height(),
            limits.max_rows
        )));
    }
    if df.width() > limits.max_columns {
        return Err(UnreadableFile::TooLarge(format!(
            "{} columns (max {})",
            df.width(),
            limits.max_columns
        )));
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| find_column(df, required).is_none())
        .map(|required| required.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(UnreadableFile::MissingColumns(missing));
    }

    Ok(())
}

fn find_column<'a>(df: &'a DataFrame, name: &str) -> Option<&'a Series> {
    df.get_columns()
        .iter()
        .find(|series| series.name().trim() == name)
}

fn required_column<'a>(
    df: &'a DataFrame,
    name: &'static str,
) -> Result<&'a Series, UnreadableFile> {
    find_column(df, name).ok_or_else(|| UnreadableFile::MissingColumns(vec![name.to_string()]))
}

fn text_values(series: &Series, column: &'static str) -> Result<Vec<Option<String>>, UnreadableFile> {
    let cast = series
        .cast(&DataType::String)
        .map_err(|e| UnreadableFile::Parse {
            format: "table",
            message: format!("column {column} cannot be read as text: {e}"),
        })?;
    let values = cast.str().map_err(|e| UnreadableFile::Parse {
        format: "table",
        message: format!("column {column} cannot be read as text: {e}"),
    })?;

    Ok(values
        .into_iter()
        .map(|value| {
            value
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
        })
        .collect())
}

fn amount_values(series: &Series) -> Result<Vec<Option<f64>>, UnreadableFile> {
    // Non-strict cast: unparseable text becomes null and is reported per row.
    let cast = series
        .cast(&DataType::Float64)
        .map_err(|e| UnreadableFile::Parse {
            format: "table",
            message: format!("column {AMOUNT_COLUMN} cannot be read as numbers: {e}"),
        })?;
    let values = cast.f64().map_err(|e| UnreadableFile::Parse {
        format: "table",
        message: format!("column {AMOUNT_COLUMN} cannot be read as numbers: {e}"),
    })?;

    Ok(values.into_iter().collect())
}

fn frame_to_records(df: &DataFrame) -> Result<Vec<ClaimRecord>, UnreadableFile> {
    let ids = text_values(required_column(df, CLAIM_ID_COLUMN)?, CLAIM_ID_COLUMN)?;
    let amount_series = required_column(df, AMOUNT_COLUMN)?;
    let amounts = amount_values(amount_series)?;
    let raw_amounts = text_values(amount_series, AMOUNT_COLUMN)?;
    let damage_types = text_values(required_column(df, DAMAGE_TYPE_COLUMN)?, DAMAGE_TYPE_COLUMN)?;
    let regions = text_values(required_column(df, REGION_COLUMN)?, REGION_COLUMN)?;

    let mut records = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let row = idx + 1;

        let claim_id = required_text(&ids[idx], row, CLAIM_ID_COLUMN)?;
        let amount_eur = match amounts[idx] {
            Some(amount) => amount,
            None => {
                let reason = match &raw_amounts[idx] {
                    Some(raw) => format!("is not a number ('{raw}')"),
                    None => "is empty".to_string(),
                };
                return Err(UnreadableFile::InvalidCell {
                    row,
                    column: AMOUNT_COLUMN,
                    reason,
                });
            }
        };
        let damage_type = required_text(&damage_types[idx], row, DAMAGE_TYPE_COLUMN)?;
        let region = required_text(&regions[idx], row, REGION_COLUMN)?;

        records.push(ClaimRecord {
            claim_id,
            amount_eur,
            damage_type,
            region,
        });
    }

    Ok(records)
}

fn required_text(
    value: &Option<String>,
    row: usize,
    column: &'static str,
) -> Result<String, UnreadableFile> {
    value.clone().ok_or_else(|| UnreadableFile::InvalidCell {
        row,
        column,
        reason: "is empty".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn load_csv(csv: &str) -> Result<ClaimsTable, AnalysisError> {
        load_claims("claims.csv", csv.as_bytes(), DatasetFormat::Csv, &LoadLimits::default())
    }

    #[rstest]
    #[case("claims.csv", DatasetFormat::Csv)]
    #[case("CLAIMS.CSV", DatasetFormat::Csv)]
    #[case("claims.xlsx", DatasetFormat::Spreadsheet)]
    #[case("claims.xls", DatasetFormat::Spreadsheet)]
    #[case("claims.ods", DatasetFormat::Spreadsheet)]
    fn test_format_from_filename(#[case] name: &str, #[case] expected: DatasetFormat) {
        assert_eq!(DatasetFormat::from_filename(name).unwrap(), expected);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = DatasetFormat::from_filename("claims.pdf").unwrap_err();
        assert_eq!(err, UnreadableFile::UnsupportedFormat("pdf".to_string()));
    }

    #[test]
    fn test_loads_csv_in_file_order() {
        let table = load_csv(
            "Claim_ID,Amount_EUR,Damage_Type,Region\n\
             C1,1000,Flood,A\n\
             C2,5000,Fire,B\n\
             C3,2000.5,Hail,A\n",
        )
        .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(
            table.records()[2],
            ClaimRecord::new("C3", 2000.5, "Hail", "A")
        );
        assert_eq!(table.records()[0].amount_eur, 1000.0);
    }

    #[test]
    fn test_numeric_claim_ids_and_extra_columns() {
        let table = load_csv(
            "Claim_ID,Policy_Holder,Amount_EUR,Damage_Type,Region\n\
             101,Νίκος,750,Collision,Κρήτη\n",
        )
        .unwrap();

        assert_eq!(
            table.records()[0],
            ClaimRecord::new("101", 750.0, "Collision", "Κρήτη")
        );
    }

    #[test]
    fn test_csv_text_columns_keep_leading_zeros() {
        let table = load_csv(
            "Claim_ID,Amount_EUR,Damage_Type,Region\n\
             007,100,1.50,01\n\
             7,200.25,Fire,02\n",
        )
        .unwrap();

        assert_eq!(
            table.records(),
            &[
                ClaimRecord::new("007", 100.0, "1.50", "01"),
                ClaimRecord::new("7", 200.25, "Fire", "02"),
            ]
        );
    }

    #[test]
    fn test_header_only_csv_is_empty_table() {
        let table = load_csv("Claim_ID,Amount_EUR,Damage_Type,Region\n").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_missing_columns_reported() {
        let err = load_csv("Claim_ID,Amount\nC1,100\n").unwrap_err();
        assert_eq!(
            err,
            AnalysisError::UnreadableFile(UnreadableFile::MissingColumns(vec![
                "Amount_EUR".to_string(),
                "Damage_Type".to_string(),
                "Region".to_string(),
            ]))
        );
    }

    #[test]
    fn test_non_numeric_amount_reported_with_row() {
        let err = load_csv(
            "Claim_ID,Amount_EUR,Damage_Type,Region\n\
             C1,100,Flood,A\n\
             C2,lots,Flood,A\n",
        )
        .unwrap_err();

        assert_eq!(
            err,
            AnalysisError::UnreadableFile(UnreadableFile::InvalidCell {
                row: 2,
                column: "Amount_EUR",
                reason: "is not a number ('lots')".to_string(),
            })
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = load_csv(
            "Claim_ID,Amount_EUR,Damage_Type,Region\n\
             C1,100,Flood,A\n\
             C1,200,Fire,B\n",
        )
        .unwrap_err();

        assert!(matches!(
            err,
            AnalysisError::UnreadableFile(UnreadableFile::DuplicateClaimId { row: 2, .. })
        ));
    }

    #[test]
    fn test_empty_bytes_unreadable() {
        let err = load_csv("").unwrap_err();
        assert!(matches!(err, AnalysisError::UnreadableFile(_)));
    }

    #[test]
    fn test_garbage_workbook_unreadable() {
        let err = load_claims(
            "claims.xlsx",
            b"definitely not a zip archive",
            DatasetFormat::Spreadsheet,
            &LoadLimits::default(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            AnalysisError::UnreadableFile(UnreadableFile::Parse {
                format: "spreadsheet",
                ..
            })
        ));
    }

    #[test]
    fn test_file_size_limit() {
        let limits = LoadLimits {
            max_file_bytes: 8,
            ..LoadLimits::default()
        };
        let err = load_claims(
            "claims.csv",
            b"Claim_ID,Amount_EUR,Damage_Type,Region\n",
            DatasetFormat::Csv,
            &limits,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            AnalysisError::UnreadableFile(UnreadableFile::TooLarge(_))
        ));
    }

    #[test]
    fn test_cells_to_series_prefers_integers() {
        let series = cells_to_series(
            "Claim_ID",
            &[Data::Float(17.0), Data::Int(18), Data::Empty],
        );
        assert_eq!(series.dtype(), &DataType::Int64);

        let series = cells_to_series("Amount_EUR", &[Data::Float(17.5), Data::Int(18)]);
        assert_eq!(series.dtype(), &DataType::Float64);

        let series = cells_to_series(
            "Region",
            &[Data::String("Attica".to_string()), Data::Float(3.0)],
        );
        assert_eq!(series.dtype(), &DataType::String);
    }
}
