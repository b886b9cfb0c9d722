//! Post-ingestion data quality report
//!
//! Findings never block ingestion; they are shown next to the records.

use std::collections::HashSet;

use serde::Serialize;

use crate::columns::ColumnMap;
use crate::rows::SalesRecord;

/// Below this share of valid rows the quality score is a warning.
pub const QUALITY_WARNING_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub total_rows: usize,
    pub valid_rows: usize,
    /// Target or actual figures with no column to come from.
    pub missing_values: usize,
    pub duplicates: usize,
    /// valid_rows / total_rows in percent, one decimal.
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
    pub quality: DataQuality,
}

/// Check ingested records. `columns` is the map they were extracted with.
pub fn validate(records: &[SalesRecord], columns: &ColumnMap) -> ValidationReport {
    let mut report = ValidationReport::default();

    if records.is_empty() {
        report.errors.push("no data".to_string());
        return report;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut quality = DataQuality {
        total_rows: records.len(),
        ..DataQuality::default()
    };

    for (index, record) in records.iter().enumerate() {
        let line = index + 1;

        if record.product.trim().is_empty() {
            report.errors.push(format!("row {line}: product name is empty"));
        } else {
            quality.valid_rows += 1;
            if !seen.insert(record.product.as_str()) {
                quality.duplicates += 1;
                report.warnings.push(format!("duplicate product: {}", record.product));
            }
        }

        if record.target < 0.0 || record.actual < 0.0 {
            report.warnings.push(format!("row {line}: negative figure"));
        }
    }

    // one warning per unmapped figure column, a zero figure is a value
    if columns.target.is_none() {
        quality.missing_values += records.len();
        report
            .warnings
            .push("no target column: achievement rate not available".to_string());
    }
    if columns.actual.is_none() {
        quality.missing_values += records.len();
        report
            .warnings
            .push("no actual column: achievement rate and growth not available".to_string());
    }

    quality.score = (quality.valid_rows as f64 / quality.total_rows as f64 * 1000.0).round() / 10.0;
    if quality.score < QUALITY_WARNING_THRESHOLD {
        report
            .warnings
            .push(format!("data quality score {:.1}% (below {QUALITY_WARNING_THRESHOLD}%)", quality.score));
    } else {
        report.info.push(format!("data quality score {:.1}%", quality.score));
    }

    if !records.iter().any(|r| r.last_year.is_some_and(|v| v > 0.0)) {
        report
            .info
            .push("no last-year figures: year-over-year growth not available".to_string());
    }

    report.is_valid = report.errors.is_empty();
    report.quality = quality;
    report
}
