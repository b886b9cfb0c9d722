//! Data row extraction below a chosen header

use serde::Serialize;
use tracing::trace;

use crate::cell::{clean_text, normalize_number, Cell, Grid};
use crate::columns::ColumnMap;
use crate::error::{IngestError, Result};

/// Product labels of total/subtotal rows. These rows are never data.
pub const AGGREGATE_LABELS: &[&str] = &["合計", "総計", "計"];

/// One product's figures with derived percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRecord {
    pub product: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_year: Option<f64>,
    pub target: f64,
    pub actual: f64,
    /// Percent change of actual over last year, one decimal.
    pub yoy_growth: f64,
    /// Actual as a percent of target, one decimal.
    pub achievement_rate: f64,
}

impl SalesRecord {
    /// Build a record from raw figures, deriving the percentages.
    pub fn new(product: impl Into<String>, last_year: Option<f64>, target: f64, actual: f64) -> Self {
        Self {
            product: product.into(),
            last_year,
            target,
            actual,
            yoy_growth: yoy_growth(last_year.unwrap_or(0.0), actual),
            achievement_rate: achievement_rate(target, actual),
        }
    }

    /// At least one figure is positive.
    pub fn has_figures(&self) -> bool {
        self.target > 0.0 || self.actual > 0.0 || self.last_year.is_some_and(|v| v > 0.0)
    }
}

/// Round a percentage to one decimal, halves toward positive infinity.
pub fn round_one_decimal(percent: f64) -> f64 {
    (percent * 10.0 + 0.5).floor() / 10.0
}

/// Year-over-year growth in percent; 0 unless both figures are positive.
pub fn yoy_growth(last_year: f64, actual: f64) -> f64 {
    if last_year > 0.0 && actual > 0.0 {
        round_one_decimal((actual - last_year) / last_year * 100.0)
    } else {
        0.0
    }
}

/// Target achievement in percent; 0 unless both figures are positive.
pub fn achievement_rate(target: f64, actual: f64) -> f64 {
    if target > 0.0 && actual > 0.0 {
        round_one_decimal(actual / target * 100.0)
    } else {
        0.0
    }
}

fn cell_at(row: &[Cell], col: usize) -> &Cell {
    row.get(col).unwrap_or(&Cell::Empty)
}

/// Walk every row after `header_row` and turn qualifying rows into records.
///
/// Rows are skipped, not rejected, when they are empty, have no product,
/// are total rows, or carry no positive figure. Unparseable numbers read as 0.
pub fn extract_rows(grid: &Grid, header_row: usize, columns: &ColumnMap) -> Result<Vec<SalesRecord>> {
    let product_col = columns.product.ok_or_else(|| IngestError::MissingProductColumn {
        header_row,
        headers: Vec::new(),
    })?;

    let mut records = Vec::new();

    for (row_index, row) in grid.iter().enumerate().skip(header_row + 1) {
        if row.is_empty() {
            continue;
        }

        let product = clean_text(&cell_at(row, product_col).display_text());
        if product.is_empty() {
            trace!(row = row_index, "skipped: no product");
            continue;
        }
        if AGGREGATE_LABELS.contains(&product.as_str()) {
            trace!(row = row_index, label = %product, "skipped: total row");
            continue;
        }

        let last_year = columns.last_year.map(|col| normalize_number(cell_at(row, col)));
        let target = columns.target.map_or(0.0, |col| normalize_number(cell_at(row, col)));
        let actual = columns.actual.map_or(0.0, |col| normalize_number(cell_at(row, col)));

        let record = SalesRecord::new(product, last_year, target, actual);
        if !record.has_figures() {
            trace!(row = row_index, product = %record.product, "skipped: no figures");
            continue;
        }
        records.push(record);
    }

    Ok(records)
}
