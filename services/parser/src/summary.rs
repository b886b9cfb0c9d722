//! Sheet-wide totals

use serde::Serialize;

use crate::rows::{achievement_rate, yoy_growth, SalesRecord};

/// Column sums with the same derived percentages as a single record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesTotals {
    pub products: usize,
    pub last_year: f64,
    pub target: f64,
    pub actual: f64,
    pub yoy_growth: f64,
    pub achievement_rate: f64,
}

pub fn summarize(records: &[SalesRecord]) -> SalesTotals {
    let last_year: f64 = records.iter().filter_map(|r| r.last_year).sum();
    let target: f64 = records.iter().map(|r| r.target).sum();
    let actual: f64 = records.iter().map(|r| r.actual).sum();

    SalesTotals {
        products: records.len(),
        last_year,
        target,
        actual,
        yoy_growth: yoy_growth(last_year, actual),
        achievement_rate: achievement_rate(target, actual),
    }
}
