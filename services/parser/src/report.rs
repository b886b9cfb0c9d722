//! Everything a caller shows after one ingestion

use serde::Serialize;

use crate::cell::Grid;
use crate::error::Result;
use crate::header::HeaderCandidate;
use crate::pipeline::{header_candidates, ingest_detailed, Source, SourceInfo};
use crate::rows::SalesRecord;
use crate::summary::{summarize, SalesTotals};
use crate::validate::{validate, ValidationReport};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub source: SourceInfo,
    /// The header the records were read under.
    pub header: HeaderCandidate,
    /// All detected candidates, best first, so a caller can offer a manual override.
    pub candidates: Vec<HeaderCandidate>,
    pub records: Vec<SalesRecord>,
    pub totals: SalesTotals,
    pub validation: ValidationReport,
}

impl IngestReport {
    pub fn build(grid: &Grid, source: SourceInfo, manual_header_row: Option<usize>) -> Result<Self> {
        let ingested = ingest_detailed(Source::Grid(grid), manual_header_row)?;
        let candidates = header_candidates(Source::Grid(grid))?;

        Ok(Self {
            source,
            totals: summarize(&ingested.records),
            validation: validate(&ingested.records, &ingested.header.column_map),
            header: ingested.header,
            candidates,
            records: ingested.records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::pipeline::SourceKind;
    use crate::sample::sample_grid;

    #[test]
    fn test_report_for_sample() {
        let grid = sample_grid();
        let info = SourceInfo::new("sample", SourceKind::Csv, 0, &grid);
        let report = IngestReport::build(&grid, info, None).unwrap();

        assert_eq!(report.records.len(), 11);
        assert_eq!(report.totals.products, 11);
        assert_eq!(report.header.row_index, 0);
        assert_eq!(report.candidates[0], report.header);
        assert!(report.validation.is_valid);
        assert_eq!(report.source.row_count, 12);
    }

    #[test]
    fn test_report_json_keys() {
        let grid = sample_grid();
        let info = SourceInfo::new("sample", SourceKind::Csv, 0, &grid);
        let json = serde_json::to_value(IngestReport::build(&grid, info, Some(0)).unwrap()).unwrap();
        for key in ["source", "header", "candidates", "records", "totals", "validation"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["header"]["rowIndex"], 0);
        assert_eq!(json["source"]["kind"], "csv");
    }

    #[test]
    fn test_report_actual_only_sheet_warns_once() {
        let grid = vec![
            vec![Cell::from("商品名"), Cell::from("実績")],
            vec![Cell::from("レモンケーキ"), Cell::Number(1575.0)],
            vec![Cell::from("抹茶フィナンシェ"), Cell::Number(871.0)],
            vec![Cell::from("チーズケーキ"), Cell::Number(850.0)],
        ];
        let info = SourceInfo::new("actual-only.csv", SourceKind::Csv, 0, &grid);
        let report = IngestReport::build(&grid, info, None).unwrap();

        assert_eq!(report.records.len(), 3);
        assert_eq!(report.validation.warnings, vec!["no target column: achievement rate not available"]);
        assert_eq!(report.validation.quality.missing_values, 3);
    }
}
