//! Ingestion pipeline: source → grid → header → records
//!
//! This module is DETERMINISTIC: the same source with the same header choice
//! always yields the same records. Ingestion is all-or-nothing; individual
//! rows may still be skipped by the row filters.

use std::borrow::Cow;

use serde::Serialize;
use tracing::info;

use crate::cell::Grid;
use crate::error::{IngestError, Result};
use crate::header::{detect_header_candidates, manual_header_candidate, HeaderCandidate};
use crate::rows::{extract_rows, SalesRecord};
use crate::text_grid::parse_delimited_text;

/// Input to the pipeline: delimited text, or a grid from a spreadsheet decoder.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    Text(&'a str),
    Grid(&'a Grid),
}

impl<'a> Source<'a> {
    fn into_grid(self) -> Result<Cow<'a, Grid>> {
        match self {
            Source::Text(text) => parse_delimited_text(text).map(Cow::Owned),
            Source::Grid(grid) => {
                if grid.len() < 2 {
                    return Err(IngestError::InsufficientData { lines: grid.len() });
                }
                Ok(Cow::Borrowed(grid))
            }
        }
    }
}

/// Records together with the header they were read under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ingested {
    pub header: HeaderCandidate,
    pub records: Vec<SalesRecord>,
}

/// Where the data came from and how big it was, for display next to the results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub name: String,
    pub kind: SourceKind,
    pub size_bytes: usize,
    /// All sheets of a workbook; a single pseudo-sheet for text sources.
    pub sheets: Vec<String>,
    pub sheet: String,
    pub row_count: usize,
    pub column_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Csv,
    Workbook,
    Url,
}

/// Sheet label used for text sources.
pub const TEXT_SHEET_NAME: &str = "CSV";

impl SourceInfo {
    pub fn new(name: impl Into<String>, kind: SourceKind, size_bytes: usize, grid: &Grid) -> Self {
        Self {
            name: name.into(),
            kind,
            size_bytes,
            sheets: vec![TEXT_SHEET_NAME.to_string()],
            sheet: TEXT_SHEET_NAME.to_string(),
            row_count: grid.len(),
            column_count: grid.iter().map(Vec::len).max().unwrap_or(0),
        }
    }

    pub fn with_sheets(mut self, sheets: &[String], sheet: &str) -> Self {
        self.sheets = sheets.to_vec();
        self.sheet = sheet.to_string();
        self
    }
}

/// Ranked header candidates for operator review.
pub fn header_candidates(source: Source<'_>) -> Result<Vec<HeaderCandidate>> {
    let grid = source.into_grid()?;
    Ok(detect_header_candidates(&grid))
}

/// Ingest `source` into sales records.
///
/// With `manual_header_row`, that row is the header (no scoring, no
/// content-based product guess); otherwise the best-scoring row is used.
pub fn ingest(source: Source<'_>, manual_header_row: Option<usize>) -> Result<Vec<SalesRecord>> {
    ingest_detailed(source, manual_header_row).map(|ingested| ingested.records)
}

/// Like [`ingest`], also returning the header the records were read under.
pub fn ingest_detailed(source: Source<'_>, manual_header_row: Option<usize>) -> Result<Ingested> {
    let grid = source.into_grid()?;
    ingest_grid(&grid, manual_header_row)
}

fn ingest_grid(grid: &Grid, manual_header_row: Option<usize>) -> Result<Ingested> {
    let header = match manual_header_row {
        Some(row) => manual_header_candidate(grid, row),
        None => detect_header_candidates(grid).into_iter().next(),
    }
    .ok_or(IngestError::NoHeaderFound)?;

    if !header.column_map.has_product() {
        return Err(IngestError::MissingProductColumn {
            header_row: header.row_index,
            headers: header.headers.clone(),
        });
    }

    let records = extract_rows(grid, header.row_index, &header.column_map)?;
    if records.is_empty() {
        return Err(IngestError::NoValidRows {
            header_row: header.row_index,
            confidence: header.confidence,
        });
    }

    info!(
        header_row = header.row_index,
        confidence = header.confidence,
        manual = manual_header_row.is_some(),
        records = records.len(),
        "ingested sales records"
    );

    Ok(Ingested { header, records })
}
