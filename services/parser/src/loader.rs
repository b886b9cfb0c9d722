//! Raw input → grid plus a description of where it came from

use crate::cell::Grid;
use crate::error::Result;
use crate::pipeline::{SourceInfo, SourceKind};
use crate::report::IngestReport;
use crate::text_grid::{decode_bytes, parse_delimited_text};
use crate::workbook::Workbook;

const WORKBOOK_EXTENSIONS: &[&str] = &["xls", "xlsx", "xlsm", "xlsb", "ods"];

/// Whether a file name or MIME type denotes a workbook rather than delimited text.
pub fn is_workbook(name: &str, mime_type: &str) -> bool {
    let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    mime_type.contains("excel")
        || mime_type.contains("spreadsheetml")
        || mime_type.contains("opendocument.spreadsheet")
        || extension.is_some_and(|ext| WORKBOOK_EXTENSIONS.contains(&ext.as_str()))
}

/// One sheet's grid, ready for ingestion.
#[derive(Debug, Clone)]
pub struct LoadedSheet {
    pub grid: Grid,
    pub info: SourceInfo,
}

impl LoadedSheet {
    pub fn from_text(name: &str, kind: SourceKind, text: &str) -> Result<Self> {
        let grid = parse_delimited_text(text)?;
        let info = SourceInfo::new(name, kind, text.len(), &grid);
        Ok(Self { grid, info })
    }

    /// Uploaded CSV bytes in UTF-8 or Shift_JIS.
    pub fn from_csv_bytes(name: &str, bytes: &[u8]) -> Result<Self> {
        let text = decode_bytes(bytes);
        let mut loaded = Self::from_text(name, SourceKind::Csv, &text)?;
        loaded.info.size_bytes = bytes.len();
        Ok(loaded)
    }

    pub fn from_workbook_bytes(name: &str, bytes: Vec<u8>, sheet: Option<&str>) -> Result<Self> {
        let size = bytes.len();
        let mut workbook = Workbook::from_bytes(bytes)?;
        let (sheet_name, grid) = workbook.grid(sheet)?;
        let info = SourceInfo::new(name, SourceKind::Workbook, size, &grid)
            .with_sheets(workbook.sheet_names(), &sheet_name);
        Ok(Self { grid, info })
    }

    pub fn report(&self, manual_header_row: Option<usize>) -> Result<IngestReport> {
        IngestReport::build(&self.grid, self.info.clone(), manual_header_row)
    }
}
