//! Spreadsheet bytes → grid, via calamine
//!
//! The format (xls, xlsx, xlsb, ods) is detected from the content. Only one
//! sheet is ingested per run: the requested one, or the first.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use tracing::debug;

use crate::cell::{Cell, Grid};
use crate::error::{IngestError, Result};

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) if s.trim().is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
            // Serial day number, as the sheet stores it
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(e.to_string()),
            Data::Empty => Cell::Empty,
        }
    }
}

/// Grid of a sheet's used range. Row 0 is the first row of the used range.
pub fn grid_from_range(range: &Range<Data>) -> Grid {
    range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect())
        .collect()
}

/// An opened workbook held in memory.
pub struct Workbook {
    sheets: Sheets<Cursor<Vec<u8>>>,
    sheet_names: Vec<String>,
}

impl Workbook {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let size = bytes.len();
        let sheets = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let sheet_names = sheets.sheet_names().to_vec();
        if sheet_names.is_empty() {
            return Err(IngestError::NoSheets);
        }
        debug!(size, sheets = sheet_names.len(), "opened workbook");
        Ok(Self { sheets, sheet_names })
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    /// Resolve `sheet` (or the first sheet) and return its name with its grid.
    pub fn grid(&mut self, sheet: Option<&str>) -> Result<(String, Grid)> {
        let name = match sheet {
            Some(requested) => self
                .sheet_names
                .iter()
                .find(|name| name.as_str() == requested)
                .cloned()
                .ok_or_else(|| IngestError::SheetNotFound(requested.to_string()))?,
            None => self.sheet_names[0].clone(),
        };

        let range = self.sheets.worksheet_range(&name)?;
        let (rows, cols) = range.get_size();
        debug!(sheet = %name, rows, cols, "read sheet");

        Ok((name, grid_from_range(&range)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    // -------------------------------------------------------------------------
    // CELL CONVERSION
    // -------------------------------------------------------------------------

    #[test]
    fn test_cell_conversion_numbers() {
        assert_eq!(Cell::from(&Data::Int(2454)), Cell::Number(2454.0));
        assert_eq!(Cell::from(&Data::Float(94.8)), Cell::Number(94.8));
    }

    #[test]
    fn test_cell_conversion_text_and_blank() {
        assert_eq!(Cell::from(&Data::String("実績".into())), Cell::Text("実績".into()));
        assert_eq!(Cell::from(&Data::String("  ".into())), Cell::Empty);
        assert_eq!(Cell::from(&Data::Empty), Cell::Empty);
    }

    #[test]
    fn test_cell_conversion_bool_and_error() {
        assert_eq!(Cell::from(&Data::Bool(true)), Cell::Text("TRUE".into()));
        assert_eq!(Cell::from(&Data::Error(CellErrorType::Div0)), Cell::Text("#DIV/0!".into()));
    }

    // -------------------------------------------------------------------------
    // RANGE → GRID
    // -------------------------------------------------------------------------

    #[test]
    fn test_grid_from_range() {
        let mut range: Range<Data> = Range::new((0, 0), (1, 2));
        range.set_value((0, 0), Data::String("商品名".into()));
        range.set_value((0, 2), Data::String("実績".into()));
        range.set_value((1, 0), Data::String("チーズケーキ".into()));
        range.set_value((1, 2), Data::Float(850.0));

        let grid = grid_from_range(&range);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0][1], Cell::Empty);
        assert_eq!(grid[1][2], Cell::Number(850.0));
    }

    #[test]
    fn test_grid_starts_at_used_range() {
        let mut range: Range<Data> = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("商品名".into()));
        range.set_value((3, 2), Data::Int(5));

        let grid = grid_from_range(&range);
        assert_eq!(grid[0][0], Cell::Text("商品名".into()));
        assert_eq!(grid[1][1], Cell::Number(5.0));
    }

    // -------------------------------------------------------------------------
    // OPENING
    // -------------------------------------------------------------------------

    #[test]
    fn test_non_workbook_bytes_rejected() {
        let err = Workbook::from_bytes("商品名,実績\nA,1\n".as_bytes().to_vec()).err().unwrap();
        assert!(err.is_decode_failure());
    }
}
