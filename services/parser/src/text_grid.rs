//! Delimited text → grid
//!
//! Text arrives from uploaded `.csv` files or from a spreadsheet export URL.
//! Every non-blank line becomes one row; fields are split on commas outside
//! double quotes.

use encoding_rs::SHIFT_JIS;
use tracing::debug;

use crate::cell::{Cell, Grid};
use crate::error::{IngestError, Result};

const BOM: char = '\u{feff}';
const DELIMITER: char = ',';
const QUOTE: char = '"';

/// Decode uploaded bytes into text.
///
/// UTF-8 (with or without BOM) is taken as-is. Anything that is not valid
/// UTF-8 is read as Shift_JIS, the usual encoding of spreadsheet CSV exports
/// on Japanese Windows; undecodable bytes become U+FFFD.
pub fn decode_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, had_errors) = SHIFT_JIS.decode(bytes);
            debug!(had_errors, "input is not UTF-8, decoded as Shift_JIS");
            text.into_owned()
        }
    }
}

/// Non-blank, trimmed lines with line endings normalized and a leading BOM removed.
fn content_lines(text: &str) -> Vec<String> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Quotes were consumed while splitting; only the BOM and padding remain to drop.
fn clean_field(field: &str) -> String {
    field.trim_start_matches(BOM).trim().to_string()
}

/// Split one line into fields. A comma inside double quotes is part of the
/// field; `""` inside quotes is a literal quote. Quote state does not carry
/// over to the next line.
pub fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            QUOTE if in_quotes && chars.peek() == Some(&QUOTE) => {
                current.push(QUOTE);
                chars.next();
            }
            QUOTE => in_quotes = !in_quotes,
            DELIMITER if !in_quotes => fields.push(clean_field(&std::mem::take(&mut current))),
            _ => current.push(c),
        }
    }
    fields.push(clean_field(&current));

    fields
}

/// Parse delimited text into a grid of text cells (blank fields are `Empty`).
///
/// Fails with `InsufficientData` when fewer than two non-blank lines remain:
/// a header and at least one data row are required.
pub fn parse_delimited_text(text: &str) -> Result<Grid> {
    let lines = content_lines(text);
    if lines.len() < 2 {
        return Err(IngestError::InsufficientData { lines: lines.len() });
    }

    let grid: Grid = lines
        .iter()
        .map(|line| {
            split_line(line)
                .into_iter()
                .map(|field| if field.is_empty() { Cell::Empty } else { Cell::Text(field) })
                .collect()
        })
        .collect();

    debug!(rows = grid.len(), "parsed delimited text");
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(row: &[Cell]) -> Vec<String> {
        row.iter().map(Cell::display_text).collect()
    }

    // -------------------------------------------------------------------------
    // LINE HANDLING
    // -------------------------------------------------------------------------

    #[test]
    fn test_line_endings_and_blank_lines() {
        let text = "\u{feff}商品名,実績\r\n\r\nA,1\rB,2\n   \nC,3\n";
        let grid = parse_delimited_text(text).unwrap();
        assert_eq!(grid.len(), 4);
        assert_eq!(texts(&grid[0]), vec!["商品名", "実績"]);
        assert_eq!(texts(&grid[3]), vec!["C", "3"]);
    }

    #[test]
    fn test_single_line_is_insufficient() {
        let err = parse_delimited_text("商品名,実績\n\n   \n").unwrap_err();
        assert!(matches!(err, IngestError::InsufficientData { lines: 1 }));
    }

    #[test]
    fn test_empty_text_is_insufficient() {
        let err = parse_delimited_text("").unwrap_err();
        assert!(matches!(err, IngestError::InsufficientData { lines: 0 }));
    }

    // -------------------------------------------------------------------------
    // FIELD SPLITTING
    // -------------------------------------------------------------------------

    #[test]
    fn test_quoted_comma_is_not_a_separator() {
        assert_eq!(split_line(r#"A,"1,234","¥5,000""#), vec!["A", "1,234", "¥5,000"]);
    }

    #[test]
    fn test_quote_after_space_still_opens() {
        assert_eq!(split_line(r#"A, "1,234""#), vec!["A", "1,234"]);
    }

    #[test]
    fn test_quote_toggles_mid_field() {
        assert_eq!(split_line(r#"ab"c,d"e,x"#), vec!["abc,de", "x"]);
    }

    #[test]
    fn test_doubled_quote_is_literal() {
        assert_eq!(split_line(r#""say ""hi""",x"#), vec![r#"say "hi""#, "x"]);
        assert_eq!(split_line(r#"a,"",b"#), vec!["a", "", "b"]);
    }

    #[test]
    fn test_fields_trimmed_and_blank_fields_empty() {
        let grid = parse_delimited_text("商品名 , 前年 ,予定\n A ,, 3 \n").unwrap();
        assert_eq!(texts(&grid[0]), vec!["商品名", "前年", "予定"]);
        assert_eq!(grid[1], vec![Cell::Text("A".into()), Cell::Empty, Cell::Text("3".into())]);
    }

    #[test]
    fn test_ragged_rows_kept() {
        let grid = parse_delimited_text("a,b,c\nx\n").unwrap();
        assert_eq!(grid[0].len(), 3);
        assert_eq!(grid[1].len(), 1);
    }

    #[test]
    fn test_unbalanced_quote_stays_on_its_line() {
        let grid = parse_delimited_text("a,\"b,c\nd,e\n").unwrap();
        assert_eq!(texts(&grid[0]), vec!["a", "b,c"]);
        assert_eq!(texts(&grid[1]), vec!["d", "e"]);
    }

    // -------------------------------------------------------------------------
    // DECODING
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_utf8_with_bom() {
        let bytes = "\u{feff}商品名,実績".as_bytes();
        assert_eq!(decode_bytes(bytes), "商品名,実績");
    }

    #[test]
    fn test_decode_shift_jis_fallback() {
        let (encoded, _, _) = SHIFT_JIS.encode("商品名,実績\nチーズケーキ,850");
        assert!(std::str::from_utf8(&encoded).is_err());
        assert_eq!(decode_bytes(&encoded), "商品名,実績\nチーズケーキ,850");
    }
}
