//! Cell values and their normalization into text and numbers

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// A single grid entry. Spreadsheet decoders may produce any of the three;
/// delimited text only ever produces `Text` or `Empty`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

/// Row-major, ragged rows permitted.
pub type Grid = Vec<Vec<Cell>>;

/// Characters dropped before numeric parsing: thousands separators and currency glyphs
const NUMBER_NOISE: &[char] = &[',', '¥', '$'];

impl Cell {
    /// Text form of the cell as a human would read it in the sheet.
    pub fn display_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
        }
    }

    /// Empty, or text made only of whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Present in the grid with some content, even if only whitespace.
    /// Used by the product-column sampler, which counts whitespace cells as samples.
    pub(crate) fn is_present(&self) -> bool {
        match self {
            Cell::Empty => false,
            Cell::Text(s) => !s.is_empty(),
            Cell::Number(_) => true,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

fn leading_float() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?").expect("static pattern")
    })
}

/// Coerce a cell into a number. Never fails: anything without a leading
/// numeric literal is zero.
///
/// Text has `,`, `¥` and `$` removed first, so `"¥1,234"` reads as 1234.
/// Like a lenient float reader, trailing garbage after the literal is ignored
/// (`"12個"` reads as 12).
pub fn normalize_number(cell: &Cell) -> f64 {
    match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => parse_lenient(s),
        Cell::Empty => 0.0,
    }
}

fn parse_lenient(text: &str) -> f64 {
    let cleaned: String = text.chars().filter(|c| !NUMBER_NOISE.contains(c)).collect();
    leading_float()
        .find(cleaned.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Strip a leading byte-order mark, one pair of surrounding quotes and
/// surrounding whitespace.
pub fn clean_text(text: &str) -> String {
    let s = text.trim_start_matches('\u{feff}').trim();
    let s = s.strip_prefix('"').unwrap_or(s);
    let s = s.strip_suffix('"').unwrap_or(s);
    s.trim().to_string()
}

/// Whether the whole string reads as a number (not NaN).
///
/// Accepts what a strict whole-string numeric conversion accepts: decimal
/// and exponent forms, `Infinity`, and `0x`/`0o`/`0b` integer prefixes.
/// The empty string is not numeric here; callers decide how to treat blanks.
pub fn looks_numeric(text: &str) -> bool {
    let s = text.trim();
    if s.is_empty() {
        return false;
    }
    if matches!(s, "Infinity" | "+Infinity" | "-Infinity") {
        return true;
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            // no sign after the prefix, any length
            return !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix));
        }
    }
    // f64's parser also takes "inf", "infinity" and "nan" in any case
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return false;
    }
    // overflow parses to infinity, which still counts
    s.parse::<f64>().is_ok_and(|v| !v.is_nan())
}
