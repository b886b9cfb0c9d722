//! Header row detection
//!
//! Uploaded sheets often carry titles, dates or notes above the real header.
//! Each of the first rows is scored by how many of its cells name a known
//! column, with a content-based fallback for an unlabeled product column.

use serde::Serialize;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::cell::{looks_numeric, Cell, Grid};
use crate::columns::{identify_column, ColumnMap};

/// Only the first rows of a sheet are considered; headers live near the top.
pub const HEADER_SCAN_ROWS: usize = 15;
/// A header row needs at least this many plausible label cells.
pub const MIN_HEADER_CELLS: usize = 2;
/// Numeric-looking labels shorter than this are data, not headers.
pub const NUMERIC_LABEL_MAX_LEN: usize = 10;
/// Rows sampled under a candidate header when guessing the product column.
pub const PRODUCT_SAMPLE_ROWS: usize = 5;
/// Minimum share of text samples for a column to be taken as the product column.
pub const PRODUCT_TEXT_RATIO: f64 = 0.7;
/// Score bonus when a product column is known.
pub const PRODUCT_BONUS: f64 = 0.3;
/// Score bonus when at least two figure columns are known.
pub const FIGURES_BONUS: f64 = 0.2;
/// Figure columns needed for `FIGURES_BONUS`.
pub const FIGURES_BONUS_MIN: usize = 2;

/// A row considered as the header, with what was recognized in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderCandidate {
    pub row_index: usize,
    /// Text of every plausible label cell in the row, in column order.
    pub headers: Vec<String>,
    pub column_map: ColumnMap,
    /// Heuristic likelihood in [0, 1].
    pub confidence: f64,
}

fn date_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{4}[-/][0-9]{1,2}[-/][0-9]{1,2}$").expect("static pattern"))
}

/// Whether a cell could be a column label: not blank, not a short number,
/// not a `YYYY-M-D` / `YYYY/M/D` date.
pub fn is_valid_header_cell(cell: &Cell) -> bool {
    if cell.is_blank() {
        return false;
    }
    let text = cell.display_text();
    let text = text.trim();
    if looks_numeric(text) && text.chars().count() < NUMERIC_LABEL_MAX_LEN {
        return false;
    }
    !date_pattern().is_match(text)
}

/// Map every recognizable label in `row`. Returns the map and how many cells matched.
pub fn build_column_map(row: &[Cell]) -> (ColumnMap, usize) {
    let mut map = ColumnMap::default();
    let mut matches = 0;

    for (col, cell) in row.iter().enumerate() {
        if !is_valid_header_cell(cell) {
            continue;
        }
        if let Some(field) = identify_column(&cell.display_text()) {
            map.set(field, col);
            matches += 1;
        }
    }

    (map, matches)
}

/// Label texts of the plausible header cells in a row.
fn header_labels(row: &[Cell]) -> Vec<String> {
    row.iter()
        .filter(|cell| is_valid_header_cell(cell))
        .map(Cell::display_text)
        .collect()
}

/// First label column whose next few cells are mostly text, if any.
fn guess_product_column(grid: &Grid, header_row: usize) -> Option<usize> {
    let row = &grid[header_row];
    let sample_end = (header_row + 1 + PRODUCT_SAMPLE_ROWS).min(grid.len());

    (0..row.len())
        .filter(|&col| is_valid_header_cell(&row[col]))
        .find(|&col| {
            let mut samples = 0usize;
            let mut texts = 0usize;
            for below in &grid[header_row + 1..sample_end] {
                let Some(cell) = below.get(col) else { continue };
                if !cell.is_present() {
                    continue;
                }
                samples += 1;
                let text = cell.display_text();
                let text = text.trim();
                if !text.is_empty() && !looks_numeric(text) {
                    texts += 1;
                }
            }
            samples > 0 && texts as f64 / samples as f64 >= PRODUCT_TEXT_RATIO
        })
}

/// Confidence for a row with `matches` recognized columns out of `valid_cells` labels.
pub fn score(matches: usize, valid_cells: usize, map: &ColumnMap) -> f64 {
    if valid_cells == 0 {
        return 0.0;
    }
    let mut confidence = matches as f64 / valid_cells as f64;
    if map.has_product() {
        confidence += PRODUCT_BONUS;
    }
    if map.figure_columns() >= FIGURES_BONUS_MIN {
        confidence += FIGURES_BONUS;
    }
    confidence.min(1.0)
}

/// Score the first rows of `grid` as header candidates, best first.
/// Ties keep row order. Never fails; an empty result means no plausible header.
pub fn detect_header_candidates(grid: &Grid) -> Vec<HeaderCandidate> {
    let mut candidates = Vec::new();

    for row_index in 0..grid.len().min(HEADER_SCAN_ROWS) {
        let row = &grid[row_index];
        let headers = header_labels(row);
        if headers.len() < MIN_HEADER_CELLS {
            continue;
        }

        let (mut column_map, mut matches) = build_column_map(row);

        if !column_map.has_product() {
            if let Some(col) = guess_product_column(grid, row_index) {
                debug!(row = row_index, column = col, "product column inferred from cell contents");
                column_map.product = Some(col);
                matches += 1;
            }
        }

        let confidence = score(matches, headers.len(), &column_map);
        debug!(row = row_index, matches, labels = headers.len(), confidence, "header candidate");

        candidates.push(HeaderCandidate {
            row_index,
            headers,
            column_map,
            confidence,
        });
    }

    // sort_by is stable: equal scores keep their row order
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    candidates
}

/// Candidate for an operator-chosen header row. Columns come from labels only
/// (no content fallback) and confidence is 1.0. `None` if the row does not exist.
pub fn manual_header_candidate(grid: &Grid, row_index: usize) -> Option<HeaderCandidate> {
    let row = grid.get(row_index)?;
    let (column_map, _) = build_column_map(row);

    Some(HeaderCandidate {
        row_index,
        headers: header_labels(row),
        column_map,
        confidence: 1.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|s| Cell::from(*s)).collect()
    }

    // -------------------------------------------------------------------------
    // HEADER CELL VALIDITY
    // -------------------------------------------------------------------------

    #[test]
    fn test_valid_header_cell_rejects_blank_and_numbers() {
        assert!(!is_valid_header_cell(&Cell::Empty));
        assert!(!is_valid_header_cell(&Cell::from("  ")));
        assert!(!is_valid_header_cell(&Cell::from("2454")));
        assert!(!is_valid_header_cell(&Cell::Number(2024.0)));
        assert!(is_valid_header_cell(&Cell::from("実績")));
    }

    #[test]
    fn test_valid_header_cell_long_numbers_pass() {
        // Ten characters or more: treated like an id/code label, not a figure
        assert!(is_valid_header_cell(&Cell::from("1234567890")));
        assert!(!is_valid_header_cell(&Cell::from("123456789")));
    }

    #[test]
    fn test_valid_header_cell_numeric_edge_labels() {
        // overflows to infinity, still a number
        assert!(!is_valid_header_cell(&Cell::from("1e400")));
        assert!(is_valid_header_cell(&Cell::from("0x+1F")));
        assert!(is_valid_header_cell(&Cell::from("nan")));
    }

    #[test]
    fn test_valid_header_cell_rejects_dates() {
        assert!(!is_valid_header_cell(&Cell::from("2024-04-01")));
        assert!(!is_valid_header_cell(&Cell::from("2024/4/1")));
        assert!(is_valid_header_cell(&Cell::from("2024年4月")));
    }

    // -------------------------------------------------------------------------
    // SCORING BONUSES
    // -------------------------------------------------------------------------

    #[test]
    fn test_score_base_ratio_only() {
        let map = ColumnMap {
            target: Some(1),
            ..ColumnMap::default()
        };
        assert!((score(1, 4, &map) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_score_product_bonus() {
        let map = ColumnMap {
            product: Some(0),
            ..ColumnMap::default()
        };
        assert!((score(1, 4, &map) - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_score_figures_bonus() {
        let map = ColumnMap {
            target: Some(1),
            actual: Some(2),
            ..ColumnMap::default()
        };
        assert!((score(2, 5, &map) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_score_single_figure_gets_no_figures_bonus() {
        let map = ColumnMap {
            product: Some(0),
            actual: Some(1),
            ..ColumnMap::default()
        };
        assert!((score(2, 4, &map) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_score_clamped_to_one() {
        let map = ColumnMap {
            product: Some(0),
            last_year: Some(1),
            target: Some(2),
            actual: Some(3),
        };
        assert_eq!(score(4, 4, &map), 1.0);
    }

    #[test]
    fn test_score_no_labels() {
        assert_eq!(score(0, 0, &ColumnMap::default()), 0.0);
    }

    // -------------------------------------------------------------------------
    // DETECTION
    // -------------------------------------------------------------------------

    #[test]
    fn test_detect_header_on_first_row() {
        let grid = vec![
            text_row(&["主力商品名", "前年", "予定", "実績"]),
            text_row(&["チーズケーキ", "750", "800", "850"]),
        ];
        let candidates = detect_header_candidates(&grid);
        assert_eq!(candidates[0].row_index, 0);
        assert_eq!(candidates[0].confidence, 1.0);
        assert_eq!(candidates[0].column_map.product, Some(0));
        assert_eq!(candidates[0].column_map.actual, Some(3));
    }

    #[test]
    fn test_detect_header_below_title_rows() {
        let grid = vec![
            text_row(&["2024年度 売上報告"]),
            text_row(&["作成日", "2024/4/1"]),
            text_row(&[]),
            text_row(&["商品名", "前年", "予定", "実績"]),
            text_row(&["レモンケーキ", "798", "1680", "1575"]),
        ];
        let candidates = detect_header_candidates(&grid);
        assert_eq!(candidates[0].row_index, 3);
        assert_eq!(candidates[0].headers, vec!["商品名", "前年", "予定", "実績"]);
    }

    #[test]
    fn test_detect_skips_rows_with_single_label() {
        let grid = vec![text_row(&["実績", "100"]), text_row(&["a", "1"])];
        assert!(detect_header_candidates(&grid).is_empty());
    }

    #[test]
    fn test_detect_scans_only_first_rows() {
        let mut grid: Grid = (0..HEADER_SCAN_ROWS).map(|_| text_row(&["1", "2"])).collect();
        grid.push(text_row(&["商品名", "実績"]));
        grid.push(text_row(&["x", "1"]));
        assert!(detect_header_candidates(&grid).is_empty());
    }

    #[test]
    fn test_product_fallback_from_text_column() {
        let grid = vec![
            text_row(&["区分", "予定", "実績"]),
            text_row(&["フィナンシェ", "1820", "1726"]),
            text_row(&["カステラ", "1400", "1433"]),
            text_row(&["レモンケーキ", "1680", "1575"]),
        ];
        let candidates = detect_header_candidates(&grid);
        let top = &candidates[0];
        assert_eq!(top.column_map.product, Some(0));
        // 3 matches (2 labels + inferred product) / 3 labels, clamped
        assert_eq!(top.confidence, 1.0);
    }

    #[test]
    fn test_product_fallback_requires_text_majority() {
        let grid = vec![
            text_row(&["区分", "予定", "実績"]),
            text_row(&["A", "1820", "1726"]),
            text_row(&["100", "1400", "1433"]),
            text_row(&["200", "1680", "1575"]),
        ];
        let candidates = detect_header_candidates(&grid);
        assert_eq!(candidates[0].column_map.product, None);
        // 2 matches / 3 labels + figures bonus
        assert!((candidates[0].confidence - (2.0 / 3.0 + 0.2)).abs() < 1e-9);
    }

    #[test]
    fn test_product_fallback_samples_at_most_five_rows() {
        let mut grid = vec![text_row(&["区分", "予定", "実績"])];
        for _ in 0..5 {
            grid.push(text_row(&["10", "1", "2"]));
        }
        for _ in 0..10 {
            grid.push(text_row(&["品", "1", "2"]));
        }
        let candidates = detect_header_candidates(&grid);
        let header = candidates.iter().find(|c| c.row_index == 0).unwrap();
        assert_eq!(header.column_map.product, None);
    }

    #[test]
    fn test_product_fallback_ignores_blank_samples() {
        let grid = vec![
            text_row(&["区分", "予定"]),
            vec![Cell::Empty, Cell::from("1")],
            text_row(&["バターカレット", "2"]),
        ];
        let candidates = detect_header_candidates(&grid);
        assert_eq!(candidates[0].column_map.product, Some(0));
    }

    #[test]
    fn test_candidates_sorted_stable() {
        let grid = vec![
            text_row(&["foo", "bar"]),
            text_row(&["baz", "qux"]),
            text_row(&["商品名", "実績"]),
            text_row(&["x", "1"]),
        ];
        let candidates = detect_header_candidates(&grid);
        let order: Vec<usize> = candidates.iter().map(|c| c.row_index).collect();
        assert_eq!(order[0], 2);
        // rows 0 and 1 score the same and keep their order
        let tail: Vec<usize> = order.into_iter().filter(|r| *r != 2).collect();
        assert_eq!(tail, vec![0, 1]);
    }

    // -------------------------------------------------------------------------
    // MANUAL SELECTION
    // -------------------------------------------------------------------------

    #[test]
    fn test_manual_candidate_has_full_confidence_and_no_fallback() {
        let grid = vec![
            text_row(&["区分", "予定", "実績"]),
            text_row(&["フィナンシェ", "1820", "1726"]),
        ];
        let manual = manual_header_candidate(&grid, 0).unwrap();
        assert_eq!(manual.confidence, 1.0);
        assert_eq!(manual.column_map.product, None);
        assert_eq!(manual.column_map.target, Some(1));
    }

    #[test]
    fn test_manual_candidate_out_of_range() {
        let grid = vec![text_row(&["商品名", "実績"])];
        assert!(manual_header_candidate(&grid, 3).is_none());
    }
}
