//! Header row candidates.
//!
//! Exports often carry title rows or blank padding above the real header.
//! Rather than guess, the first few non-empty rows are offered and the
//! operator picks one.

use serde::Serialize;

use super::workbook::{Cell, RawRow};

/// Default number of candidate rows offered.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// A row that could be the header, with its position in the sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderCandidate {
    /// Zero-based row index in the sheet.
    pub index: usize,
    /// Trimmed string form of each cell.
    pub cells: Vec<String>,
}

/// The first `limit` rows containing at least one non-empty cell.
#[must_use]
pub fn detect_header_candidates(rows: &[RawRow], limit: usize) -> Vec<HeaderCandidate> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|cell| !cell.is_empty()))
        .take(limit)
        .map(|(index, row)| HeaderCandidate {
            index,
            cells: row.iter().map(Cell::as_text).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> RawRow {
        cells.iter().map(|c| Cell::from_raw(c)).collect()
    }

    #[test]
    fn test_skips_blank_rows_and_keeps_indices() {
        let rows = vec![
            row(&["", "", ""]),
            row(&["S/N", "DATE", "ID"]),
            vec![Cell::Number(1.0), Cell::from("2025-01-01"), Cell::from("F1")],
        ];
        let candidates = detect_header_candidates(&rows, DEFAULT_PREVIEW_ROWS);
        let indices: Vec<_> = candidates.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(candidates[0].cells, vec!["S/N", "DATE", "ID"]);
        assert_eq!(candidates[1].cells[0], "1");
    }

    #[test]
    fn test_limit_applies_after_filtering() {
        let mut rows = vec![row(&[""])];
        for i in 0..10 {
            rows.push(row(&[&format!("r{i}")]));
        }
        let candidates = detect_header_candidates(&rows, 5);
        assert_eq!(candidates.len(), 5);
        assert_eq!(candidates[0].index, 1);
        assert_eq!(candidates[4].index, 5);
    }

    #[test]
    fn test_whitespace_only_row_is_empty() {
        let rows = vec![vec![Cell::Text("  ".to_string())], row(&["x"])];
        let candidates = detect_header_candidates(&rows, 5);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].index, 1);
    }

    #[test]
    fn test_empty_sheet_has_no_candidates() {
        assert!(detect_header_candidates(&[], 5).is_empty());
    }
}
