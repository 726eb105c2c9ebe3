//! Raw spreadsheet content.
//!
//! A [`WorkbookReader`] turns a file into named sheets of untyped rows. The
//! rows are ragged: nothing here assumes a header or a fixed width.
//!
//! Delimited text is read by [`CsvWorkbookReader`]; Excel and OpenDocument
//! workbooks by [`SpreadsheetReader`]. [`reader_for_path`] picks one by file
//! extension.

use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

/// A single untyped cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Nothing, or only whitespace.
    Empty,
    /// Text as typed.
    Text(String),
    /// A value the workbook stored as a number, dates and times included.
    Number(f64),
}

impl Cell {
    /// Classify a raw string cell.
    ///
    /// Blank strings are [`Cell::Empty`]; anything else is [`Cell::Text`],
    /// trimmed. Text is never read as a number here: `007` and `0954` must
    /// survive as typed for text and time fields.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self::Empty
        } else {
            Self::Text(trimmed.to_string())
        }
    }

    /// Whether the cell's trimmed string form is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// The trimmed string form of the cell.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(raw: &str) -> Self {
        Self::from_raw(raw)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// An ordered row of cells with no schema.
pub type RawRow = Vec<Cell>;

/// One sheet of a workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    /// Sheet name; usually identifies the airframe.
    pub name: String,
    /// Every row in file order, including blank ones.
    pub rows: Vec<RawRow>,
}

impl Sheet {
    /// Create a sheet.
    #[must_use]
    pub fn new(name: impl Into<String>, rows: Vec<RawRow>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// Decodes a workbook file into raw sheets.
///
/// Implementors do no interpretation of the content: header detection and
/// typing happen downstream.
pub trait WorkbookReader {
    /// The name of this reader (for logging/debugging).
    fn name(&self) -> &'static str;

    /// Read every sheet of the workbook at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or decoded.
    fn read(&self, path: &Path) -> Result<Vec<Sheet>>;
}

/// Reads a delimited text file as a single sheet named after the file stem.
#[derive(Debug, Clone, Copy)]
pub struct CsvWorkbookReader {
    delimiter: u8,
}

impl Default for CsvWorkbookReader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvWorkbookReader {
    /// Create a comma-delimited reader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different field delimiter, e.g. `b';'` or `b'\t'`.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read one sheet from any byte source.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be decoded.
    pub fn read_sheet<R: Read>(&self, name: impl Into<String>, source: R) -> Result<Sheet> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(source);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(Cell::from_raw).collect());
        }
        Ok(Sheet::new(name, rows))
    }
}

impl WorkbookReader for CsvWorkbookReader {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn read(&self, path: &Path) -> Result<Vec<Sheet>> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::workbook_read(path, e.to_string()))?;
        let name = path
            .file_stem()
            .map_or_else(|| "Sheet1".to_string(), |s| s.to_string_lossy().into_owned());

        let sheet = self
            .read_sheet(name, file)
            .map_err(|e| Error::workbook_read(path, e.to_string()))?;
        debug!(path = %path.display(), rows = sheet.rows.len(), "Read CSV sheet");
        Ok(vec![sheet])
    }
}

/// File extensions read as workbooks rather than delimited text.
pub const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Reads every sheet of an Excel or OpenDocument workbook, in workbook order.
///
/// Cells keep the workbook's own typing: numbers, dates and times arrive as
/// [`Cell::Number`] (dates and times as serial days), strings as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetReader;

impl SpreadsheetReader {
    /// Create a workbook reader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl WorkbookReader for SpreadsheetReader {
    fn name(&self) -> &'static str {
        "spreadsheet"
    }

    fn read(&self, path: &Path) -> Result<Vec<Sheet>> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| Error::workbook_read(path, e.to_string()))?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| Error::workbook_read(path, format!("sheet '{name}': {e}")))?;

            // Ranges start at the first used cell; pad back to A1 so row
            // indices match what the operator sees.
            let (top, left) = range.start().unwrap_or((0, 0));
            let mut rows: Vec<RawRow> = (0..top).map(|_| Vec::new()).collect();
            for row in range.rows() {
                let mut cells: RawRow = (0..left).map(|_| Cell::Empty).collect();
                cells.extend(row.iter().map(cell_from_data));
                rows.push(cells);
            }
            debug!(sheet = %name, rows = rows.len(), "Read workbook sheet");
            sheets.push(Sheet::new(name, rows));
        }
        Ok(sheets)
    }
}

/// Convert one workbook cell.
#[allow(clippy::cast_precision_loss)]
fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(n) => Cell::from(*n as f64),
        Data::Float(n) => Cell::from(*n),
        Data::DateTime(dt) => Cell::from(dt.as_f64()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from_raw(s),
    }
}

/// Pick a reader for `path` by extension; anything not a known workbook
/// format is read as delimited text with `delimiter`.
#[must_use]
pub fn reader_for_path(path: &Path, delimiter: u8) -> Box<dyn WorkbookReader> {
    let is_spreadsheet = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SPREADSHEET_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        });
    if is_spreadsheet {
        Box::new(SpreadsheetReader::new())
    } else {
        Box::new(CsvWorkbookReader::new().with_delimiter(delimiter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cell_from_raw() {
        assert_eq!(Cell::from_raw(""), Cell::Empty);
        assert_eq!(Cell::from_raw("   "), Cell::Empty);
        assert_eq!(Cell::from_raw("12.32"), Cell::Text("12.32".to_string()));
        assert_eq!(Cell::from_raw(" 007 "), Cell::Text("007".to_string()));
        assert_eq!(
            Cell::from_raw(" 2025-03-10 "),
            Cell::Text("2025-03-10".to_string())
        );
    }

    #[test]
    fn test_cell_as_text() {
        assert_eq!(Cell::Number(1.0).as_text(), "1");
        assert_eq!(Cell::Number(12.5).as_text(), "12.5");
        assert_eq!(Cell::Text(" a ".to_string()).as_text(), "a");
        assert!(Cell::Empty.as_text().is_empty());
    }

    #[test]
    fn test_read_sheet_keeps_ragged_and_blank_rows() {
        let data = ",,\nS/N,DATE,ID\n1,2025-01-01,F1,extra\n";
        let sheet = CsvWorkbookReader::new()
            .read_sheet("ARSENIO 004", data.as_bytes())
            .unwrap();

        assert_eq!(sheet.name, "ARSENIO 004");
        assert_eq!(sheet.rows.len(), 3);
        assert!(sheet.rows[0].iter().all(Cell::is_empty));
        assert_eq!(sheet.rows[2].len(), 4);
        assert_eq!(sheet.rows[2][0], Cell::from("1"));
    }

    #[test]
    fn test_read_sheet_with_delimiter() {
        let data = "a;b\n1;2\n";
        let sheet = CsvWorkbookReader::new()
            .with_delimiter(b';')
            .read_sheet("s", data.as_bytes())
            .unwrap();
        assert_eq!(sheet.rows[0], vec![Cell::from("a"), Cell::from("b")]);
    }

    #[test]
    fn test_read_uses_file_stem_as_sheet_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Arsenio 004.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "DRONE MODEL,FLIGHT ID").unwrap();
        writeln!(file, "Arsenio 004,F1").unwrap();

        let sheets = CsvWorkbookReader::new().read(&path).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "Arsenio 004");
        assert_eq!(sheets[0].rows.len(), 2);
    }

    #[test]
    fn test_read_missing_file_is_workbook_error() {
        let err = CsvWorkbookReader::new()
            .read(Path::new("/nonexistent/flights.csv"))
            .unwrap_err();
        assert!(matches!(err, Error::WorkbookRead { .. }));
    }

    #[test]
    fn test_reader_for_path_dispatches_on_extension() {
        assert_eq!(reader_for_path(Path::new("march.xlsx"), b',').name(), "spreadsheet");
        assert_eq!(reader_for_path(Path::new("OLD.XLS"), b',').name(), "spreadsheet");
        assert_eq!(reader_for_path(Path::new("march.ods"), b',').name(), "spreadsheet");
        assert_eq!(reader_for_path(Path::new("march.csv"), b',').name(), "csv");
        assert_eq!(reader_for_path(Path::new("march.tsv"), b'\t').name(), "csv");
        assert_eq!(reader_for_path(Path::new("march"), b',').name(), "csv");
    }

    #[test]
    fn test_workbook_cells_keep_their_types() {
        assert_eq!(cell_from_data(&Data::Empty), Cell::Empty);
        assert_eq!(cell_from_data(&Data::Int(7)), Cell::Number(7.0));
        assert_eq!(cell_from_data(&Data::Float(12.32)), Cell::Number(12.32));
        assert_eq!(
            cell_from_data(&Data::String(" 007 ".to_string())),
            Cell::Text("007".to_string())
        );
        assert_eq!(
            cell_from_data(&Data::String("   ".to_string())),
            Cell::Empty
        );
        assert_eq!(
            cell_from_data(&Data::Bool(true)),
            Cell::Text("true".to_string())
        );
    }

    #[test]
    fn test_spreadsheet_read_rejects_non_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flights.xlsx");
        std::fs::write(&path, "not a zip archive").unwrap();

        let err = SpreadsheetReader::new().read(&path).unwrap_err();
        assert!(matches!(err, Error::WorkbookRead { .. }));
    }
}
