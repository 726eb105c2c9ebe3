//! Spreadsheet ingestion.
//!
//! An import runs in three steps, each owning the previous one's output:
//!
//! 1. [`ImportSession::open`] reads a sheet and offers header candidates.
//! 2. [`ImportSession::select_header`] auto-maps the chosen header row into a
//!    [`MappingSession`], whose mapping can be edited.
//! 3. [`MappingSession::commit`] normalizes the data rows into records.
//!
//! Nothing is written to the store here; the caller persists the batch.

pub mod header;
pub mod mapping;
pub mod normalize;
pub mod workbook;

pub use header::{detect_header_candidates, HeaderCandidate, DEFAULT_PREVIEW_ROWS};
pub use mapping::{
    normalize_header, split_sheet, ColumnAssignment, ColumnMapper, ColumnMapping, ColumnTarget,
    MappingOrigin,
};
pub use normalize::{normalize_row, normalize_rows};
pub use workbook::{
    reader_for_path, Cell, CsvWorkbookReader, RawRow, Sheet, SpreadsheetReader, WorkbookReader,
};

use tracing::info;

use crate::error::Result;
use crate::record::FlightRecord;

/// A sheet awaiting a header row choice.
#[derive(Debug, Clone)]
pub struct ImportSession {
    sheet: Sheet,
    candidates: Vec<HeaderCandidate>,
    mapper: ColumnMapper,
}

impl ImportSession {
    /// Start an import of one sheet, offering up to `preview_rows` candidates.
    ///
    /// # Errors
    ///
    /// Returns an error if the column mapper cannot be built.
    pub fn open(sheet: Sheet, preview_rows: usize) -> Result<Self> {
        let candidates = detect_header_candidates(&sheet.rows, preview_rows);
        Ok(Self {
            sheet,
            candidates,
            mapper: ColumnMapper::new()?,
        })
    }

    /// The sheet being imported.
    #[must_use]
    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    /// Rows that may be the header, first non-empty rows first.
    #[must_use]
    pub fn candidates(&self) -> &[HeaderCandidate] {
        &self.candidates
    }

    /// Choose the header row and auto-map its labels.
    ///
    /// Any row index is accepted, not only offered candidates.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::HeaderRowOutOfRange`] if the index is not a row.
    pub fn select_header(self, header_index: usize) -> Result<MappingSession> {
        let (headers, _) = split_sheet(&self.sheet.rows, header_index)?;
        let mapping = self.mapper.auto_map(&headers);
        Ok(MappingSession {
            sheet: self.sheet,
            header_index,
            mapping,
        })
    }
}

/// A sheet with a chosen header row and an editable mapping.
#[derive(Debug, Clone)]
pub struct MappingSession {
    sheet: Sheet,
    header_index: usize,
    mapping: ColumnMapping,
}

impl MappingSession {
    /// The current mapping.
    #[must_use]
    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Edit the mapping before commit.
    pub fn mapping_mut(&mut self) -> &mut ColumnMapping {
        &mut self.mapping
    }

    /// Index of the chosen header row.
    #[must_use]
    pub fn header_index(&self) -> usize {
        self.header_index
    }

    /// Number of rows below the header, blank rows included.
    #[must_use]
    pub fn data_row_count(&self) -> usize {
        self.sheet.rows.len().saturating_sub(self.header_index + 1)
    }

    /// Normalize every data row with the current mapping.
    #[must_use]
    pub fn commit(self) -> ImportBatch {
        let data = self.sheet.rows.get(self.header_index + 1..).unwrap_or(&[]);
        let records = normalize_rows(data, &self.mapping);
        let skipped_rows = data.len() - records.len();
        info!(
            sheet = %self.sheet.name,
            records = records.len(),
            skipped_rows,
            "Committed import mapping"
        );
        ImportBatch {
            sheet_name: self.sheet.name,
            header_index: self.header_index,
            records,
            skipped_rows,
        }
    }
}

/// Records produced by one committed import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportBatch {
    /// Name of the source sheet.
    pub sheet_name: String,
    /// Index of the header row used.
    pub header_index: usize,
    /// Normalized records in source order.
    pub records: Vec<FlightRecord>,
    /// Blank data rows that produced no record.
    pub skipped_rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CanonicalField;

    fn sheet() -> Sheet {
        let csv = "\
ARSENIO 004 FLIGHT LOG,,,
,,,
S/N,MISSION DATE,FLIGHT ID,BATTERY 1 (3S) TAKE-OFF VOLTAGE
1,2025-03-10,F1,12.32
,,,
2,2025-03-12,F2,12.30
";
        CsvWorkbookReader::new()
            .read_sheet("ARSENIO 004", csv.as_bytes())
            .unwrap()
    }

    #[test]
    fn test_session_flow() {
        let session = ImportSession::open(sheet(), DEFAULT_PREVIEW_ROWS).unwrap();
        let indices: Vec<_> = session.candidates().iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 2, 3, 5]);

        let mapping = session.select_header(2).unwrap();
        assert_eq!(mapping.data_row_count(), 3);
        assert_eq!(
            mapping.mapping().target(3),
            ColumnTarget::Field(CanonicalField::Battery1Takeoff)
        );

        let batch = mapping.commit();
        assert_eq!(batch.sheet_name, "ARSENIO 004");
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.skipped_rows, 1);
        assert_eq!(batch.records[1].flight_id.as_deref(), Some("F2"));
        assert_eq!(batch.records[0].battery1.takeoff, Some(12.32));
    }

    #[test]
    fn test_mapping_edits_apply_at_commit() {
        let mut mapping = ImportSession::open(sheet(), 5)
            .unwrap()
            .select_header(2)
            .unwrap();
        mapping
            .mapping_mut()
            .apply_override("S/N=comment")
            .unwrap();
        let batch = mapping.commit();
        assert_eq!(batch.records[0].comment.as_deref(), Some("1"));
    }

    #[test]
    fn test_header_out_of_range() {
        let session = ImportSession::open(sheet(), 5).unwrap();
        assert!(session.select_header(99).is_err());
    }

    #[test]
    fn test_last_row_as_header_yields_empty_batch() {
        let batch = ImportSession::open(sheet(), 5)
            .unwrap()
            .select_header(5)
            .unwrap()
            .commit();
        assert!(batch.records.is_empty());
        assert_eq!(batch.skipped_rows, 0);
    }
}
