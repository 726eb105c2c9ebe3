//! Column-to-field mapping.
//!
//! Header labels are normalized and matched exactly against the canonical
//! catalogue, then against the labels field sheets actually use (battery
//! columns carry the pack size, `BATTERY 1 (3S) TAKE-OFF VOLTAGE`). Anything
//! else is ignored. The resulting mapping is positional and may be edited
//! before it is committed.

use std::str::FromStr;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::workbook::{Cell, RawRow};
use crate::error::{Error, Result};
use crate::record::CanonicalField;

/// Battery columns with or without a pack size, e.g. `BATTERY 2 (12S) VOLTAGE USED`.
const BATTERY_ALIAS_PATTERN: &str =
    r"^BATTERY ([12])(?: \(\d*S\))? (TAKE-?OFF VOLTAGE|LANDING VOLTAGE|VOLTAGE USED)$";

/// Bookkeeping columns that are recognised but never imported.
const IGNORED_PATTERN: &str = r"^(S/N|SN|S\.N\.?|NO\.?)$|\bQTY$";

/// Normalize a header label: trim, collapse internal whitespace, upper-case.
#[must_use]
pub fn normalize_header(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Where a source column's values go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnTarget {
    /// Into a canonical field.
    Field(CanonicalField),
    /// Nowhere.
    Ignored,
}

impl FromStr for ColumnTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if ["ignore", "ignored", "-", "none"]
            .iter()
            .any(|w| trimmed.eq_ignore_ascii_case(w))
        {
            return Ok(Self::Ignored);
        }
        CanonicalField::parse(trimmed)
            .map(Self::Field)
            .ok_or_else(|| Error::UnknownField {
                name: trimmed.to_string(),
            })
    }
}

impl std::fmt::Display for ColumnTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field(field) => write!(f, "{field}"),
            Self::Ignored => write!(f, "(ignored)"),
        }
    }
}

/// How a column's target was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingOrigin {
    /// Header equals a canonical name.
    Exact,
    /// Header matched a known sheet label for a canonical field.
    Alias,
    /// Header is a known bookkeeping column.
    KnownIgnored,
    /// Nothing matched.
    Unmatched,
    /// Set by the operator.
    Manual,
}

impl std::fmt::Display for MappingOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Exact => "exact",
            Self::Alias => "alias",
            Self::KnownIgnored => "known ignored",
            Self::Unmatched => "unmatched",
            Self::Manual => "manual",
        };
        f.write_str(s)
    }
}

/// One source column and its target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnAssignment {
    /// Zero-based column position.
    pub position: usize,
    /// Normalized header label.
    pub header: String,
    /// Where the column's values go.
    pub target: ColumnTarget,
    /// How the target was decided.
    pub origin: MappingOrigin,
}

/// A positional mapping from source columns to canonical fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnMapping {
    columns: Vec<ColumnAssignment>,
}

impl ColumnMapping {
    /// Every column in position order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnAssignment] {
        &self.columns
    }

    /// Number of source columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the header row had no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Target of a column; columns past the header width are ignored.
    #[must_use]
    pub fn target(&self, position: usize) -> ColumnTarget {
        self.columns
            .get(position)
            .map_or(ColumnTarget::Ignored, |c| c.target)
    }

    /// Canonical fields that at least one column feeds.
    #[must_use]
    pub fn mapped_fields(&self) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|field| {
                self.columns
                    .iter()
                    .any(|c| c.target == ColumnTarget::Field(*field))
            })
            .collect()
    }

    /// Override the target of one column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownColumn`] if `position` is past the header width.
    pub fn set(&mut self, position: usize, target: ColumnTarget) -> Result<()> {
        let column = self
            .columns
            .get_mut(position)
            .ok_or_else(|| Error::UnknownColumn {
                name: position.to_string(),
            })?;
        column.target = target;
        column.origin = MappingOrigin::Manual;
        Ok(())
    }

    /// Resolve a column reference: a zero-based position or a header label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownColumn`] if nothing matches.
    pub fn resolve_column(&self, reference: &str) -> Result<usize> {
        if let Ok(position) = reference.trim().parse::<usize>() {
            if position < self.columns.len() {
                return Ok(position);
            }
        }
        let wanted = normalize_header(reference);
        self.columns
            .iter()
            .find(|c| c.header == wanted)
            .map(|c| c.position)
            .ok_or_else(|| Error::UnknownColumn {
                name: reference.to_string(),
            })
    }

    /// Apply an override written as `COLUMN=FIELD`.
    ///
    /// `COLUMN` is a position or header label; `FIELD` is a canonical name,
    /// column name, or `ignore`.
    ///
    /// # Errors
    ///
    /// Returns an error if the override is malformed or either side fails to
    /// resolve.
    pub fn apply_override(&mut self, rule: &str) -> Result<()> {
        let (column, field) = rule.rsplit_once('=').ok_or_else(|| Error::UnknownColumn {
            name: rule.to_string(),
        })?;
        let position = self.resolve_column(column)?;
        let target = field.parse::<ColumnTarget>()?;
        debug!(position, %target, "Column mapping override");
        self.set(position, target)
    }
}

/// Builds automatic column mappings.
#[derive(Debug, Clone)]
pub struct ColumnMapper {
    canonical: Vec<(String, CanonicalField)>,
    battery_alias: Regex,
    ignored: Regex,
}

impl ColumnMapper {
    /// Create a mapper over the canonical catalogue.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in label pattern fails to compile.
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::internal(format!("header pattern: {e}")))
        };
        Ok(Self {
            canonical: CanonicalField::ALL
                .into_iter()
                .map(|field| (normalize_header(field.name()), field))
                .collect(),
            battery_alias: compile(BATTERY_ALIAS_PATTERN)?,
            ignored: compile(IGNORED_PATTERN)?,
        })
    }

    /// Decide the target of a single header label.
    #[must_use]
    pub fn classify(&self, label: &str) -> (ColumnTarget, MappingOrigin) {
        let header = normalize_header(label);
        if let Some((_, field)) = self.canonical.iter().find(|(name, _)| *name == header) {
            return (ColumnTarget::Field(*field), MappingOrigin::Exact);
        }
        if let Some(field) = self.battery_field(&header) {
            return (ColumnTarget::Field(field), MappingOrigin::Alias);
        }
        if self.ignored.is_match(&header) {
            return (ColumnTarget::Ignored, MappingOrigin::KnownIgnored);
        }
        (ColumnTarget::Ignored, MappingOrigin::Unmatched)
    }

    fn battery_field(&self, header: &str) -> Option<CanonicalField> {
        let caps = self.battery_alias.captures(header)?;
        let slot = caps.get(1)?.as_str();
        let reading = caps.get(2)?.as_str();
        let field = match (slot, reading) {
            ("1", "LANDING VOLTAGE") => CanonicalField::Battery1Landing,
            ("1", "VOLTAGE USED") => CanonicalField::Battery1Used,
            ("1", _) => CanonicalField::Battery1Takeoff,
            ("2", "LANDING VOLTAGE") => CanonicalField::Battery2Landing,
            ("2", "VOLTAGE USED") => CanonicalField::Battery2Used,
            _ => CanonicalField::Battery2Takeoff,
        };
        Some(field)
    }

    /// Map every header label by position.
    #[must_use]
    pub fn auto_map(&self, headers: &[String]) -> ColumnMapping {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(position, label)| {
                let (target, origin) = self.classify(label);
                ColumnAssignment {
                    position,
                    header: normalize_header(label),
                    target,
                    origin,
                }
            })
            .collect::<Vec<_>>();
        debug!(
            columns = columns.len(),
            mapped = columns
                .iter()
                .filter(|c| c.target != ColumnTarget::Ignored)
                .count(),
            "Auto-mapped header row"
        );
        ColumnMapping { columns }
    }
}

/// Split a sheet at the chosen header row.
///
/// Returns the header labels and every row after the header.
///
/// # Errors
///
/// Returns [`Error::HeaderRowOutOfRange`] if `header_index` is not a row.
pub fn split_sheet(rows: &[RawRow], header_index: usize) -> Result<(Vec<String>, &[RawRow])> {
    let header = rows.get(header_index).ok_or(Error::HeaderRowOutOfRange {
        index: header_index,
        rows: rows.len(),
    })?;
    let labels = header.iter().map(Cell::as_text).collect();
    Ok((labels, &rows[header_index + 1..]))
}
