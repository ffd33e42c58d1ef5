//! Audit summaries for crosswalk builds and per-file de-identification.
//!
//! Nothing in here affects results. The counts exist so a human can judge
//! output quality ("how many rows got no token") after a run.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which crosswalk subtable a source summary describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Token,
    Offset,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token => f.write_str("token"),
            Self::Offset => f.write_str("offset"),
        }
    }
}

/// Counts collected while reading one crosswalk subtable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub kind: SourceKind,
    /// Display name of the source (usually the file path).
    pub name: String,
    pub rows_read: usize,
    /// Fully identical rows removed before the integrity checks.
    pub exact_duplicates_removed: usize,
    /// Rows dropped because the identifier or value cell was empty.
    pub incomplete_rows_dropped: usize,
    pub entries: usize,
}

/// Summary of a crosswalk build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrosswalkSummary {
    pub token_source: Option<SourceSummary>,
    pub offset_source: Option<SourceSummary>,
    /// Identifiers present in only one subtable when both were supplied.
    pub dropped_by_join: usize,
    pub entries: usize,
    pub compare_numeric: bool,
}

/// Handling category of a configured column, without format details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    Remove,
    Blank,
    Date,
    DateTime,
    Epoch,
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Remove => "remove",
            Self::Blank => "blank",
            Self::Date => "date shift",
            Self::DateTime => "datetime shift",
            Self::Epoch => "epoch shift",
        };
        f.write_str(label)
    }
}

/// A configured column that the input header does not contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingColumn {
    pub column: String,
    pub role: RoleKind,
}

/// Outcome of de-identifying one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeidentifyReport {
    /// Display name of the input (usually the file path).
    pub source: String,
    pub rows: usize,
    /// Rows whose identifier had no crosswalk entry.
    pub unmatched_identifiers: usize,
    /// Per shift column: non-empty values that failed to parse.
    pub unparseable: BTreeMap<String, usize>,
    pub missing_columns: Vec<MissingColumn>,
    pub removed_columns: Vec<String>,
    pub blanked_columns: Vec<String>,
    pub shifted_columns: Vec<String>,
}

impl DeidentifyReport {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Total unparseable values across all shift columns.
    pub fn unparseable_count(&self) -> usize {
        self.unparseable.values().sum()
    }

    /// True when any recoverable condition was observed.
    pub fn has_warnings(&self) -> bool {
        self.unmatched_identifiers > 0
            || self.unparseable_count() > 0
            || !self.missing_columns.is_empty()
    }
}
