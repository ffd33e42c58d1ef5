//! The immutable crosswalk value.

use std::collections::HashMap;

use polars::prelude::{Column, DataFrame, PolarsResult};
use sha2::{Digest, Sha256};

use deid_common::text_column;
use deid_model::{
    CrosswalkSummary, DAY_OFFSET_COLUMN, IDENTIFIER_COLUMN, IdentifierMode, TOKEN_COLUMN,
    canonicalize_identifier,
};

/// One resolved identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrosswalkEntry {
    /// Canonical identifier (see [`IdentifierMode`]).
    pub identifier: String,
    pub token: Option<String>,
    /// Signed number of days to shift this patient's timestamps by.
    pub day_offset: Option<i64>,
}

/// Identifier → (token, day offset) mapping.
///
/// Constructed only through [`crate::CrosswalkBuilder`]; never mutated
/// afterwards, so one value can be shared by any number of de-identification
/// passes.
#[derive(Debug, Clone)]
pub struct Crosswalk {
    entries: Vec<CrosswalkEntry>,
    index: HashMap<String, usize>,
    mode: IdentifierMode,
    has_tokens: bool,
    has_offsets: bool,
    summary: CrosswalkSummary,
}

impl Crosswalk {
    pub(crate) fn new(
        entries: Vec<CrosswalkEntry>,
        mode: IdentifierMode,
        has_tokens: bool,
        has_offsets: bool,
        summary: CrosswalkSummary,
    ) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.identifier.clone(), idx))
            .collect();
        Self {
            entries,
            index,
            mode,
            has_tokens,
            has_offsets,
            summary,
        }
    }

    /// Looks up an already-canonical identifier.
    pub fn lookup(&self, identifier: &str) -> Option<&CrosswalkEntry> {
        self.index.get(identifier).map(|&idx| &self.entries[idx])
    }

    /// Canonicalizes a raw cell under this crosswalk's mode, then looks it up.
    pub fn resolve(&self, raw: &str) -> Option<&CrosswalkEntry> {
        let key = canonicalize_identifier(raw, self.mode)?;
        self.lookup(&key)
    }

    /// Entries sorted by identifier.
    pub fn entries(&self) -> &[CrosswalkEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether identifiers were keyed by canonical numeric value.
    ///
    /// Input tables must be looked up under the same convention.
    pub fn compare_numeric(&self) -> bool {
        self.mode.is_numeric()
    }

    /// True when a token source was supplied.
    pub fn has_tokens(&self) -> bool {
        self.has_tokens
    }

    /// True when an offset source was supplied.
    pub fn has_offsets(&self) -> bool {
        self.has_offsets
    }

    pub fn summary(&self) -> &CrosswalkSummary {
        &self.summary
    }

    /// SHA-256 over the canonical entries, as lowercase hex.
    ///
    /// Two crosswalks with the same mode and the same entries always share a
    /// fingerprint, whatever the row order or padding of their sources.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        let mode: &[u8] = if self.mode.is_numeric() {
            b"numeric\n"
        } else {
            b"exact\n"
        };
        hasher.update(mode);
        for entry in &self.entries {
            hasher.update(entry.identifier.as_bytes());
            hasher.update([0u8]);
            if let Some(token) = &entry.token {
                hasher.update(token.as_bytes());
            }
            hasher.update([0u8]);
            if let Some(offset) = entry.day_offset {
                hasher.update(offset.to_string().as_bytes());
            }
            hasher.update([b'\n']);
        }
        hex::encode(hasher.finalize())
    }

    /// The crosswalk as a DataFrame with the internal column names
    /// `identifier`, `token` and `day_offset` (components that were not
    /// supplied are omitted).
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let mut columns = vec![text_column(
            IDENTIFIER_COLUMN,
            self.entries
                .iter()
                .map(|entry| Some(entry.identifier.clone()))
                .collect(),
        )];
        if self.has_tokens {
            columns.push(text_column(
                TOKEN_COLUMN,
                self.entries.iter().map(|entry| entry.token.clone()).collect(),
            ));
        }
        if self.has_offsets {
            let offsets: Vec<Option<i64>> =
                self.entries.iter().map(|entry| entry.day_offset).collect();
            columns.push(Column::new(DAY_OFFSET_COLUMN.into(), offsets));
        }
        DataFrame::new(columns)
    }
}
