//! Building and validating a crosswalk from its source tables.
//!
//! Each source is reduced to `canonical identifier → value` independently:
//!
//! 1. identifier and value are read as text;
//! 2. identifiers are canonicalized (exact text or numeric);
//! 3. fully identical rows are dropped (re-extraction duplicates);
//! 4. an identifier that still repeats with a different value is fatal;
//! 5. for the token source, a token shared by two identifiers is fatal.
//!
//! With both sources present the results are inner-joined on identifier, so
//! only identifiers that resolve to a token AND an offset survive.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::path::Path;

use polars::prelude::DataFrame;
use tracing::{debug, info, warn};

use deid_common::{column_texts, parse_f64, parse_i64};
use deid_ingest::{Separator, read_crosswalk_source};
use deid_model::{
    CrosswalkSummary, DeidError, IdentifierMode, Result, SourceKind, SourceSummary,
    canonicalize_identifier, identifier_order,
};

use crate::crosswalk::{Crosswalk, CrosswalkEntry};

/// One crosswalk source table plus the names of its two relevant columns.
#[derive(Debug, Clone)]
pub struct CrosswalkSource {
    /// Display name used in diagnostics and errors (usually the file path).
    pub name: String,
    pub frame: DataFrame,
    pub identifier_column: String,
    pub value_column: String,
}

impl CrosswalkSource {
    pub fn new(
        name: impl Into<String>,
        frame: DataFrame,
        identifier_column: impl Into<String>,
        value_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            frame,
            identifier_column: identifier_column.into(),
            value_column: value_column.into(),
        }
    }

    /// Loads a source from a delimited file, reading both columns as text.
    pub fn from_file(
        path: &Path,
        separator: Separator,
        identifier_column: &str,
        value_column: &str,
    ) -> Result<Self> {
        let frame = read_crosswalk_source(path, separator, identifier_column, value_column)?;
        Ok(Self::new(
            path.display().to_string(),
            frame,
            identifier_column,
            value_column,
        ))
    }
}

/// Builder for [`Crosswalk`].
#[derive(Debug, Clone, Default)]
pub struct CrosswalkBuilder {
    token_source: Option<CrosswalkSource>,
    offset_source: Option<CrosswalkSource>,
    compare_numeric: bool,
}

impl CrosswalkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier ↔ token source.
    pub fn with_token_source(mut self, source: CrosswalkSource) -> Self {
        self.token_source = Some(source);
        self
    }

    /// Set the identifier ↔ day-offset source.
    pub fn with_offset_source(mut self, source: CrosswalkSource) -> Self {
        self.offset_source = Some(source);
        self
    }

    /// Key identifiers by canonical numeric value instead of exact text.
    pub fn compare_numeric(mut self, enable: bool) -> Self {
        self.compare_numeric = enable;
        self
    }

    pub fn build(self) -> Result<Crosswalk> {
        build_crosswalk(
            self.token_source.as_ref(),
            self.offset_source.as_ref(),
            self.compare_numeric,
        )
    }
}

/// Builds a crosswalk from a token source, an offset source, or both.
///
/// # Errors
///
/// - [`DeidError::Configuration`] when neither source is supplied
/// - [`DeidError::ColumnNotFound`] when a configured column is absent
/// - [`DeidError::DuplicateIdentifier`] / [`DeidError::DuplicateToken`] when
///   the result would not be 1-to-1
/// - [`DeidError::InvalidValue`] for a day offset that is not an integer
pub fn build_crosswalk(
    token_source: Option<&CrosswalkSource>,
    offset_source: Option<&CrosswalkSource>,
    compare_numeric: bool,
) -> Result<Crosswalk> {
    if token_source.is_none() && offset_source.is_none() {
        return Err(DeidError::configuration(
            "at least one crosswalk source (token or day offset) is required",
        ));
    }
    let mode = IdentifierMode::from_compare_numeric(compare_numeric);

    let tokens = token_source
        .map(|source| {
            let (map, summary) = prepare_subtable(source, SourceKind::Token, mode, |value| {
                Ok(value.to_string())
            })?;
            check_unique_tokens(&map, &source.name)?;
            Ok::<_, DeidError>((map, summary))
        })
        .transpose()?;
    let offsets = offset_source
        .map(|source| {
            prepare_subtable(source, SourceKind::Offset, mode, |value| {
                parse_day_offset(value).ok_or_else(|| DeidError::InvalidValue {
                    field: source.value_column.clone(),
                    value: value.to_string(),
                    table: source.name.clone(),
                })
            })
        })
        .transpose()?;

    let has_tokens = tokens.is_some();
    let has_offsets = offsets.is_some();
    let mut dropped_by_join = 0usize;
    let mut entries: Vec<CrosswalkEntry> = match (&tokens, &offsets) {
        (Some((token_map, _)), Some((offset_map, _))) => {
            dropped_by_join += offset_map
                .keys()
                .filter(|id| !token_map.contains_key(*id))
                .count();
            token_map
                .iter()
                .filter_map(|(identifier, token)| match offset_map.get(identifier) {
                    Some(offset) => Some(CrosswalkEntry {
                        identifier: identifier.clone(),
                        token: Some(token.clone()),
                        day_offset: Some(*offset),
                    }),
                    None => {
                        dropped_by_join += 1;
                        None
                    }
                })
                .collect()
        }
        (Some((token_map, _)), None) => token_map
            .iter()
            .map(|(identifier, token)| CrosswalkEntry {
                identifier: identifier.clone(),
                token: Some(token.clone()),
                day_offset: None,
            })
            .collect(),
        (None, Some((offset_map, _))) => offset_map
            .iter()
            .map(|(identifier, offset)| CrosswalkEntry {
                identifier: identifier.clone(),
                token: None,
                day_offset: Some(*offset),
            })
            .collect(),
        (None, None) => Vec::new(),
    };
    entries.sort_by(|a, b| identifier_order(&a.identifier, &b.identifier, mode));

    if dropped_by_join > 0 {
        debug!(
            dropped_by_join,
            "identifiers present in only one crosswalk source were dropped"
        );
    }
    let summary = CrosswalkSummary {
        token_source: tokens.map(|(_, summary)| summary),
        offset_source: offsets.map(|(_, summary)| summary),
        dropped_by_join,
        entries: entries.len(),
        compare_numeric,
    };
    info!(
        entries = entries.len(),
        compare_numeric,
        has_tokens,
        has_offsets,
        "crosswalk built"
    );
    Ok(Crosswalk::new(entries, mode, has_tokens, has_offsets, summary))
}

/// Parses a day offset stored as text.
///
/// Accepts plain integers and integral decimals such as `"4.0"` (offsets
/// that were round-tripped through a float). Surrounding quotes and
/// whitespace are ignored.
pub fn parse_day_offset(value: &str) -> Option<i64> {
    let unquoted = value.trim().trim_matches('"').trim();
    if let Some(offset) = parse_i64(unquoted) {
        return Some(offset);
    }
    let float = parse_f64(unquoted)?;
    if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}

/// Reduces one source table to `canonical identifier → value`.
fn prepare_subtable<V, F>(
    source: &CrosswalkSource,
    kind: SourceKind,
    mode: IdentifierMode,
    parse_value: F,
) -> Result<(BTreeMap<String, V>, SourceSummary)>
where
    V: Clone + PartialEq + Display,
    F: Fn(&str) -> Result<V>,
{
    for column in [&source.identifier_column, &source.value_column] {
        if source.frame.column(column).is_err() {
            return Err(DeidError::column_not_found(column.as_str(), source.name.as_str()));
        }
    }
    let identifiers = column_texts(&source.frame, &source.identifier_column)?;
    let values = column_texts(&source.frame, &source.value_column)?;

    let mut map: BTreeMap<String, V> = BTreeMap::new();
    let mut incomplete = 0usize;
    let mut exact_duplicates = 0usize;
    for (raw_id, raw_value) in identifiers.iter().zip(values.iter()) {
        let identifier = raw_id
            .as_deref()
            .and_then(|id| canonicalize_identifier(id, mode));
        let value = raw_value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let (Some(identifier), Some(value)) = (identifier, value) else {
            incomplete += 1;
            continue;
        };
        let value = parse_value(value)?;
        match map.get(&identifier) {
            Some(existing) if *existing == value => exact_duplicates += 1,
            Some(existing) => {
                return Err(DeidError::DuplicateIdentifier {
                    identifier,
                    table: source.name.clone(),
                    first: existing.to_string(),
                    second: value.to_string(),
                });
            }
            None => {
                map.insert(identifier, value);
            }
        }
    }

    if exact_duplicates > 0 {
        warn!(
            source = %source.name,
            kind = %kind,
            removed = exact_duplicates,
            "removed fully duplicated crosswalk rows"
        );
    }
    if incomplete > 0 {
        warn!(
            source = %source.name,
            kind = %kind,
            dropped = incomplete,
            "dropped crosswalk rows with an empty identifier or value"
        );
    }
    let summary = SourceSummary {
        kind,
        name: source.name.clone(),
        rows_read: identifiers.len(),
        exact_duplicates_removed: exact_duplicates,
        incomplete_rows_dropped: incomplete,
        entries: map.len(),
    };
    debug!(
        source = %source.name,
        kind = %kind,
        rows_read = summary.rows_read,
        entries = summary.entries,
        "prepared crosswalk source"
    );
    Ok((map, summary))
}

fn check_unique_tokens(map: &BTreeMap<String, String>, table: &str) -> Result<()> {
    let mut owners: HashMap<&str, &str> = HashMap::with_capacity(map.len());
    for (identifier, token) in map {
        if let Some(first) = owners.insert(token.as_str(), identifier.as_str()) {
            return Err(DeidError::DuplicateToken {
                token: token.clone(),
                table: table.to_string(),
                first: first.to_string(),
                second: identifier.clone(),
            });
        }
    }
    Ok(())
}
