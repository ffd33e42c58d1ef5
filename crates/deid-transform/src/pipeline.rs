//! The table de-identification pipeline.
//!
//! Steps run in a fixed order:
//!
//! 1. Check the crosswalk has what the configuration needs.
//! 2. Check the identifier column is present; warn about other absent columns.
//! 3. Read (or take) every retained column as text; removed columns are
//!    never materialized when reading from a file.
//! 4. Blank configured columns.
//! 5. Resolve each row's identifier against the crosswalk once.
//! 6. Shift date, datetime and epoch columns using the offsets of that
//!    resolution.
//! 7. Replace the identifier with the token of that same resolution.
//!
//! Steps 6 and 7 read one shared match vector built from the original
//! identifiers, so substitution can never leak into the offset lookup.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;

use polars::prelude::{Column, DataFrame};
use tracing::{debug, info, info_span, warn};

use deid_crosswalk::Crosswalk;
use deid_ingest::{read_csv_headers, read_text_table};
use deid_model::{DeidError, DeidentifyReport, MissingColumn, Result, RoleKind};

use crate::config::{ColumnRole, DeidentifyConfig};
use crate::executors::{
    blank_column, match_identifiers, shift_date_column, shift_datetime_column,
    shift_epoch_column, substitute_tokens,
};

/// A de-identified table together with its run report.
#[derive(Debug, Clone)]
pub struct Deidentified {
    pub frame: DataFrame,
    pub report: DeidentifyReport,
}

/// De-identifies one delimited file.
///
/// Removed columns are excluded from the read projection, so their values
/// never enter memory.
///
/// # Errors
///
/// - [`DeidError::Configuration`] when the crosswalk lacks tokens, or lacks
///   offsets while shift columns are configured
/// - [`DeidError::ColumnNotFound`] when the identifier column is absent
/// - [`DeidError::Ingest`] when the file cannot be read
pub fn deidentify_file(
    path: &Path,
    config: &DeidentifyConfig,
    crosswalk: &Crosswalk,
) -> Result<Deidentified> {
    let source = path.display().to_string();
    let span = info_span!("deidentify", source = %source);
    let _guard = span.enter();
    let start = Instant::now();

    check_crosswalk(config, crosswalk)?;
    let headers = read_csv_headers(path, config.separator())?;
    let mut report = DeidentifyReport::new(source.as_str());
    check_header(&headers.columns, config, &source, &mut report)?;

    let skip: BTreeSet<String> = config
        .removed_columns()
        .into_iter()
        .filter(|column| headers.contains(column))
        .collect();
    let (df, _) = read_text_table(path, config.separator(), &skip)?;

    let frame = apply(df, config, crosswalk, &mut report)?;
    info!(
        rows = report.rows,
        unmatched = report.unmatched_identifiers,
        unparseable = report.unparseable_count(),
        duration_ms = start.elapsed().as_millis(),
        "file de-identified"
    );
    Ok(Deidentified { frame, report })
}

/// De-identifies a table already in memory.
///
/// The frame must hold text columns only. Removed columns are dropped
/// before any other step runs.
///
/// # Errors
///
/// Same as [`deidentify_file`], minus the read errors.
pub fn deidentify_frame(
    df: DataFrame,
    config: &DeidentifyConfig,
    crosswalk: &Crosswalk,
    source: &str,
) -> Result<Deidentified> {
    let span = info_span!("deidentify", source = %source);
    let _guard = span.enter();

    check_crosswalk(config, crosswalk)?;
    let header: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let mut report = DeidentifyReport::new(source);
    check_header(&header, config, source, &mut report)?;

    let removed = config.removed_columns();
    let retained: Vec<Column> = df
        .get_columns()
        .iter()
        .filter(|column| !removed.contains(column.name().as_str()))
        .cloned()
        .collect();
    let df = DataFrame::new(retained)?;

    let frame = apply(df, config, crosswalk, &mut report)?;
    debug!(rows = report.rows, "frame de-identified");
    Ok(Deidentified { frame, report })
}

/// Fails when the crosswalk cannot serve the configured operation.
fn check_crosswalk(config: &DeidentifyConfig, crosswalk: &Crosswalk) -> Result<()> {
    if !crosswalk.has_tokens() {
        return Err(DeidError::configuration(
            "the crosswalk has no token column; identifier substitution needs one",
        ));
    }
    if config.requires_offsets() && !crosswalk.has_offsets() {
        return Err(DeidError::configuration(
            "date, datetime or epoch columns are configured but the crosswalk has no day offsets",
        ));
    }
    if config.compare_numeric() != crosswalk.compare_numeric() {
        warn!(
            config_numeric = config.compare_numeric(),
            crosswalk_numeric = crosswalk.compare_numeric(),
            "identifier comparison differs from the crosswalk's; lookups may not match"
        );
    }
    Ok(())
}

/// Requires the identifier column and records configured columns the header
/// lacks.
fn check_header(
    header: &[String],
    config: &DeidentifyConfig,
    source: &str,
    report: &mut DeidentifyReport,
) -> Result<()> {
    let present = |column: &str| header.iter().any(|name| name == column);
    if !present(config.identifier_column()) {
        return Err(DeidError::column_not_found(config.identifier_column(), source));
    }

    for (column, role) in config.roles() {
        let Some(kind) = role.kind() else {
            continue;
        };
        if present(column) {
            continue;
        }
        warn!(column, role = %kind, "configured column not in header, skipping");
        report.missing_columns.push(MissingColumn {
            column: column.to_string(),
            role: kind,
        });
    }
    Ok(())
}

/// Runs the transformation steps on the retained columns.
fn apply(
    mut df: DataFrame,
    config: &DeidentifyConfig,
    crosswalk: &Crosswalk,
    report: &mut DeidentifyReport,
) -> Result<DataFrame> {
    report.rows = df.height();
    let present: BTreeSet<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    report.removed_columns = config
        .columns_with(RoleKind::Remove)
        .into_iter()
        .filter(|column| !report.missing_columns.iter().any(|m| m.column == *column))
        .map(str::to_string)
        .collect();

    // === Blank ===
    for column in config.columns_with(RoleKind::Blank) {
        if present.contains(column) {
            blank_column(&mut df, column)?;
            report.blanked_columns.push(column.to_string());
        }
    }

    // === Resolve identifiers ===
    let matches = match_identifiers(
        &df,
        config.identifier_column(),
        config.identifier_mode(),
        crosswalk,
    )?;

    // === Shift ===
    if config.requires_offsets() {
        let offsets: Vec<Option<i64>> = matches
            .iter()
            .map(|entry| entry.and_then(|entry| entry.day_offset))
            .collect();
        for (column, role) in config.roles() {
            if !role.is_shift() || !present.contains(column) {
                continue;
            }
            let unparseable = match role {
                ColumnRole::ShiftDate(pattern) => {
                    shift_date_column(&mut df, column, pattern, &offsets)?
                }
                ColumnRole::ShiftDateTime(pattern) => {
                    shift_datetime_column(&mut df, column, pattern, &offsets)?
                }
                ColumnRole::ShiftEpoch => shift_epoch_column(&mut df, column, &offsets)?,
                ColumnRole::Remove | ColumnRole::Blank | ColumnRole::Passthrough => continue,
            };
            if unparseable > 0 {
                debug!(column, unparseable, "values could not be parsed and were left missing");
            }
            report.unparseable.insert(column.to_string(), unparseable);
            report.shifted_columns.push(column.to_string());
        }
    }

    // === Substitute ===
    let unmatched = substitute_tokens(&mut df, config.identifier_column(), &matches)?;
    report.unmatched_identifiers = unmatched;
    if unmatched > 0 {
        debug!(unmatched, rows = report.rows, "rows without a crosswalk token");
    }

    Ok(df)
}
