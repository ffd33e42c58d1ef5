//! Column executors.
//!
//! Each function rewrites one column of an all-`String` DataFrame in place
//! and returns a count for the run report. Row order and height never
//! change; a value that cannot be produced becomes null ("missing").

use polars::prelude::{DataFrame, IntoSeries, StringChunkedBuilder};

use deid_crosswalk::{Crosswalk, CrosswalkEntry};
use deid_model::{IdentifierMode, Result, canonicalize_identifier};

use crate::pattern::TimestampPattern;
use crate::shift::{
    EpochSeconds, format_date, format_datetime, shift_date, shift_datetime,
};

/// Replaces every cell of a column with null.
///
/// Returns the number of rows blanked.
pub fn blank_column(df: &mut DataFrame, column_name: &str) -> Result<usize> {
    let height = df.height();
    let mut builder = StringChunkedBuilder::new(column_name.into(), height);
    for _ in 0..height {
        builder.append_null();
    }
    df.with_column(builder.finish().into_series())?;
    Ok(height)
}

/// Resolves each row's identifier against the crosswalk.
///
/// The identifier is canonicalized under `mode` first; a missing or
/// unmatched identifier yields `None` for that row.
pub fn match_identifiers<'a>(
    df: &DataFrame,
    column_name: &str,
    mode: IdentifierMode,
    crosswalk: &'a Crosswalk,
) -> Result<Vec<Option<&'a CrosswalkEntry>>> {
    let matches = df
        .column(column_name)?
        .str()?
        .into_iter()
        .map(|value| {
            value
                .and_then(|raw| canonicalize_identifier(raw, mode))
                .and_then(|key| crosswalk.lookup(&key))
        })
        .collect();
    Ok(matches)
}

/// Replaces the identifier column with each row's token.
///
/// Returns the number of rows left without a token.
pub fn substitute_tokens(
    df: &mut DataFrame,
    column_name: &str,
    matches: &[Option<&CrosswalkEntry>],
) -> Result<usize> {
    let mut builder = StringChunkedBuilder::new(column_name.into(), matches.len());
    let mut unmatched = 0usize;
    for entry in matches {
        match entry.and_then(|entry| entry.token.as_deref()) {
            Some(token) => builder.append_value(token),
            None => {
                builder.append_null();
                unmatched += 1;
            }
        }
    }
    df.with_column(builder.finish().into_series())?;
    Ok(unmatched)
}

/// Shifts a date column by each row's day offset.
///
/// Returns the number of non-empty values that failed to parse.
pub fn shift_date_column(
    df: &mut DataFrame,
    column_name: &str,
    pattern: &TimestampPattern,
    offsets: &[Option<i64>],
) -> Result<usize> {
    map_shifted(
        df,
        column_name,
        offsets,
        |value| pattern.parse_date(value),
        |date, days| shift_date(date, days).map(format_date),
    )
}

/// Shifts a datetime column by `offset × 86400` seconds per row.
///
/// Returns the number of non-empty values that failed to parse.
pub fn shift_datetime_column(
    df: &mut DataFrame,
    column_name: &str,
    pattern: &TimestampPattern,
    offsets: &[Option<i64>],
) -> Result<usize> {
    map_shifted(
        df,
        column_name,
        offsets,
        |value| pattern.parse_datetime(value),
        |datetime, days| shift_datetime(datetime, days).map(format_datetime),
    )
}

/// Adds `offset × 86400` to each row's epoch seconds.
///
/// Returns the number of non-empty values that are not numbers.
pub fn shift_epoch_column(
    df: &mut DataFrame,
    column_name: &str,
    offsets: &[Option<i64>],
) -> Result<usize> {
    map_shifted(df, column_name, offsets, EpochSeconds::parse, |seconds, days| {
        seconds.shift(days).map(|shifted| shifted.to_string())
    })
}

/// Shared row loop for the shift executors.
///
/// A missing cell or missing offset gives null; a value that fails `parse`
/// (or overflows in `shift`) gives null and is counted.
fn map_shifted<T, P, S>(
    df: &mut DataFrame,
    column_name: &str,
    offsets: &[Option<i64>],
    parse: P,
    shift: S,
) -> Result<usize>
where
    P: Fn(&str) -> Option<T>,
    S: Fn(T, i64) -> Option<String>,
{
    let values = df.column(column_name)?.str()?;
    let mut builder = StringChunkedBuilder::new(column_name.into(), df.height());
    let mut unparseable = 0usize;

    for (value, offset) in values.into_iter().zip(offsets.iter().copied()) {
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            builder.append_null();
            continue;
        };
        let Some(parsed) = parse(value) else {
            unparseable += 1;
            builder.append_null();
            continue;
        };
        let Some(days) = offset else {
            builder.append_null();
            continue;
        };
        match shift(parsed, days) {
            Some(shifted) => builder.append_value(shifted),
            None => {
                unparseable += 1;
                builder.append_null();
            }
        }
    }

    df.with_column(builder.finish().into_series())?;
    Ok(unparseable)
}
