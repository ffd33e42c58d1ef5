//! Polars text-frame utility functions.
//!
//! Helpers for reading cells out of, and building, all-`String` DataFrames,
//! plus the numeric text conversions used by epoch shifting. A null stays
//! `None` throughout: "missing" and an empty string must stay distinct all
//! the way to the writer.

use polars::prelude::{Column, DataFrame, PolarsResult};

/// Formats a floating-point number as a string without trailing zeros.
///
/// # Examples
///
/// ```
/// use deid_common::format_numeric;
///
/// assert_eq!(format_numeric(1.0), "1");
/// assert_eq!(format_numeric(1.5), "1.5");
/// assert_eq!(format_numeric(0.0), "0");
/// ```
pub fn format_numeric(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let s = format!("{v}");
    if !s.contains('.') {
        return s;
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

/// Parses a string as `f64`, returning `None` for invalid, empty or non-finite input.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a string as `i64`, returning `None` for invalid or empty strings.
pub fn parse_i64(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

/// Collects a `String` column into owned optional values, preserving row order.
///
/// Fails if the column is absent or is not a `String` column.
pub fn column_texts(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let values = df
        .column(name)?
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();
    Ok(values)
}

/// Builds a `String` column from optional values.
pub fn text_column(name: &str, values: Vec<Option<String>>) -> Column {
    Column::new(name.into(), values)
}

/// Builds an all-`String` DataFrame from `(name, values)` pairs.
///
/// Handy for constructing crosswalk sources and input tables in memory.
pub fn text_frame(columns: Vec<(&str, Vec<Option<&str>>)>) -> PolarsResult<DataFrame> {
    let cols: Vec<Column> = columns
        .into_iter()
        .map(|(name, values)| {
            text_column(
                name,
                values
                    .into_iter()
                    .map(|value| value.map(str::to_string))
                    .collect(),
            )
        })
        .collect();
    DataFrame::new(cols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_numeric() {
        assert_eq!(format_numeric(1.0), "1");
        assert_eq!(format_numeric(1.50), "1.5");
        assert_eq!(format_numeric(1700172800.25), "1700172800.25");
        assert_eq!(format_numeric(100.0), "100");
        assert_eq!(format_numeric(-0.0), "0");
    }

    #[test]
    fn test_parse_f64() {
        assert_eq!(parse_f64(""), None);
        assert_eq!(parse_f64("  3.5  "), Some(3.5));
        assert_eq!(parse_f64("NaN"), None);
        assert_eq!(parse_f64("invalid"), None);
    }

    #[test]
    fn test_parse_i64() {
        assert_eq!(parse_i64("  "), None);
        assert_eq!(parse_i64(" -100 "), Some(-100));
        assert_eq!(parse_i64("4.0"), None);
    }

    #[test]
    fn test_text_frame_keeps_nulls() {
        let df = text_frame(vec![("id", vec![Some("1"), None])]).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(
            column_texts(&df, "id").unwrap(),
            vec![Some("1".to_string()), None]
        );
    }
}
