//! Tests for crosswalk construction and its 1-to-1 guarantees.

use std::io::Write;

use deid_common::{column_texts, text_frame};
use deid_crosswalk::{CrosswalkBuilder, CrosswalkSource, build_crosswalk};
use deid_ingest::Separator;
use deid_model::{DeidError, ErrorCategory};
use tempfile::NamedTempFile;

fn token_source(rows: &[(&str, &str)]) -> CrosswalkSource {
    let df = text_frame(vec![
        ("mrn", rows.iter().map(|(id, _)| Some(*id)).collect()),
        ("token", rows.iter().map(|(_, token)| Some(*token)).collect()),
    ])
    .unwrap();
    CrosswalkSource::new("tokens.csv", df, "mrn", "token")
}

fn offset_source(rows: &[(&str, &str)]) -> CrosswalkSource {
    let df = text_frame(vec![
        ("mrn", rows.iter().map(|(id, _)| Some(*id)).collect()),
        ("day_offset", rows.iter().map(|(_, offset)| Some(*offset)).collect()),
    ])
    .unwrap();
    CrosswalkSource::new("offsets.csv", df, "mrn", "day_offset")
}

#[test]
fn no_source_is_a_configuration_error() {
    let result = CrosswalkBuilder::new().build();
    let err = result.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn conflicting_duplicate_identifier_fails() {
    let result = CrosswalkBuilder::new()
        .with_token_source(token_source(&[("1", "a"), ("2", "b"), ("1", "c")]))
        .build();
    match result {
        Err(DeidError::DuplicateIdentifier {
            identifier,
            first,
            second,
            ..
        }) => {
            assert_eq!(identifier, "1");
            assert_eq!(first, "a");
            assert_eq!(second, "c");
        }
        other => panic!("expected DuplicateIdentifier, got {other:?}"),
    }
}

#[test]
fn exact_duplicates_are_removed() {
    let crosswalk = CrosswalkBuilder::new()
        .with_token_source(token_source(&[("1", "a"), ("2", "b"), ("1", "a")]))
        .build()
        .expect("exact duplicates are tolerated");

    assert_eq!(crosswalk.len(), 2);
    let summary = crosswalk.summary().token_source.as_ref().unwrap();
    assert_eq!(summary.rows_read, 3);
    assert_eq!(summary.exact_duplicates_removed, 1);
    assert_eq!(summary.entries, 2);
}

#[test]
fn duplicate_token_fails() {
    let result = CrosswalkBuilder::new()
        .with_token_source(token_source(&[("1", "a"), ("2", "a")]))
        .build();
    let err = result.unwrap_err();
    assert!(matches!(err, DeidError::DuplicateToken { ref token, .. } if token == "a"));
    assert_eq!(err.category(), ErrorCategory::Integrity);
}

#[test]
fn conflicting_offsets_fail() {
    let result = CrosswalkBuilder::new()
        .with_offset_source(offset_source(&[("1", "4"), ("1", "5")]))
        .build();
    assert!(matches!(result, Err(DeidError::DuplicateIdentifier { .. })));
}

#[test]
fn offsets_compare_by_value() {
    // "4" and "04" are the same offset, so this is an exact duplicate.
    let crosswalk = CrosswalkBuilder::new()
        .with_offset_source(offset_source(&[("1", "4"), ("1", "04")]))
        .build()
        .unwrap();
    assert_eq!(crosswalk.len(), 1);
    assert_eq!(crosswalk.lookup("1").unwrap().day_offset, Some(4));
}

#[test]
fn invalid_offset_fails_with_context() {
    let result = CrosswalkBuilder::new()
        .with_offset_source(offset_source(&[("1", "soon")]))
        .build();
    match result {
        Err(DeidError::InvalidValue { field, value, table }) => {
            assert_eq!(field, "day_offset");
            assert_eq!(value, "soon");
            assert_eq!(table, "offsets.csv");
        }
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

#[test]
fn both_sources_are_inner_joined() {
    let crosswalk = CrosswalkBuilder::new()
        .with_token_source(token_source(&[("2", "b"), ("9", "z"), ("3", "c")]))
        .with_offset_source(offset_source(&[("2", "4"), ("3", "-1"), ("5", "8")]))
        .build()
        .unwrap();

    assert_eq!(crosswalk.len(), 2);
    assert!(crosswalk.lookup("9").is_none());
    assert!(crosswalk.lookup("5").is_none());
    let entry = crosswalk.lookup("2").unwrap();
    assert_eq!(entry.token.as_deref(), Some("b"));
    assert_eq!(entry.day_offset, Some(4));
    assert_eq!(crosswalk.lookup("3").unwrap().day_offset, Some(-1));
    assert_eq!(crosswalk.summary().dropped_by_join, 2);
    assert!(crosswalk.has_tokens());
    assert!(crosswalk.has_offsets());
}

#[test]
fn single_source_is_sorted_by_identifier() {
    let crosswalk = build_crosswalk(
        Some(&token_source(&[("10", "x"), ("9", "y"), ("100", "z")])),
        None,
        true,
    )
    .unwrap();
    let ids: Vec<&str> = crosswalk
        .entries()
        .iter()
        .map(|entry| entry.identifier.as_str())
        .collect();
    assert_eq!(ids, vec!["9", "10", "100"]);
    assert!(!crosswalk.has_offsets());
}

#[test]
fn numeric_comparison_merges_padded_identifiers() {
    let crosswalk = CrosswalkBuilder::new()
        .with_token_source(token_source(&[("0007", "t7")]))
        .with_offset_source(offset_source(&[("7", "3")]))
        .compare_numeric(true)
        .build()
        .unwrap();
    assert!(crosswalk.compare_numeric());
    assert_eq!(crosswalk.len(), 1);
    assert_eq!(crosswalk.resolve("007.0").unwrap().token.as_deref(), Some("t7"));
}

#[test]
fn exact_comparison_keeps_padding_significant() {
    let crosswalk = CrosswalkBuilder::new()
        .with_token_source(token_source(&[("0007", "t7")]))
        .with_offset_source(offset_source(&[("7", "3")]))
        .build()
        .unwrap();
    assert!(crosswalk.is_empty());
    assert_eq!(crosswalk.summary().dropped_by_join, 2);
}

#[test]
fn padded_duplicates_conflict_under_numeric_comparison() {
    let result = CrosswalkBuilder::new()
        .with_token_source(token_source(&[("007", "a"), ("7", "b")]))
        .compare_numeric(true)
        .build();
    assert!(matches!(result, Err(DeidError::DuplicateIdentifier { .. })));
}

#[test]
fn missing_column_is_reported() {
    let df = text_frame(vec![("id", vec![Some("1")]), ("token", vec![Some("a")])]).unwrap();
    let source = CrosswalkSource::new("tokens.csv", df, "mrn", "token");
    let result = CrosswalkBuilder::new().with_token_source(source).build();
    assert!(matches!(
        result,
        Err(DeidError::ColumnNotFound { ref column, ref table }) if column == "mrn" && table == "tokens.csv"
    ));
}

#[test]
fn blank_rows_are_dropped_and_counted() {
    let df = text_frame(vec![
        ("mrn", vec![Some("1"), None, Some("3")]),
        ("token", vec![Some("a"), Some("b"), None]),
    ])
    .unwrap();
    let crosswalk = CrosswalkBuilder::new()
        .with_token_source(CrosswalkSource::new("tokens.csv", df, "mrn", "token"))
        .build()
        .unwrap();
    assert_eq!(crosswalk.len(), 1);
    let summary = crosswalk.summary().token_source.as_ref().unwrap();
    assert_eq!(summary.incomplete_rows_dropped, 2);
}

#[test]
fn to_frame_uses_internal_column_names() {
    let crosswalk = CrosswalkBuilder::new()
        .with_token_source(token_source(&[("2", "b")]))
        .with_offset_source(offset_source(&[("2", "4")]))
        .build()
        .unwrap();
    let df = crosswalk.to_frame().unwrap();
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(names, vec!["identifier", "token", "day_offset"]);
    assert_eq!(
        column_texts(&df, "token").unwrap(),
        vec![Some("b".to_string())]
    );
}

#[test]
fn fingerprint_ignores_source_order_and_padding() {
    let a = CrosswalkBuilder::new()
        .with_token_source(token_source(&[("1", "a"), ("2", "b")]))
        .compare_numeric(true)
        .build()
        .unwrap();
    let b = CrosswalkBuilder::new()
        .with_token_source(token_source(&[("002", "b"), ("001", "a")]))
        .compare_numeric(true)
        .build()
        .unwrap();
    let c = CrosswalkBuilder::new()
        .with_token_source(token_source(&[("1", "a"), ("2", "c")]))
        .compare_numeric(true)
        .build()
        .unwrap();
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_ne!(a.fingerprint(), c.fingerprint());
    assert_eq!(a.fingerprint().len(), 64);
}

#[test]
fn loads_sources_from_files() {
    let mut tokens = NamedTempFile::new().unwrap();
    write!(tokens, "mrn,token,site\n0002,b,A\n0009,z,B\n").unwrap();
    let mut offsets = NamedTempFile::new().unwrap();
    write!(offsets, "mrn\tday_offset\n0002\t\"4\"\n").unwrap();

    let crosswalk = CrosswalkBuilder::new()
        .with_token_source(
            CrosswalkSource::from_file(tokens.path(), Separator::COMMA, "mrn", "token").unwrap(),
        )
        .with_offset_source(
            CrosswalkSource::from_file(offsets.path(), Separator::TAB, "mrn", "day_offset")
                .unwrap(),
        )
        .build()
        .unwrap();

    assert_eq!(crosswalk.len(), 1);
    let entry = crosswalk.lookup("0002").unwrap();
    assert_eq!(entry.token.as_deref(), Some("b"));
    assert_eq!(entry.day_offset, Some(4));
}

#[test]
fn file_source_missing_column_is_column_not_found() {
    let mut tokens = NamedTempFile::new().unwrap();
    write!(tokens, "patient,token\n1,a\n").unwrap();
    let result = CrosswalkSource::from_file(tokens.path(), Separator::COMMA, "mrn", "token");
    assert!(matches!(result, Err(DeidError::ColumnNotFound { .. })));
}
