//! Text-only, column-projected reads into Polars DataFrames.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use polars::prelude::*;
use tracing::debug;

use deid_common::text_column;

use crate::error::{IngestError, Result};
use crate::separator::Separator;

use super::header::{CsvHeaders, read_csv_headers};

/// Detect encoding and validate it's supported (UTF-8 only).
///
/// Checks for UTF-16 BOM markers, which some device software emits on export.
pub fn validate_encoding(path: &Path) -> Result<()> {
    let mut file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let mut buffer = [0u8; 2];
    let bytes_read = file.read(&mut buffer).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if bytes_read == 2 {
        if buffer == [0xFF, 0xFE] {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: "UTF-16 LE",
            });
        }
        if buffer == [0xFE, 0xFF] {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: "UTF-16 BE",
            });
        }
    }

    Ok(())
}

/// Reads a delimited file into an all-`String` DataFrame.
///
/// Columns named in `skip` are never materialized: the reader is given a
/// projection of the retained column positions, so skipped data does not
/// pass through memory at all. Empty fields become null ("missing").
///
/// Returns the DataFrame (retained columns only, file order) together with
/// the full header of the file.
pub fn read_text_table(
    path: &Path,
    separator: Separator,
    skip: &BTreeSet<String>,
) -> Result<(DataFrame, CsvHeaders)> {
    validate_encoding(path)?;
    let headers = read_csv_headers(path, separator)?;

    let (projection, names): (Vec<usize>, Vec<String>) = headers
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| !skip.contains(*name))
        .map(|(idx, name)| (idx, name.clone()))
        .unzip();
    if projection.is_empty() {
        debug!(path = %path.display(), "every column skipped, nothing to read");
        return Ok((DataFrame::empty(), headers));
    }

    let raw = CsvReadOptions::default()
        .with_has_header(true)
        // Zero inference rows reads every column as String.
        .with_infer_schema_length(Some(0))
        .with_projection(Some(Arc::new(projection)))
        .map_parse_options(|options| {
            options
                .with_separator(separator.byte())
                .with_missing_is_null(true)
        })
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    // Rebuild under the normalized header names; quoted empty strings are
    // missing too.
    let columns = raw
        .get_columns()
        .iter()
        .zip(names.iter())
        .map(|(column, name)| {
            let values = column
                .str()?
                .into_iter()
                .map(|value| value.filter(|v| !v.is_empty()).map(str::to_string))
                .collect();
            Ok(text_column(name, values))
        })
        .collect::<Result<Vec<Column>>>()?;
    let df = DataFrame::new(columns)?;

    debug!(
        path = %path.display(),
        rows = df.height(),
        columns_read = df.width(),
        columns_skipped = headers.len() - df.width(),
        "read delimited table"
    );
    Ok((df, headers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deid_common::column_texts;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_reads_everything_as_text() {
        let file = create_temp_csv("mrn,value\n00123,1.50\n00456,2\n");
        let (df, headers) = read_text_table(file.path(), Separator::COMMA, &BTreeSet::new()).unwrap();

        assert_eq!(headers.columns, vec!["mrn", "value"]);
        assert_eq!(df.height(), 2);
        assert_eq!(
            column_texts(&df, "mrn").unwrap(),
            vec![Some("00123".to_string()), Some("00456".to_string())]
        );
        assert_eq!(
            column_texts(&df, "value").unwrap(),
            vec![Some("1.50".to_string()), Some("2".to_string())]
        );
    }

    #[test]
    fn test_skipped_columns_are_not_read() {
        let file = create_temp_csv("mrn,name,eye\n1,Jane Doe,OD\n2,John Roe,OS\n");
        let skip: BTreeSet<String> = ["name".to_string()].into();
        let (df, headers) = read_text_table(file.path(), Separator::COMMA, &skip).unwrap();

        assert_eq!(headers.len(), 3);
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(names, vec!["mrn", "eye"]);
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_empty_fields_are_missing() {
        let file = create_temp_csv("mrn,note\n1,\n2,\"\"\n3,x\n");
        let (df, _) = read_text_table(file.path(), Separator::COMMA, &BTreeSet::new()).unwrap();
        assert_eq!(
            column_texts(&df, "note").unwrap(),
            vec![None, None, Some("x".to_string())]
        );
    }

    #[test]
    fn test_tab_separated() {
        let file = create_temp_csv("mrn\texam date\n7\t2020-01-02\n");
        let (df, _) = read_text_table(file.path(), Separator::TAB, &BTreeSet::new()).unwrap();
        assert_eq!(
            column_texts(&df, "exam date").unwrap(),
            vec![Some("2020-01-02".to_string())]
        );
    }

    #[test]
    fn test_rejects_utf16() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xFF, 0xFE, b'a', 0]).unwrap();
        let result = read_text_table(file.path(), Separator::COMMA, &BTreeSet::new());
        assert!(matches!(result, Err(IngestError::UnsupportedEncoding { .. })));
    }
}
