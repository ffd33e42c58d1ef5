//! Header sniffing and validation.

use std::collections::BTreeSet;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::error::{IngestError, Result};
use crate::separator::Separator;

/// The header row of a delimited file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvHeaders {
    /// Normalized column names (trimmed, BOM removed), in file order.
    pub columns: Vec<String>,
}

impl CsvHeaders {
    /// Creates headers from already-normalized names.
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the position of a column by exact name.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.position(column).is_some()
    }
}

/// Normalizes a header value by trimming whitespace and a UTF-8 BOM.
pub fn normalize_header(value: &str) -> String {
    value.trim_start_matches('\u{feff}').trim().to_string()
}

/// Reads and validates the header row of a delimited file.
///
/// Names are trimmed; empty or repeated names are rejected because every
/// downstream step addresses columns by name.
pub fn read_csv_headers(path: &Path, separator: Separator) -> Result<CsvHeaders> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(separator.byte())
        .from_path(path)
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut record = StringRecord::new();
    let found = reader
        .read_record(&mut record)
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    if !found {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }

    let columns: Vec<String> = record.iter().map(normalize_header).collect();
    validate_header_names(&columns, path)?;
    Ok(CsvHeaders::new(columns))
}

fn validate_header_names(columns: &[String], path: &Path) -> Result<()> {
    let mut seen = BTreeSet::new();
    for (position, column) in columns.iter().enumerate() {
        if column.is_empty() {
            return Err(IngestError::EmptyColumnName {
                path: path.to_path_buf(),
                position: position + 1,
            });
        }
        if !seen.insert(column.as_str()) {
            return Err(IngestError::DuplicateColumn {
                column: column.clone(),
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_read_headers_comma() {
        let file = create_temp_csv("mrn,ExamDate, Eye \n1,2020-01-01,OD\n");
        let headers = read_csv_headers(file.path(), Separator::COMMA).unwrap();
        assert_eq!(headers.columns, vec!["mrn", "ExamDate", "Eye"]);
        assert_eq!(headers.position("Eye"), Some(2));
    }

    #[test]
    fn test_read_headers_tab_with_bom() {
        let file = create_temp_csv("\u{feff}mrn\tExam Date\n1\t2020-01-01\n");
        let headers = read_csv_headers(file.path(), Separator::TAB).unwrap();
        assert_eq!(headers.columns, vec!["mrn", "Exam Date"]);
    }

    #[test]
    fn test_read_headers_quoted() {
        let file = create_temp_csv("\"mrn\",\"last, first\"\n");
        let headers = read_csv_headers(file.path(), Separator::COMMA).unwrap();
        assert_eq!(headers.columns, vec!["mrn", "last, first"]);
    }

    #[test]
    fn test_read_headers_empty_file() {
        let file = create_temp_csv("");
        let result = read_csv_headers(file.path(), Separator::COMMA);
        assert!(matches!(result, Err(IngestError::EmptyCsv { .. })));
    }

    #[test]
    fn test_read_headers_rejects_duplicates() {
        let file = create_temp_csv("mrn,date,mrn\n");
        let result = read_csv_headers(file.path(), Separator::COMMA);
        assert!(matches!(
            result,
            Err(IngestError::DuplicateColumn { ref column, .. }) if column == "mrn"
        ));
    }

    #[test]
    fn test_read_headers_rejects_empty_name() {
        let file = create_temp_csv("mrn,,date\n");
        let result = read_csv_headers(file.path(), Separator::COMMA);
        assert!(matches!(
            result,
            Err(IngestError::EmptyColumnName { position: 2, .. })
        ));
    }
}
