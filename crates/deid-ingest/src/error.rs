//! Error types for delimited-file ingestion.

use std::path::PathBuf;

use deid_model::DeidError;
use thiserror::Error;

/// Errors that can occur while reading device exports or crosswalk sources.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Input file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File uses an encoding other than UTF-8.
    #[error("unsupported encoding {encoding} in {path}; re-export as UTF-8")]
    UnsupportedEncoding {
        path: PathBuf,
        encoding: &'static str,
    },

    // === Parsing Errors ===
    /// Failed to parse the delimited data.
    #[error("failed to parse {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// File has no header line.
    #[error("file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    /// Header contains an empty column name.
    #[error("empty column name at position {position} in {path}")]
    EmptyColumnName { path: PathBuf, position: usize },

    /// Header names must be unique.
    #[error("duplicate column '{column}' in header of {path}")]
    DuplicateColumn { column: String, path: PathBuf },

    // === Column Errors ===
    /// Required column not found in the header.
    #[error("column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

impl From<IngestError> for DeidError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::MissingColumn { column, path } => DeidError::ColumnNotFound {
                column,
                table: path.display().to_string(),
            },
            IngestError::DataFrame { message } => DeidError::DataFrame { message },
            IngestError::DirectoryNotFound { ref path }
            | IngestError::FileNotFound { ref path }
            | IngestError::DirectoryRead { ref path, .. }
            | IngestError::FileRead { ref path, .. }
            | IngestError::UnsupportedEncoding { ref path, .. }
            | IngestError::CsvParse { ref path, .. }
            | IngestError::EmptyCsv { ref path }
            | IngestError::EmptyColumnName { ref path, .. }
            | IngestError::DuplicateColumn { ref path, .. } => DeidError::Ingest {
                path: path.clone(),
                message: err.to_string(),
            },
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/exports/oct.csv"),
        };
        assert_eq!(err.to_string(), "file not found: /exports/oct.csv");
    }

    #[test]
    fn test_missing_column_becomes_column_not_found() {
        let err = IngestError::MissingColumn {
            column: "mrn".to_string(),
            path: PathBuf::from("tokens.csv"),
        };
        let deid: DeidError = err.into();
        assert!(matches!(deid, DeidError::ColumnNotFound { ref column, .. } if column == "mrn"));
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("test".into());
        let ingest_err: IngestError = polars_err.into();
        assert!(matches!(ingest_err, IngestError::DataFrame { .. }));
    }
}
