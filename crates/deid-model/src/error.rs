//! Error taxonomy for crosswalk construction and de-identification.
//!
//! Every variant here is fatal for the crosswalk build or for the file being
//! processed. Recoverable conditions (absent optional columns, unmatched
//! identifiers, unparseable timestamps) are never errors; they are counted in
//! [`crate::DeidentifyReport`] instead.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while building a crosswalk or de-identifying a table.
#[derive(Debug, Error)]
pub enum DeidError {
    // === Configuration Errors ===
    /// The requested operation cannot run with the supplied configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A column was given more than one handling role.
    #[error("column '{column}' is assigned to both {first} and {second}")]
    ConflictingColumnRole {
        column: String,
        first: String,
        second: String,
    },

    /// A timestamp pattern uses components or separators outside the supported set.
    #[error("unsupported {kind} format '{pattern}': {reason}")]
    InvalidFormat {
        kind: String,
        pattern: String,
        reason: String,
    },

    // === Column Errors ===
    /// A required column is absent from a table header.
    #[error("column '{column}' not found in {table}")]
    ColumnNotFound { column: String, table: String },

    // === Integrity Errors ===
    /// One identifier maps to two different values after de-duplication.
    #[error(
        "duplicate identifier '{identifier}' in {table}: conflicting values '{first}' and '{second}'"
    )]
    DuplicateIdentifier {
        identifier: String,
        table: String,
        first: String,
        second: String,
    },

    /// One token is assigned to two different identifiers.
    #[error("duplicate token '{token}' in {table}: assigned to identifiers '{first}' and '{second}'")]
    DuplicateToken {
        token: String,
        table: String,
        first: String,
        second: String,
    },

    // === Data Errors ===
    /// A crosswalk value cannot be interpreted (e.g. a non-integer day offset).
    #[error("invalid {field} value '{value}' in {table}")]
    InvalidValue {
        field: String,
        value: String,
        table: String,
    },

    /// Reading a delimited file failed.
    #[error("failed to read {path}: {message}")]
    Ingest { path: PathBuf, message: String },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

/// Coarse classification used for reporting and exit handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Integrity,
    ColumnNotFound,
    Data,
}

impl DeidError {
    /// Returns the taxonomy bucket this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_)
            | Self::ConflictingColumnRole { .. }
            | Self::InvalidFormat { .. } => ErrorCategory::Configuration,
            Self::DuplicateIdentifier { .. } | Self::DuplicateToken { .. } => {
                ErrorCategory::Integrity
            }
            Self::ColumnNotFound { .. } => ErrorCategory::ColumnNotFound,
            Self::InvalidValue { .. } | Self::Ingest { .. } | Self::DataFrame { .. } => {
                ErrorCategory::Data
            }
        }
    }

    /// True for crosswalk integrity violations, which must stop every file.
    pub fn is_fatal_integrity(&self) -> bool {
        self.category() == ErrorCategory::Integrity
    }

    /// Convenience constructor for [`DeidError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Convenience constructor for [`DeidError::ColumnNotFound`].
    pub fn column_not_found(column: impl Into<String>, table: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
            table: table.into(),
        }
    }
}

impl From<polars::prelude::PolarsError> for DeidError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for de-identification operations.
pub type Result<T> = std::result::Result<T, DeidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeidError::column_not_found("mrn", "visits.csv");
        assert_eq!(err.to_string(), "column 'mrn' not found in visits.csv");
    }

    #[test]
    fn test_integrity_category() {
        let err = DeidError::DuplicateToken {
            token: "T1".to_string(),
            table: "tokens.csv".to_string(),
            first: "1".to_string(),
            second: "2".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Integrity);
        assert!(err.is_fatal_integrity());
        assert!(!DeidError::configuration("no crosswalk").is_fatal_integrity());
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("test".into());
        let err: DeidError = polars_err.into();
        assert!(matches!(err, DeidError::DataFrame { .. }));
        assert_eq!(err.category(), ErrorCategory::Data);
    }
}
