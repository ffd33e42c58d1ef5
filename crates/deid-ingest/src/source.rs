//! Loading crosswalk source tables.

use std::collections::BTreeSet;
use std::path::Path;

use polars::prelude::DataFrame;
use tracing::debug;

use crate::delimited::{read_csv_headers, read_text_table};
use crate::error::{IngestError, Result};
use crate::separator::Separator;

/// Reads the identifier column and one value column of a crosswalk source.
///
/// Both columns are read as text so zero-padded identifiers and quoted day
/// offsets arrive exactly as stored. Any other column in the file is skipped.
///
/// # Errors
///
/// [`IngestError::MissingColumn`] if either column is absent from the header.
pub fn read_crosswalk_source(
    path: &Path,
    separator: Separator,
    identifier_column: &str,
    value_column: &str,
) -> Result<DataFrame> {
    let headers = read_csv_headers(path, separator)?;
    for column in [identifier_column, value_column] {
        if !headers.contains(column) {
            return Err(IngestError::MissingColumn {
                column: column.to_string(),
                path: path.to_path_buf(),
            });
        }
    }

    let skip: BTreeSet<String> = headers
        .columns
        .iter()
        .filter(|name| name.as_str() != identifier_column && name.as_str() != value_column)
        .cloned()
        .collect();
    let (df, _) = read_text_table(path, separator, &skip)?;
    debug!(
        path = %path.display(),
        rows = df.height(),
        identifier_column,
        value_column,
        "read crosswalk source"
    );
    Ok(df)
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
    fn test_reads_only_requested_columns() {
        let file = create_temp_csv("site,mrn,day_offset\nA,0001,\"4\"\nB,0002,7\n");
        let df = read_crosswalk_source(file.path(), Separator::COMMA, "mrn", "day_offset").unwrap();

        assert_eq!(df.width(), 2);
        assert_eq!(
            column_texts(&df, "day_offset").unwrap(),
            vec![Some("4".to_string()), Some("7".to_string())]
        );
        assert_eq!(
            column_texts(&df, "mrn").unwrap(),
            vec![Some("0001".to_string()), Some("0002".to_string())]
        );
    }

    #[test]
    fn test_missing_value_column() {
        let file = create_temp_csv("mrn,token\n1,a\n");
        let result = read_crosswalk_source(file.path(), Separator::COMMA, "mrn", "day_offset");
        assert!(matches!(
            result,
            Err(IngestError::MissingColumn { ref column, .. }) if column == "day_offset"
        ));
    }
}
