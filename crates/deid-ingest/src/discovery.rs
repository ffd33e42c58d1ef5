//! File discovery for batch runs.

use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

const DELIMITED_EXTENSIONS: [&str; 4] = ["csv", "tsv", "tab", "txt"];

/// Lists all delimited files (`.csv`, `.tsv`, `.tab`, `.txt`) in a directory.
///
/// Not recursive. Returns files sorted by filename.
pub fn list_delimited_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_delimited = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                DELIMITED_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            });

        if is_delimited {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lists_delimited_files_sorted() {
        let dir = TempDir::new().unwrap();
        for name in &["visual_fields.tsv", "oct.CSV", "notes.pdf", "biometry.txt"] {
            std::fs::write(dir.path().join(name), "header\ndata").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let files = list_delimited_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["biometry.txt", "oct.CSV", "visual_fields.tsv"]);
    }

    #[test]
    fn test_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("test.csv");
        std::fs::write(&file_path, "data").unwrap();

        let result = list_delimited_files(&file_path);
        assert!(matches!(result, Err(IngestError::DirectoryNotFound { .. })));
    }
}
