use serde::Serialize;

use deid_cli::pipeline::{FileFailure, FileOutcome};
use deid_model::CrosswalkSummary;

/// Everything a `deidentify` or `batch` run produced.
#[derive(Debug, Serialize)]
pub struct RunResult {
    pub crosswalk: CrosswalkSummary,
    pub fingerprint: String,
    pub dry_run: bool,
    pub files: Vec<FileOutcome>,
    pub failures: Vec<FileFailure>,
}

impl RunResult {
    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        self.files.iter().any(|file| file.report.has_warnings())
    }
}
