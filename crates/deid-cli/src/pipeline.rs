//! Run stages shared by the `deidentify`, `batch` and `crosswalk` commands.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, info_span, trace, warn};

use deid_crosswalk::{Crosswalk, CrosswalkBuilder, CrosswalkSource};
use deid_ingest::{Separator, list_delimited_files};
use deid_model::{DeidError, DeidentifyReport};
use deid_output::{WriteOptions, ensure_parent_dir, prefixed_output_path, write_table_file};
use deid_transform::{DeidentifyConfig, deidentify_file};

use crate::logging::redact_value;

/// Where the crosswalk comes from and how its columns are named.
#[derive(Debug, Clone)]
pub struct CrosswalkOptions {
    pub token_path: Option<PathBuf>,
    pub offset_path: Option<PathBuf>,
    pub token_identifier_column: String,
    pub token_column: String,
    pub offset_identifier_column: String,
    pub offset_column: String,
    /// Separator for both sources; guessed from each file's extension when unset.
    pub separator: Option<Separator>,
    pub compare_numeric: bool,
}

impl Default for CrosswalkOptions {
    fn default() -> Self {
        Self {
            token_path: None,
            offset_path: None,
            token_identifier_column: "mrn".to_string(),
            token_column: "token".to_string(),
            offset_identifier_column: "mrn".to_string(),
            offset_column: "day_offset".to_string(),
            separator: None,
            compare_numeric: false,
        }
    }
}

/// Loads both crosswalk sources and builds the crosswalk.
///
/// # Errors
///
/// Every crosswalk error of [`deid_crosswalk::build_crosswalk`], plus read
/// errors for the source files.
pub fn load_crosswalk(options: &CrosswalkOptions) -> deid_model::Result<Crosswalk> {
    let span = info_span!("crosswalk");
    let _guard = span.enter();
    let start = Instant::now();

    let mut builder = CrosswalkBuilder::new().compare_numeric(options.compare_numeric);
    if let Some(path) = &options.token_path {
        builder = builder.with_token_source(CrosswalkSource::from_file(
            path,
            options.separator.unwrap_or_else(|| Separator::for_path(path)),
            &options.token_identifier_column,
            &options.token_column,
        )?);
    }
    if let Some(path) = &options.offset_path {
        builder = builder.with_offset_source(CrosswalkSource::from_file(
            path,
            options.separator.unwrap_or_else(|| Separator::for_path(path)),
            &options.offset_identifier_column,
            &options.offset_column,
        )?);
    }
    let crosswalk = builder.build()?;

    for entry in crosswalk.entries() {
        trace!(
            identifier = redact_value(&entry.identifier),
            token = redact_value(entry.token.as_deref().unwrap_or("")),
            day_offset = ?entry.day_offset,
            "crosswalk entry"
        );
    }
    info!(
        entries = crosswalk.len(),
        fingerprint = %crosswalk.fingerprint(),
        duration_ms = start.elapsed().as_millis(),
        "crosswalk ready"
    );
    Ok(crosswalk)
}

/// Requires exactly one input path.
pub fn single_input(inputs: &[PathBuf]) -> deid_model::Result<&Path> {
    match inputs {
        [input] => Ok(input.as_path()),
        [] => Err(DeidError::configuration("an input file is required")),
        _ => Err(DeidError::configuration(format!(
            "expected exactly one input file, got {} (use `deid batch` for several)",
            inputs.len()
        ))),
    }
}

/// Expands directories to the delimited files they contain.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let found = list_delimited_files(input)
                .with_context(|| format!("list {}", input.display()))?;
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

/// Result of processing one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub input: PathBuf,
    /// Written output; `None` for dry runs.
    pub output: Option<PathBuf>,
    pub report: DeidentifyReport,
}

/// De-identifies one file and writes it to `output` (skipped when `None`).
///
/// The output uses the configuration's separator.
pub fn process_file(
    input: &Path,
    output: Option<&Path>,
    config: &DeidentifyConfig,
    crosswalk: &Crosswalk,
) -> Result<FileOutcome> {
    let mut result = deidentify_file(input, config, crosswalk)
        .with_context(|| format!("de-identify {}", input.display()))?;
    if let Some(path) = output {
        let options = WriteOptions {
            separator: config.separator(),
            include_header: true,
        };
        write_table_file(path, &mut result.frame, options)?;
        info!(output = %path.display(), rows = result.report.rows, "output written");
    }
    Ok(FileOutcome {
        input: input.to_path_buf(),
        output: output.map(Path::to_path_buf),
        report: result.report,
    })
}

/// Refuses an output path that names the input file itself.
///
/// Paths are compared after canonicalization when both exist, so `./a.csv`
/// and `a.csv` count as the same file.
pub fn guard_overwrite(input: &Path, output: &Path) -> deid_model::Result<()> {
    let same_file = match (input.canonicalize(), output.canonicalize()) {
        (Ok(input), Ok(output)) => input == output,
        _ => input == output,
    };
    if same_file {
        return Err(DeidError::configuration(format!(
            "output {} would overwrite the input; choose another --output",
            output.display()
        )));
    }
    Ok(())
}

/// A batch input that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub input: PathBuf,
    pub error: String,
}

/// How a batch run places its outputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions<'a> {
    /// Directory for outputs; each input's own directory when `None`.
    pub output_dir: Option<&'a Path>,
    /// Keep the configured separator instead of guessing it per file.
    pub fixed_separator: bool,
    pub dry_run: bool,
}

/// Per-file results of a batch run.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub files: Vec<FileOutcome>,
    pub failures: Vec<FileFailure>,
}

/// De-identifies every input independently.
///
/// A file that fails is recorded in [`BatchOutcome::failures`] and the run
/// moves on to the next one. `on_file` is called after each input.
pub fn run_files<F>(
    inputs: &[PathBuf],
    config: &DeidentifyConfig,
    crosswalk: &Crosswalk,
    options: BatchOptions<'_>,
    mut on_file: F,
) -> BatchOutcome
where
    F: FnMut(&Path),
{
    let mut outcome = BatchOutcome::default();
    for input in inputs {
        let file_config = if options.fixed_separator {
            config.clone()
        } else {
            config.clone().with_separator(Separator::for_path(input))
        };
        let output = (!options.dry_run).then(|| prefixed_output_path(input, options.output_dir));
        match process_file(input, output.as_deref(), &file_config, crosswalk) {
            Ok(file) => outcome.files.push(file),
            Err(error) => {
                let error = format!("{error:#}");
                warn!(input = %input.display(), error = %error, "file failed");
                outcome.failures.push(FileFailure {
                    input: input.clone(),
                    error,
                });
            }
        }
        on_file(input);
    }
    outcome
}

/// Writes any serializable report as pretty JSON.
pub fn write_json_report<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_input_rejects_many() {
        let inputs = vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")];
        let err = single_input(&inputs).unwrap_err();
        assert!(matches!(err, DeidError::Configuration(_)));
        assert_eq!(
            single_input(&inputs[..1]).unwrap(),
            Path::new("a.csv")
        );
    }
}
