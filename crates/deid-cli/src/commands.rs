use std::path::Path;
use std::time::Instant;

use anyhow::{Result, bail};
use comfy_table::{Cell, Table};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, info_span};

use deid_cli::pipeline::{
    BatchOptions, expand_inputs, guard_overwrite, load_crosswalk, process_file, run_files,
    single_input, write_json_report,
};
use deid_cli::profile::{Profile, load_profile};
use deid_ingest::Separator;
use deid_model::CrosswalkSummary;
use deid_output::ensure_output_dir;
use deid_transform::{SUPPORTED_COMPONENTS, SUPPORTED_SEPARATORS};

use crate::cli::{BatchArgs, CrosswalkCommandArgs, DeidentifyArgs, TableArgs};
use crate::summary::{apply_table_style, header_cell, print_crosswalk_summary};
use crate::types::RunResult;

pub fn run_formats() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Component"), header_cell("Meaning")]);
    apply_table_style(&mut table);
    for (component, meaning) in SUPPORTED_COMPONENTS {
        table.add_row(vec![component, meaning]);
    }
    println!("{table}");

    let mut separators = Table::new();
    separators.set_header(vec![header_cell("Separator")]);
    apply_table_style(&mut separators);
    for separator in SUPPORTED_SEPARATORS {
        let label = match separator {
            ' ' => "(space)".to_string(),
            other => other.to_string(),
        };
        separators.add_row(vec![Cell::new(label)]);
    }
    println!("{separators}");
    println!("Patterns without separators (e.g. %Y%m%d%H%M%S) accept values that lost leading zeros.");
    println!("Fractional seconds are optional; separated date patterns drop a trailing time.");
    Ok(())
}

#[derive(Serialize)]
struct CrosswalkReport<'a> {
    summary: &'a CrosswalkSummary,
    fingerprint: String,
}

pub fn run_crosswalk(args: &CrosswalkCommandArgs) -> Result<()> {
    let crosswalk = load_crosswalk(&args.crosswalk.options(args.crosswalk.compare_numeric))?;
    let fingerprint = crosswalk.fingerprint();
    if args.json {
        let report = CrosswalkReport {
            summary: crosswalk.summary(),
            fingerprint,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_crosswalk_summary(crosswalk.summary(), &fingerprint);
    }
    Ok(())
}

pub fn run_deidentify(args: &DeidentifyArgs) -> Result<RunResult> {
    let input = single_input(&args.inputs)?;
    let run_span = info_span!("deidentify", input = %input.display());
    let _run_guard = run_span.enter();
    let start = Instant::now();

    // =========================================================================
    // Stage 1: Validate the per-file configuration
    // =========================================================================
    let profile = resolve_profile(&args.table, args.crosswalk.compare_numeric)?;
    let config = profile.to_config(Separator::for_path(input))?;

    // =========================================================================
    // Stage 2: Build the crosswalk
    // =========================================================================
    let crosswalk = load_crosswalk(&args.crosswalk.options(profile.compare_numeric()))?;

    // =========================================================================
    // Stage 3: Transform and write
    // =========================================================================
    let output = if args.table.dry_run {
        None
    } else {
        let path = args.output.resolve(input);
        guard_overwrite(input, &path)?;
        Some(path)
    };
    let outcome = process_file(input, output.as_deref(), &config, &crosswalk)?;

    let result = RunResult {
        crosswalk: crosswalk.summary().clone(),
        fingerprint: crosswalk.fingerprint(),
        dry_run: args.table.dry_run,
        files: vec![outcome],
        failures: Vec::new(),
    };
    if let Some(path) = &args.table.report {
        write_json_report(path, &result)?;
    }
    info!(
        duration_ms = start.elapsed().as_millis(),
        "de-identification complete"
    );
    Ok(result)
}

pub fn run_batch(args: &BatchArgs) -> Result<RunResult> {
    let run_span = info_span!("batch");
    let _run_guard = run_span.enter();
    let start = Instant::now();

    let inputs = expand_inputs(&args.inputs)?;
    if inputs.is_empty() {
        bail!("no delimited files found in the given inputs");
    }

    // =========================================================================
    // Stage 1: Validate the per-file configuration once
    // =========================================================================
    let profile = resolve_profile(&args.table, args.crosswalk.compare_numeric)?;
    let base_config = profile.to_config(Separator::COMMA)?;

    // =========================================================================
    // Stage 2: Build the crosswalk shared by every file
    // =========================================================================
    let crosswalk = load_crosswalk(&args.crosswalk.options(profile.compare_numeric()))?;
    let output_dir = match &args.output_dir {
        Some(dir) if !args.table.dry_run => Some(ensure_output_dir(dir)?),
        Some(dir) => Some(dir.clone()),
        None => None,
    };

    // =========================================================================
    // Stage 3: Process each file independently
    // =========================================================================
    let progress = ProgressBar::new(inputs.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let options = BatchOptions {
        output_dir: output_dir.as_deref(),
        fixed_separator: profile.separator.is_some(),
        dry_run: args.table.dry_run,
    };
    let outcome = run_files(&inputs, &base_config, &crosswalk, options, |input| {
        progress.set_message(file_label(input));
        progress.inc(1);
    });
    progress.finish_and_clear();

    let result = RunResult {
        crosswalk: crosswalk.summary().clone(),
        fingerprint: crosswalk.fingerprint(),
        dry_run: args.table.dry_run,
        files: outcome.files,
        failures: outcome.failures,
    };
    if let Some(path) = &args.table.report {
        write_json_report(path, &result)?;
    }
    info!(
        files = result.files.len(),
        failures = result.failures.len(),
        duration_ms = start.elapsed().as_millis(),
        "batch complete"
    );
    Ok(result)
}

/// Loads the named profile (if any) and layers the command-line flags on top.
fn resolve_profile(table: &TableArgs, compare_numeric: bool) -> Result<Profile> {
    let base = match (&table.profile, &table.profile_file) {
        (Some(name), Some(path)) => load_profile(path, name)?,
        _ => Profile::default(),
    };
    Ok(base.merge(table.as_profile(compare_numeric)))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
