//! CLI argument definitions for `deid`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use deid_cli::pipeline::CrosswalkOptions;
use deid_cli::profile::{Profile, parse_column_format};
use deid_ingest::Separator;
use deid_output::OutputTarget;

#[derive(Parser)]
#[command(
    name = "deid",
    version,
    about = "De-identify ophthalmic device exports with a precomputed crosswalk",
    long_about = "De-identify delimited exports from ophthalmic imaging and testing devices.\n\n\
                  Replaces the patient identifier with a crosswalk token, shifts dates,\n\
                  datetimes and epoch times by the patient's day offset, and removes or\n\
                  blanks identifying columns. Everything else passes through unchanged."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -vvv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow identifiers and tokens in trace-level logs.
    ///
    /// These values are protected health information; without this flag
    /// they are logged as [REDACTED].
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// De-identify a single export file.
    Deidentify(DeidentifyArgs),

    /// De-identify many files (or directories of files) with one crosswalk.
    Batch(BatchArgs),

    /// Build and validate the crosswalk only, then print its summary.
    Crosswalk(CrosswalkCommandArgs),

    /// List the supported timestamp pattern components and separators.
    Formats,
}

#[derive(Args)]
pub struct DeidentifyArgs {
    /// The export file to de-identify.
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file, or `default` to write `deidentified_<name>` next to the input.
    #[arg(long = "output", short = 'o', value_name = "PATH", default_value = "default")]
    pub output: OutputTarget,

    #[command(flatten)]
    pub crosswalk: CrosswalkArgs,

    #[command(flatten)]
    pub table: TableArgs,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Export files or directories of export files.
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory for outputs (default: next to each input).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub crosswalk: CrosswalkArgs,

    #[command(flatten)]
    pub table: TableArgs,
}

#[derive(Args)]
pub struct CrosswalkCommandArgs {
    #[command(flatten)]
    pub crosswalk: CrosswalkArgs,

    /// Print the summary as JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

/// Crosswalk sources.
#[derive(Args)]
pub struct CrosswalkArgs {
    /// Identifier ↔ token table.
    #[arg(long = "token-crosswalk", value_name = "PATH")]
    pub token_crosswalk: Option<PathBuf>,

    /// Identifier ↔ day-offset table.
    #[arg(long = "offset-crosswalk", value_name = "PATH")]
    pub offset_crosswalk: Option<PathBuf>,

    /// Identifier column of the token table.
    #[arg(long = "token-id-column", value_name = "COLUMN", default_value = "mrn")]
    pub token_id_column: String,

    /// Token column of the token table.
    #[arg(long = "token-column", value_name = "COLUMN", default_value = "token")]
    pub token_column: String,

    /// Identifier column of the offset table.
    #[arg(long = "offset-id-column", value_name = "COLUMN", default_value = "mrn")]
    pub offset_id_column: String,

    /// Day-offset column of the offset table.
    #[arg(long = "offset-column", value_name = "COLUMN", default_value = "day_offset")]
    pub offset_column: String,

    /// Separator of the crosswalk tables (default: from the file extension).
    #[arg(long = "crosswalk-separator", value_name = "SEP")]
    pub crosswalk_separator: Option<Separator>,

    /// Compare identifiers by numeric value, ignoring leading zeros.
    ///
    /// Applies to the crosswalk and to every input file alike.
    #[arg(long = "compare-numeric")]
    pub compare_numeric: bool,
}

impl CrosswalkArgs {
    pub fn options(&self, compare_numeric: bool) -> CrosswalkOptions {
        CrosswalkOptions {
            token_path: self.token_crosswalk.clone(),
            offset_path: self.offset_crosswalk.clone(),
            token_identifier_column: self.token_id_column.clone(),
            token_column: self.token_column.clone(),
            offset_identifier_column: self.offset_id_column.clone(),
            offset_column: self.offset_column.clone(),
            separator: self.crosswalk_separator,
            compare_numeric,
        }
    }
}

/// Per-file column handling.
#[derive(Args)]
pub struct TableArgs {
    /// Column holding the patient identifier.
    #[arg(long = "identifier-column", value_name = "COLUMN")]
    pub identifier_column: Option<String>,

    /// Columns to drop (never read into memory).
    #[arg(long = "remove", value_name = "COLUMN", value_delimiter = ',')]
    pub remove: Vec<String>,

    /// Columns whose every cell is emptied.
    #[arg(long = "blank", value_name = "COLUMN", value_delimiter = ',')]
    pub blank: Vec<String>,

    /// Date column to shift, with its pattern (e.g. ExamDate=%m/%d/%Y).
    #[arg(long = "date", value_name = "COLUMN=FORMAT", value_parser = parse_column_format)]
    pub date: Vec<(String, String)>,

    /// Datetime column to shift, with its pattern (e.g. Acquired=%Y%m%d%H%M%S).
    #[arg(long = "datetime", value_name = "COLUMN=FORMAT", value_parser = parse_column_format)]
    pub datetime: Vec<(String, String)>,

    /// Epoch-seconds columns to shift.
    #[arg(long = "epoch", value_name = "COLUMN", value_delimiter = ',')]
    pub epoch: Vec<String>,

    /// Field separator: comma, tab, or a single character (default: from the extension).
    #[arg(long = "separator", value_name = "SEP")]
    pub separator: Option<Separator>,

    /// Named device profile to start from.
    #[arg(long = "profile", value_name = "NAME", requires = "profile_file")]
    pub profile: Option<String>,

    /// JSON file holding device profiles.
    #[arg(long = "profile-file", value_name = "PATH", requires = "profile")]
    pub profile_file: Option<PathBuf>,

    /// Validate and transform, but write nothing.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Write the per-file report(s) as JSON.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,
}

impl TableArgs {
    /// The command-line flags as a profile layer.
    pub fn as_profile(&self, compare_numeric: bool) -> Profile {
        Profile {
            identifier_column: self.identifier_column.clone(),
            remove: self.remove.clone(),
            blank: self.blank.clone(),
            date: self.date.iter().cloned().collect::<BTreeMap<_, _>>(),
            datetime: self.datetime.iter().cloned().collect::<BTreeMap<_, _>>(),
            epoch: self.epoch.clone(),
            separator: self.separator,
            compare_numeric: compare_numeric.then_some(true),
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
