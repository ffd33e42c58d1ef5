//! Delimited writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::{CsvWriter, DataFrame, QuoteStyle, SerWriter};
use tracing::debug;

use deid_ingest::Separator;

use crate::common::ensure_parent_dir;

/// Options for delimited output.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    pub separator: Separator,
    pub include_header: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            separator: Separator::COMMA,
            include_header: true,
        }
    }
}

/// Writes a table as delimited text.
///
/// Null cells are written as empty, unquoted fields; other values are quoted
/// only when they contain the separator, a quote or a line break.
pub fn write_table<W: Write>(writer: W, df: &mut DataFrame, options: WriteOptions) -> Result<()> {
    CsvWriter::new(writer)
        .include_header(options.include_header)
        .with_separator(options.separator.byte())
        .with_quote_style(QuoteStyle::Necessary)
        .finish(df)
        .context("write delimited table")?;
    Ok(())
}

/// Writes a table to a file, creating parent directories as needed.
pub fn write_table_file(path: &Path, df: &mut DataFrame, options: WriteOptions) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_table(&mut writer, df, options)
        .with_context(|| format!("write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "table written"
    );
    Ok(())
}
