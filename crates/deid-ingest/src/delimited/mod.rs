//! Delimited (CSV/TSV) reading utilities.

mod header;
mod reader;

pub use header::{CsvHeaders, read_csv_headers};
pub use reader::{read_text_table, validate_encoding};
