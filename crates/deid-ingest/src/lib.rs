//! Delimited-file ingestion for device exports and crosswalk sources.
//!
//! Every column is read as text: record numbers lose their leading zeros and
//! timestamps their precision the moment a reader infers a numeric type.
//!
//! # Features
//!
//! - **Header sniffing**: read and validate the header row before any data
//! - **Projected reads**: load only the retained columns into a Polars `DataFrame`
//! - **Crosswalk sources**: load an identifier column and one value column
//! - **Discovery**: list delimited files in a directory for batch runs
//!
//! # Example
//!
//! ```ignore
//! use std::collections::BTreeSet;
//! use std::path::Path;
//! use deid_ingest::{Separator, read_text_table};
//!
//! let skip: BTreeSet<String> = ["PatientName".to_string()].into();
//! let (df, headers) = read_text_table(Path::new("exports/oct.csv"), Separator::COMMA, &skip)?;
//! ```

mod delimited;
mod discovery;
mod error;
mod separator;
mod source;

// === Error Types ===
pub use error::{IngestError, Result};

// === Delimited Reading ===
pub use delimited::{CsvHeaders, read_csv_headers, read_text_table, validate_encoding};

// === Separators ===
pub use separator::Separator;

// === Crosswalk Sources ===
pub use source::read_crosswalk_source;

// === File Discovery ===
pub use discovery::list_delimited_files;
