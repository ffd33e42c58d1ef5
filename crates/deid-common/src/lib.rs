//! Shared utilities for the de-identification crates.
//!
//! Tables at every crate boundary are Polars `DataFrame`s whose columns all
//! have the `String` dtype; a null cell is the "missing" marker. This crate
//! holds the small helpers for moving text in and out of such frames.

pub mod polars;

// Re-export commonly used functions at crate root for convenience
pub use polars::{column_texts, format_numeric, parse_f64, parse_i64, text_column, text_frame};
