//! Table de-identification.
//!
//! - **pattern**: the timestamp pattern language for date/datetime columns
//! - **shift**: day-offset arithmetic on dates, wall-clock datetimes and epochs
//! - **config**: per-column roles and the validated per-file configuration
//! - **executors**: column-level rewrites on all-text DataFrames
//! - **pipeline**: the ordered de-identification of one table
//!
//! # Example
//!
//! ```ignore
//! use deid_transform::{DeidentifyConfig, deidentify_file};
//!
//! let config = DeidentifyConfig::builder("PatientID")
//!     .remove("PatientName")
//!     .shift_date("ExamDate", "%m/%d/%Y")
//!     .build()?;
//! let out = deidentify_file(Path::new("oct.csv"), &config, &crosswalk)?;
//! ```

pub mod config;
pub mod executors;
pub mod pattern;
pub mod pipeline;
pub mod shift;

pub use config::{ColumnRole, DeidentifyConfig, DeidentifyConfigBuilder};
pub use pattern::{SUPPORTED_COMPONENTS, SUPPORTED_SEPARATORS, TimestampPattern};
pub use pipeline::{Deidentified, deidentify_file, deidentify_frame};
pub use shift::{EpochSeconds, shift_date, shift_datetime, shift_epoch};
