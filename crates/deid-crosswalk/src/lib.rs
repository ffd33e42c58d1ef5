//! Crosswalk construction.
//!
//! A crosswalk maps each patient identifier to a surrogate token and a
//! pre-assigned day offset. It is built once from one or two source tables,
//! validated to be 1-to-1, and then shared read-only by every file that is
//! de-identified in a run.
//!
//! # Example
//!
//! ```ignore
//! use deid_crosswalk::{CrosswalkBuilder, CrosswalkSource};
//!
//! let crosswalk = CrosswalkBuilder::new()
//!     .with_token_source(CrosswalkSource::from_file("tokens.csv", sep, "mrn", "token")?)
//!     .with_offset_source(CrosswalkSource::from_file("offsets.csv", sep, "mrn", "day_offset")?)
//!     .compare_numeric(true)
//!     .build()?;
//! ```

mod builder;
mod crosswalk;

pub use builder::{CrosswalkBuilder, CrosswalkSource, build_crosswalk, parse_day_offset};
pub use crosswalk::{Crosswalk, CrosswalkEntry};
