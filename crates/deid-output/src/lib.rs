//! Output for de-identified tables.
//!
//! - **writer**: delimited output where a missing cell is an empty field
//! - **path**: output path resolution, including the `default` marker

mod common;
mod path;
mod writer;

pub use common::{ensure_output_dir, ensure_parent_dir};
pub use path::{DEFAULT_OUTPUT_MARKER, OUTPUT_PREFIX, OutputTarget, prefixed_output_path};
pub use writer::{WriteOptions, write_table, write_table_file};
