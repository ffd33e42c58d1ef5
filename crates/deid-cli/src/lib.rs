//! Library side of the `deid` command-line tool.

pub mod logging;
pub mod pipeline;
pub mod profile;
