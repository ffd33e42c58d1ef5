//! Shared model types for the de-identification workspace.
//!
//! - **error**: the fatal error taxonomy shared by every crate
//! - **identifier**: identifier canonicalisation (exact text or numeric)
//! - **report**: crosswalk and per-file audit summaries

pub mod error;
pub mod identifier;
pub mod report;

pub use error::{DeidError, ErrorCategory, Result};
pub use identifier::{IdentifierMode, canonical_numeric, canonicalize_identifier, identifier_order};
pub use report::{
    CrosswalkSummary, DeidentifyReport, MissingColumn, RoleKind, SourceKind, SourceSummary,
};

/// Internal name of the identifier column in a built crosswalk.
pub const IDENTIFIER_COLUMN: &str = "identifier";
/// Internal name of the token column in a built crosswalk.
pub const TOKEN_COLUMN: &str = "token";
/// Internal name of the day-offset column in a built crosswalk.
pub const DAY_OFFSET_COLUMN: &str = "day_offset";
