//! Per-file de-identification configuration.
//!
//! Every configured column carries exactly one [`ColumnRole`]. Columns that
//! are not configured pass through untouched. The configuration is validated
//! once, when it is built, so a conflicting role or a bad timestamp pattern
//! fails before any file is opened.

use std::collections::BTreeSet;

use tracing::debug;

use deid_ingest::Separator;
use deid_model::{DeidError, IdentifierMode, Result, RoleKind};

use crate::pattern::TimestampPattern;

/// How one column is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRole {
    /// Never read, absent from the output.
    Remove,
    /// Kept in the header, every cell missing.
    Blank,
    ShiftDate(TimestampPattern),
    ShiftDateTime(TimestampPattern),
    ShiftEpoch,
    Passthrough,
}

impl ColumnRole {
    /// The reporting category, `None` for passthrough.
    pub fn kind(&self) -> Option<RoleKind> {
        match self {
            Self::Remove => Some(RoleKind::Remove),
            Self::Blank => Some(RoleKind::Blank),
            Self::ShiftDate(_) => Some(RoleKind::Date),
            Self::ShiftDateTime(_) => Some(RoleKind::DateTime),
            Self::ShiftEpoch => Some(RoleKind::Epoch),
            Self::Passthrough => None,
        }
    }

    /// True for the three day-offset roles.
    pub fn is_shift(&self) -> bool {
        matches!(
            self,
            Self::ShiftDate(_) | Self::ShiftDateTime(_) | Self::ShiftEpoch
        )
    }
}

/// Validated configuration for de-identifying one table.
#[derive(Debug, Clone)]
pub struct DeidentifyConfig {
    identifier_column: String,
    /// Configured columns in the order they were added.
    roles: Vec<(String, ColumnRole)>,
    compare_numeric: bool,
    separator: Separator,
}

impl DeidentifyConfig {
    pub fn builder(identifier_column: impl Into<String>) -> DeidentifyConfigBuilder {
        DeidentifyConfigBuilder::new(identifier_column)
    }

    pub fn identifier_column(&self) -> &str {
        &self.identifier_column
    }

    /// Whether input identifiers are canonicalized numerically before lookup.
    ///
    /// Must match the convention the crosswalk was built with.
    pub fn compare_numeric(&self) -> bool {
        self.compare_numeric
    }

    pub fn identifier_mode(&self) -> IdentifierMode {
        IdentifierMode::from_compare_numeric(self.compare_numeric)
    }

    pub fn separator(&self) -> Separator {
        self.separator
    }

    /// Same configuration, different field separator.
    #[must_use]
    pub fn with_separator(mut self, separator: Separator) -> Self {
        self.separator = separator;
        self
    }

    /// The role of a column; unconfigured columns are passthrough.
    pub fn role(&self, column: &str) -> &ColumnRole {
        self.roles
            .iter()
            .find(|(name, _)| name == column)
            .map_or(&ColumnRole::Passthrough, |(_, role)| role)
    }

    /// All configured columns with their roles, in configuration order.
    pub fn roles(&self) -> impl Iterator<Item = (&str, &ColumnRole)> {
        self.roles.iter().map(|(name, role)| (name.as_str(), role))
    }

    /// Names of the columns with the given role category.
    pub fn columns_with(&self, kind: RoleKind) -> Vec<&str> {
        self.roles()
            .filter(|(_, role)| role.kind() == Some(kind))
            .map(|(name, _)| name)
            .collect()
    }

    pub fn removed_columns(&self) -> BTreeSet<String> {
        self.columns_with(RoleKind::Remove)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// True when any date, datetime or epoch column is configured.
    pub fn requires_offsets(&self) -> bool {
        self.roles.iter().any(|(_, role)| role.is_shift())
    }
}

#[derive(Debug, Clone)]
enum PendingRole {
    Remove,
    Blank,
    Date(String),
    DateTime(String),
    Epoch,
}

impl PendingRole {
    fn kind(&self) -> RoleKind {
        match self {
            Self::Remove => RoleKind::Remove,
            Self::Blank => RoleKind::Blank,
            Self::Date(_) => RoleKind::Date,
            Self::DateTime(_) => RoleKind::DateTime,
            Self::Epoch => RoleKind::Epoch,
        }
    }

    fn compile(self) -> Result<ColumnRole> {
        Ok(match self {
            Self::Remove => ColumnRole::Remove,
            Self::Blank => ColumnRole::Blank,
            Self::Date(pattern) => ColumnRole::ShiftDate(TimestampPattern::date(&pattern)?),
            Self::DateTime(pattern) => {
                ColumnRole::ShiftDateTime(TimestampPattern::datetime(&pattern)?)
            }
            Self::Epoch => ColumnRole::ShiftEpoch,
        })
    }
}

/// Builder for [`DeidentifyConfig`].
///
/// Roles are collected as given and checked together in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct DeidentifyConfigBuilder {
    identifier_column: String,
    pending: Vec<(String, PendingRole)>,
    compare_numeric: bool,
    separator: Separator,
}

impl DeidentifyConfigBuilder {
    pub fn new(identifier_column: impl Into<String>) -> Self {
        Self {
            identifier_column: identifier_column.into(),
            pending: Vec::new(),
            compare_numeric: false,
            separator: Separator::default(),
        }
    }

    pub fn remove(mut self, column: impl Into<String>) -> Self {
        self.pending.push((column.into(), PendingRole::Remove));
        self
    }

    pub fn blank(mut self, column: impl Into<String>) -> Self {
        self.pending.push((column.into(), PendingRole::Blank));
        self
    }

    pub fn shift_date(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.pending
            .push((column.into(), PendingRole::Date(pattern.into())));
        self
    }

    pub fn shift_datetime(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.pending
            .push((column.into(), PendingRole::DateTime(pattern.into())));
        self
    }

    pub fn shift_epoch(mut self, column: impl Into<String>) -> Self {
        self.pending.push((column.into(), PendingRole::Epoch));
        self
    }

    pub fn compare_numeric(mut self, enable: bool) -> Self {
        self.compare_numeric = enable;
        self
    }

    pub fn separator(mut self, separator: Separator) -> Self {
        self.separator = separator;
        self
    }

    /// Validates and compiles the configuration.
    ///
    /// # Errors
    ///
    /// - [`DeidError::Configuration`] for an empty identifier column name
    /// - [`DeidError::ConflictingColumnRole`] when a column (including the
    ///   identifier column) is given two different roles
    /// - [`DeidError::InvalidFormat`] for an unsupported timestamp pattern
    pub fn build(self) -> Result<DeidentifyConfig> {
        let identifier_column = self.identifier_column.trim().to_string();
        if identifier_column.is_empty() {
            return Err(DeidError::configuration("identifier column name is empty"));
        }

        let mut roles: Vec<(String, ColumnRole)> = Vec::with_capacity(self.pending.len());
        for (column, pending) in self.pending {
            let column = column.trim().to_string();
            if column.is_empty() {
                return Err(DeidError::configuration("column name is empty"));
            }
            if column == identifier_column {
                return Err(DeidError::ConflictingColumnRole {
                    column,
                    first: "identifier".to_string(),
                    second: pending.kind().to_string(),
                });
            }
            let kind = pending.kind();
            let role = pending.compile()?;
            match roles.iter().find(|(name, _)| *name == column) {
                // Repeating the same role is harmless.
                Some((_, existing)) if *existing == role => continue,
                Some((_, existing)) => {
                    return Err(DeidError::ConflictingColumnRole {
                        first: existing
                            .kind()
                            .map_or_else(|| "passthrough".to_string(), |k| k.to_string()),
                        second: kind.to_string(),
                        column,
                    });
                }
                None => roles.push((column, role)),
            }
        }

        debug!(
            identifier_column = %identifier_column,
            configured_columns = roles.len(),
            compare_numeric = self.compare_numeric,
            "de-identification configuration built"
        );
        Ok(DeidentifyConfig {
            identifier_column,
            roles,
            compare_numeric: self.compare_numeric,
            separator: self.separator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_columns_pass_through() {
        let config = DeidentifyConfig::builder("mrn")
            .remove("name")
            .build()
            .unwrap();
        assert_eq!(config.role("name"), &ColumnRole::Remove);
        assert_eq!(config.role("eye"), &ColumnRole::Passthrough);
        assert!(!config.requires_offsets());
    }

    #[test]
    fn repeated_identical_role_is_accepted() {
        let config = DeidentifyConfig::builder("mrn")
            .blank("dob")
            .blank("dob")
            .build()
            .unwrap();
        assert_eq!(config.columns_with(RoleKind::Blank), vec!["dob"]);
    }

    #[test]
    fn same_column_with_two_patterns_conflicts() {
        let result = DeidentifyConfig::builder("mrn")
            .shift_date("examdate", "%Y-%m-%d")
            .shift_date("examdate", "%m/%d/%Y")
            .build();
        assert!(matches!(result, Err(DeidError::ConflictingColumnRole { .. })));
    }
}
