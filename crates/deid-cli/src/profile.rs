//! Device profiles: named, reusable per-file configurations.
//!
//! A profile file is a JSON object mapping profile names to settings:
//!
//! ```json
//! {
//!   "oct": {
//!     "identifier_column": "PatientID",
//!     "remove": ["PatientName", "DOB"],
//!     "date": { "ExamDate": "%m/%d/%Y" },
//!     "datetime": { "AcquisitionTime": "%Y%m%d%H%M%S" },
//!     "separator": "comma"
//!   }
//! }
//! ```
//!
//! Command-line flags extend the lists and override the scalars of a loaded
//! profile.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use deid_ingest::Separator;
use deid_model::DeidError;
use deid_transform::{DeidentifyConfig, DeidentifyConfigBuilder};

/// Per-file settings as stored in a profile or given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    pub identifier_column: Option<String>,
    pub remove: Vec<String>,
    pub blank: Vec<String>,
    /// Column name → date pattern.
    pub date: BTreeMap<String, String>,
    /// Column name → datetime pattern.
    pub datetime: BTreeMap<String, String>,
    pub epoch: Vec<String>,
    pub separator: Option<Separator>,
    pub compare_numeric: Option<bool>,
}

impl Profile {
    /// Layers `overrides` on top of this profile.
    ///
    /// Lists are concatenated (duplicates dropped), pattern maps are merged
    /// with `overrides` winning per column, and set scalars replace ours.
    #[must_use]
    pub fn merge(mut self, overrides: Profile) -> Self {
        if overrides.identifier_column.is_some() {
            self.identifier_column = overrides.identifier_column;
        }
        extend_unique(&mut self.remove, overrides.remove);
        extend_unique(&mut self.blank, overrides.blank);
        extend_unique(&mut self.epoch, overrides.epoch);
        self.date.extend(overrides.date);
        self.datetime.extend(overrides.datetime);
        if overrides.separator.is_some() {
            self.separator = overrides.separator;
        }
        if overrides.compare_numeric.is_some() {
            self.compare_numeric = overrides.compare_numeric;
        }
        self
    }

    pub fn compare_numeric(&self) -> bool {
        self.compare_numeric.unwrap_or(false)
    }

    /// Builds the validated configuration.
    ///
    /// `default_separator` applies when the profile does not name one.
    ///
    /// # Errors
    ///
    /// [`DeidError::Configuration`] without an identifier column, plus every
    /// error of [`DeidentifyConfigBuilder::build`].
    pub fn to_config(&self, default_separator: Separator) -> deid_model::Result<DeidentifyConfig> {
        let identifier_column = self.identifier_column.as_deref().ok_or_else(|| {
            DeidError::configuration("an identifier column is required (--identifier-column)")
        })?;
        let mut builder: DeidentifyConfigBuilder = DeidentifyConfig::builder(identifier_column)
            .compare_numeric(self.compare_numeric())
            .separator(self.separator.unwrap_or(default_separator));
        for column in &self.remove {
            builder = builder.remove(column.as_str());
        }
        for column in &self.blank {
            builder = builder.blank(column.as_str());
        }
        for (column, pattern) in &self.date {
            builder = builder.shift_date(column.as_str(), pattern.as_str());
        }
        for (column, pattern) in &self.datetime {
            builder = builder.shift_datetime(column.as_str(), pattern.as_str());
        }
        for column in &self.epoch {
            builder = builder.shift_epoch(column.as_str());
        }
        builder.build()
    }
}

fn extend_unique(target: &mut Vec<String>, extra: Vec<String>) {
    for value in extra {
        if !target.contains(&value) {
            target.push(value);
        }
    }
}

/// Loads one named profile from a JSON profile file.
pub fn load_profile(path: &Path, name: &str) -> Result<Profile> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read profile file {}", path.display()))?;
    let mut profiles: BTreeMap<String, Profile> = serde_json::from_str(&text)
        .with_context(|| format!("parse profile file {}", path.display()))?;
    profiles.remove(name).ok_or_else(|| {
        let known: Vec<&str> = profiles.keys().map(String::as_str).collect();
        anyhow!(
            "profile '{name}' not found in {} (available: {})",
            path.display(),
            known.join(", ")
        )
    })
}

/// Parses a `COLUMN=FORMAT` command-line value.
pub fn parse_column_format(value: &str) -> std::result::Result<(String, String), String> {
    let (column, format) = value
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=FORMAT, got '{value}'"))?;
    let column = column.trim();
    if column.is_empty() || format.is_empty() {
        return Err(format!("expected COLUMN=FORMAT, got '{value}'"));
    }
    Ok((column.to_string(), format.to_string()))
}
