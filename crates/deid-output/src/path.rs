//! Output path resolution.

use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Reserved `--output` value meaning "next to the input, prefixed".
pub const DEFAULT_OUTPUT_MARKER: &str = "default";

/// Literal prepended to the input file name by the marker form.
pub const OUTPUT_PREFIX: &str = "deidentified_";

/// Where a de-identified table is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Input directory, input file name with [`OUTPUT_PREFIX`].
    Default,
    /// An explicit file path.
    Path(PathBuf),
}

impl OutputTarget {
    /// Resolves the concrete output path for an input file.
    pub fn resolve(&self, input: &Path) -> PathBuf {
        match self {
            Self::Default => prefixed_output_path(input, None),
            Self::Path(path) => path.clone(),
        }
    }
}

impl FromStr for OutputTarget {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == DEFAULT_OUTPUT_MARKER {
            Ok(Self::Default)
        } else {
            Ok(Self::Path(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str(DEFAULT_OUTPUT_MARKER),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Prefixes the input's final path segment with [`OUTPUT_PREFIX`].
///
/// The result lands in `dir` when given, otherwise in the input's own
/// directory.
pub fn prefixed_output_path(input: &Path, dir: Option<&Path>) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefixed = format!("{OUTPUT_PREFIX}{file_name}");
    match dir {
        Some(dir) => dir.join(prefixed),
        None => input.with_file_name(prefixed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_keeps_directory() {
        let target: OutputTarget = "default".parse().unwrap();
        assert_eq!(target, OutputTarget::Default);
        assert_eq!(
            target.resolve(Path::new("exports/2024/oct_scans.csv")),
            PathBuf::from("exports/2024/deidentified_oct_scans.csv")
        );
        assert_eq!(
            target.resolve(Path::new("fields.tsv")),
            PathBuf::from("deidentified_fields.tsv")
        );
    }

    #[test]
    fn explicit_path_is_used_verbatim() {
        let target: OutputTarget = "out/clean.csv".parse().unwrap();
        assert_eq!(
            target.resolve(Path::new("in/raw.csv")),
            PathBuf::from("out/clean.csv")
        );
    }

    #[test]
    fn output_dir_variant() {
        assert_eq!(
            prefixed_output_path(Path::new("in/raw.csv"), Some(Path::new("shared"))),
            PathBuf::from("shared/deidentified_raw.csv")
        );
    }
}
