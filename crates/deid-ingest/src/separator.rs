//! Field separator for delimited files.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single-byte field separator.
///
/// Parses from `comma`, `tab`, `semicolon`, `pipe`, the escaped form `\t`, or
/// any single ASCII punctuation/whitespace character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Separator(u8);

impl Separator {
    pub const COMMA: Self = Self(b',');
    pub const TAB: Self = Self(b'\t');

    /// The separator as a byte, for CSV readers and writers.
    pub fn byte(self) -> u8 {
        self.0
    }

    /// Guesses the separator from a file extension: `.tsv`/`.tab` are
    /// tab-separated, everything else comma-separated.
    pub fn for_path(path: &Path) -> Self {
        let is_tab = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("tab"));
        if is_tab { Self::TAB } else { Self::COMMA }
    }
}

impl Default for Separator {
    fn default() -> Self {
        Self::COMMA
    }
}

impl FromStr for Separator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "comma" | "csv" => return Ok(Self::COMMA),
            "tab" | "tsv" | "\\t" => return Ok(Self::TAB),
            "semicolon" => return Ok(Self(b';')),
            "pipe" => return Ok(Self(b'|')),
            _ => {}
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_ascii() && !ch.is_ascii_alphanumeric() && ch != '"' => {
                Ok(Self(ch as u8))
            }
            _ => Err(format!(
                "unsupported separator '{s}' (expected comma, tab, or a single punctuation character)"
            )),
        }
    }
}

impl TryFrom<String> for Separator {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Separator> for String {
    fn from(value: Separator) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            b',' => f.write_str("comma"),
            b'\t' => f.write_str("tab"),
            other => write!(f, "{}", other as char),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_separators() {
        assert_eq!("comma".parse::<Separator>(), Ok(Separator::COMMA));
        assert_eq!("TAB".parse::<Separator>(), Ok(Separator::TAB));
        assert_eq!("\t".parse::<Separator>(), Ok(Separator::TAB));
        assert_eq!("\\t".parse::<Separator>(), Ok(Separator::TAB));
        assert_eq!(";".parse::<Separator>().map(Separator::byte), Ok(b';'));
    }

    #[test]
    fn rejects_letters_and_quotes() {
        assert!("x".parse::<Separator>().is_err());
        assert!("\"".parse::<Separator>().is_err());
        assert!(",,".parse::<Separator>().is_err());
    }

    #[test]
    fn guesses_from_extension() {
        assert_eq!(Separator::for_path(Path::new("a/b.TSV")), Separator::TAB);
        assert_eq!(Separator::for_path(Path::new("a/b.csv")), Separator::COMMA);
        assert_eq!(Separator::for_path(Path::new("a/b")), Separator::COMMA);
    }
}
