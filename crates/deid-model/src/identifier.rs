//! Identifier canonicalisation.
//!
//! Source systems disagree about identifier formatting: one export keeps
//! `000123`, another drops the padding and stores `123`, a third round-trips
//! the value through a float and writes `123.0`. When numeric comparison is
//! enabled all three collapse to the same key. The canonical form is computed
//! on the decimal text itself so long record numbers never lose precision.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// How identifiers are compared between an input table and the crosswalk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierMode {
    /// Compare the trimmed text exactly.
    #[default]
    Exact,
    /// Compare the canonical numeric form.
    Numeric,
}

impl IdentifierMode {
    pub fn from_compare_numeric(compare_numeric: bool) -> Self {
        if compare_numeric {
            Self::Numeric
        } else {
            Self::Exact
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Numeric)
    }
}

/// Canonicalises an identifier cell for keying.
///
/// Returns `None` for empty cells and, in numeric mode, for values that are
/// not numbers at all.
pub fn canonicalize_identifier(value: &str, mode: IdentifierMode) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match mode {
        IdentifierMode::Exact => Some(trimmed.to_string()),
        IdentifierMode::Numeric => canonical_numeric(trimmed),
    }
}

/// Converts numeric text to a canonical decimal string.
///
/// Leading zeros, a leading `+`, and trailing fractional zeros are removed:
/// `"000123"`, `"+123"` and `"123.000"` all become `"123"`. Exponent forms
/// fall back to floating point parsing.
pub fn canonical_numeric(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let (negative, unsigned) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (unsigned, ""),
    };
    let is_decimal = !(int_part.is_empty() && frac_part.is_empty())
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.bytes().all(|b| b.is_ascii_digit());
    if !is_decimal {
        return canonical_from_float(trimmed);
    }

    let int_digits = int_part.trim_start_matches('0');
    let frac_digits = frac_part.trim_end_matches('0');
    let mut out = String::with_capacity(trimmed.len());
    let is_zero = int_digits.is_empty() && frac_digits.is_empty();
    if negative && !is_zero {
        out.push('-');
    }
    if int_digits.is_empty() {
        out.push('0');
    } else {
        out.push_str(int_digits);
    }
    if !frac_digits.is_empty() {
        out.push('.');
        out.push_str(frac_digits);
    }
    Some(out)
}

fn canonical_from_float(value: &str) -> Option<String> {
    let lowered = value.to_ascii_lowercase();
    // Rust accepts "inf" and "nan"; identifiers never do.
    if !lowered.contains('e') {
        return None;
    }
    let parsed = lowered.parse::<f64>().ok().filter(|v| v.is_finite())?;
    if parsed.fract() == 0.0 && parsed.abs() < 1e18 {
        return Some(format!("{}", parsed as i64));
    }
    canonical_numeric(&format!("{parsed}"))
}

/// Orders canonical identifiers for presentation.
///
/// Numeric identifiers sort by value, exact identifiers lexically.
pub fn identifier_order(left: &str, right: &str, mode: IdentifierMode) -> Ordering {
    if mode.is_numeric()
        && let (Ok(l), Ok(r)) = (left.parse::<f64>(), right.parse::<f64>())
    {
        return l.partial_cmp(&r).unwrap_or(Ordering::Equal).then_with(|| left.cmp(right));
    }
    left.cmp(right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_mode_only_trims() {
        assert_eq!(
            canonicalize_identifier(" 000123 ", IdentifierMode::Exact),
            Some("000123".to_string())
        );
        assert_eq!(canonicalize_identifier("   ", IdentifierMode::Exact), None);
    }

    #[test]
    fn numeric_mode_drops_padding() {
        let mode = IdentifierMode::Numeric;
        assert_eq!(canonicalize_identifier("000123", mode), Some("123".to_string()));
        assert_eq!(canonicalize_identifier("123.0", mode), Some("123".to_string()));
        assert_eq!(canonicalize_identifier("+123", mode), Some("123".to_string()));
        assert_eq!(canonicalize_identifier("0", mode), Some("0".to_string()));
        assert_eq!(canonicalize_identifier("-0.00", mode), Some("0".to_string()));
        assert_eq!(canonicalize_identifier("12.50", mode), Some("12.5".to_string()));
    }

    #[test]
    fn numeric_mode_keeps_long_identifiers_exact() {
        assert_eq!(
            canonical_numeric("0012345678901234567890"),
            Some("12345678901234567890".to_string())
        );
    }

    #[test]
    fn numeric_mode_rejects_text() {
        assert_eq!(canonical_numeric("MRN-1"), None);
        assert_eq!(canonical_numeric("inf"), None);
        assert_eq!(canonical_numeric("."), None);
        assert_eq!(canonical_numeric("1.2.3"), None);
    }

    #[test]
    fn numeric_mode_accepts_exponent() {
        assert_eq!(canonical_numeric("1.23e2"), Some("123".to_string()));
    }

    #[test]
    fn numeric_order_is_by_value() {
        assert_eq!(identifier_order("9", "10", IdentifierMode::Numeric), Ordering::Less);
        assert_eq!(identifier_order("9", "10", IdentifierMode::Exact), Ordering::Greater);
    }
}
