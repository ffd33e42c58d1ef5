//! Timestamp pattern language.
//!
//! Patterns are strftime-like but deliberately small:
//!
//! | specifier | component                              |
//! |-----------|----------------------------------------|
//! | `%Y`      | 4-digit year                           |
//! | `%m`      | month, 2 digits (1 when separated)     |
//! | `%d`      | day, 2 digits (1 when separated)       |
//! | `%H`      | hour (24h), 2 digits (1 when separated)|
//! | `%M`      | minute, 2 digits (1 when separated)    |
//! | `%S`      | second, 2 digits (1 when separated)    |
//! | `%f`      | fractional seconds, 1+ digits, dropped |
//!
//! Fractional seconds are optional on both sides: `.%f` also matches a value
//! that ends at the seconds, and a separated pattern ending in `%S` also
//! matches a value carrying a `.fraction`. A separated date pattern without `%H`
//! accepts a trailing ` HH:MM[:SS[.f]]` (or `T…`) time, which is dropped.
//!
//! Between components only the literals `-`, `/`, `:`, space, `T` and `.`
//! may appear. A component that touches another component (`%Y%m%d`) has a
//! fixed width; one bounded by literals (`%m/%d/%Y`) accepts one or two
//! digits, so `1/2/2020` parses.
//!
//! A pattern with no literals at all is *compact*. Compact values are often
//! stored as numbers upstream, which drops leading zeros and may append a
//! `.0`; both are undone before parsing.

use std::borrow::Cow;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use deid_model::{DeidError, Result};

/// Literal separators allowed between components.
pub const SUPPORTED_SEPARATORS: [char; 6] = ['-', '/', ':', ' ', 'T', '.'];

/// Supported specifiers with a short description, in display order.
pub const SUPPORTED_COMPONENTS: [(&str, &str); 7] = [
    ("%Y", "4-digit year"),
    ("%m", "month (01-12)"),
    ("%d", "day of month (01-31)"),
    ("%H", "hour, 24h clock (00-23)"),
    ("%M", "minute (00-59)"),
    ("%S", "second (00-59)"),
    ("%f", "fractional seconds (parsed, then dropped)"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Component {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Fraction,
}

impl Component {
    fn from_specifier(ch: char) -> Option<Self> {
        match ch {
            'Y' => Some(Self::Year),
            'm' => Some(Self::Month),
            'd' => Some(Self::Day),
            'H' => Some(Self::Hour),
            'M' => Some(Self::Minute),
            'S' => Some(Self::Second),
            'f' => Some(Self::Fraction),
            _ => None,
        }
    }

    fn width(self) -> usize {
        match self {
            Self::Year => 4,
            Self::Fraction => 0,
            _ => 2,
        }
    }

    fn specifier(self) -> &'static str {
        match self {
            Self::Year => "%Y",
            Self::Month => "%m",
            Self::Day => "%d",
            Self::Hour => "%H",
            Self::Minute => "%M",
            Self::Second => "%S",
            Self::Fraction => "%f",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Field { component: Component, fixed: bool },
    Literal(u8),
}

/// Parsed component values, before calendar validation.
#[derive(Debug, Default)]
struct Fields {
    year: u32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
}

impl Fields {
    fn set(&mut self, component: Component, value: u32) {
        match component {
            Component::Year => self.year = value,
            Component::Month => self.month = value,
            Component::Day => self.day = value,
            Component::Hour => self.hour = value,
            Component::Minute => self.minute = value,
            Component::Second => self.second = value,
            Component::Fraction => {}
        }
    }
}

/// A compiled timestamp pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampPattern {
    source: String,
    tokens: Vec<Token>,
    has_time: bool,
    /// Total digit count for compact patterns.
    compact_width: Option<usize>,
}

impl TimestampPattern {
    /// Compiles a pattern for a date column.
    ///
    /// Time components are allowed and ignored on output.
    pub fn date(pattern: &str) -> Result<Self> {
        Self::compile(pattern, "date")
    }

    /// Compiles a pattern for a datetime column; `%H` and `%M` are required.
    pub fn datetime(pattern: &str) -> Result<Self> {
        let compiled = Self::compile(pattern, "datetime")?;
        if !compiled.has_time {
            return Err(invalid("datetime", pattern, "requires %H and %M"));
        }
        Ok(compiled)
    }

    fn compile(pattern: &str, kind: &str) -> Result<Self> {
        let mut raw: Vec<Option<Component>> = Vec::new();
        let mut literals: Vec<u8> = Vec::new();
        let mut chars = pattern.chars();
        while let Some(ch) = chars.next() {
            if ch == '%' {
                let Some(spec) = chars.next() else {
                    return Err(invalid(kind, pattern, "dangling '%' at end of pattern"));
                };
                let Some(component) = Component::from_specifier(spec) else {
                    return Err(invalid(
                        kind,
                        pattern,
                        &format!("unsupported component '%{spec}'"),
                    ));
                };
                if raw.contains(&Some(component)) {
                    return Err(invalid(
                        kind,
                        pattern,
                        &format!("component {} appears twice", component.specifier()),
                    ));
                }
                raw.push(Some(component));
                literals.push(0);
            } else if SUPPORTED_SEPARATORS.contains(&ch) {
                raw.push(None);
                literals.push(ch as u8);
            } else {
                return Err(invalid(
                    kind,
                    pattern,
                    &format!("unsupported separator '{ch}'"),
                ));
            }
        }

        let has = |component: Component| raw.contains(&Some(component));
        for required in [Component::Year, Component::Month, Component::Day] {
            if !has(required) {
                return Err(invalid(
                    kind,
                    pattern,
                    &format!("missing {}", required.specifier()),
                ));
            }
        }
        if (has(Component::Minute) || has(Component::Second)) && !has(Component::Hour) {
            return Err(invalid(kind, pattern, "minutes or seconds without %H"));
        }
        if has(Component::Hour) && !has(Component::Minute) {
            return Err(invalid(kind, pattern, "%H without %M"));
        }
        if has(Component::Fraction) && !has(Component::Second) {
            return Err(invalid(kind, pattern, "%f without %S"));
        }

        let is_field = |idx: Option<usize>| idx.and_then(|i| raw.get(i)).is_some_and(Option::is_some);
        let mut tokens = Vec::with_capacity(raw.len());
        for (idx, slot) in raw.iter().enumerate() {
            match slot {
                Some(Component::Fraction) => {
                    if !matches!(idx.checked_sub(1).and_then(|i| raw.get(i)), Some(None)) {
                        return Err(invalid(kind, pattern, "%f must follow a separator"));
                    }
                    tokens.push(Token::Field {
                        component: Component::Fraction,
                        fixed: false,
                    });
                }
                Some(component) => tokens.push(Token::Field {
                    component: *component,
                    fixed: is_field(idx.checked_sub(1)) || is_field(Some(idx + 1)),
                }),
                None => tokens.push(Token::Literal(literals[idx])),
            }
        }

        let compact_width = if raw.iter().all(Option::is_some) {
            Some(raw.iter().flatten().copied().map(Component::width).sum())
        } else {
            None
        };
        if compact_width.is_none() && raw.last() == Some(&Some(Component::Second)) {
            tokens.push(Token::Literal(b'.'));
            tokens.push(Token::Field {
                component: Component::Fraction,
                fixed: false,
            });
        }

        Ok(Self {
            source: pattern.to_string(),
            tokens,
            has_time: has(Component::Hour),
            compact_width,
        })
    }

    /// The pattern text as configured.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the pattern has no separators at all.
    pub fn is_compact(&self) -> bool {
        self.compact_width.is_some()
    }

    /// Parses a value, returning `None` for anything that does not match.
    ///
    /// Components the pattern lacks default to midnight.
    pub fn parse_datetime(&self, value: &str) -> Option<NaiveDateTime> {
        let prepared = self.prepare(value)?;
        let bytes = prepared.as_bytes();
        let mut fields = Fields::default();
        let mut pos = 0usize;

        for (idx, token) in self.tokens.iter().enumerate() {
            match *token {
                Token::Literal(expected) => {
                    if pos == bytes.len() && self.fraction_follows(idx) {
                        break;
                    }
                    if bytes.get(pos) != Some(&expected) {
                        return None;
                    }
                    pos += 1;
                }
                Token::Field { component, fixed } => {
                    let run = bytes[pos..].iter().take_while(|b| b.is_ascii_digit()).count();
                    let take = match component {
                        Component::Fraction => run,
                        Component::Year => 4,
                        _ if fixed => component.width(),
                        _ => run.min(component.width()),
                    };
                    if take == 0 || run < take {
                        return None;
                    }
                    let digits = std::str::from_utf8(&bytes[pos..pos + take]).ok()?;
                    if component != Component::Fraction {
                        fields.set(component, digits.parse().ok()?);
                    }
                    pos += take;
                }
            }
        }
        if pos != bytes.len() && (self.has_time || !is_time_suffix(&prepared[pos..])) {
            return None;
        }

        NaiveDate::from_ymd_opt(i32::try_from(fields.year).ok()?, fields.month, fields.day)?
            .and_hms_opt(fields.hour, fields.minute, fields.second)
    }

    /// True when the token after `idx` is the fractional-seconds field.
    fn fraction_follows(&self, idx: usize) -> bool {
        matches!(
            self.tokens.get(idx + 1),
            Some(Token::Field {
                component: Component::Fraction,
                ..
            })
        )
    }

    /// Parses a value and keeps only its calendar date.
    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        self.parse_datetime(value).map(|dt| dt.date())
    }

    /// Trims the value and, for compact patterns, undoes numeric storage:
    /// a trailing `.0…` is stripped and the digits are left-padded with zeros
    /// to the pattern's fixed width.
    fn prepare<'a>(&self, value: &'a str) -> Option<Cow<'a, str>> {
        let trimmed = value.trim();
        if trimmed.is_empty() || !trimmed.is_ascii() {
            return None;
        }
        let Some(width) = self.compact_width else {
            return Some(Cow::Borrowed(trimmed));
        };

        let digits = match trimmed.split_once('.') {
            Some((integral, fraction)) if fraction.bytes().all(|b| b == b'0') => integral,
            Some(_) => return None,
            None => trimmed,
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match digits.len() {
            len if len == width => Some(Cow::Borrowed(digits)),
            len if len < width => Some(Cow::Owned(format!("{digits:0>width$}"))),
            _ => None,
        }
    }
}

impl fmt::Display for TimestampPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Matches ` HH:MM`, ` HH:MM:SS` or ` HH:MM:SS.f` (space or `T` first).
fn is_time_suffix(rest: &str) -> bool {
    let Some(time) = rest.strip_prefix(' ').or_else(|| rest.strip_prefix('T')) else {
        return false;
    };
    ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
        .iter()
        .any(|format| NaiveTime::parse_from_str(time, format).is_ok())
}

fn invalid(kind: &str, pattern: &str, reason: &str) -> DeidError {
    DeidError::InvalidFormat {
        kind: kind.to_string(),
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn separated_components_accept_single_digits() {
        let pattern = TimestampPattern::date("%m/%d/%Y").unwrap();
        assert_eq!(pattern.parse_date("1/2/2020"), Some(ymd(2020, 1, 2)));
        assert_eq!(pattern.parse_date("12/31/1999"), Some(ymd(1999, 12, 31)));
        assert_eq!(pattern.parse_date("123/1/1999"), None);
        assert_eq!(pattern.parse_date("1/2/20"), None);
    }

    #[test]
    fn compact_components_are_fixed_width() {
        let pattern = TimestampPattern::date("%Y%m%d").unwrap();
        assert!(pattern.is_compact());
        assert_eq!(pattern.parse_date("20200102"), Some(ymd(2020, 1, 2)));
        assert_eq!(pattern.parse_date("20200102.0"), Some(ymd(2020, 1, 2)));
        assert_eq!(pattern.parse_date("20200102.5"), None);
        assert_eq!(pattern.parse_date("202001021"), None);
    }

    #[test]
    fn compact_values_are_zero_padded() {
        let pattern = TimestampPattern::datetime("%H%M%S%Y%m%d").unwrap();
        let parsed = pattern.parse_datetime("9300020200307").unwrap();
        assert_eq!(parsed.to_string(), "2020-03-07 09:30:00");
    }

    #[test]
    fn trailing_text_is_rejected() {
        let pattern = TimestampPattern::date("%Y-%m-%d").unwrap();
        assert!(pattern.parse_date("2020-01-02x").is_none());
        assert!(pattern.parse_date("2020-01-02 10").is_none());
        assert!(pattern.parse_date("2020-01-02 25:00").is_none());

        let datetime = TimestampPattern::datetime("%Y-%m-%d %H:%M").unwrap();
        assert!(datetime.parse_datetime("2020-01-02 10:00:00").is_none());
    }

    #[test]
    fn date_patterns_drop_a_trailing_time() {
        let pattern = TimestampPattern::date("%Y-%m-%d").unwrap();
        assert_eq!(pattern.parse_date("2020-03-07 00:00:00"), Some(ymd(2020, 3, 7)));
        assert_eq!(pattern.parse_date("2020-03-07T23:30"), Some(ymd(2020, 3, 7)));
        assert_eq!(pattern.parse_date("2020-03-07 23:30:00.125"), Some(ymd(2020, 3, 7)));
    }

    #[test]
    fn fractional_seconds_are_optional() {
        let with_fraction = TimestampPattern::datetime("%Y-%m-%d %H:%M:%S.%f").unwrap();
        let without_fraction = TimestampPattern::datetime("%Y-%m-%d %H:%M:%S").unwrap();
        for pattern in [&with_fraction, &without_fraction] {
            for value in ["2020-03-07 23:30:00", "2020-03-07 23:30:00.5"] {
                assert_eq!(
                    pattern.parse_datetime(value).map(|dt| dt.to_string()),
                    Some("2020-03-07 23:30:00".to_string()),
                    "{value} under {pattern}"
                );
            }
            assert!(pattern.parse_datetime("2020-03-07 23:30:00.").is_none());
        }
    }

    #[test]
    fn calendar_validation() {
        let pattern = TimestampPattern::date("%Y-%m-%d").unwrap();
        assert!(pattern.parse_date("2021-02-29").is_none());
        assert!(pattern.parse_date("2020-02-29").is_some());
        assert!(pattern.parse_date("2020-13-01").is_none());
    }

    #[test]
    fn rejects_unsupported_patterns() {
        for bad in ["%Y-%m", "%Y_%m_%d", "%Y-%m-%d %H", "%Y-%m-%d%", "%Y-%m-%d %Z", "%Y%Y-%m-%d"] {
            assert!(
                matches!(
                    TimestampPattern::date(bad),
                    Err(DeidError::InvalidFormat { .. })
                ),
                "{bad} should be rejected"
            );
        }
        assert!(TimestampPattern::datetime("%Y-%m-%d").is_err());
        assert!(TimestampPattern::datetime("%Y-%m-%d %H:%M:%S%f").is_err());
    }
}
