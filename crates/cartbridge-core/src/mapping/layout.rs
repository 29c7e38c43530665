//! Date layouts for the `format` transformation
//!
//! Stored rule configs express layouts by example against the reference time
//! `Mon Jan 2 15:04:05 MST 2006` (e.g. `2006-01-02T15:04:05Z07:00`). Layouts
//! that contain `%` are taken as chrono strftime strings instead.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::fmt::Write;

/// Reference-layout tokens, longest first within each leading character
const TOKENS: &[(&str, &str)] = &[
    ("January", "%B"),
    ("Jan", "%b"),
    ("Monday", "%A"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("2006", "%Y"),
    ("Z07:00", "%:z"),
    ("Z0700", "%z"),
    ("-07:00", "%:z"),
    ("-0700", "%z"),
    (".000000000", "%.9f"),
    (".000000", "%.6f"),
    (".000", "%.3f"),
    (".999999999", "%.f"),
    (".999999", "%.f"),
    (".999", "%.f"),
    ("01", "%m"),
    ("02", "%d"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("15", "%H"),
    ("_2", "%e"),
    ("PM", "%p"),
    ("pm", "%P"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
    ("4", "%-M"),
    ("5", "%-S"),
];

/// A layout compiled to a strftime string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateLayout {
    strftime: String,
    // `Z07:00` renders UTC as a literal `Z`
    utc_as_z: bool,
}

impl DateLayout {
    /// Compile a reference layout or strftime string
    pub fn compile(layout: &str) -> Result<Self, String> {
        if layout.is_empty() {
            return Err("layout is empty".to_string());
        }

        let (strftime, utc_as_z) = if layout.contains('%') {
            (layout.to_string(), false)
        } else {
            (translate_reference_layout(layout), layout.contains("Z07"))
        };

        if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
            return Err(format!("unsupported layout '{}'", layout));
        }

        Ok(Self { strftime, utc_as_z })
    }

    pub fn as_strftime(&self) -> &str {
        &self.strftime
    }

    /// Parse `input`; date-only values land at midnight and naive values are UTC
    pub fn parse(&self, input: &str) -> Result<DateTime<FixedOffset>, String> {
        let input = if self.utc_as_z {
            normalize_zulu(input)
        } else {
            input.to_string()
        };

        if let Ok(parsed) = DateTime::parse_from_str(&input, &self.strftime) {
            return Ok(parsed);
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(&input, &self.strftime) {
            return Ok(Utc.from_utc_datetime(&naive).fixed_offset());
        }
        match NaiveDate::parse_from_str(&input, &self.strftime) {
            Ok(date) => Ok(Utc
                .from_utc_datetime(&date.and_time(NaiveTime::default()))
                .fixed_offset()),
            Err(e) => Err(format!("cannot parse '{}' as '{}': {}", input, self.strftime, e)),
        }
    }

    /// Render `value` in this layout
    pub fn format(&self, value: &DateTime<FixedOffset>) -> Result<String, String> {
        let mut rendered = String::new();
        write!(
            rendered,
            "{}",
            value.format_with_items(StrftimeItems::new(&self.strftime))
        )
        .map_err(|_| format!("cannot render date with '{}'", self.strftime))?;

        if self.utc_as_z && value.offset().local_minus_utc() == 0 {
            for offset in ["+00:00", "+0000"] {
                if let Some(stripped) = rendered.strip_suffix(offset) {
                    rendered = format!("{}Z", stripped);
                    break;
                }
            }
        }
        Ok(rendered)
    }
}

fn translate_reference_layout(layout: &str) -> String {
    let mut out = String::with_capacity(layout.len() * 2);
    let mut rest = layout;

    'scan: while let Some(ch) = rest.chars().next() {
        for (token, spec) in TOKENS {
            if rest.starts_with(token) {
                out.push_str(spec);
                rest = &rest[token.len()..];
                continue 'scan;
            }
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    out
}

fn normalize_zulu(input: &str) -> String {
    match input.strip_suffix('Z').or_else(|| input.strip_suffix('z')) {
        Some(stripped) => format!("{}+00:00", stripped),
        None => input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_reference_layouts() {
        assert_eq!(translate_reference_layout("2006-01-02"), "%Y-%m-%d");
        assert_eq!(
            translate_reference_layout("2006-01-02T15:04:05Z07:00"),
            "%Y-%m-%dT%H:%M:%S%:z"
        );
        assert_eq!(
            translate_reference_layout("2006-01-02T15:04:05.000-07:00"),
            "%Y-%m-%dT%H:%M:%S%.3f%:z"
        );
        assert_eq!(translate_reference_layout("Jan 2, 2006"), "%b %-d, %Y");
        assert_eq!(translate_reference_layout("02/01/2006 03:04 PM"), "%d/%m/%Y %I:%M %p");
    }

    #[test]
    fn test_strftime_passthrough() {
        let layout = DateLayout::compile("%d.%m.%Y").unwrap();
        assert_eq!(layout.as_strftime(), "%d.%m.%Y");
    }

    #[test]
    fn test_invalid_strftime_rejected() {
        assert!(DateLayout::compile("%Q").is_err());
        assert!(DateLayout::compile("").is_err());
    }

    #[test]
    fn test_date_only_roundtrip() {
        let source = DateLayout::compile("2006-01-02").unwrap();
        let dest = DateLayout::compile("02/01/2006").unwrap();
        let parsed = source.parse("2024-03-15").unwrap();
        assert_eq!(dest.format(&parsed).unwrap(), "15/03/2024");
    }

    #[test]
    fn test_rfc3339_zulu() {
        let layout = DateLayout::compile("2006-01-02T15:04:05Z07:00").unwrap();
        let parsed = layout.parse("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(layout.format(&parsed).unwrap(), "2024-01-15T10:30:00Z");

        let offset = layout.parse("2024-01-15T10:30:00+02:00").unwrap();
        assert_eq!(layout.format(&offset).unwrap(), "2024-01-15T10:30:00+02:00");
    }

    #[test]
    fn test_unparseable_input() {
        let layout = DateLayout::compile("2006-01-02").unwrap();
        assert!(layout.parse("15.03.2024").is_err());
    }
}
