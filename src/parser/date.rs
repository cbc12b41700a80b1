use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::parser::ParseError;

/// Zone abbreviations seen in the wild that RFC 2822 parsing does not know.
const NAMED_ZONES: &[(&str, &str)] = &[
    ("UTC", "+0000"),
    ("Z", "+0000"),
    ("CET", "+0100"),
    ("CEST", "+0200"),
    ("EET", "+0200"),
    ("EEST", "+0300"),
    ("BST", "+0100"),
    ("MSK", "+0300"),
    ("IST", "+0530"),
    ("SGT", "+0800"),
    ("HKT", "+0800"),
    ("JST", "+0900"),
    ("KST", "+0900"),
    ("AEST", "+1000"),
    ("AEDT", "+1100"),
];

const OFFSET_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%a, %d %B %Y %H:%M:%S %z",
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

/// Parse a feed date. Offset-less values are taken as UTC.
pub fn parse_time(value: &str) -> Result<DateTime<Utc>, ParseError> {
    let value = value.trim();

    if let Some(dt) = parse_with_offset(value) {
        return Ok(dt);
    }

    if let Some(rewritten) = replace_named_zone(value) {
        if let Some(dt) = parse_with_offset(&rewritten) {
            return Ok(dt);
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.and_utc());
        }
    }

    if let Some(dt) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(dt.and_utc());
    }

    Err(ParseError::InvalidDate(value.to_string()))
}

/// Like [`parse_time`] but never fails; used for channel-level timestamps.
pub fn parse_time_lenient(value: &str) -> Option<DateTime<Utc>> {
    if value.trim().is_empty() {
        return None;
    }
    parse_time(value).ok()
}

fn parse_with_offset(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .or_else(|| {
            OFFSET_FORMATS
                .iter()
                .find_map(|format| DateTime::parse_from_str(value, format).ok())
        })
        .map(|dt| dt.with_timezone(&Utc))
}

fn replace_named_zone(value: &str) -> Option<String> {
    let (head, zone) = value.rsplit_once(' ')?;
    let zone = zone.to_ascii_uppercase();
    NAMED_ZONES
        .iter()
        .find(|(name, _)| *name == zone)
        .map(|(_, offset)| format!("{} {}", head, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_rfc822_with_numeric_offset() {
        assert_eq!(
            parse_time("Mon, 02 Jan 2006 15:04:05 -0700").unwrap(),
            utc(2006, 1, 2, 22, 4, 5)
        );
    }

    #[test]
    fn test_rfc822_with_gmt() {
        assert_eq!(
            parse_time("Mon, 01 Jan 2024 00:00:00 GMT").unwrap(),
            utc(2024, 1, 1, 0, 0, 0)
        );
    }

    #[test]
    fn test_named_zone_outside_rfc2822() {
        assert_eq!(
            parse_time("Tue, 15 Oct 2024 10:00:00 EEST").unwrap(),
            utc(2024, 10, 15, 7, 0, 0)
        );
        assert_eq!(
            parse_time("Tue, 15 Oct 2024 10:00:00 UTC").unwrap(),
            utc(2024, 10, 15, 10, 0, 0)
        );
    }

    #[test]
    fn test_rfc3339() {
        assert_eq!(
            parse_time("2024-01-01T12:00:00+02:00").unwrap(),
            utc(2024, 1, 1, 10, 0, 0)
        );
        assert_eq!(
            parse_time(" 2024-01-01T12:00:00Z ").unwrap(),
            utc(2024, 1, 1, 12, 0, 0)
        );
    }

    #[test]
    fn test_offsetless_values_are_utc() {
        assert_eq!(
            parse_time("2024-01-01 12:30:00").unwrap(),
            utc(2024, 1, 1, 12, 30, 0)
        );
        assert_eq!(parse_time("2024-01-01").unwrap(), utc(2024, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            parse_time("yesterday-ish"),
            Err(ParseError::InvalidDate(v)) if v == "yesterday-ish"
        ));
    }

    #[test]
    fn test_lenient_parse() {
        assert!(parse_time_lenient("").is_none());
        assert!(parse_time_lenient("nope").is_none());
        assert!(parse_time_lenient("2024-01-01").is_some());
    }
}
