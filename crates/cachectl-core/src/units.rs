//! Size and duration parsing and display

use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt;
use thiserror::Error;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

const KILOBYTE: i64 = 1024;
const MEGABYTE: i64 = 1024 * 1000;
const GIGABYTE: i64 = 1024 * 1000 * 1000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("empty value")]
    Empty,

    #[error("'{0}' is not a valid duration (expected e.g. 1d2h3m4s)")]
    InvalidDuration(String),

    #[error("'{0}' is not a valid size (expected e.g. 10mb)")]
    InvalidSize(String),

    #[error("'{0}' is out of range")]
    Overflow(String),
}

/// Parse a duration in seconds, returning `default` when `input` is absent
///
/// Accepts a plain number of seconds or any combination of `<n>d`,
/// `<n>h`, `<n>m` and `<n>s` groups, e.g. `1d2h3m4s`.
pub fn parse_duration(input: Option<&str>, default: i64) -> Result<i64, UnitError> {
    let Some(input) = input else {
        return Ok(default);
    };
    let value = input.trim().to_lowercase();
    if value.is_empty() {
        return Err(UnitError::Empty);
    }
    if let Ok(seconds) = value.parse::<i64>() {
        return Ok(seconds);
    }

    let invalid = || UnitError::InvalidDuration(input.to_string());
    let overflow = || UnitError::Overflow(input.to_string());

    let mut total: i64 = 0;
    let mut digits = String::new();
    for ch in value.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        let unit = match ch {
            'd' => DAY,
            'h' => HOUR,
            'm' => MINUTE,
            's' => 1,
            _ => return Err(invalid()),
        };
        if digits.is_empty() {
            return Err(invalid());
        }
        let count: i64 = digits.parse().map_err(|_| overflow())?;
        total = count
            .checked_mul(unit)
            .and_then(|n| total.checked_add(n))
            .ok_or_else(overflow)?;
        digits.clear();
    }

    if !digits.is_empty() {
        return Err(invalid());
    }
    Ok(total)
}

/// Parse a size in bytes (or an entry count), returning `default` when `input` is absent
///
/// Accepts a plain number or `<n><unit>` with `b`, `k`/`kb`, `m`/`mb`
/// or `g`/`gb`. A negative plain number means unbounded.
pub fn parse_size(input: Option<&str>, default: i64) -> Result<i64, UnitError> {
    let Some(input) = input else {
        return Ok(default);
    };
    let value = input.trim().to_lowercase();
    if value.is_empty() {
        return Err(UnitError::Empty);
    }
    if let Ok(size) = value.parse::<i64>() {
        return Ok(size);
    }

    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    if number.is_empty() {
        return Err(UnitError::InvalidSize(input.to_string()));
    }

    let multiplier = match unit.trim() {
        "b" => 1,
        "k" | "kb" => KILOBYTE,
        "m" | "mb" => MEGABYTE,
        "g" | "gb" => GIGABYTE,
        _ => return Err(UnitError::InvalidSize(input.to_string())),
    };

    number
        .parse::<i64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| UnitError::Overflow(input.to_string()))
}

/// Render seconds as `<d>d<h>h<m>m<s>s`
///
/// Zero units are omitted, except that seconds follow whenever minutes
/// are shown. Negative values render as the raw number.
pub fn format_duration(seconds: i64) -> String {
    if seconds < 0 {
        return seconds.to_string();
    }
    if seconds == 0 {
        return "0s".to_string();
    }

    let days = seconds / DAY;
    let hours = (seconds % DAY) / HOUR;
    let minutes = (seconds % HOUR) / MINUTE;
    let secs = seconds % MINUTE;

    let mut out = String::new();
    if days != 0 {
        out.push_str(&format!("{}d", days));
    }
    if hours != 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes != 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if secs != 0 || minutes != 0 {
        out.push_str(&format!("{}s", secs));
    }
    out
}

/// Render a byte count with two decimals and a `kb`/`mb`/`gb` suffix
///
/// A unit is chosen only when its threshold is strictly exceeded.
pub fn format_space(bytes: i64) -> String {
    let value = bytes as f64;
    let (scaled, units) = if value > GIGABYTE as f64 {
        (value / GIGABYTE as f64, "gb")
    } else if value > MEGABYTE as f64 {
        (value / MEGABYTE as f64, "mb")
    } else if value > KILOBYTE as f64 {
        (value / KILOBYTE as f64, "kb")
    } else {
        (value, " bytes")
    };
    format!("{:.2}{}", scaled, units)
}

/// Render a timestamp in local time as `YYYY-MM-DDTHH:MM:SS±HH:MM`
pub fn format_time(time: &DateTime<Utc>) -> String {
    format_time_in(&time.with_timezone(&Local))
}

fn format_time_in<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    time.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(5), "5s");
        assert_eq!(format_duration(60), "1m0s");
        assert_eq!(format_duration(65), "1m5s");
        assert_eq!(format_duration(3600), "1h");
        assert_eq!(format_duration(3661), "1h1m1s");
        assert_eq!(format_duration(3605), "1h5s");
        assert_eq!(format_duration(90000), "1d1h");
        assert_eq!(format_duration(604800), "7d");
        assert_eq!(format_duration(-5), "-5");
        assert_eq!(format_duration(-1), "-1");
    }

    #[test]
    fn test_format_space() {
        assert_eq!(format_space(0), "0.00 bytes");
        assert_eq!(format_space(500), "500.00 bytes");
        assert_eq!(format_space(1024), "1024.00 bytes");
        assert_eq!(format_space(2048), "2.00kb");
        assert_eq!(format_space(1024 * 1000), "1000.00kb");
        assert_eq!(format_space(1024 * 1000 * 10), "10.00mb");
        assert_eq!(format_space(1024 * 1000 * 1000), "1000.00mb");
        assert_eq!(format_space(3 * 1024 * 1000 * 1000), "3.00gb");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration(None, 42), Ok(42));
        assert_eq!(parse_duration(Some("90"), 0), Ok(90));
        assert_eq!(parse_duration(Some("-1"), 0), Ok(-1));
        assert_eq!(parse_duration(Some("1d2h3m4s"), 0), Ok(93784));
        assert_eq!(parse_duration(Some("2H"), 0), Ok(7200));
        assert_eq!(parse_duration(Some(" 7d "), 0), Ok(604800));
        assert_eq!(parse_duration(Some("1m1m"), 0), Ok(120));

        assert_eq!(parse_duration(Some(""), 0), Err(UnitError::Empty));
        assert!(matches!(
            parse_duration(Some("1h30"), 0),
            Err(UnitError::InvalidDuration(_))
        ));
        assert!(matches!(
            parse_duration(Some("d"), 0),
            Err(UnitError::InvalidDuration(_))
        ));
        assert!(matches!(
            parse_duration(Some("1w"), 0),
            Err(UnitError::InvalidDuration(_))
        ));
        assert!(matches!(
            parse_duration(Some("99999999999999999999d"), 0),
            Err(UnitError::Overflow(_))
        ));
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size(None, 1000), Ok(1000));
        assert_eq!(parse_size(Some("512"), 0), Ok(512));
        assert_eq!(parse_size(Some("-1"), 0), Ok(-1));
        assert_eq!(parse_size(Some("2k"), 0), Ok(2048));
        assert_eq!(parse_size(Some("10mb"), 0), Ok(10 * 1024 * 1000));
        assert_eq!(parse_size(Some("1GB"), 0), Ok(1024 * 1000 * 1000));
        assert_eq!(parse_size(Some("5b"), 0), Ok(5));

        assert!(matches!(parse_size(Some("mb"), 0), Err(UnitError::InvalidSize(_))));
        assert!(matches!(parse_size(Some("10tb"), 0), Err(UnitError::InvalidSize(_))));
        assert!(matches!(parse_size(Some("1.5mb"), 0), Err(UnitError::InvalidSize(_))));
    }

    #[test]
    fn test_format_time() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let time = DateTime::parse_from_rfc3339("2024-01-01T12:00:00Z")
            .unwrap()
            .with_timezone(&offset);
        assert_eq!(format_time_in(&time), "2024-01-01T14:00:00+02:00");
    }
}
