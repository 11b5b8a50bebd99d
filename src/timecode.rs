use crate::error::MediaError;
use chrono::{NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

static TIME_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,2}:\d{2}(:\d{2})?$").expect("static time pattern")
});

/// Parses `HH:MM:SS` or `MM:SS` into whole seconds.
pub fn parse_time(time_str: &str) -> Result<u32, MediaError> {
    let s = time_str.trim();
    if s.is_empty() {
        return Err(MediaError::InvalidTimeFormat(time_str.to_string()));
    }

    let parsed = match s.matches(':').count() {
        2 => NaiveTime::parse_from_str(s, "%H:%M:%S"),
        1 => NaiveTime::parse_from_str(&format!("0:{s}"), "%H:%M:%S"),
        _ => return Err(MediaError::InvalidTimeFormat(time_str.to_string())),
    };

    let t = parsed.map_err(|_| MediaError::InvalidTimeFormat(time_str.to_string()))?;
    // chrono reads `:60` as a leap second and reports it as 59
    if t.nanosecond() >= 1_000_000_000 {
        return Err(MediaError::InvalidTimeFormat(time_str.to_string()));
    }
    Ok(t.hour() * 3600 + t.minute() * 60 + t.second())
}

pub fn validate_time_format(time_str: &str) -> Result<(), MediaError> {
    if !TIME_SHAPE.is_match(time_str) {
        return Err(MediaError::InvalidTimeFormat(time_str.to_string()));
    }
    parse_time(time_str).map(|_| ())
}

/// Length in seconds of the `start..end` window.
pub fn clip_window(start: &str, end: &str) -> Result<u32, MediaError> {
    validate_time_format(start)?;
    validate_time_format(end)?;
    let s = parse_time(start)?;
    let e = parse_time(end)?;
    if e <= s {
        return Err(MediaError::EmptyWindow {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok(e - s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_shapes() {
        assert_eq!(parse_time("0:25").unwrap(), 25);
        assert_eq!(parse_time("1:00").unwrap(), 60);
        assert_eq!(parse_time("01:02:03").unwrap(), 3723);
        assert_eq!(parse_time("2:00:00").unwrap(), 7200);
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert!(parse_time("0:75").is_err());
        assert!(parse_time("61:00").is_err());
        assert!(parse_time("").is_err());
        assert!(parse_time("12").is_err());
        assert!(parse_time("0:60").is_err());
        assert!(parse_time("1:00:60").is_err());
        assert_eq!(parse_time("0:59").unwrap(), 59);
    }

    #[test]
    fn validate_checks_shape_before_value() {
        assert!(validate_time_format("0:25").is_ok());
        assert!(validate_time_format("10:00:00").is_ok());
        assert!(validate_time_format("0:5").is_err());
        assert!(validate_time_format("100:00").is_err());
        assert!(validate_time_format("a:bc").is_err());
        assert!(validate_time_format(" 0:25").is_err());
        assert!(validate_time_format("0:60").is_err());
    }

    #[test]
    fn window_requires_end_after_start() {
        assert_eq!(clip_window("0:25", "0:50").unwrap(), 25);
        assert_eq!(clip_window("1:00", "1:22").unwrap(), 22);
        assert!(matches!(
            clip_window("0:50", "0:50"),
            Err(MediaError::EmptyWindow { .. })
        ));
        assert!(matches!(
            clip_window("0:59", "0:60"),
            Err(MediaError::InvalidTimeFormat(_))
        ));
        assert!(matches!(
            clip_window("0:5", "0:50"),
            Err(MediaError::InvalidTimeFormat(_))
        ));
    }
}
