//! Timestamp helpers. Everything downstream works on naive UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

pub fn now_naive_utc() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Accepts RFC 3339 (converted to UTC and stripped of its offset), a naive
/// `YYYY-MM-DDTHH:MM:SS[.f]` timestamp, or a bare `YYYY-MM-DD` date.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    let value = value.trim();
    if let Ok(aware) = DateTime::parse_from_rfc3339(value) {
        return Ok(aware.with_timezone(&Utc).naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| format!("unrecognized timestamp `{value}`"))
}
