//! Date/time expression parsing.
//!
//! Accepts the shapes REST payloads actually carry:
//! - RFC 3339 / ISO 8601, with or without offset (no offset = UTC)
//! - RFC 2822
//! - `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY`, `DD-MM-YYYY`, with optional time
//! - English month names: `15 January 2024`, `January 15, 2024`, `Jan 15 2024`
//! - `@<unix seconds>`
//! - `now`, `today`, `midnight`, `noon`, `tomorrow`, `yesterday`
//! - relative offsets: `+1 day`, `-2 weeks`, `3 hours ago`, `10 minutes`
//!
//! Bare numbers are never dates here.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `+3 days`, `-1 week`, `10 minutes`, `2 hours ago`
    static ref RELATIVE: Regex = Regex::new(
        r"^(?P<sign>[+-])?\s*(?P<n>\d+)\s*(?P<unit>sec|second|min|minute|hour|day|week|fortnight|month|year)s?(?P<ago>\s+ago)?$"
    ).unwrap();

    /// `@1700000000`
    static ref AT_TIMESTAMP: Regex = Regex::new(r"^@(?P<ts>-?\d+)$").unwrap();
}

/// Keeps relative offsets inside chrono's representable range
const MAX_RELATIVE_UNITS: i64 = 1_000_000;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

/// Parse `text` into Unix seconds, relative expressions anchored at `now`.
pub fn parse_timestamp(text: &str, now: DateTime<Utc>) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() || text.len() > 64 {
        return None;
    }

    parse_absolute(text).or_else(|| parse_relative(&text.to_ascii_lowercase(), now))
}

/// Parse against the wall clock
pub fn parse_timestamp_now(text: &str) -> Option<i64> {
    parse_timestamp(text, Utc::now())
}

fn parse_absolute(text: &str) -> Option<i64> {
    if let Some(caps) = AT_TIMESTAMP.captures(text) {
        return caps["ts"].parse().ok();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp());
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.timestamp());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(Utc.from_utc_datetime(&dt).timestamp());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)).timestamp());
        }
    }

    None
}

fn parse_relative(text: &str, now: DateTime<Utc>) -> Option<i64> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    match text {
        "now" => return Some(now.timestamp()),
        "today" | "midnight" => return Some(Utc.from_utc_datetime(&midnight).timestamp()),
        "noon" => {
            return Some(Utc.from_utc_datetime(&(midnight + Duration::hours(12))).timestamp());
        }
        "tomorrow" => {
            return Some(Utc.from_utc_datetime(&(midnight + Duration::days(1))).timestamp());
        }
        "yesterday" => {
            return Some(Utc.from_utc_datetime(&(midnight - Duration::days(1))).timestamp());
        }
        _ => {}
    }

    let caps = RELATIVE.captures(text)?;
    let n = caps["n"].parse::<i64>().ok().filter(|n| *n <= MAX_RELATIVE_UNITS)?;
    let step = match &caps["unit"] {
        "sec" | "second" => Duration::seconds(n),
        "min" | "minute" => Duration::minutes(n),
        "hour" => Duration::hours(n),
        "day" => Duration::days(n),
        "week" => Duration::weeks(n),
        "fortnight" => Duration::weeks(n.checked_mul(2)?),
        "month" => Duration::days(n.checked_mul(30)?),
        "year" => Duration::days(n.checked_mul(365)?),
        _ => return None,
    };

    let backwards = caps.name("sign").map(|m| m.as_str() == "-").unwrap_or(false)
        ^ caps.name("ago").is_some();
    let shifted = if backwards {
        now.checked_sub_signed(step)?
    } else {
        now.checked_add_signed(step)?
    };
    Some(shifted.timestamp())
}
