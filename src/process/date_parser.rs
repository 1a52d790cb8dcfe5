use crate::error::TimestampFault;
use chrono::{
    format::{ParseError, ParseErrorKind},
    DateTime, FixedOffset, Utc,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// `"YYYY-MM-DD HH:MM:SS ±HHMM"`, the shop export layout.
pub const FIXED_OFFSET_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// ISO-8601 layouts tried after RFC 3339, on the offset-normalized value.
const ISO_FALLBACK_FORMATS: [&str; 7] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
    "%Y%m%dT%H%M%S%.f%z",
    "%Y%m%dT%H%M%z",
];

/// Which timestamp layouts a deployment accepts in `Created at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampGrammar {
    /// Only [`FIXED_OFFSET_FORMAT`].
    #[default]
    FixedOffset,
    /// Any ISO-8601 date-time carrying an offset (`Z`, `±HH`, `±HH:MM` or
    /// `±HHMM`), extended or basic layout.
    Iso8601,
}

fn fault_of(e: &ParseError) -> TimestampFault {
    match e.kind() {
        ParseErrorKind::OutOfRange => TimestampFault::OutOfBounds,
        _ => TimestampFault::InvalidFormat,
    }
}

/// Rewrite a `Z` or hour-only (`±HH`) offset as `±HHMM` so `%z` can read it.
/// Values without a time part are left alone.
fn normalize_offset(s: &str) -> Cow<'_, str> {
    if !s.contains(['T', ' ']) {
        return Cow::Borrowed(s);
    }
    if let Some(rest) = s.strip_suffix(['Z', 'z']) {
        return Cow::Owned(format!("{}+0000", rest));
    }
    let b = s.as_bytes();
    let n = b.len();
    if n >= 4
        && matches!(b[n - 3], b'+' | b'-')
        && b[n - 2].is_ascii_digit()
        && b[n - 1].is_ascii_digit()
        && b[n - 4].is_ascii_digit()
    {
        return Cow::Owned(format!("{}00", s));
    }
    Cow::Borrowed(s)
}

fn parse_iso8601(s: &str) -> Result<DateTime<FixedOffset>, TimestampFault> {
    let mut fault = match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => return Ok(dt),
        Err(e) => fault_of(&e),
    };
    let normalized = normalize_offset(s);
    for fmt in ISO_FALLBACK_FORMATS {
        match DateTime::parse_from_str(&normalized, fmt) {
            Ok(dt) => return Ok(dt),
            Err(e) if fault_of(&e) == TimestampFault::OutOfBounds => {
                fault = TimestampFault::OutOfBounds
            }
            Err(_) => {}
        }
    }
    Err(fault)
}

/// Parse `raw` per `grammar` and normalize to UTC.
///
/// Instants that do not fit a signed 64-bit nanosecond count
/// (1677-09-21 .. 2262-04-11) are out of bounds.
pub fn parse_created_at(raw: &str, grammar: TimestampGrammar) -> Result<DateTime<Utc>, TimestampFault> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(TimestampFault::InvalidFormat);
    }
    let parsed = match grammar {
        TimestampGrammar::FixedOffset => {
            DateTime::parse_from_str(s, FIXED_OFFSET_FORMAT).map_err(|e| fault_of(&e))?
        }
        TimestampGrammar::Iso8601 => parse_iso8601(s)?,
    };
    let utc = parsed.with_timezone(&Utc);
    if utc.timestamp_nanos_opt().is_none() {
        return Err(TimestampFault::OutOfBounds);
    }
    Ok(utc)
}
