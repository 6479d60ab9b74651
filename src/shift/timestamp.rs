//! Parsing and formatting of timestamp text stored in snapshot columns.
//!
//! Accepted shapes: `YYYY-MM-DD`, `YYYY-MM-DD HH:MM`,
//! `YYYY-MM-DD HH:MM:SS[.fraction]` with `T` or a space between date and
//! time, optionally followed by `Z`, `±HH`, `±HHMM` or `±HH:MM` (a space
//! before the offset is tolerated). Text without an offset is naive.
//! Years are exactly four digits; signed or extended years are rejected.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeDelta, Timelike, Utc};
use rusqlite::types::Value;

/// The zone a parsed value carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    Naive,
    Fixed(FixedOffset),
}

impl Zone {
    /// The offset used for arithmetic; naive values are read as UTC.
    pub fn offset(self) -> FixedOffset {
        match self {
            Self::Naive => utc_offset(),
            Self::Fixed(offset) => offset,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Naive => f.write_str("naive"),
            Self::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

/// A wall-clock reading plus the zone it was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    local: NaiveDateTime,
    zone: Zone,
    instant: DateTime<FixedOffset>,
}

impl Timestamp {
    /// Parse timestamp text. Returns `None` for anything unrecognized.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !has_four_digit_year(text) {
            return None;
        }
        let (body, zone) = split_zone(text)?;
        let local = parse_naive(body.trim_end())?;
        let offset = zone.offset();
        let utc = local.checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))?;
        Some(Self {
            local,
            zone,
            instant: DateTime::from_naive_utc_and_offset(utc, offset),
        })
    }

    pub const fn zone(&self) -> Zone {
        self.zone
    }

    pub const fn local(&self) -> NaiveDateTime {
        self.local
    }

    /// The instant, with naive values taken as UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        self.to_fixed().with_timezone(&Utc)
    }

    /// The instant in its own zone (`+00:00` for naive values).
    pub const fn to_fixed(&self) -> DateTime<FixedOffset> {
        self.instant
    }
}

/// Text of a cell that should hold a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell<'a> {
    Missing,
    Text(&'a str),
    /// A non-text, non-null storage class; carries a description.
    Unsupported(&'static str),
}

/// Classify a raw value, folding NULL, blank text and sentinel text into
/// [`Cell::Missing`].
pub fn classify<'a>(value: &'a Value, null_sentinels: &[String]) -> Cell<'a> {
    match value {
        Value::Null => Cell::Missing,
        Value::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() || null_sentinels.iter().any(|s| s == text || s == trimmed) {
                Cell::Missing
            } else {
                Cell::Text(text)
            }
        }
        Value::Integer(_) => Cell::Unsupported("integer"),
        Value::Real(_) => Cell::Unsupported("real"),
        Value::Blob(_) => Cell::Unsupported("blob"),
    }
}

/// Render an instant as `YYYY-MM-DD HH:MM:SS[.ffffff]+00:00`.
///
/// The fraction is omitted when zero, six digits for whole microseconds,
/// nine digits otherwise, so that [`Timestamp::parse`] reads back the exact
/// instant.
pub fn format_utc(instant: DateTime<Utc>) -> String {
    let base = instant.format("%Y-%m-%d %H:%M:%S");
    let nanos = instant.nanosecond();
    if nanos == 0 {
        format!("{base}+00:00")
    } else if nanos % 1_000 == 0 {
        format!("{base}.{:06}+00:00", nanos / 1_000)
    } else {
        format!("{base}.{nanos:09}+00:00")
    }
}

/// Render a signed duration as `+517 days 00:00:00` (fraction when present).
pub fn format_offset(offset: TimeDelta) -> String {
    let sign = if offset < TimeDelta::zero() { '-' } else { '+' };
    let abs = offset.abs();
    let days = abs.num_days();
    let rem = abs - TimeDelta::days(days);
    let secs = rem.num_seconds();
    let micros = (rem - TimeDelta::seconds(secs)).num_microseconds().unwrap_or(0);
    let clock = format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60);
    if micros == 0 {
        format!("{sign}{days} days {clock}")
    } else {
        format!("{sign}{days} days {clock}.{micros:06}")
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

fn has_four_digit_year(text: &str) -> bool {
    text.as_bytes()
        .get(..5)
        .is_some_and(|head| head[..4].iter().all(u8::is_ascii_digit) && head[4] == b'-')
}

/// Split trailing zone designator from the date-time body.
fn split_zone(text: &str) -> Option<(&str, Zone)> {
    if let Some(body) = text.strip_suffix(['Z', 'z']) {
        return Some((body, Zone::Fixed(utc_offset())));
    }
    // Offset signs can only follow the `YYYY-MM-DD` date part.
    let Some(tail) = text.get(10..) else {
        return Some((text, Zone::Naive));
    };
    match tail.rfind(['+', '-']) {
        Some(pos) => {
            let split = 10 + pos;
            let offset = parse_offset(&text[split..])?;
            Some((&text[..split], Zone::Fixed(offset)))
        }
        None => Some((text, Zone::Naive)),
    }
}

fn parse_offset(text: &str) -> Option<FixedOffset> {
    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match (digits.len(), rest.contains(':')) {
        (2, false) => (digits.parse::<i32>().ok()?, 0),
        (4, _) => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_naive(body: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(body, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(body, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
