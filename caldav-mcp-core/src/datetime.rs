//! Parsing of caller-supplied ISO datetimes and iCalendar value formatting.

use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{CalMcpError, CalMcpResult};

/// iCalendar local DATE-TIME form (`20250929T150000`).
pub const ICS_LOCAL_FORMAT: &str = "%Y%m%dT%H%M%S";
/// iCalendar UTC DATE-TIME form (`20250929T190000Z`).
pub const ICS_UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";
/// iCalendar DATE form (`20250929`).
pub const ICS_DATE_FORMAT: &str = "%Y%m%d";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// A point in time as written by a caller.
///
/// Accepted forms:
/// - `2025-09-29T15:00:00` (naive, wall-clock in whatever zone applies)
/// - `2025-09-29T19:00:00Z` (UTC)
/// - `2025-09-29T15:00:00-04:00` (explicit offset)
/// - `2025-09-29` (date only)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTime {
    Date(NaiveDate),
    Naive(NaiveDateTime),
    Utc(DateTime<Utc>),
    Offset(DateTime<FixedOffset>),
}

impl InputTime {
    /// Parse `value`, naming `field` in the error if it is malformed.
    pub fn parse(field: &str, value: &str) -> CalMcpResult<Self> {
        let s = value.trim();
        if s.is_empty() {
            return Err(CalMcpError::validation(field, "value is empty"));
        }

        if let Some(naive) = s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
            return parse_naive(naive)
                .map(|dt| InputTime::Utc(dt.and_utc()))
                .ok_or_else(|| malformed(field, value));
        }

        if let Some(dt) = OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
        {
            return Ok(InputTime::Offset(dt));
        }

        if let Some(dt) = parse_naive(s) {
            return Ok(InputTime::Naive(dt));
        }

        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(InputTime::Date)
            .map_err(|_| malformed(field, value))
    }

    /// Parse an optional caller value.
    pub fn parse_opt(field: &str, value: Option<&str>) -> CalMcpResult<Option<Self>> {
        value.map(|v| InputTime::parse(field, v)).transpose()
    }

    /// The absolute instant, interpreting naive values in `zone` (UTC if `None`).
    pub fn to_utc(&self, zone: Option<Tz>) -> DateTime<Utc> {
        match self {
            InputTime::Date(d) => naive_to_utc(start_of_day(*d), zone),
            InputTime::Naive(dt) => naive_to_utc(*dt, zone),
            InputTime::Utc(dt) => *dt,
            InputTime::Offset(dt) => dt.with_timezone(&Utc),
        }
    }

    /// True when the value carries its own offset (UTC or explicit).
    pub fn is_absolute(&self) -> bool {
        matches!(self, InputTime::Utc(_) | InputTime::Offset(_))
    }
}

fn malformed(field: &str, value: &str) -> CalMcpError {
    CalMcpError::validation(
        field,
        format!(
            "'{value}' is not a valid ISO datetime (expected YYYY-MM-DDTHH:MM:SS, optionally with Z or ±HH:MM)"
        ),
    )
}

/// Midnight at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).unwrap_or_default()
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Look up an IANA zone name in the tz database.
pub fn parse_zone(tzid: &str) -> Option<Tz> {
    tzid.trim().parse::<Tz>().ok()
}

/// Resolve a wall-clock time in `zone`.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times inside a
/// DST gap are pushed forward by an hour.
pub fn localize(zone: Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => zone
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| zone.from_utc_datetime(&naive)),
    }
}

/// Interpret a wall-clock time in `zone`, or as UTC without one.
pub fn naive_to_utc(naive: NaiveDateTime, zone: Option<Tz>) -> DateTime<Utc> {
    match zone {
        Some(zone) => localize(zone, naive).with_timezone(&Utc),
        None => naive.and_utc(),
    }
}
