//! Structured views of calendar events.
//!
//! The raw ICS text returned by the server is authoritative. Everything here
//! is derived from it and only used for presentation and windowing.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use icalendar::{Property, ValueType};
use serde::{Deserialize, Serialize};

use crate::datetime::{
    ICS_DATE_FORMAT, ICS_LOCAL_FORMAT, ICS_UTC_FORMAT, localize, naive_to_utc, parse_zone,
    start_of_day,
};

/// The value of a DTSTART/DTEND/RECURRENCE-ID property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTime {
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
}

impl EventTime {
    /// The absolute instant. Floating times and dates are read in `fallback`
    /// (UTC if `None`); zoned times whose TZID is unknown to the tz database
    /// fall back the same way.
    pub fn to_utc(&self, fallback: Option<Tz>) -> DateTime<Utc> {
        match self {
            EventTime::Date(d) => naive_to_utc(start_of_day(*d), fallback),
            EventTime::DateTimeUtc(dt) => *dt,
            EventTime::DateTimeFloating(dt) => naive_to_utc(*dt, fallback),
            EventTime::DateTimeZoned { datetime, tzid } => {
                naive_to_utc(*datetime, parse_zone(tzid).or(fallback))
            }
        }
    }

    pub fn tzid(&self) -> Option<&str> {
        match self {
            EventTime::DateTimeZoned { tzid, .. } => Some(tzid),
            _ => None,
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    /// ISO-8601 rendering for callers.
    ///
    /// Zoned values carry their UTC offset when the zone is known, UTC values
    /// render as `+00:00`, floating values have no offset.
    pub fn to_iso_string(&self) -> String {
        match self {
            EventTime::Date(d) => d.format("%Y-%m-%d").to_string(),
            EventTime::DateTimeUtc(dt) => dt.fixed_offset().to_rfc3339(),
            EventTime::DateTimeFloating(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
            EventTime::DateTimeZoned { datetime, tzid } => match parse_zone(tzid) {
                Some(zone) => localize(zone, *datetime).fixed_offset().to_rfc3339(),
                None => datetime.format("%Y-%m-%dT%H:%M:%S").to_string(),
            },
        }
    }

    /// The bare iCalendar value (no parameters).
    pub fn to_ics_value(&self) -> String {
        match self {
            EventTime::Date(d) => d.format(ICS_DATE_FORMAT).to_string(),
            EventTime::DateTimeUtc(dt) => dt.format(ICS_UTC_FORMAT).to_string(),
            EventTime::DateTimeFloating(dt) => dt.format(ICS_LOCAL_FORMAT).to_string(),
            EventTime::DateTimeZoned { datetime, .. } => datetime.format(ICS_LOCAL_FORMAT).to_string(),
        }
    }

    /// Property `name` carrying this value: dates get `VALUE=DATE`, zoned
    /// times a `TZID` parameter.
    pub fn to_property(&self, name: &str) -> Property {
        let mut property = Property::new(name, self.to_ics_value());
        match self {
            EventTime::Date(_) => {
                property.append_parameter(ValueType::Date);
            }
            EventTime::DateTimeZoned { tzid, .. } => {
                property.add_parameter("TZID", tzid);
            }
            EventTime::DateTimeUtc(_) | EventTime::DateTimeFloating(_) => {}
        }
        property
    }

    /// Shift by `delta`, keeping the variant (and zone) of `self`.
    pub fn shifted(&self, delta: Duration) -> EventTime {
        match self {
            EventTime::Date(d) => EventTime::Date(*d + Duration::days(delta.num_days())),
            EventTime::DateTimeUtc(dt) => EventTime::DateTimeUtc(*dt + delta),
            EventTime::DateTimeFloating(dt) => EventTime::DateTimeFloating(*dt + delta),
            EventTime::DateTimeZoned { datetime, tzid } => EventTime::DateTimeZoned {
                datetime: *datetime + delta,
                tzid: tzid.clone(),
            },
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}

/// An event as returned to callers of `list_events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub uid: String,
    pub summary: String,
    pub start: String,
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tzid: Option<String>,
    /// Verbatim calendar data as stored on the server.
    pub raw: String,
}
