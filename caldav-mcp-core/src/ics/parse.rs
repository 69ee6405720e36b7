//! ICS parsing using the icalendar crate's parser.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use icalendar::{
    DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};

use super::escape::unescape_text;
use crate::datetime::{ICS_DATE_FORMAT, ICS_LOCAL_FORMAT};
use crate::event::EventTime;

/// The fields of a VEVENT this connector reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvent {
    pub uid: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: EventTime,
    pub end: Option<EventTime>,
    pub duration: Option<Duration>,
    pub rrule: Option<String>,
    pub rdates: Vec<EventTime>,
    pub exdates: Vec<EventTime>,
    pub recurrence_id: Option<EventTime>,
}

impl ParsedEvent {
    /// DTEND, or DTSTART + DURATION when only a duration is given.
    pub fn effective_end(&self) -> Option<EventTime> {
        self.end
            .clone()
            .or_else(|| self.duration.map(|d| self.start.shifted(d)))
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence_id.is_none() && (self.rrule.is_some() || !self.rdates.is_empty())
    }
}

/// Parse the first VEVENT in `content`. Events without UID or DTSTART are
/// rejected.
pub fn parse_event(content: &str) -> Option<ParsedEvent> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).ok()?;
    let vevent = calendar.components.iter().find(|c| c.name == "VEVENT")?;
    parse_vevent(vevent)
}

fn parse_vevent(vevent: &Component) -> Option<ParsedEvent> {
    let uid = vevent.find_prop("UID")?.val.to_string().trim().to_string();
    if uid.is_empty() {
        return None;
    }
    let start = to_event_time(DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?);
    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_event_time);

    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| unescape_text(p.val.as_ref()));
    let description = vevent
        .find_prop("DESCRIPTION")
        .map(|p| unescape_text(p.val.as_ref()));
    let duration = vevent
        .find_prop("DURATION")
        .and_then(|p| parse_duration(p.val.as_ref()));

    let rrule = vevent.find_prop("RRULE").map(|p| p.val.to_string());
    let rdates = multi_valued(vevent, "RDATE");
    let exdates = multi_valued(vevent, "EXDATE");
    let recurrence_id = vevent
        .find_prop("RECURRENCE-ID")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_event_time);

    Some(ParsedEvent {
        uid,
        summary,
        description,
        start,
        end,
        duration,
        rrule,
        rdates,
        exdates,
        recurrence_id,
    })
}

fn to_event_time(dpt: DatePerhapsTime) -> EventTime {
    match dpt {
        DatePerhapsTime::Date(d) => EventTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            icalendar::CalendarDateTime::Utc(dt) => EventTime::DateTimeUtc(dt),
            icalendar::CalendarDateTime::Floating(naive) => EventTime::DateTimeFloating(naive),
            icalendar::CalendarDateTime::WithTimezone { date_time, tzid } => {
                EventTime::DateTimeZoned {
                    datetime: date_time,
                    tzid,
                }
            }
        },
    }
}

/// ISO-8601 duration (`PT1H30M`, `P1D`, `P2W`). Negative durations are not
/// meaningful for DTEND and are ignored.
fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let value = value.strip_prefix('+').unwrap_or(value);
    if value.starts_with('-') {
        return None;
    }
    let parsed = iso8601::duration(value).ok()?;
    Duration::from_std(std::time::Duration::from(parsed)).ok()
}

/// Collect every value of a multi-valued date property (EXDATE, RDATE).
///
/// Handles `TZID`, `VALUE=DATE`, UTC and floating forms, and
/// comma-separated lists.
fn multi_valued(vevent: &Component, name: &str) -> Vec<EventTime> {
    vevent
        .properties
        .iter()
        .filter(|p| p.name.as_ref() == name)
        .flat_map(parse_date_list)
        .collect()
}

fn parse_date_list(prop: &Property) -> Vec<EventTime> {
    let tzid = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    let is_date = prop
        .params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE"));

    prop.val
        .as_ref()
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if is_date {
                NaiveDate::parse_from_str(s, ICS_DATE_FORMAT)
                    .ok()
                    .map(EventTime::Date)
            } else if let Some(utc) = s.strip_suffix('Z') {
                NaiveDateTime::parse_from_str(utc, ICS_LOCAL_FORMAT)
                    .ok()
                    .map(|dt| EventTime::DateTimeUtc(dt.and_utc()))
            } else if let Some(ref tz) = tzid {
                NaiveDateTime::parse_from_str(s, ICS_LOCAL_FORMAT)
                    .ok()
                    .map(|dt| EventTime::DateTimeZoned {
                        datetime: dt,
                        tzid: tz.clone(),
                    })
            } else {
                NaiveDateTime::parse_from_str(s, ICS_LOCAL_FORMAT)
                    .ok()
                    .map(EventTime::DateTimeFloating)
            }
        })
        .collect()
}
