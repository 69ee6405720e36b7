//! Minimal in-place patching of an existing VEVENT.

use chrono::{NaiveDate, NaiveDateTime};
use icalendar::Property;

use super::document::{ContentLine, IcsDocument, PropertyEdit};
use super::escape::text_property;
use crate::datetime::{ICS_DATE_FORMAT, ICS_LOCAL_FORMAT, InputTime, parse_zone};
use crate::error::{CalMcpError, CalMcpResult};
use crate::event::EventTime;

/// Caller-supplied overrides. `None` leaves the property as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub summary: Option<String>,
    pub start: Option<InputTime>,
    pub end: Option<InputTime>,
    pub tzid: Option<String>,
    pub description: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.tzid().is_none()
            && self.description.is_none()
    }

    fn tzid(&self) -> Option<&str> {
        self.tzid.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Apply `patch` to the VEVENT for `uid` inside `raw`.
///
/// Only properties named by the patch change; every other line (including
/// folding and line endings) is returned as it came in. A patch that would
/// leave DTSTART and DTEND with different value types (one a date, the
/// other a date-time) is rejected.
pub fn apply_patch(
    raw: &str,
    uid: &str,
    patch: &EventPatch,
    default_tzid: Option<&str>,
) -> CalMcpResult<String> {
    let mut doc = IcsDocument::parse(raw);
    let range = doc
        .primary_event(Some(uid))
        .ok_or_else(|| CalMcpError::IcsParse(format!("no VEVENT found for UID {uid}")))?;

    let original_start = doc.property(&range, "DTSTART").cloned();
    let original_end = doc.property(&range, "DTEND").cloned();
    check_value_types(patch, original_start.as_ref(), original_end.as_ref())?;

    let start_tzid = original_start.as_ref().and_then(|l| l.param("TZID"));
    let mut edits = Vec::new();

    if let Some(summary) = &patch.summary {
        edits.push(PropertyEdit::set(text_property("SUMMARY", summary)));
    }

    let start_zone = patch
        .tzid()
        .map(str::to_string)
        .or_else(|| start_tzid.clone())
        .or_else(|| default_tzid.map(str::to_string));
    match (&patch.start, patch.tzid(), &original_start) {
        (Some(start), _, _) => edits.push(PropertyEdit::set(datetime_property(
            "DTSTART",
            start,
            start_zone.as_deref(),
        ))),
        (None, Some(tzid), Some(line)) => {
            if let Some(retagged) = retag(line, "DTSTART", tzid) {
                edits.push(PropertyEdit::set(retagged));
            }
        }
        _ => {}
    }

    let end_zone = patch
        .tzid()
        .map(str::to_string)
        .or_else(|| original_end.as_ref().and_then(|l| l.param("TZID")))
        .or(start_tzid)
        .or_else(|| default_tzid.map(str::to_string));
    match (&patch.end, patch.tzid(), &original_end) {
        (Some(end), _, _) => {
            edits.push(PropertyEdit::set(datetime_property(
                "DTEND",
                end,
                end_zone.as_deref(),
            )));
            edits.push(PropertyEdit::remove("DURATION"));
        }
        (None, Some(tzid), Some(line)) => {
            if let Some(retagged) = retag(line, "DTEND", tzid) {
                edits.push(PropertyEdit::set(retagged));
            }
        }
        _ => {}
    }

    if let Some(description) = &patch.description {
        edits.push(PropertyEdit::set(text_property("DESCRIPTION", description)));
    }

    doc.rewrite_event(&range, &edits)?;
    Ok(doc.to_string())
}

/// Reject a patch whose resulting DTSTART and DTEND disagree on being a
/// date. Unreadable or absent values are not checked.
fn check_value_types(
    patch: &EventPatch,
    original_start: Option<&ContentLine>,
    original_end: Option<&ContentLine>,
) -> CalMcpResult<()> {
    if patch.start.is_none() && patch.end.is_none() {
        return Ok(());
    }
    let is_date = |input: &Option<InputTime>, original: Option<&ContentLine>| match input {
        Some(value) => Some(matches!(value, InputTime::Date(_))),
        None => original.and_then(existing_time).map(|t| t.is_date()),
    };
    let (Some(start_is_date), Some(end_is_date)) = (
        is_date(&patch.start, original_start),
        is_date(&patch.end, original_end),
    ) else {
        return Ok(());
    };
    if start_is_date == end_is_date {
        return Ok(());
    }

    let field = if patch.end.is_some() { "end" } else { "start" };
    let (start_kind, end_kind) = if start_is_date {
        ("a date", "a date-time")
    } else {
        ("a date-time", "a date")
    };
    Err(CalMcpError::validation(
        field,
        format!(
            "start would be {start_kind} but end {end_kind}; \
             pass both start and end as dates or both as date-times"
        ),
    ))
}

/// Property `name` holding a caller time.
///
/// Dates become `VALUE=DATE`. With a zone, naive input is wall-clock time
/// in it and absolute input is converted into it; a zone the tz database
/// does not know makes absolute input fall back to UTC. Without a zone,
/// everything is written in UTC.
pub fn datetime_property(name: &str, value: &InputTime, tzid: Option<&str>) -> Property {
    event_time(value, tzid).to_property(name)
}

fn event_time(value: &InputTime, tzid: Option<&str>) -> EventTime {
    let utc = || EventTime::DateTimeUtc(value.to_utc(None));
    match (value, tzid) {
        (InputTime::Date(date), _) => EventTime::Date(*date),
        (InputTime::Naive(naive), Some(tzid)) => EventTime::DateTimeZoned {
            datetime: *naive,
            tzid: tzid.to_string(),
        },
        (absolute, Some(tzid)) if absolute.is_absolute() => match parse_zone(tzid) {
            Some(zone) => EventTime::DateTimeZoned {
                datetime: absolute.to_utc(None).with_timezone(&zone).naive_local(),
                tzid: tzid.to_string(),
            },
            None => utc(),
        },
        _ => utc(),
    }
}

/// Move an existing DTSTART/DTEND to `tzid`.
///
/// Floating and zoned values keep their wall-clock time, UTC values are
/// converted when the zone is known. Dates carry no zone and are skipped.
fn retag(line: &ContentLine, name: &str, tzid: &str) -> Option<Property> {
    let retagged = match existing_time(line)? {
        EventTime::Date(_) => return None,
        EventTime::DateTimeFloating(datetime) | EventTime::DateTimeZoned { datetime, .. } => {
            EventTime::DateTimeZoned {
                datetime,
                tzid: tzid.to_string(),
            }
        }
        EventTime::DateTimeUtc(utc) => {
            let zone = parse_zone(tzid)?;
            EventTime::DateTimeZoned {
                datetime: utc.with_timezone(&zone).naive_local(),
                tzid: tzid.to_string(),
            }
        }
    };
    Some(retagged.to_property(name))
}

/// Read a DTSTART/DTEND line into an [`EventTime`].
pub(crate) fn existing_time(line: &ContentLine) -> Option<EventTime> {
    let value = line.value().trim();
    let is_date = line
        .param("VALUE")
        .is_some_and(|v| v.eq_ignore_ascii_case("DATE"));

    if is_date || (value.len() == 8 && value.chars().all(|c| c.is_ascii_digit())) {
        return NaiveDate::parse_from_str(value, ICS_DATE_FORMAT)
            .ok()
            .map(EventTime::Date);
    }
    if let Some(utc) = value.strip_suffix('Z') {
        return NaiveDateTime::parse_from_str(utc, ICS_LOCAL_FORMAT)
            .ok()
            .map(|dt| EventTime::DateTimeUtc(dt.and_utc()));
    }
    let datetime = NaiveDateTime::parse_from_str(value, ICS_LOCAL_FORMAT).ok()?;
    Some(match line.param("TZID") {
        Some(tzid) => EventTime::DateTimeZoned { datetime, tzid },
        None => EventTime::DateTimeFloating(datetime),
    })
}
