//! RRULE expansion for recurring events.
//!
//! Expands a series master into individual instances within a window,
//! respecting EXDATEs and skipping slots taken by RECURRENCE-ID overrides.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::constants::MAX_OCCURRENCES;
use crate::error::{CalMcpError, CalMcpResult};
use crate::event::EventTime;
use crate::ics::{EventComponent, IcsDocument, ParsedEvent, PropertyEdit};
use crate::window::TimeWindow;

/// Render one DTSTART/EXDATE/RDATE line for the rrule crate parser.
///
/// The rrule crate needs datetimes, so all-day dates become midnight UTC and
/// floating times are read as UTC.
fn rrule_line(name: &str, time: &EventTime) -> String {
    match time {
        EventTime::Date(d) => format!("{name}:{}T000000Z", d.format("%Y%m%d")),
        EventTime::DateTimeUtc(dt) => format!("{name}:{}", dt.format("%Y%m%dT%H%M%SZ")),
        EventTime::DateTimeFloating(dt) => format!("{name}:{}Z", dt.format("%Y%m%dT%H%M%S")),
        EventTime::DateTimeZoned { datetime, tzid } => {
            format!("{name};TZID={tzid}:{}", datetime.format("%Y%m%dT%H%M%S"))
        }
    }
}

fn build_rrule_string(master: &ParsedEvent) -> String {
    let mut lines = vec![rrule_line("DTSTART", &master.start)];
    if let Some(rrule) = &master.rrule {
        lines.push(format!("RRULE:{rrule}"));
    }
    lines.extend(master.rdates.iter().map(|t| rrule_line("RDATE", t)));
    lines.extend(master.exdates.iter().map(|t| rrule_line("EXDATE", t)));
    lines.join("\n")
}

/// Convert an rrule occurrence back to an EventTime matching the master's variant.
fn occurrence_to_event_time(dt: &DateTime<rrule::Tz>, master_start: &EventTime) -> EventTime {
    match master_start {
        EventTime::Date(_) => EventTime::Date(dt.date_naive()),
        EventTime::DateTimeUtc(_) => EventTime::DateTimeUtc(dt.with_timezone(&Utc)),
        EventTime::DateTimeFloating(_) => EventTime::DateTimeFloating(dt.naive_utc()),
        EventTime::DateTimeZoned { tzid, .. } => EventTime::DateTimeZoned {
            datetime: dt.naive_local(),
            tzid: tzid.clone(),
        },
    }
}

/// Instance end, keeping the master's length and EventTime variant.
fn instance_end(master: &ParsedEvent, occurrence: &EventTime, zone: Option<Tz>) -> Option<EventTime> {
    let end = master.effective_end()?;
    let length = match (&master.start, &end) {
        (EventTime::Date(s), EventTime::Date(e)) => Duration::days((*e - *s).num_days()),
        _ => end.to_utc(zone) - master.start.to_utc(zone),
    };
    Some(occurrence.shifted(length))
}

/// Expand `master` into instances overlapping `window`.
///
/// `overrides` are the RECURRENCE-ID components of the same series; slots
/// they replace are not generated. The master itself is not returned.
/// Each instance's raw text is `master_raw` re-dated, with RRULE, RDATE and
/// EXDATE removed and a RECURRENCE-ID added.
pub fn expand(
    master: &ParsedEvent,
    master_raw: &str,
    window: &TimeWindow,
    overrides: &[EventComponent],
    zone: Option<Tz>,
) -> CalMcpResult<Vec<EventComponent>> {
    if !master.is_recurring() {
        return Ok(Vec::new());
    }

    let rrule_set: RRuleSet = build_rrule_string(master).parse().map_err(|e| {
        CalMcpError::Recurrence(format!(
            "Failed to parse RRULE for event '{}': {}",
            master.uid, e
        ))
    })?;

    let length = master
        .effective_end()
        .map(|end| end.to_utc(zone) - master.start.to_utc(zone))
        .unwrap_or_else(Duration::zero)
        .max(Duration::zero());

    // after/before are exclusive; widen by a second and filter exactly below.
    let tz: rrule::Tz = Utc.into();
    let after = (window.start - length - Duration::seconds(1)).with_timezone(&tz);
    let before = (window.end + Duration::seconds(1)).with_timezone(&tz);
    let result = rrule_set.after(after).before(before).all(MAX_OCCURRENCES);

    let taken: Vec<DateTime<Utc>> = overrides
        .iter()
        .filter(|o| o.event.uid == master.uid)
        .filter_map(|o| o.event.recurrence_id.as_ref())
        .map(|rid| rid.to_utc(zone))
        .collect();

    let doc = IcsDocument::parse(master_raw);
    let Some(range) = doc.primary_event(Some(&master.uid)) else {
        return Ok(Vec::new());
    };

    let mut instances = Vec::new();
    for occ_dt in &result.dates {
        let start = occurrence_to_event_time(occ_dt, &master.start);
        let start_utc = start.to_utc(zone);
        if taken.contains(&start_utc) {
            continue;
        }
        let end = instance_end(master, &start, zone);
        if !window.overlaps(start_utc, end.as_ref().map(|e| e.to_utc(zone))) {
            continue;
        }

        let mut edits = vec![
            PropertyEdit::set(start.to_property("DTSTART")),
            PropertyEdit::remove("RRULE"),
            PropertyEdit::remove("RDATE"),
            PropertyEdit::remove("EXDATE"),
            PropertyEdit::set(start.to_property("RECURRENCE-ID")),
        ];
        if let (Some(end), true) = (&end, master.end.is_some()) {
            edits.push(PropertyEdit::set(end.to_property("DTEND")));
        }
        let mut instance_doc = doc.clone();
        instance_doc.rewrite_event(&range, &edits)?;

        let mut event = master.clone();
        event.start = start.clone();
        event.end = if master.end.is_some() { end } else { None };
        event.rrule = None;
        event.rdates.clear();
        event.exdates.clear();
        event.recurrence_id = Some(start);

        instances.push(EventComponent {
            event,
            raw: instance_doc.to_string(),
        });
    }

    Ok(instances)
}
