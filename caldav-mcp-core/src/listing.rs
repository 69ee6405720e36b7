//! Turning calendar object resources into event records for a window.

use chrono_tz::Tz;

use crate::error::CalMcpResult;
use crate::event::EventRecord;
use crate::ics::{EventComponent, ParsedEvent, split_events};
use crate::recurrence::expand;
use crate::window::TimeWindow;

/// Map a parsed VEVENT and its raw text to the caller-facing record.
pub fn to_record(event: &ParsedEvent, raw: String) -> EventRecord {
    EventRecord {
        uid: event.uid.clone(),
        summary: event.summary.clone().unwrap_or_default(),
        start: event.start.to_iso_string(),
        end: event.effective_end().map(|end| end.to_iso_string()),
        description: event.description.clone(),
        tzid: event.start.tzid().map(str::to_string),
        raw,
    }
}

fn overlaps(event: &ParsedEvent, window: &TimeWindow, zone: Option<Tz>) -> bool {
    let end = event.effective_end().map(|end| end.to_utc(zone));
    window.overlaps(event.start.to_utc(zone), end)
}

/// Series master of a resource: the first VEVENT without RECURRENCE-ID.
pub fn primary(components: &[EventComponent]) -> Option<&EventComponent> {
    components
        .iter()
        .find(|c| c.event.recurrence_id.is_none())
        .or_else(|| components.first())
}

/// Records for one resource (`raw`) that fall inside `window`.
///
/// Without expansion a resource yields at most one record, its series
/// master, carrying the whole resource as raw text. With expansion every
/// recurring master is expanded into instances, overrides are listed where
/// they landed, and plain events pass through. Floating times are read in
/// `zone`.
pub fn events_in_window(
    raw: &str,
    window: &TimeWindow,
    expand_recurring: bool,
    zone: Option<Tz>,
) -> CalMcpResult<Vec<EventRecord>> {
    let components = split_events(raw);

    if !expand_recurring {
        let records = primary(&components)
            .filter(|c| {
                if c.event.is_recurring() {
                    c.event.start.to_utc(zone) < window.end
                } else {
                    overlaps(&c.event, window, zone)
                }
            })
            .map(|c| to_record(&c.event, raw.to_string()))
            .into_iter()
            .collect();
        return Ok(records);
    }

    let single = components.len() == 1;
    let overrides: Vec<EventComponent> = components
        .iter()
        .filter(|c| c.event.recurrence_id.is_some())
        .cloned()
        .collect();

    let mut records = Vec::new();
    for component in &components {
        let event = &component.event;
        if event.is_recurring() {
            for instance in expand(event, &component.raw, window, &overrides, zone)? {
                records.push(to_record(&instance.event, instance.raw));
            }
        } else if overlaps(event, window, zone) {
            let raw = if single {
                raw.to_string()
            } else {
                component.raw.clone()
            };
            records.push(to_record(event, raw));
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const SERIES: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:test\r\n\
BEGIN:VEVENT\r\n\
UID:daily\r\n\
DTSTART:20250601T090000Z\r\n\
DTEND:20250601T093000Z\r\n\
RRULE:FREQ=DAILY;COUNT=10\r\n\
SUMMARY:Standup\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:daily\r\n\
RECURRENCE-ID:20250603T090000Z\r\n\
DTSTART:20250603T120000Z\r\n\
DTEND:20250603T123000Z\r\n\
SUMMARY:Standup (late)\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    fn window(d1: u32, d2: u32) -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 6, d1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 6, d2, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn single_event_record() {
        let raw = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:test\r\n\
BEGIN:VEVENT\r\n\
UID:abc@chatgpt-mcp\r\n\
DTSTART;TZID=America/New_York:20250929T150000\r\n\
DTEND;TZID=America/New_York:20250929T153000\r\n\
SUMMARY:Demo\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
        let w = TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 9, 29, 4, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 9, 30, 4, 0, 0).unwrap(),
        )
        .unwrap();
        let records = events_in_window(raw, &w, true, None).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.uid, "abc@chatgpt-mcp");
        assert_eq!(r.summary, "Demo");
        assert_eq!(r.start, "2025-09-29T15:00:00-04:00");
        assert_eq!(r.end.as_deref(), Some("2025-09-29T15:30:00-04:00"));
        assert_eq!(r.tzid.as_deref(), Some("America/New_York"));
        assert_eq!(r.raw, raw);
    }

    #[test]
    fn event_starting_at_window_end_is_excluded() {
        let raw = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:test\r\n\
BEGIN:VEVENT\r\nUID:edge\r\nDTSTART:20250602T000000Z\r\nDTEND:20250602T010000Z\r\nEND:VEVENT\r\n\
END:VCALENDAR\r\n";
        assert!(events_in_window(raw, &window(1, 2), true, None).unwrap().is_empty());
        assert_eq!(events_in_window(raw, &window(2, 3), true, None).unwrap().len(), 1);
    }

    #[test]
    fn expanded_series_includes_override_in_its_slot() {
        let records = events_in_window(SERIES, &window(2, 5), true, None).unwrap();
        let summaries: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.start.as_str(), r.summary.as_str()))
            .collect();
        assert_eq!(
            summaries,
            vec![
                ("2025-06-02T09:00:00+00:00", "Standup"),
                ("2025-06-04T09:00:00+00:00", "Standup"),
                ("2025-06-03T12:00:00+00:00", "Standup (late)"),
            ]
        );
        assert!(records.iter().all(|r| r.uid == "daily"));
        assert!(records[2].raw.contains("RECURRENCE-ID:20250603T090000Z"));
        assert!(!records[2].raw.contains("RRULE"));
    }

    #[test]
    fn unexpanded_returns_master_once() {
        let records = events_in_window(SERIES, &window(2, 5), false, None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].summary, "Standup");
        assert_eq!(records[0].start, "2025-06-01T09:00:00+00:00");
        assert_eq!(records[0].raw, SERIES);
    }

    #[test]
    fn floating_times_use_zone() {
        let raw = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:test\r\n\
BEGIN:VEVENT\r\nUID:f\r\nDTSTART:20250601T230000\r\nEND:VEVENT\r\n\
END:VCALENDAR\r\n";
        let zone: Tz = "America/Los_Angeles".parse().unwrap();
        // 23:00 in Los Angeles is 06:00 UTC the next day.
        assert!(events_in_window(raw, &window(1, 2), true, Some(zone)).unwrap().is_empty());
        assert_eq!(events_in_window(raw, &window(1, 2), true, None).unwrap().len(), 1);
    }
}
