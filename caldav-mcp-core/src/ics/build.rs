//! ICS generation for newly created events.

use chrono::{DateTime, Utc};
use icalendar::{Calendar, Component, Event, Property};
use uuid::Uuid;

use super::escape::text_property;
use super::patch::datetime_property;
use crate::constants::{PRODID, UID_DOMAIN};
use crate::datetime::InputTime;
use crate::error::{CalMcpError, CalMcpResult};

/// Fields of an event that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEventFields {
    pub summary: String,
    pub start: InputTime,
    pub end: Option<InputTime>,
    pub tzid: Option<String>,
    pub description: Option<String>,
}

/// A fresh UID: 32 random hex digits tagged with this connector's domain.
pub fn generate_uid() -> String {
    format!("{}@{}", Uuid::new_v4().simple(), UID_DOMAIN)
}

/// Generate a complete VCALENDAR holding one VEVENT.
///
/// Times use `fields.tzid`, else `default_tzid`, else UTC. Output uses CRLF
/// line endings and folded lines.
pub fn build_event(
    uid: &str,
    fields: &NewEventFields,
    default_tzid: Option<&str>,
    now: DateTime<Utc>,
) -> CalMcpResult<String> {
    let tzid = fields
        .tzid
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or(default_tzid);

    let mut event = Event::new();
    event
        .uid(uid)
        .timestamp(now)
        .append_property(text_property("SUMMARY", &fields.summary))
        .append_property(datetime_property("DTSTART", &fields.start, tzid));
    if let Some(end) = &fields.end {
        event.append_property(datetime_property("DTEND", end, tzid));
    }
    if let Some(description) = &fields.description {
        event.append_property(text_property("DESCRIPTION", description));
    }

    let mut calendar = Calendar::empty();
    calendar
        .append_property(Property::new("VERSION", "2.0"))
        .append_property(Property::new("PRODID", PRODID))
        .push(event.done());

    (&calendar)
        .try_into()
        .map_err(|_| CalMcpError::IcsGenerate(format!("cannot render event {uid}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap()
    }

    fn fields(start: &str, end: Option<&str>) -> NewEventFields {
        NewEventFields {
            summary: "Demo".to_string(),
            start: InputTime::parse("start", start).unwrap(),
            end: end.map(|e| InputTime::parse("end", e).unwrap()),
            tzid: Some("America/New_York".to_string()),
            description: None,
        }
    }

    #[test]
    fn uid_shape() {
        let uid = generate_uid();
        let (hex, domain) = uid.split_once('@').unwrap();
        assert_eq!(domain, "chatgpt-mcp");
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(uid, generate_uid());
    }

    fn lines(ics: &str) -> Vec<&str> {
        ics.split("\r\n").collect()
    }

    #[test]
    fn builds_minimal_event() {
        let ics = build_event(
            "abc@chatgpt-mcp",
            &fields("2025-09-29T15:00:00", Some("2025-09-29T15:30:00")),
            None,
            now(),
        )
        .unwrap();
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//ChatGPT MCP iCloud CalDAV//EN\r\n"));
        assert!(ics.ends_with("END:VEVENT\r\nEND:VCALENDAR\r\n"));
        let lines = lines(&ics);
        for expected in [
            "BEGIN:VEVENT",
            "UID:abc@chatgpt-mcp",
            "DTSTAMP:20250901T120000Z",
            "SUMMARY:Demo",
            "DTSTART;TZID=America/New_York:20250929T150000",
            "DTEND;TZID=America/New_York:20250929T153000",
        ] {
            assert!(lines.contains(&expected), "missing {expected} in {ics}");
        }
        assert!(!ics.contains("CALSCALE"));
        assert_eq!(ics.matches("DTSTAMP").count(), 1);
    }

    #[test]
    fn default_zone_applies_without_tzid() {
        let mut f = fields("2025-09-29T15:00:00", None);
        f.tzid = None;
        let ics = build_event("u", &f, Some("Europe/Paris"), now()).unwrap();
        assert!(ics.contains("DTSTART;TZID=Europe/Paris:20250929T150000\r\n"));
        assert!(!ics.contains("DTEND"));

        let utc = build_event("u", &f, None, now()).unwrap();
        assert!(utc.contains("DTSTART:20250929T150000Z\r\n"));
    }

    #[test]
    fn all_day_event_uses_value_date() {
        let f = fields("2025-12-25", Some("2025-12-26"));
        let ics = build_event("u", &f, None, now()).unwrap();
        assert!(ics.contains("DTSTART;VALUE=DATE:20251225\r\n"));
        assert!(ics.contains("DTEND;VALUE=DATE:20251226\r\n"));
    }

    #[test]
    fn escapes_and_folds_description() {
        let mut f = fields("2025-09-29T15:00:00", None);
        f.summary = "Lunch, then; review".to_string();
        f.description = Some(format!("{}\r\nsecond line", "word ".repeat(30)));
        let ics = build_event("u", &f, None, now()).unwrap();
        assert!(ics.contains("SUMMARY:Lunch\\, then\\; review\r\n"));
        assert!(ics.lines().all(|l| l.len() <= 75));
        assert!(ics.contains("\r\n "));
        assert_eq!(ics.matches('\r').count(), ics.matches("\r\n").count());
    }
}
