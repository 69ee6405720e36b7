//! Looking an event up by UID inside a bounded window.

use caldav_mcp_core::ics::{EventComponent, split_events};
use caldav_mcp_core::listing::primary;
use caldav_mcp_core::{CalMcpResult, TimeWindow};

use crate::caldav::{CalendarClient, CalendarResource};

/// First resource in server order holding a VEVENT with `uid`.
///
/// Returns the resource and its series master (or, failing that, the
/// first matching component). Absence is `Ok(None)`, never an error.
pub async fn find_by_uid(
    client: &dyn CalendarClient,
    calendar_url: &str,
    uid: &str,
    window: &TimeWindow,
) -> CalMcpResult<Option<(CalendarResource, EventComponent)>> {
    for resource in client.query_resources(calendar_url, window).await? {
        let matching: Vec<EventComponent> = split_events(&resource.data)
            .into_iter()
            .filter(|c| c.event.uid == uid)
            .collect();
        if let Some(component) = primary(&matching).cloned() {
            return Ok(Some((resource, component)));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caldav::fake::FakeCalendarClient;
    use chrono::{TimeZone, Utc};

    const CAL: &str = "https://example.com/cal/home/";

    fn event(uid: &str, summary: &str) -> String {
        format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:test\r\n\
BEGIN:VEVENT\r\nUID:{uid}\r\nDTSTART:20250601T090000Z\r\nDTEND:20250601T100000Z\r\nSUMMARY:{summary}\r\nEND:VEVENT\r\n\
END:VCALENDAR\r\n"
        )
    }

    fn window() -> TimeWindow {
        TimeWindow::around(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(), 30)
    }

    #[tokio::test]
    async fn finds_matching_uid() {
        let client = FakeCalendarClient::new();
        client.seed(CAL, "a.ics", &event("a", "First"));
        client.seed(CAL, "b.ics", &event("b", "Second"));

        let (resource, component) = find_by_uid(&client, CAL, "b", &window())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resource.url, "https://example.com/cal/home/b.ics");
        assert_eq!(component.event.summary.as_deref(), Some("Second"));
    }

    #[tokio::test]
    async fn duplicates_resolve_to_first_in_response_order() {
        let client = FakeCalendarClient::new();
        client.seed(CAL, "one.ics", &event("dup", "One"));
        client.seed(CAL, "two.ics", &event("dup", "Two"));

        let (resource, _) = find_by_uid(&client, CAL, "dup", &window())
            .await
            .unwrap()
            .unwrap();
        assert!(resource.url.ends_with("one.ics"));
    }

    #[tokio::test]
    async fn missing_uid_is_none() {
        let client = FakeCalendarClient::new();
        client.seed(CAL, "a.ics", &event("a", "First"));
        assert!(find_by_uid(&client, CAL, "nope", &window()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn events_outside_window_are_not_found() {
        let client = FakeCalendarClient::new();
        client.seed(CAL, "a.ics", &event("a", "First"));
        let far = TimeWindow::around(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(), 30);
        assert!(find_by_uid(&client, CAL, "a", &far).await.unwrap().is_none());
    }
}
