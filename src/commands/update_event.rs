//! Patch an existing event found by UID.

use caldav_mcp_core::CalMcpResult;
use caldav_mcp_core::datetime::InputTime;
use caldav_mcp_core::ics::{EventPatch, apply_patch};
use caldav_mcp_core::protocol::UpdateEvent;
use chrono::Utc;
use tracing::{debug, info};

use crate::resolve::resolve_calendar;
use crate::scan::find_by_uid;
use crate::state::AppState;

/// `false` when the UID is not within the scan window. Only the fields the
/// caller supplied change; every other line of the stored object is kept.
pub async fn handle(state: &AppState, cmd: UpdateEvent) -> CalMcpResult<bool> {
    let patch = EventPatch {
        summary: cmd.summary,
        start: InputTime::parse_opt("start", cmd.start.as_deref())?,
        end: InputTime::parse_opt("end", cmd.end.as_deref())?,
        tzid: cmd.tzid,
        description: cmd.description,
    };

    let calendar_url = resolve_calendar(state.client.as_ref(), &cmd.calendar_name_or_url).await?;
    let window = state.scan_window(Utc::now());

    let Some((resource, _)) =
        find_by_uid(state.client.as_ref(), &calendar_url, &cmd.uid, &window).await?
    else {
        debug!(calendar = %calendar_url, uid = %cmd.uid, "Event not found for update");
        return Ok(false);
    };

    if patch.is_empty() {
        return Ok(true);
    }

    let updated = apply_patch(
        &resource.data,
        &cmd.uid,
        &patch,
        state.config.default_tzid.as_deref(),
    )?;
    state.client.replace_resource(&resource, &updated).await?;

    info!(calendar = %calendar_url, uid = %cmd.uid, "Updated event");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{HOME, fake_client, state_with, upcoming_event};
    use caldav_mcp_core::protocol::ToolProfile;

    fn params(uid: &str) -> UpdateEvent {
        UpdateEvent {
            calendar_name_or_url: "Home".to_string(),
            uid: uid.to_string(),
            summary: None,
            start: None,
            end: None,
            tzid: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn summary_only_keeps_everything_else() {
        let client = fake_client();
        let original = upcoming_event("u1", "Old", Some("Notes"));
        client.seed(HOME, "u1.ics", &original);
        let state = state_with(client.clone(), ToolProfile::Standard);

        let mut p = params("u1");
        p.summary = Some("New, improved".to_string());
        assert!(handle(&state, p).await.unwrap());

        let stored = &client.resources(HOME)[0].data;
        assert_eq!(
            stored,
            &original.replace("SUMMARY:Old\r\n", "SUMMARY:New\\, improved\r\n")
        );
        assert_eq!(client.writes(), 1);
    }

    #[tokio::test]
    async fn missing_uid_returns_false_without_write() {
        let client = fake_client();
        client.seed(HOME, "u1.ics", &upcoming_event("u1", "Old", None));
        let state = state_with(client.clone(), ToolProfile::Standard);

        let mut p = params("nope");
        p.summary = Some("x".to_string());
        assert!(!handle(&state, p).await.unwrap());
        assert_eq!(client.writes(), 0);
    }

    #[tokio::test]
    async fn empty_patch_is_a_no_op() {
        let client = fake_client();
        client.seed(HOME, "u1.ics", &upcoming_event("u1", "Old", None));
        let state = state_with(client.clone(), ToolProfile::Standard);

        assert!(handle(&state, params("u1")).await.unwrap());
        assert_eq!(client.writes(), 0);
    }

    #[tokio::test]
    async fn new_times_use_given_zone() {
        let client = fake_client();
        client.seed(HOME, "u1.ics", &upcoming_event("u1", "Old", None));
        let state = state_with(client.clone(), ToolProfile::Standard);

        let mut p = params("u1");
        p.start = Some("2030-01-02T09:00:00".to_string());
        p.end = Some("2030-01-02T10:00:00".to_string());
        p.tzid = Some("Europe/Paris".to_string());
        assert!(handle(&state, p).await.unwrap());

        let stored = &client.resources(HOME)[0].data;
        assert!(stored.contains("DTSTART;TZID=Europe/Paris:20300102T090000\r\n"));
        assert!(stored.contains("DTEND;TZID=Europe/Paris:20300102T100000\r\n"));
        assert!(stored.contains("X-CUSTOM;X-PARAM=1:kept as is\r\n"));
    }

    #[tokio::test]
    async fn malformed_time_is_rejected() {
        let client = fake_client();
        client.seed(HOME, "u1.ics", &upcoming_event("u1", "Old", None));
        let state = state_with(client.clone(), ToolProfile::Standard);

        let mut p = params("u1");
        p.end = Some("soon".to_string());
        assert!(handle(&state, p).await.is_err());
        assert_eq!(client.writes(), 0);
    }

    #[tokio::test]
    async fn date_end_on_timed_event_is_rejected_without_write() {
        let client = fake_client();
        client.seed(HOME, "u1.ics", &upcoming_event("u1", "Old", None));
        let state = state_with(client.clone(), ToolProfile::Standard);

        let mut p = params("u1");
        p.end = Some("2030-01-03".to_string());
        let err = handle(&state, p).await.unwrap_err();
        assert!(matches!(err, caldav_mcp_core::CalMcpError::Validation { ref field, .. } if field == "end"));
        assert_eq!(client.writes(), 0);
    }
}
