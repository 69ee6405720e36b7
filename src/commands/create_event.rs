//! Create an event and return its UID.
//!
//! start < end is not checked here; the server decides what it accepts.

use caldav_mcp_core::CalMcpResult;
use caldav_mcp_core::datetime::InputTime;
use caldav_mcp_core::ics::{NewEventFields, build_event, generate_uid};
use caldav_mcp_core::protocol::CreateEvent;
use chrono::Utc;
use tracing::info;

use crate::resolve::resolve_calendar;
use crate::state::AppState;

pub async fn handle(state: &AppState, cmd: CreateEvent) -> CalMcpResult<String> {
    let fields = NewEventFields {
        summary: cmd.summary,
        start: InputTime::parse("start", &cmd.start)?,
        end: Some(InputTime::parse("end", &cmd.end)?),
        tzid: cmd.tzid,
        description: cmd.description,
    };

    let calendar_url = resolve_calendar(state.client.as_ref(), &cmd.calendar_name_or_url).await?;

    let uid = generate_uid();
    let ics = build_event(&uid, &fields, state.config.default_tzid.as_deref(), Utc::now())?;
    state
        .client
        .create_resource(&calendar_url, &uid, &ics)
        .await?;

    info!(calendar = %calendar_url, uid = %uid, "Created event");
    Ok(uid)
}
