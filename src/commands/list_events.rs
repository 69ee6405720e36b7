//! List events of one calendar within `[start, end)`.

use caldav_mcp_core::datetime::InputTime;
use caldav_mcp_core::protocol::ListEvents;
use caldav_mcp_core::{CalMcpResult, EventRecord, TimeWindow};

use super::resource_records;
use crate::resolve::resolve_calendar;
use crate::state::AppState;

pub async fn handle(state: &AppState, cmd: ListEvents) -> CalMcpResult<Vec<EventRecord>> {
    let zone = state.config.default_zone();
    let start = InputTime::parse("start", &cmd.start)?;
    let end = InputTime::parse("end", &cmd.end)?;
    let window = TimeWindow::new(start.to_utc(zone), end.to_utc(zone))?;

    let calendar_url = resolve_calendar(state.client.as_ref(), &cmd.calendar_name_or_url).await?;

    let mut records = Vec::new();
    for resource in state.client.query_resources(&calendar_url, &window).await? {
        records.extend(resource_records(
            &resource.url,
            &resource.data,
            &window,
            cmd.expand_recurring,
            zone,
        ));
    }
    Ok(records)
}
