//! Delete an event found by UID.

use caldav_mcp_core::CalMcpResult;
use caldav_mcp_core::protocol::DeleteEvent;
use chrono::Utc;
use tracing::{debug, info};

use crate::resolve::resolve_calendar;
use crate::scan::find_by_uid;
use crate::state::AppState;

/// `false` when the UID is not within the scan window.
pub async fn handle(state: &AppState, cmd: DeleteEvent) -> CalMcpResult<bool> {
    let calendar_url = resolve_calendar(state.client.as_ref(), &cmd.calendar_name_or_url).await?;
    let window = state.scan_window(Utc::now());

    let Some((resource, _)) =
        find_by_uid(state.client.as_ref(), &calendar_url, &cmd.uid, &window).await?
    else {
        debug!(calendar = %calendar_url, uid = %cmd.uid, "Event not found for delete");
        return Ok(false);
    };

    state.client.delete_resource(&resource).await?;

    info!(calendar = %calendar_url, uid = %cmd.uid, "Deleted event");
    Ok(true)
}
