//! Read-only retrieval of the stored ICS for search hit ids.

use std::collections::HashSet;

use caldav_mcp_core::CalMcpResult;
use caldav_mcp_core::protocol::{Fetch, FetchedDocument, split_hit_id};
use chrono::Utc;
use tracing::debug;

use crate::scan::find_by_uid;
use crate::state::AppState;

const ICS_MIME_TYPE: &str = "text/calendar";

/// Ids that are malformed, name an unknown calendar, or whose UID is no
/// longer in the scan window are left out of the result.
pub async fn handle(state: &AppState, cmd: Fetch) -> CalMcpResult<Vec<FetchedDocument>> {
    let known: HashSet<String> = state
        .client
        .list_calendars()
        .await?
        .into_iter()
        .map(|cal| cal.url)
        .collect();
    let window = state.scan_window(Utc::now());

    let mut documents = Vec::new();
    for id in cmd.ids {
        let Some((calendar_url, uid)) = split_hit_id(&id) else {
            debug!(id = %id, "Skipping malformed id");
            continue;
        };
        if !known.contains(calendar_url) {
            debug!(id = %id, "Skipping id for unknown calendar");
            continue;
        }
        let Some((resource, _)) =
            find_by_uid(state.client.as_ref(), calendar_url, uid.trim(), &window).await?
        else {
            continue;
        };
        documents.push(FetchedDocument {
            id: id.clone(),
            mime_type: ICS_MIME_TYPE.to_string(),
            content: resource.data,
        });
    }
    Ok(documents)
}
