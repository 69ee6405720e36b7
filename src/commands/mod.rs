//! One module per tool; each exposes `handle(state, params)`.

pub mod create_event;
pub mod delete_event;
pub mod fetch;
pub mod list_calendars;
pub mod list_events;
pub mod search;
pub mod update_event;

use caldav_mcp_core::listing::events_in_window;
use caldav_mcp_core::{EventRecord, TimeWindow};
use chrono_tz::Tz;
use tracing::warn;

/// Records for one resource, expanded when asked.
///
/// If expansion fails (a malformed RRULE, say) the resource is listed
/// unexpanded instead of failing the whole call.
pub(crate) fn resource_records(
    resource_url: &str,
    data: &str,
    window: &TimeWindow,
    expand_recurring: bool,
    zone: Option<Tz>,
) -> Vec<EventRecord> {
    match events_in_window(data, window, expand_recurring, zone) {
        Ok(records) => records,
        Err(e) => {
            warn!(resource = resource_url, error = %e, "Recurrence expansion failed, listing series unexpanded");
            events_in_window(data, window, false, zone).unwrap_or_default()
        }
    }
}
