//! List every calendar visible to the account.

use caldav_mcp_core::CalMcpResult;
use caldav_mcp_core::CalendarInfo;
use caldav_mcp_core::protocol::ListCalendars;

use crate::state::AppState;

pub async fn handle(state: &AppState, _cmd: ListCalendars) -> CalMcpResult<Vec<CalendarInfo>> {
    state.client.list_calendars().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{HOME, WORK, fake_client, state_with};
    use caldav_mcp_core::protocol::ToolProfile;

    #[tokio::test]
    async fn lists_name_url_and_id() {
        let state = state_with(fake_client(), ToolProfile::Standard);
        let calendars = handle(&state, ListCalendars {}).await.unwrap();
        assert_eq!(calendars.len(), 2);
        assert_eq!(calendars[0].name.as_deref(), Some("Home"));
        assert_eq!(calendars[0].url, HOME);
        assert_eq!(calendars[0].id.as_deref(), Some("home"));
        assert_eq!(calendars[1].url, WORK);
    }
}
