//! The MCP server: one `#[tool]` per calendar operation.
//!
//! Tools are split into two routers; the deployment's [`ToolProfile`] picks
//! which one `tools/list` and `tools/call` see.

use caldav_mcp_core::CalMcpResult;
use caldav_mcp_core::protocol::{
    CreateEvent, DeleteEvent, Fetch, ListCalendars, ListEvents, Search, ToolProfile, UpdateEvent,
};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::commands::{
    create_event, delete_event, fetch, list_calendars, list_events, search, update_event,
};
use crate::state::AppState;

#[derive(Clone)]
pub struct CalendarServer {
    state: AppState,
    tool_router: ToolRouter<Self>,
}

impl CalendarServer {
    pub fn new(state: AppState) -> Self {
        let tool_router = match state.config.profile {
            ToolProfile::Standard => Self::standard_tools(),
            ToolProfile::DeepResearch => Self::research_tools(),
        };
        Self { state, tool_router }
    }
}

/// Wrap a command result for `tools/call`.
///
/// Success carries the JSON value twice: as text content and as
/// `structuredContent.result`. A failed command is a tool error the model
/// can read, not a JSON-RPC error.
fn respond<T: Serialize>(tool: &str, result: CalMcpResult<T>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(response) => {
            let value = serde_json::to_value(response)
                .map_err(|e| McpError::internal_error(e.to_string(), None))?;
            let mut result = CallToolResult::success(vec![Content::text(value.to_string())]);
            result.structured_content = Some(json!({ "result": value }));
            Ok(result)
        }
        Err(e) => {
            warn!(tool, error = %e, "Tool call failed");
            Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
        }
    }
}

#[tool_router(router = standard_tools)]
impl CalendarServer {
    #[tool(description = "Return available calendar containers with their name and URL.")]
    async fn list_calendars(&self) -> Result<CallToolResult, McpError> {
        info!(tool = "list_calendars", "Tool call");
        respond(
            "list_calendars",
            list_calendars::handle(&self.state, ListCalendars {}).await,
        )
    }

    #[tool(
        description = "List events between ISO datetimes [start, end). Recurring series are expanded into instances unless expand_recurring is false."
    )]
    async fn list_events(
        &self,
        Parameters(params): Parameters<ListEvents>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "list_events", calendar = %params.calendar_name_or_url, "Tool call");
        respond("list_events", list_events::handle(&self.state, params).await)
    }

    #[tool(
        description = "Create an event and return its new UID. start/end are ISO datetimes; tzid is an IANA zone (defaults to the server's zone)."
    )]
    async fn create_event(
        &self,
        Parameters(params): Parameters<CreateEvent>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "create_event", calendar = %params.calendar_name_or_url, "Tool call");
        respond("create_event", create_event::handle(&self.state, params).await)
    }

    #[tool(
        description = "Update an event by UID. Only the fields given are changed; everything else in the event is preserved. Returns false if the UID is not found."
    )]
    async fn update_event(
        &self,
        Parameters(params): Parameters<UpdateEvent>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "update_event", uid = %params.uid, "Tool call");
        respond("update_event", update_event::handle(&self.state, params).await)
    }

    #[tool(description = "Delete an event by UID. Returns false if the UID is not found.")]
    async fn delete_event(
        &self,
        Parameters(params): Parameters<DeleteEvent>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "delete_event", uid = %params.uid, "Tool call");
        respond("delete_event", delete_event::handle(&self.state, params).await)
    }
}

#[tool_router(router = research_tools)]
impl CalendarServer {
    #[tool(
        description = "Read-only search across event titles and descriptions. Returns [{id, title, snippet}]."
    )]
    async fn search(&self, Parameters(params): Parameters<Search>) -> Result<CallToolResult, McpError> {
        info!(tool = "search", "Tool call");
        respond("search", search::handle(&self.state, params).await)
    }

    #[tool(description = "Fetch raw ICS for ids returned by search. Returns [{id, mimeType, content}].")]
    async fn fetch(&self, Parameters(params): Parameters<Fetch>) -> Result<CallToolResult, McpError> {
        info!(tool = "fetch", ids = params.ids.len(), "Tool call");
        respond("fetch", fetch::handle(&self.state, params).await)
    }
}

#[tool_handler]
impl ServerHandler for CalendarServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Calendar tools for an iCloud/CalDAV account. Call list_calendars first; \
                 other tools take a calendar display name or URL. Events are addressed by UID."
                    .into(),
            ),
            ..Default::default()
        }
    }
}
