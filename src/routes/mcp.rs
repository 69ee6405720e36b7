//! MCP over streamable HTTP at `/mcp`.
//!
//! Stateless: every POST is served by a fresh [`CalendarServer`] clone, so
//! `tools/call` works without a prior `initialize` and notifications get 202.

use std::sync::Arc;

use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};

use crate::server::CalendarServer;
use crate::state::AppState;

pub fn service(state: AppState) -> StreamableHttpService<CalendarServer, LocalSessionManager> {
    let server = CalendarServer::new(state);
    StreamableHttpService::new(
        move || Ok(server.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            stateful_mode: false,
            ..Default::default()
        },
    )
}
