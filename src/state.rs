use std::sync::Arc;

use caldav_mcp_core::TimeWindow;
use chrono::{DateTime, Utc};

use crate::caldav::SharedCalendarClient;
use crate::config::AppConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub client: SharedCalendarClient,
}

impl AppState {
    pub fn new(config: AppConfig, client: SharedCalendarClient) -> Self {
        AppState {
            config: Arc::new(config),
            client,
        }
    }

    /// Window searched when an event is looked up by UID.
    pub fn scan_window(&self, now: DateTime<Utc>) -> TimeWindow {
        TimeWindow::around(now, self.config.scan_days)
    }
}
