//! Access to the upstream CalDAV server.
//!
//! Operations talk to a [`CalendarClient`] so they can be exercised against
//! an in-memory fake; [`LibDavCalendarClient`] is the real one.

mod connection;
#[cfg(test)]
pub mod fake;
mod libdav_client;
mod requests;

use std::sync::Arc;

use async_trait::async_trait;
use caldav_mcp_core::{CalMcpResult, CalendarInfo, TimeWindow};

pub use libdav_client::LibDavCalendarClient;

/// A calendar object resource as stored on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarResource {
    /// Absolute URL of the `.ics` resource.
    pub url: String,
    pub etag: Option<String>,
    pub data: String,
}

#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// Every calendar collection visible to the account.
    async fn list_calendars(&self) -> CalMcpResult<Vec<CalendarInfo>>;

    /// Resources with a VEVENT intersecting `window`, in server order.
    async fn query_resources(
        &self,
        calendar_url: &str,
        window: &TimeWindow,
    ) -> CalMcpResult<Vec<CalendarResource>>;

    /// Store a new resource named after `uid`. Fails if it already exists.
    async fn create_resource(&self, calendar_url: &str, uid: &str, ics: &str) -> CalMcpResult<()>;

    /// Overwrite an existing resource.
    async fn replace_resource(&self, resource: &CalendarResource, ics: &str) -> CalMcpResult<()>;

    /// Remove a resource. A resource that is already gone is not an error.
    async fn delete_resource(&self, resource: &CalendarResource) -> CalMcpResult<()>;
}

pub type SharedCalendarClient = Arc<dyn CalendarClient>;
