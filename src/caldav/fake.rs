//! In-memory [`CalendarClient`] for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use caldav_mcp_core::ics::split_events;
use caldav_mcp_core::{CalMcpError, CalMcpResult, CalendarInfo, TimeWindow};

use super::{CalendarClient, CalendarResource};

#[derive(Default)]
pub struct FakeCalendarClient {
    calendars: Vec<CalendarInfo>,
    resources: Mutex<HashMap<String, Vec<CalendarResource>>>,
    writes: AtomicUsize,
    queries: AtomicUsize,
    reject_credentials: bool,
}

impl FakeCalendarClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calendar(mut self, url: &str, name: Option<&str>) -> Self {
        self.calendars
            .push(CalendarInfo::new(url, name.map(str::to_string)));
        self
    }

    /// Every call fails as if the server answered 401.
    pub fn rejecting_credentials(mut self) -> Self {
        self.reject_credentials = true;
        self
    }

    /// Store `ics` directly, bypassing the write counter.
    pub fn seed(&self, calendar_url: &str, file_name: &str, ics: &str) {
        let url = format!("{}/{}", calendar_url.trim_end_matches('/'), file_name);
        self.resources
            .lock()
            .unwrap()
            .entry(calendar_url.to_string())
            .or_default()
            .push(CalendarResource {
                url,
                etag: Some("\"seed\"".to_string()),
                data: ics.to_string(),
            });
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Calendar queries issued so far.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn resources(&self, calendar_url: &str) -> Vec<CalendarResource> {
        self.resources
            .lock()
            .unwrap()
            .get(calendar_url)
            .cloned()
            .unwrap_or_default()
    }

    fn check_credentials(&self) -> CalMcpResult<()> {
        if self.reject_credentials {
            return Err(CalMcpError::Authentication(
                "bad status code: 401 Unauthorized".to_string(),
            ));
        }
        Ok(())
    }

    fn calendar_of(resource_url: &str) -> String {
        match resource_url.rsplit_once('/') {
            Some((calendar, _)) => format!("{calendar}/"),
            None => resource_url.to_string(),
        }
    }
}

fn touches_window(data: &str, window: &TimeWindow) -> bool {
    split_events(data).iter().any(|c| {
        let start = c.event.start.to_utc(None);
        if c.event.is_recurring() {
            return start < window.end;
        }
        let end = c.event.effective_end().map(|e| e.to_utc(None));
        window.overlaps(start, end)
    })
}

#[async_trait]
impl CalendarClient for FakeCalendarClient {
    async fn list_calendars(&self) -> CalMcpResult<Vec<CalendarInfo>> {
        self.check_credentials()?;
        Ok(self.calendars.clone())
    }

    async fn query_resources(
        &self,
        calendar_url: &str,
        window: &TimeWindow,
    ) -> CalMcpResult<Vec<CalendarResource>> {
        self.check_credentials()?;
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .resources(calendar_url)
            .into_iter()
            .filter(|r| touches_window(&r.data, window))
            .collect())
    }

    async fn create_resource(&self, calendar_url: &str, uid: &str, ics: &str) -> CalMcpResult<()> {
        self.check_credentials()?;
        let url = format!("{}/{uid}.ics", calendar_url.trim_end_matches('/'));
        let mut resources = self.resources.lock().unwrap();
        let entries = resources.entry(calendar_url.to_string()).or_default();
        if entries.iter().any(|r| r.url == url) {
            return Err(CalMcpError::Transport(
                "bad status code: 412 Precondition Failed".to_string(),
            ));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        entries.push(CalendarResource {
            url,
            etag: Some("\"1\"".to_string()),
            data: ics.to_string(),
        });
        Ok(())
    }

    async fn replace_resource(&self, resource: &CalendarResource, ics: &str) -> CalMcpResult<()> {
        self.check_credentials()?;
        let mut resources = self.resources.lock().unwrap();
        let entries = resources
            .entry(Self::calendar_of(&resource.url))
            .or_default();
        let Some(existing) = entries.iter_mut().find(|r| r.url == resource.url) else {
            return Err(CalMcpError::Transport(
                "bad status code: 404 Not Found".to_string(),
            ));
        };
        self.writes.fetch_add(1, Ordering::SeqCst);
        existing.data = ics.to_string();
        existing.etag = Some("\"2\"".to_string());
        Ok(())
    }

    async fn delete_resource(&self, resource: &CalendarResource) -> CalMcpResult<()> {
        self.check_credentials()?;
        let mut resources = self.resources.lock().unwrap();
        if let Some(entries) = resources.get_mut(&Self::calendar_of(&resource.url)) {
            entries.retain(|r| r.url != resource.url);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
