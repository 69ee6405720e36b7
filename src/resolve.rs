//! Resolving a caller's `calendar_name_or_url` to a calendar URL.

use caldav_mcp_core::{CalMcpError, CalMcpResult};

use crate::caldav::CalendarClient;

/// The two shapes a calendar reference can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarRef {
    Url(String),
    Name(String),
}

impl CalendarRef {
    pub fn parse(input: &str) -> CalMcpResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(CalMcpError::validation(
                "calendar_name_or_url",
                "value is empty",
            ));
        }
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(CalendarRef::Url(input.to_string()))
        } else {
            Ok(CalendarRef::Name(input.to_string()))
        }
    }

    /// The calendar URL. Names must match exactly one display name.
    pub async fn resolve(&self, client: &dyn CalendarClient) -> CalMcpResult<String> {
        let name = match self {
            CalendarRef::Url(url) => return Ok(url.clone()),
            CalendarRef::Name(name) => name,
        };

        let mut urls: Vec<String> = client
            .list_calendars()
            .await?
            .into_iter()
            .filter(|cal| cal.name.as_deref() == Some(name.as_str()))
            .map(|cal| cal.url)
            .collect();

        if urls.len() > 1 {
            return Err(CalMcpError::AmbiguousCalendar {
                name: name.clone(),
                urls,
            });
        }
        urls.pop()
            .ok_or_else(|| CalMcpError::CalendarNotFound(name.clone()))
    }
}

/// Parse and resolve in one step.
pub async fn resolve_calendar(client: &dyn CalendarClient, input: &str) -> CalMcpResult<String> {
    CalendarRef::parse(input)?.resolve(client).await
}
