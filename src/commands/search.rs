//! Read-only free-text search across every calendar.

use caldav_mcp_core::CalMcpResult;
use caldav_mcp_core::protocol::{Search, SearchHit};
use chrono::Utc;

use super::resource_records;
use crate::state::AppState;

const MAX_HITS: usize = 200;
const MAX_TITLE_CHARS: usize = 200;

/// Case-insensitive substring match on SUMMARY and DESCRIPTION.
///
/// Recurring series are expanded, so each matching instance is its own hit.
pub async fn handle(state: &AppState, cmd: Search) -> CalMcpResult<Vec<SearchHit>> {
    let query = cmd.query.trim().to_lowercase();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let zone = state.config.default_zone();
    let window = state.scan_window(Utc::now());
    let mut hits = Vec::new();

    for calendar in state.client.list_calendars().await? {
        let label = calendar.name.clone().unwrap_or_else(|| calendar.url.clone());
        for resource in state.client.query_resources(&calendar.url, &window).await? {
            for record in resource_records(&resource.url, &resource.data, &window, true, zone) {
                let haystack = format!(
                    "{}\n{}",
                    record.summary,
                    record.description.as_deref().unwrap_or_default()
                )
                .to_lowercase();
                if !haystack.contains(&query) {
                    continue;
                }
                hits.push(SearchHit {
                    id: format!("{}|{}", calendar.url, record.uid),
                    title: record.summary.chars().take(MAX_TITLE_CHARS).collect(),
                    snippet: format!("{} — {}", record.start, label),
                });
                if hits.len() == MAX_HITS {
                    return Ok(hits);
                }
            }
        }
    }

    Ok(hits)
}
