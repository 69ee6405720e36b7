//! Tool surface exposed over MCP.
//!
//! Each tool takes one parameter struct, deserialized from the `arguments`
//! of a `tools/call` request. The JSON Schema published by `tools/list` is
//! derived from the same struct, field docs included.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which tools a deployment exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolProfile {
    /// Calendar read/write tools.
    #[default]
    Standard,
    /// Read-only `search` and `fetch`.
    DeepResearch,
}

impl ToolProfile {
    pub fn tool_names(self) -> &'static [&'static str] {
        match self {
            ToolProfile::Standard => &[
                "list_calendars",
                "list_events",
                "create_event",
                "update_event",
                "delete_event",
            ],
            ToolProfile::DeepResearch => &["search", "fetch"],
        }
    }
}

// ============================================================================
// Calendar tools
// ============================================================================

/// List every calendar visible to the account.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListCalendars {}

/// List events in `[start, end)`.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListEvents {
    /// Calendar display name (exact, case-sensitive) or absolute CalDAV calendar URL
    pub calendar_name_or_url: String,
    /// ISO datetime: YYYY-MM-DDTHH:MM:SS (local), with trailing Z (UTC), or with a +HH:MM offset
    pub start: String,
    /// ISO datetime, exclusive
    pub end: String,
    /// Expand recurring series into instances (default true)
    #[serde(default = "default_true")]
    pub expand_recurring: bool,
}

fn default_true() -> bool {
    true
}

/// Create an event; responds with the generated UID.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateEvent {
    /// Calendar display name (exact, case-sensitive) or absolute CalDAV calendar URL
    pub calendar_name_or_url: String,
    pub summary: String,
    /// ISO datetime, or YYYY-MM-DD for an all-day event
    pub start: String,
    /// ISO datetime, or YYYY-MM-DD for an all-day event
    pub end: String,
    /// IANA time zone, e.g. America/New_York
    #[serde(default)]
    pub tzid: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Patch an existing event. Omitted fields are left untouched.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateEvent {
    /// Calendar display name (exact, case-sensitive) or absolute CalDAV calendar URL
    pub calendar_name_or_url: String,
    pub uid: String,
    #[serde(default)]
    pub summary: Option<String>,
    /// ISO datetime, or YYYY-MM-DD for an all-day event
    #[serde(default)]
    pub start: Option<String>,
    /// ISO datetime, or YYYY-MM-DD for an all-day event
    #[serde(default)]
    pub end: Option<String>,
    /// IANA time zone, e.g. America/New_York
    #[serde(default)]
    pub tzid: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteEvent {
    /// Calendar display name (exact, case-sensitive) or absolute CalDAV calendar URL
    pub calendar_name_or_url: String,
    pub uid: String,
}

// ============================================================================
// Read-only research tools
// ============================================================================

/// Free-text search over every calendar.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Search {
    /// Case-insensitive text matched against titles and descriptions
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// `<calendar url>|<uid>`
    pub id: String,
    pub title: String,
    pub snippet: String,
}

/// Fetch the raw ICS for ids returned by [`Search`].
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Fetch {
    /// Ids as returned by `search`
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedDocument {
    pub id: String,
    pub mime_type: String,
    pub content: String,
}

/// Split a search hit id into calendar URL and UID (which may itself contain `|`).
pub fn split_hit_id(id: &str) -> Option<(&str, &str)> {
    let (url, uid) = id.split_once('|')?;
    if url.is_empty() || uid.is_empty() {
        return None;
    }
    Some((url, uid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profiles_are_disjoint() {
        for name in ToolProfile::Standard.tool_names() {
            assert!(!ToolProfile::DeepResearch.tool_names().contains(name));
        }
        assert_eq!(ToolProfile::default(), ToolProfile::Standard);
    }

    #[test]
    fn schemas_require_calendar_reference() {
        let schemas = [
            schemars::schema_for!(ListEvents),
            schemars::schema_for!(CreateEvent),
            schemars::schema_for!(UpdateEvent),
            schemars::schema_for!(DeleteEvent),
        ];
        for schema in schemas {
            let value = serde_json::to_value(&schema).unwrap();
            let required = value["required"].as_array().unwrap();
            assert!(required.contains(&json!("calendar_name_or_url")), "{value}");
            assert!(value["properties"]["calendar_name_or_url"]["description"].is_string());
        }
    }

    #[test]
    fn optional_fields_are_not_required() {
        let value = serde_json::to_value(schemars::schema_for!(UpdateEvent)).unwrap();
        let required = value["required"].as_array().unwrap();
        assert_eq!(required.len(), 2);
        assert!(!required.contains(&json!("tzid")));

        let value = serde_json::to_value(schemars::schema_for!(ListEvents)).unwrap();
        assert_eq!(value["properties"]["expand_recurring"]["default"], true);
    }

    #[test]
    fn expand_recurring_defaults_to_true() {
        let params: ListEvents = serde_json::from_value(json!({
            "calendar_name_or_url": "Home",
            "start": "2025-09-29T00:00:00",
            "end": "2025-09-30T00:00:00"
        }))
        .unwrap();
        assert!(params.expand_recurring);
    }

    #[test]
    fn update_fields_are_optional() {
        let params: UpdateEvent = serde_json::from_value(json!({
            "calendar_name_or_url": "Home",
            "uid": "abc@chatgpt-mcp",
            "summary": "New title"
        }))
        .unwrap();
        assert_eq!(params.summary.as_deref(), Some("New title"));
        assert!(params.start.is_none());
        assert!(params.tzid.is_none());
    }

    #[test]
    fn create_requires_end() {
        let result = serde_json::from_value::<CreateEvent>(json!({
            "calendar_name_or_url": "Home",
            "summary": "Demo",
            "start": "2025-09-29T15:00:00"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn fetched_document_uses_mime_type_key() {
        let doc = FetchedDocument {
            id: "https://cal/|u".into(),
            mime_type: "text/calendar".into(),
            content: "BEGIN:VCALENDAR".into(),
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["mimeType"], "text/calendar");
    }

    #[test]
    fn hit_ids_split_on_first_pipe() {
        assert_eq!(
            split_hit_id("https://p1-caldav.icloud.com/1/calendars/home/|abc@x"),
            Some(("https://p1-caldav.icloud.com/1/calendars/home/", "abc@x"))
        );
        assert_eq!(split_hit_id("no-separator"), None);
        assert_eq!(split_hit_id("|uid"), None);
    }
}
