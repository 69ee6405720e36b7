//! Calendar collections as seen by callers.

use serde::{Deserialize, Serialize};

/// A calendar collection visible to the authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarInfo {
    pub name: Option<String>,
    pub url: String,
    pub id: Option<String>,
}

impl CalendarInfo {
    /// Build from an absolute collection URL; the id is its last path segment.
    pub fn new(url: impl Into<String>, name: Option<String>) -> Self {
        let url = url.into();
        let path = match url.split_once("://") {
            Some((_, rest)) => rest.find('/').map_or("", |i| &rest[i..]),
            None => url.as_str(),
        };
        let id = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .map(str::to_string);
        CalendarInfo { name, url, id }
    }
}
