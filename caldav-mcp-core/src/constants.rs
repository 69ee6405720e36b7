/// Domain tag appended to every generated event UID.
pub const UID_DOMAIN: &str = "chatgpt-mcp";

/// PRODID written into newly created calendar objects.
pub const PRODID: &str = "-//ChatGPT MCP iCloud CalDAV//EN";

pub const DEFAULT_CALDAV_URL: &str = "https://caldav.icloud.com";

pub const DEFAULT_TZID: &str = "America/New_York";

/// Half-width of the window searched when looking an event up by UID.
pub const DEFAULT_SCAN_DAYS: i64 = 3 * 365;

/// Upper bound on occurrences generated per recurring series.
pub const MAX_OCCURRENCES: u16 = 5000;
