//! Half-open time windows for listing and UID scans.

use chrono::{DateTime, Duration, Utc};

use crate::datetime::ICS_UTC_FORMAT;
use crate::error::{CalMcpError, CalMcpResult};

/// `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> CalMcpResult<Self> {
        if end < start {
            return Err(CalMcpError::validation(
                "end",
                format!("{} is before start {}", end.to_rfc3339(), start.to_rfc3339()),
            ));
        }
        Ok(TimeWindow { start, end })
    }

    /// `days` either side of `now`.
    pub fn around(now: DateTime<Utc>, days: i64) -> Self {
        let days = Duration::days(days.max(0));
        TimeWindow {
            start: now - days,
            end: now + days,
        }
    }

    /// Whether an event occupying `[start, end)` intersects the window.
    ///
    /// Events starting at or after the window end are outside. Events with
    /// no end, or a zero length, are treated as instants.
    pub fn overlaps(&self, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> bool {
        if start >= self.end {
            return false;
        }
        match end {
            Some(end) if end > start => end > self.start,
            _ => start >= self.start,
        }
    }

    /// Bounds in the form CalDAV `time-range` filters expect.
    pub fn caldav_bounds(&self) -> (String, String) {
        (
            self.start.format(ICS_UTC_FORMAT).to_string(),
            self.end.format(ICS_UTC_FORMAT).to_string(),
        )
    }
}
