//! Core types for caldav-mcp.
//!
//! This crate holds everything that does not talk to the network:
//! - `ics` for reading, patching and synthesizing calendar components
//! - `event`, `datetime` and `window` for the structured event view
//! - `protocol` for the MCP tool parameters and results

pub mod calendar;
pub mod constants;
pub mod datetime;
pub mod error;
pub mod event;
pub mod ics;
pub mod listing;
pub mod protocol;
pub mod recurrence;
pub mod window;

pub use calendar::CalendarInfo;
pub use error::{CalMcpError, CalMcpResult};
pub use event::{EventRecord, EventTime};
pub use window::TimeWindow;
