//! Error types for caldav-mcp.

use thiserror::Error;

/// Errors surfaced by calendar operations.
#[derive(Error, Debug)]
pub enum CalMcpError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Calendar not found: {0}")]
    CalendarNotFound(String),

    #[error(
        "Calendar name '{name}' is ambiguous: it matches {} calendars ({})",
        .urls.len(),
        .urls.join(", ")
    )]
    AmbiguousCalendar { name: String, urls: Vec<String> },

    #[error("Calendar server rejected the credentials: {0}")]
    Authentication(String),

    #[error("Calendar server request failed: {0}")]
    Transport(String),

    #[error("Unexpected calendar server response: {0}")]
    Protocol(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("Recurrence expansion failed: {0}")]
    Recurrence(String),
}

impl CalMcpError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CalMcpError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for caldav-mcp operations.
pub type CalMcpResult<T> = Result<T, CalMcpError>;
