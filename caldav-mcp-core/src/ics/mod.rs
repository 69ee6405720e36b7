//! ICS reading, patching and generation.
//!
//! Calendar data is kept as an [`IcsDocument`]: the server's lines, verbatim,
//! with just enough structure to find a VEVENT and swap individual
//! properties. Nothing is re-serialized unless it was explicitly changed;
//! new and changed properties are rendered by `icalendar`.

mod build;
mod document;
mod escape;
mod object;
mod parse;
mod patch;

pub use build::{NewEventFields, build_event, generate_uid};
pub use document::{ContentLine, IcsDocument, PropertyEdit};
pub use escape::{text_property, unescape_text};
pub use object::{EventComponent, split_events};
pub use parse::{ParsedEvent, parse_event};
pub use patch::{EventPatch, apply_patch, datetime_property};
