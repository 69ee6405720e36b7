//! Splitting a calendar object resource into its events.

use super::document::IcsDocument;
use super::parse::{ParsedEvent, parse_event};

/// One VEVENT together with a self-contained ICS text holding only it (plus
/// the VCALENDAR envelope and any VTIMEZONE definitions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventComponent {
    pub event: ParsedEvent,
    pub raw: String,
}

/// Every parseable VEVENT in `raw`, in document order.
pub fn split_events(raw: &str) -> Vec<EventComponent> {
    let doc = IcsDocument::parse(raw);
    let ranges = doc.vevent_ranges();
    if ranges.len() == 1 {
        return parse_event(raw)
            .map(|event| EventComponent {
                event,
                raw: raw.to_string(),
            })
            .into_iter()
            .collect();
    }

    ranges
        .iter()
        .filter_map(|range| {
            let raw = doc.isolate(range).to_string();
            parse_event(&raw).map(|event| EventComponent { event, raw })
        })
        .collect()
}
