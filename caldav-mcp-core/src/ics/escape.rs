//! TEXT values on their way into and out of content lines.
//!
//! Writing goes through `icalendar::Property`, which escapes and folds. The
//! crate only knows `\n` as a line break, so every other break is normalized
//! first.

use icalendar::Property;

/// A TEXT property (SUMMARY, DESCRIPTION) holding `value`.
pub fn text_property(name: &str, value: &str) -> Property {
    Property::new(name, normalize_newlines(value))
}

/// Turn CRLF and lone CR into LF so no raw CR reaches a content line.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Undo RFC 5545 TEXT escaping. Unknown escapes keep the escaped character.
pub fn unescape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
