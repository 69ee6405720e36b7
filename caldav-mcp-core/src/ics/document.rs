//! Line-preserving view of an iCalendar object.

use std::ops::Range;

use icalendar::Property;

use crate::error::{CalMcpError, CalMcpResult};

/// One logical content line and the physical lines it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    physical: Vec<String>,
    logical: String,
}

impl ContentLine {
    /// Render `property` the way icalendar writes it: escaped and folded.
    pub fn rendered(property: &Property) -> CalMcpResult<Self> {
        let text: String = property.clone().try_into().map_err(|_| {
            CalMcpError::IcsGenerate(format!("cannot render {}", property.key()))
        })?;
        let physical: Vec<String> = text
            .trim_end_matches("\r\n")
            .split("\r\n")
            .map(str::to_string)
            .collect();
        let logical = physical
            .iter()
            .enumerate()
            .map(|(i, p)| if i == 0 { p.as_str() } else { p.strip_prefix(' ').unwrap_or(p) })
            .collect();
        Ok(ContentLine { physical, logical })
    }

    /// The unfolded line.
    pub fn logical(&self) -> &str {
        &self.logical
    }

    /// Upper-cased property name (`DTSTART`, `BEGIN`, ...).
    pub fn name(&self) -> String {
        let end = self
            .logical
            .find([';', ':'])
            .unwrap_or(self.logical.len());
        self.logical[..end].trim().to_ascii_uppercase()
    }

    /// Everything after the first `:` that is not inside a quoted parameter.
    pub fn value(&self) -> &str {
        match value_start(&self.logical) {
            Some(i) => &self.logical[i + 1..],
            None => "",
        }
    }

    /// Look up a parameter by name (case-insensitive), without surrounding quotes.
    pub fn param(&self, key: &str) -> Option<String> {
        let head_end = value_start(&self.logical).unwrap_or(self.logical.len());
        let head = &self.logical[..head_end];
        split_unquoted(head, ';')
            .into_iter()
            .skip(1)
            .filter_map(|p| p.split_once('='))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim().trim_matches('"').to_string())
    }

    fn is_begin(&self) -> bool {
        self.name() == "BEGIN"
    }

    fn is_end(&self) -> bool {
        self.name() == "END"
    }

    fn component(&self) -> String {
        self.value().trim().to_ascii_uppercase()
    }
}

fn value_start(line: &str) -> Option<usize> {
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ':' if !quoted => return Some(i),
            _ => {}
        }
    }
    None
}

fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if c == '"' {
            quoted = !quoted;
        } else if c == sep && !quoted {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

/// A change to a direct property of a VEVENT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyEdit {
    /// Replace the first occurrence of the property with this one and drop
    /// the rest, or append it if the property is absent.
    Set(Property),
    /// Drop every occurrence of `name`.
    Remove { name: String },
}

impl PropertyEdit {
    pub fn set(property: Property) -> Self {
        PropertyEdit::Set(property)
    }

    pub fn remove(name: &str) -> Self {
        PropertyEdit::Remove {
            name: name.to_ascii_uppercase(),
        }
    }

    fn name(&self) -> String {
        match self {
            PropertyEdit::Set(property) => property.key().to_ascii_uppercase(),
            PropertyEdit::Remove { name } => name.clone(),
        }
    }
}

/// An iCalendar object kept as the server sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcsDocument {
    lines: Vec<ContentLine>,
    newline: &'static str,
    trailing_newline: bool,
}

impl IcsDocument {
    pub fn parse(raw: &str) -> Self {
        let newline = if raw.contains("\r\n") { "\r\n" } else { "\n" };
        let trailing_newline = raw.ends_with('\n');
        let body = raw.strip_suffix('\n').unwrap_or(raw);

        let mut lines: Vec<ContentLine> = Vec::new();
        if body.is_empty() && !trailing_newline {
            return IcsDocument {
                lines,
                newline,
                trailing_newline,
            };
        }

        for physical in body.split('\n') {
            let physical = physical.strip_suffix('\r').unwrap_or(physical);
            let continuation = physical.starts_with(' ') || physical.starts_with('\t');
            match lines.last_mut() {
                Some(last) if continuation => {
                    last.logical.push_str(&physical[1..]);
                    last.physical.push(physical.to_string());
                }
                _ => lines.push(ContentLine {
                    physical: vec![physical.to_string()],
                    logical: physical.to_string(),
                }),
            }
        }

        IcsDocument {
            lines,
            newline,
            trailing_newline,
        }
    }

    pub fn lines(&self) -> &[ContentLine] {
        &self.lines
    }

    /// Index ranges of every VEVENT, `BEGIN` through `END` inclusive.
    pub fn vevent_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut stack: Vec<(String, usize)> = Vec::new();
        for (i, line) in self.lines.iter().enumerate() {
            if line.is_begin() {
                stack.push((line.component(), i));
            } else if line.is_end() {
                let name = line.component();
                if let Some(pos) = stack.iter().rposition(|(open, _)| *open == name) {
                    let (open, start) = stack.remove(pos);
                    stack.truncate(pos);
                    if open == "VEVENT" {
                        ranges.push(start..i + 1);
                    }
                }
            }
        }
        ranges.sort_by_key(|r| r.start);
        ranges
    }

    /// Indices of the properties that belong to the VEVENT at `range`
    /// itself, skipping nested components such as VALARM.
    pub fn direct_properties(&self, range: &Range<usize>) -> Vec<usize> {
        let mut indices = Vec::new();
        let mut depth = 0usize;
        for i in (range.start + 1)..range.end.saturating_sub(1) {
            let line = &self.lines[i];
            if line.is_begin() {
                depth += 1;
            } else if line.is_end() {
                depth = depth.saturating_sub(1);
            } else if depth == 0 {
                indices.push(i);
            }
        }
        indices
    }

    /// First direct property `name` of the VEVENT at `range`.
    pub fn property(&self, range: &Range<usize>, name: &str) -> Option<&ContentLine> {
        let name = name.to_ascii_uppercase();
        self.direct_properties(range)
            .into_iter()
            .map(|i| &self.lines[i])
            .find(|line| line.name() == name)
    }

    /// The VEVENT a patch for `uid` applies to: the series master (no
    /// RECURRENCE-ID) with that UID, else any VEVENT with that UID. Without
    /// a UID, the first master, else the first VEVENT.
    pub fn primary_event(&self, uid: Option<&str>) -> Option<Range<usize>> {
        let ranges = self.vevent_ranges();
        let is_master = |r: &Range<usize>| self.property(r, "RECURRENCE-ID").is_none();
        let has_uid = |r: &Range<usize>| match uid {
            Some(uid) => self
                .property(r, "UID")
                .is_some_and(|line| line.value().trim() == uid),
            None => true,
        };

        ranges
            .iter()
            .find(|r| has_uid(*r) && is_master(*r))
            .or_else(|| ranges.iter().find(|r| has_uid(*r)))
            .cloned()
    }

    /// A copy holding only the VEVENT at `range` plus everything outside any
    /// VEVENT (the VCALENDAR envelope, VTIMEZONE definitions).
    pub fn isolate(&self, range: &Range<usize>) -> IcsDocument {
        let others: Vec<Range<usize>> = self
            .vevent_ranges()
            .into_iter()
            .filter(|r| r != range)
            .collect();
        let lines = self
            .lines
            .iter()
            .enumerate()
            .filter(|(i, _)| !others.iter().any(|r| r.contains(i)))
            .map(|(_, line)| line.clone())
            .collect();
        IcsDocument {
            lines,
            newline: self.newline,
            trailing_newline: self.trailing_newline,
        }
    }

    /// Apply `edits` to the direct properties of the VEVENT at `range`.
    /// Every other line is left untouched.
    pub fn rewrite_event(&mut self, range: &Range<usize>, edits: &[PropertyEdit]) -> CalMcpResult<()> {
        let direct = self.direct_properties(range);
        let anchor = direct.last().copied().unwrap_or(range.start);

        let mut replaced: Vec<(usize, Option<ContentLine>)> = Vec::new();
        let mut appended: Vec<ContentLine> = Vec::new();

        for edit in edits {
            let name = edit.name();
            let new_line = match edit {
                PropertyEdit::Set(property) => Some(ContentLine::rendered(property)?),
                PropertyEdit::Remove { .. } => None,
            };
            let matches: Vec<usize> = direct
                .iter()
                .copied()
                .filter(|&i| self.lines[i].name() == name)
                .collect();

            match (matches.split_first(), new_line) {
                (Some((&first, rest)), new_line) => {
                    replaced.push((first, new_line));
                    replaced.extend(rest.iter().map(|&i| (i, None)));
                }
                (None, Some(line)) => appended.push(line),
                (None, None) => {}
            }
        }

        let mut lines = Vec::with_capacity(self.lines.len() + appended.len());
        for (i, line) in self.lines.drain(..).enumerate() {
            match replaced.iter().rev().find(|(idx, _)| *idx == i) {
                Some((_, Some(new_line))) => lines.push(new_line.clone()),
                Some((_, None)) => {}
                None => lines.push(line),
            }
            if i == anchor {
                lines.append(&mut appended);
            }
        }
        self.lines = lines;
        Ok(())
    }
}

impl std::fmt::Display for IcsDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for line in &self.lines {
            for physical in &line.physical {
                if !first {
                    f.write_str(self.newline)?;
                }
                f.write_str(physical)?;
                first = false;
            }
        }
        if self.trailing_newline {
            f.write_str(self.newline)?;
        }
        Ok(())
    }
}
