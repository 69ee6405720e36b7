//! The calendar-query REPORT, which libdav does not provide.

use caldav_mcp_core::TimeWindow;
use http::Method;
use libdav::requests::{DavRequest, ParseResponseError, PreparedRequest};
use roxmltree::Node;

/// `calendar-query` REPORT asking for the etag and data of every object
/// with a VEVENT intersecting a window. Depth 1, so only direct members of
/// the collection are searched.
pub struct EventsInWindow<'a> {
    collection: &'a str,
    start: String,
    end: String,
}

impl<'a> EventsInWindow<'a> {
    pub fn new(collection: &'a str, window: &TimeWindow) -> Self {
        let (start, end) = window.caldav_bounds();
        Self {
            collection,
            start,
            end,
        }
    }

    fn body(&self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="utf-8"?>"#,
                r#"<C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">"#,
                r#"<D:prop><D:getetag/><C:calendar-data/></D:prop>"#,
                r#"<C:filter><C:comp-filter name="VCALENDAR"><C:comp-filter name="VEVENT">"#,
                r#"<C:time-range start="{}" end="{}"/>"#,
                r#"</C:comp-filter></C:comp-filter></C:filter>"#,
                r#"</C:calendar-query>"#,
            ),
            self.start, self.end
        )
    }
}

/// A calendar object returned by [`EventsInWindow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueriedObject {
    pub href: String,
    pub etag: Option<String>,
    pub data: String,
}

impl DavRequest for EventsInWindow<'_> {
    type Response = Vec<QueriedObject>;
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self) -> Result<PreparedRequest, http::Error> {
        Ok(PreparedRequest {
            method: Method::from_bytes(b"REPORT")?,
            path: self.collection.to_string(),
            body: self.body(),
            headers: vec![
                ("Depth".to_string(), "1".to_string()),
                (
                    "Content-Type".to_string(),
                    "application/xml; charset=utf-8".to_string(),
                ),
            ],
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> Result<Self::Response, ParseResponseError> {
        if !parts.status.is_success() {
            return Err(ParseResponseError::BadStatusCode(parts.status));
        }
        parse_multistatus(std::str::from_utf8(body)?)
    }
}

/// Objects of a multistatus body, in document order.
///
/// Only `propstat` blocks with a 2xx status (or none) are read; members the
/// server reports as gone or forbidden have no calendar data and are skipped.
fn parse_multistatus(xml: &str) -> Result<Vec<QueriedObject>, ParseResponseError> {
    let doc = roxmltree::Document::parse(xml)?;

    let objects = doc
        .root_element()
        .children()
        .filter(|n| is_dav(n, "response"))
        .filter_map(|response| {
            let href = child_text(response, "href")?.trim().to_string();
            let mut etag = None;
            let mut data = None;
            for prop in response
                .children()
                .filter(|n| is_dav(n, "propstat") && propstat_ok(*n))
                .flat_map(|propstat| propstat.children().filter(|n| is_dav(n, "prop")))
            {
                etag = etag.or_else(|| child_text(prop, "getetag").map(str::to_string));
                data = data.or_else(|| child_text(prop, "calendar-data").map(str::to_string));
            }
            Some(QueriedObject {
                href,
                etag,
                data: data?,
            })
        })
        .collect();
    Ok(objects)
}

fn is_dav(node: &Node, local: &str) -> bool {
    node.is_element() && node.tag_name().name() == local
}

fn child_text<'a>(node: Node<'a, 'a>, local: &str) -> Option<&'a str> {
    node.children().find(|n| is_dav(n, local)).and_then(|n| n.text())
}

/// `HTTP/1.1 200 OK` and friends. A propstat without a status is trusted.
fn propstat_ok(propstat: Node) -> bool {
    match child_text(propstat, "status") {
        Some(status) => status.split_whitespace().nth(1).is_some_and(|code| code.starts_with('2')),
        None => true,
    }
}
