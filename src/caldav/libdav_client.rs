//! [`CalendarClient`] backed by libdav over hyper + tower.

use anyhow::Result;
use async_trait::async_trait;
use caldav_mcp_core::{CalMcpError, CalMcpResult, CalendarInfo, TimeWindow};
use http::{StatusCode, Uri};
use libdav::caldav::{FindCalendarHomeSet, FindCalendars};
use libdav::dav::{Delete, GetEtag, GetProperty, PutResource, WebDavError, mime_types};
use secrecy::Secret;
use tracing::debug;

use super::connection::{
    Connector, DavClient, absolute_url, classify, classify_principal, path_of, resource_path,
};
use super::requests::EventsInWindow;
use super::{CalendarClient, CalendarResource};

/// Talks to a CalDAV server with account credentials.
///
/// Every call gets a libdav client rooted at the URL it is about; the
/// connection pool underneath is shared.
pub struct LibDavCalendarClient {
    base_url: String,
    connector: Connector,
}

impl LibDavCalendarClient {
    pub fn new(base_url: impl Into<String>, username: &str, password: &Secret<String>) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            connector: Connector::new(username, password)?,
        })
    }

    fn connect(&self, url: &str) -> CalMcpResult<DavClient> {
        self.connector.connect(url)
    }

    /// Absolute calendar-home URLs for the current user.
    ///
    /// Falls back to the base URL when the server does not advertise a
    /// principal or home set.
    async fn find_calendar_homes(&self) -> CalMcpResult<Vec<String>> {
        let caldav = self.connect(&self.base_url)?;

        let principal = caldav
            .find_current_user_principal()
            .await
            .map_err(|e| classify_principal("Failed to find current user principal", e))?;

        let homes: Vec<Uri> = match principal {
            Some(principal) => {
                let response = caldav
                    .request(FindCalendarHomeSet::new(&principal))
                    .await
                    .map_err(|e| classify("Failed to find calendar home set", e))?;
                response.home_sets
            }
            None => Vec::new(),
        };

        if homes.is_empty() {
            return Ok(vec![self.base_url.clone()]);
        }
        Ok(homes
            .iter()
            .map(|home| absolute_url(&self.base_url, &home.to_string()))
            .collect())
    }
}

#[async_trait]
impl CalendarClient for LibDavCalendarClient {
    async fn list_calendars(&self) -> CalMcpResult<Vec<CalendarInfo>> {
        let mut calendars = Vec::new();

        for home_url in self.find_calendar_homes().await? {
            let caldav = self.connect(&home_url)?;
            let home: Uri = home_url
                .parse()
                .map_err(|e| CalMcpError::Protocol(format!("Invalid calendar home URL {home_url}: {e}")))?;

            let found = caldav
                .request(FindCalendars::new(&home))
                .await
                .map_err(|e| classify("Failed to find calendars", e))?;

            for cal in found.calendars {
                let name = caldav
                    .request(GetProperty::new(&cal.href, &libdav::names::DISPLAY_NAME))
                    .await
                    .ok()
                    .and_then(|r| r.value)
                    .filter(|name| !name.trim().is_empty());

                calendars.push(CalendarInfo::new(absolute_url(&home_url, &cal.href), name));
            }
        }

        debug!(count = calendars.len(), "Discovered calendars");
        Ok(calendars)
    }

    async fn query_resources(
        &self,
        calendar_url: &str,
        window: &TimeWindow,
    ) -> CalMcpResult<Vec<CalendarResource>> {
        let caldav = self.connect(calendar_url)?;
        let collection = path_of(calendar_url);

        let objects = caldav
            .request(EventsInWindow::new(&collection, window))
            .await
            .map_err(|e| classify("Failed to query calendar", e))?;

        debug!(
            calendar = calendar_url,
            start = %window.start,
            end = %window.end,
            count = objects.len(),
            "Queried calendar resources"
        );

        Ok(objects
            .into_iter()
            .map(|r| CalendarResource {
                url: absolute_url(calendar_url, &r.href),
                etag: r.etag,
                data: r.data,
            })
            .collect())
    }

    async fn create_resource(&self, calendar_url: &str, uid: &str, ics: &str) -> CalMcpResult<()> {
        let caldav = self.connect(calendar_url)?;
        let href = resource_path(calendar_url, uid);

        // PUT with If-None-Match: * so an existing resource is never clobbered.
        caldav
            .request(PutResource::new(&href).create(ics, mime_types::CALENDAR))
            .await
            .map_err(|e| classify("Failed to create event", e))?;
        Ok(())
    }

    async fn replace_resource(&self, resource: &CalendarResource, ics: &str) -> CalMcpResult<()> {
        let caldav = self.connect(&resource.url)?;
        let href = path_of(&resource.url);

        let etag = match &resource.etag {
            Some(etag) => etag.clone(),
            None => {
                caldav
                    .request(GetEtag::new(&href))
                    .await
                    .map_err(|e| classify("Failed to get event etag", e))?
                    .etag
            }
        };

        caldav
            .request(PutResource::new(&href).update(ics, mime_types::CALENDAR, &etag))
            .await
            .map_err(|e| classify("Failed to update event", e))?;
        Ok(())
    }

    async fn delete_resource(&self, resource: &CalendarResource) -> CalMcpResult<()> {
        let caldav = self.connect(&resource.url)?;
        let href = path_of(&resource.url);

        // Conditional on the etag we listed it with, when the server gave one.
        let deleted = match &resource.etag {
            Some(etag) => caldav.request(Delete::new(&href).with_etag(etag.as_str())).await,
            None => caldav.request(Delete::new(&href).force()).await,
        };
        match deleted {
            Ok(_) => Ok(()),
            Err(WebDavError::BadStatusCode(StatusCode::NOT_FOUND)) => {
                debug!(resource = %resource.url, "Resource already gone");
                Ok(())
            }
            Err(e) => Err(classify("Failed to delete event", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::extract::{Request, State};
    use secrecy::Secret;

    use super::*;

    type Seen = Arc<Mutex<Vec<(String, String, Option<String>)>>>;

    async fn record(State(seen): State<Seen>, request: Request) -> StatusCode {
        let path = request.uri().path().to_string();
        let if_match = request
            .headers()
            .get("if-match")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        seen.lock()
            .unwrap()
            .push((request.method().to_string(), path.clone(), if_match));
        match path.as_str() {
            "/cal/gone.ics" => StatusCode::NOT_FOUND,
            "/cal/locked.ics" => StatusCode::PRECONDITION_FAILED,
            _ => StatusCode::NO_CONTENT,
        }
    }

    /// Local server answering every request through [`record`].
    async fn serve() -> (String, Seen) {
        let seen = Seen::default();
        let app = Router::new().fallback(record).with_state(seen.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}"), seen)
    }

    fn resource(base: &str, name: &str, etag: Option<&str>) -> CalendarResource {
        CalendarResource {
            url: format!("{base}/cal/{name}"),
            etag: etag.map(str::to_string),
            data: String::new(),
        }
    }

    #[tokio::test]
    async fn delete_is_conditional_on_known_etag() {
        let (base, seen) = serve().await;
        let client =
            LibDavCalendarClient::new(base.clone(), "user", &Secret::new("pw".into())).unwrap();

        client
            .delete_resource(&resource(&base, "a.ics", Some("\"e1\"")))
            .await
            .unwrap();
        client
            .delete_resource(&resource(&base, "b.ics", None))
            .await
            .unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                ("DELETE".into(), "/cal/a.ics".into(), Some("\"e1\"".into())),
                ("DELETE".into(), "/cal/b.ics".into(), None),
            ]
        );
    }

    #[tokio::test]
    async fn delete_of_missing_resource_succeeds() {
        let (base, _) = serve().await;
        let client =
            LibDavCalendarClient::new(base.clone(), "user", &Secret::new("pw".into())).unwrap();
        client
            .delete_resource(&resource(&base, "gone.ics", Some("\"e1\"")))
            .await
            .unwrap();

        let err = client
            .delete_resource(&resource(&base, "locked.ics", Some("\"stale\"")))
            .await
            .unwrap_err();
        assert!(matches!(err, CalMcpError::Transport(_)));
    }
}
