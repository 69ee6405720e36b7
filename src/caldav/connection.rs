//! Building libdav clients and turning their failures into [`CalMcpError`]s.

use std::fmt::Display;

use anyhow::{Context, Result};
use caldav_mcp_core::{CalMcpError, CalMcpResult};
use http::{StatusCode, Uri};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use libdav::CalDavClient;
use libdav::dav::{FindCurrentUserPrincipalError, WebDavClient, WebDavError};
use secrecy::{ExposeSecret, Secret};
use tower::ServiceBuilder;
use tower_http::auth::AddAuthorization;
use tower_http::follow_redirect::{FollowRedirect, FollowRedirectLayer};

/// Authenticated HTTPS stack; follows the per-account host redirects iCloud
/// answers with.
type HttpStack = FollowRedirect<AddAuthorization<Client<HttpsConnector<HttpConnector>, String>>>;

pub type DavClient = CalDavClient<HttpStack>;

/// Hands out CalDAV clients rooted at arbitrary URLs, all sharing one
/// authenticated connection pool.
pub struct Connector {
    http: HttpStack,
}

impl Connector {
    pub fn new(username: &str, password: &Secret<String>) -> Result<Self> {
        let https = HttpsConnectorBuilder::new()
            .with_native_roots()
            .context("Failed to load native TLS roots")?
            .https_or_http()
            .enable_http1()
            .build();
        let pool = Client::builder(TokioExecutor::new()).build(https);

        let http = ServiceBuilder::new()
            .layer(FollowRedirectLayer::new())
            .service(AddAuthorization::basic(pool, username, password.expose_secret()));
        Ok(Self { http })
    }

    /// A client whose relative hrefs resolve against `url`.
    pub fn connect(&self, url: &str) -> CalMcpResult<DavClient> {
        let base: Uri = url
            .parse()
            .map_err(|e| CalMcpError::Config(format!("Invalid CalDAV URL {url}: {e}")))?;
        Ok(CalDavClient::new(WebDavClient::new(base, self.http.clone())))
    }
}

/// Server path of `url`; anything that does not parse as a URI is taken to
/// be a path already.
pub fn path_of(url: &str) -> String {
    match url.parse::<Uri>() {
        Ok(uri) if uri.authority().is_some() => uri.path().to_string(),
        _ => url.to_string(),
    }
}

/// Path of the resource a new event with `uid` is stored under.
pub fn resource_path(calendar_url: &str, uid: &str) -> String {
    let collection = path_of(calendar_url);
    format!("{}/{uid}.ics", collection.trim_end_matches('/'))
}

/// Resolve `href` against the scheme and host of `base`.
///
/// Hrefs that already carry a host are returned unchanged.
pub fn absolute_url(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let Ok(base) = base.parse::<Uri>() else {
        return href.to_string();
    };
    match base.authority() {
        Some(authority) => format!(
            "{}://{}{}",
            base.scheme_str().unwrap_or("https"),
            authority.as_str(),
            href
        ),
        None => href.to_string(),
    }
}

/// Map a failed libdav request onto the error taxonomy.
///
/// 401/403 become [`CalMcpError::Authentication`]. Responses that arrived
/// but could not be understood become [`CalMcpError::Protocol`]. Anything
/// else, including other status codes, is a [`CalMcpError::Transport`]
/// failure.
pub fn classify<E>(context: &str, err: WebDavError<E>) -> CalMcpError
where
    WebDavError<E>: Display,
{
    let message = format!("{context}: {err}");
    match err {
        WebDavError::BadStatusCode(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
            CalMcpError::Authentication(message)
        }
        WebDavError::MissingData(_)
        | WebDavError::InvalidStatusCode(_)
        | WebDavError::Xml(_)
        | WebDavError::InvalidEtag(_)
        | WebDavError::InvalidResponse(_)
        | WebDavError::NotUtf8(_) => CalMcpError::Protocol(message),
        WebDavError::Request(_)
        | WebDavError::BadStatusCode(_)
        | WebDavError::InvalidInput(_)
        | WebDavError::PreconditionFailed(_) => CalMcpError::Transport(message),
    }
}

/// [`classify`] for principal discovery, whose error wraps the request's.
pub fn classify_principal<E>(context: &str, err: FindCurrentUserPrincipalError<E>) -> CalMcpError
where
    WebDavError<E>: Display,
{
    match err {
        FindCurrentUserPrincipalError::RequestError(inner) => classify(context, inner),
        FindCurrentUserPrincipalError::InvalidInput(e) => {
            CalMcpError::Config(format!("{context}: {e}"))
        }
    }
}
