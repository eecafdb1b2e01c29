use crate::html_error::HttpError;
use hyper::StatusCode;
use std::net::SocketAddr;
use tracing::debug;

/// Name of the cookie pinning a client to the backend it was last sent to
pub const REVERSE_COOKIE: &str = "yummy_magical_cookie";

/// Which lookup selected the backend for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Host,
    Path,
    Cookie,
}

/// Per-request state carried from the rewrite step to the response phase
#[derive(Debug, Default, Clone)]
pub struct Connection {
    pub client_addr: Option<SocketAddr>,
    /// Path of the matched rule, kept for the tracking cookie
    pub reverse_path: Option<String>,
    /// Host of the matched rule, kept for the tracking cookie
    pub reverse_host: Option<String>,
    pub match_source: Option<MatchSource>,
    error: Option<HttpError>,
}

impl Connection {
    pub fn new(client_addr: Option<SocketAddr>) -> Self {
        Self {
            client_addr,
            ..Self::default()
        }
    }

    /// Report an HTTP error; the connection is closed after the error page
    ///
    /// Only the first error reported on a connection is kept.
    pub fn indicate_http_error(
        &mut self,
        status: StatusCode,
        reason: &str,
        details: &[(&str, &str)],
    ) {
        if self.error.is_some() {
            debug!("Ignoring additional error {} on connection", status);
            return;
        }
        self.error = Some(HttpError::new(status, reason, details));
    }

    /// Client address for log lines
    pub fn peer(&self) -> String {
        self.client_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown client".to_string())
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&HttpError> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<HttpError> {
        self.error.take()
    }

    /// `Set-Cookie` value pinning the client to the matched rule
    pub fn tracking_cookie(&self) -> Option<String> {
        self.reverse_path
            .as_deref()
            .or(self.reverse_host.as_deref())
            .map(|value| format!("{}={}; path=/", REVERSE_COOKIE, value))
    }
}

/// Value of the tracking cookie in a `Cookie` header, if present
///
/// The cookie name is searched anywhere in the header; the value ends at the
/// next `;`.
pub fn find_tracking_cookie(cookie_header: &str) -> Option<&str> {
    let token = format!("{}=", REVERSE_COOKIE);
    let start = cookie_header.find(&token)?;
    let value = &cookie_header[start + token.len()..];
    let end = value.find(';').unwrap_or(value.len());
    Some(value[..end].trim())
}
