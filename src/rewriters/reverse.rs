use crate::config::ReverseConfig;
use crate::conn::{Connection, MatchSource, find_tracking_cookie};
use crate::headers::HeaderLookup;
use crate::matcher::{match_by_host, match_by_path};
use crate::registry::Registry;
use crate::rewrite::{RewriteOutcome, UrlRewriter};
use crate::rule::Rule;
use hyper::StatusCode;
use tracing::{debug, error, info};

/// Rewrites origin-form request targets into backend urls
#[derive(Debug, Clone)]
pub struct ReverseRewriter {
    registry: Registry,
    reverse_only: bool,
    reverse_magic: bool,
}

impl ReverseRewriter {
    pub fn new(registry: Registry, reverse_only: bool, reverse_magic: bool) -> Self {
        Self {
            registry,
            reverse_only,
            reverse_magic,
        }
    }

    pub fn from_config(config: &ReverseConfig) -> Self {
        Self::new(
            Registry::from_config(&config.rules),
            config.reverse_only,
            config.reverse_magic,
        )
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn reverse_only(&self) -> bool {
        self.reverse_only
    }

    pub fn reverse_magic(&self) -> bool {
        self.reverse_magic
    }

    /// Host rule first, then path rule
    fn match_request<'a>(
        &'a self,
        headers: &dyn HeaderLookup,
        url: &str,
    ) -> Option<(&'a Rule, MatchSource)> {
        headers
            .header("host")
            .and_then(|host| match_by_host(host, &self.registry))
            .map(|rule| (rule, MatchSource::Host))
            .or_else(|| match_by_path(url, &self.registry).map(|rule| (rule, MatchSource::Path)))
    }

    /// Rule selected by the tracking cookie, if any
    fn match_cookie<'a>(&'a self, headers: &dyn HeaderLookup) -> Option<&'a Rule> {
        if !self.reverse_magic {
            return None;
        }
        let value = find_tracking_cookie(headers.header("cookie")?)?;
        let rule = match_by_path(value, &self.registry)?;
        info!("Magical tracking cookie says: {}", value);
        Some(rule)
    }
}

impl UrlRewriter for ReverseRewriter {
    fn rewrite(
        &self,
        conn: &mut Connection,
        headers: &dyn HeaderLookup,
        url: &str,
    ) -> RewriteOutcome {
        let mut matched = None;

        // Reverse requests always start with a slash
        if url.starts_with('/') {
            matched = self.match_request(headers, url).map(|(rule, source)| {
                let suffix = match rule.path() {
                    Some(path) if !path.is_empty() => &url[path.len()..],
                    _ => &url[1..],
                };
                (rule, source, join_url(rule.target(), suffix))
            });

            if matched.is_none() {
                // The cookie only selects the backend, the rule path is not stripped
                matched = self
                    .match_cookie(headers)
                    .map(|rule| (rule, MatchSource::Cookie, join_url(rule.target(), &url[1..])));
            }
        }

        let Some((rule, source, rewritten)) = matched else {
            // Absolute-form targets land here too and are refused in reverse-only mode
            if self.reverse_only {
                error!(
                    "Bad request from {}: no reverse proxy rule matches {}",
                    conn.peer(),
                    url
                );
                conn.indicate_http_error(
                    StatusCode::BAD_REQUEST,
                    "Bad Request",
                    &[("detail", "Request has an invalid URL"), ("url", url)],
                );
                return RewriteOutcome::HardFailure;
            }
            debug!("No reverse proxy rule for {}, passing through", url);
            return RewriteOutcome::Unchanged;
        };

        info!("Rewriting URL: {} -> {}", url, rewritten);

        conn.match_source = Some(source);
        if self.reverse_magic {
            conn.reverse_path = rule.path().map(str::to_string);
            conn.reverse_host = rule.host().map(str::to_string);
        }

        RewriteOutcome::Rewritten(rewritten)
    }
}

fn join_url(target: &str, suffix: &str) -> String {
    let mut url = String::with_capacity(target.len() + suffix.len());
    url.push_str(target);
    url.push_str(suffix);
    url
}
