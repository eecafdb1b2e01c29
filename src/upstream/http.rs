use crate::error::UpstreamError;
use crate::upstream::pool::HttpClient;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Method, Request, Response, Uri};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Headers that only apply to a single connection and are not forwarded
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Parse the url a request is sent to, which has to be absolute
pub fn parse_upstream_uri(upstream_url: &str) -> Result<Uri, UpstreamError> {
    let invalid = || UpstreamError::InvalidAddress {
        address: upstream_url.to_string(),
    };
    let uri: Uri = upstream_url.parse().map_err(|_| invalid())?;
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(invalid());
    }
    Ok(uri)
}

/// Copy end-to-end headers, skipping hop-by-hop headers and `Host`
pub fn copy_forwarded_headers(source: &HeaderMap, target: &mut HeaderMap) {
    for (key, value) in source {
        let name = key.as_str();
        if name == "host" || HOP_BY_HOP_HEADERS.contains(&name) {
            continue;
        }
        target.append(key, value.clone());
    }
}

/// Forward HTTP request to the backend with timeout control
/// Returns the response and the body size in bytes; bodies larger than
/// `max_response_bytes` are refused
pub async fn forward_http_request(
    client: &HttpClient,
    upstream_uri: &Uri,
    method: Method,
    headers: &HeaderMap,
    body: Bytes,
    timeout: Duration,
    max_response_bytes: usize,
) -> Result<(Response<Full<Bytes>>, u64), UpstreamError> {
    let upstream = upstream_uri.to_string();
    let authority = upstream_uri
        .authority()
        .ok_or_else(|| UpstreamError::InvalidAddress {
            address: upstream.clone(),
        })?;

    let mut req = Request::builder()
        .method(method.clone())
        .uri(upstream_uri.clone())
        .body(Full::new(body))
        .map_err(|e| UpstreamError::RequestFailed {
            upstream: upstream.clone(),
            reason: e.to_string(),
        })?;

    copy_forwarded_headers(headers, req.headers_mut());
    let host = HeaderValue::from_str(authority.as_str()).map_err(|_| {
        UpstreamError::InvalidAddress {
            address: upstream.clone(),
        }
    })?;
    req.headers_mut().insert(header::HOST, host);

    debug!(
        "Sending {} request to upstream: {} (Host: {})",
        method, upstream, authority
    );

    match tokio::time::timeout(timeout, client.request(req)).await {
        Ok(Ok(resp)) => {
            let status = resp.status();
            let (mut parts, body) = resp.into_parts();

            let body_bytes = match Limited::new(body, max_response_bytes).collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) if e.is::<LengthLimitError>() => {
                    warn!(
                        "Upstream response too large: {} (limit: {} bytes)",
                        upstream, max_response_bytes
                    );
                    return Err(UpstreamError::ResponseTooLarge {
                        upstream,
                        limit: max_response_bytes,
                    });
                }
                Err(e) => {
                    return Err(UpstreamError::RequestFailed {
                        upstream,
                        reason: format!("failed to read response body: {}", e),
                    });
                }
            };

            let body_size = body_bytes.len() as u64;
            debug!(
                "Received response from upstream: {} {} ({} bytes)",
                status, upstream, body_size
            );

            if status.is_server_error() {
                warn!("Upstream returned error status: {} {}", status, upstream);
            }

            // The body has been collected, the original framing no longer applies
            for name in HOP_BY_HOP_HEADERS {
                parts.headers.remove(*name);
            }

            Ok((Response::from_parts(parts, Full::new(body_bytes)), body_size))
        }
        Ok(Err(e)) => {
            error!(
                "HTTP upstream request failed: {} {} -> {}",
                method, upstream, e
            );
            Err(UpstreamError::ConnectionFailed {
                upstream,
                reason: e.to_string(),
            })
        }
        Err(_) => {
            error!(
                "HTTP upstream request timeout: {} {} (timeout: {:?})",
                method, upstream, timeout
            );
            Err(UpstreamError::Timeout { upstream, timeout })
        }
    }
}
