use crate::conn::Connection;
use crate::error::UpstreamError;
use crate::html_error::HttpError;
use crate::metrics::Timer;
use crate::rewrite::{RewriteOutcome, UrlRewriter};
use crate::server::ServerResources;
use crate::upstream::{forward_http_request, parse_upstream_uri};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Request, Response, StatusCode, Uri};
use std::convert::Infallible;
use std::error::Error as StdError;
use std::net::SocketAddr;
use tracing::{debug, warn};

/// Where a request goes after the rewrite step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Absolute url to fetch the response from
    Forward(String),
    /// Error page to send back, closing the connection
    Reject(HttpError),
}

/// Request target as it appeared on the request line
pub fn request_target(uri: &Uri) -> String {
    if uri.scheme().is_some() {
        uri.to_string()
    } else {
        uri.path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
            .to_string()
    }
}

/// Decide where a request goes, recording the matched rule on the connection
pub fn route_request(
    rewriter: &dyn UrlRewriter,
    conn: &mut Connection,
    uri: &Uri,
    headers: &HeaderMap,
) -> Route {
    let target = request_target(uri);

    match rewriter.rewrite(conn, headers, &target) {
        RewriteOutcome::Rewritten(url) => Route::Forward(url),
        RewriteOutcome::HardFailure => Route::Reject(conn.take_error().unwrap_or_else(|| {
            HttpError::new(
                StatusCode::BAD_REQUEST,
                "Bad Request",
                &[("detail", "Request has an invalid URL"), ("url", target.as_str())],
            )
        })),
        RewriteOutcome::Unchanged if uri.scheme().is_some() => Route::Forward(target),
        RewriteOutcome::Unchanged => Route::Reject(HttpError::new(
            StatusCode::BAD_REQUEST,
            "Bad Request",
            &[("detail", "Unknown URL type"), ("url", target.as_str())],
        )),
    }
}

/// Render an error page; the client connection is closed afterwards
pub fn error_response(err: &HttpError) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(err.render())));
    *response.status_mut() = err.status;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

fn upstream_error_page(err: &UpstreamError, url: &str) -> HttpError {
    match err {
        UpstreamError::Timeout { .. } => HttpError::new(
            StatusCode::GATEWAY_TIMEOUT,
            "Gateway Timeout",
            &[("detail", "The backend did not answer in time"), ("url", url)],
        ),
        UpstreamError::ResponseTooLarge { .. } => HttpError::new(
            StatusCode::BAD_GATEWAY,
            "Bad Gateway",
            &[("detail", "The backend response is too large"), ("url", url)],
        ),
        UpstreamError::InvalidAddress { .. } => HttpError::new(
            StatusCode::BAD_GATEWAY,
            "Bad Gateway",
            &[("detail", "The backend url is not valid"), ("url", url)],
        ),
        _ => HttpError::new(
            StatusCode::BAD_GATEWAY,
            "Bad Gateway",
            &[("detail", "Unable to connect to the backend"), ("url", url)],
        ),
    }
}

/// Handle one gateway request: rewrite, forward and set the tracking cookie
pub async fn handle_http_request<B>(
    req: Request<B>,
    resources: &ServerResources,
    client_addr: Option<SocketAddr>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let timer = Timer::start();
    let metrics = &resources.metrics;

    // Held until the response is done, keeping this registry alive across reloads
    let rewriter = resources.rewriter.current();
    let mut conn = Connection::new(client_addr);

    let route = route_request(&*rewriter, &mut conn, req.uri(), req.headers());
    let response = match route {
        Route::Reject(err) => {
            debug!(
                "Rejecting {} {} from {}: {}",
                req.method(),
                req.uri(),
                conn.peer(),
                err.reason
            );
            metrics.record_rejected();
            error_response(&err)
        }
        Route::Forward(url) => {
            match conn.match_source {
                Some(source) => metrics.record_rewrite(source),
                None => metrics.record_passthrough(),
            }
            let mut response = forward(req, &url, &conn, resources).await;
            // Only filled in when the tracking cookie is enabled
            if let Some(cookie) = conn.tracking_cookie() {
                match HeaderValue::from_str(&cookie) {
                    Ok(value) => {
                        response.headers_mut().append(header::SET_COOKIE, value);
                    }
                    Err(_) => warn!("Not setting unrepresentable tracking cookie: {}", cookie),
                }
            }
            response
        }
    };

    metrics.record_request(timer.elapsed());
    Ok(response)
}

async fn forward<B>(
    req: Request<B>,
    url: &str,
    conn: &Connection,
    resources: &ServerResources,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let upstream_uri = match parse_upstream_uri(url) {
        Ok(uri) => uri,
        Err(e) => {
            resources.metrics.record_upstream_error();
            return error_response(&upstream_error_page(&e, url));
        }
    };

    let limits = &resources.config.upstream;
    let (parts, body) = req.into_parts();
    let body = match Limited::new(body, limits.max_request_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            warn!(
                "Request body from {} for {} exceeds {} bytes",
                conn.peer(),
                url,
                limits.max_request_body_bytes
            );
            return error_response(&HttpError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Payload Too Large",
                &[("detail", "The request body is too large"), ("url", url)],
            ));
        }
        Err(e) => {
            warn!("Failed to read request body for {}: {}", url, e);
            return error_response(&HttpError::new(
                StatusCode::BAD_REQUEST,
                "Bad Request",
                &[("detail", "Unable to read the request body"), ("url", url)],
            ));
        }
    };

    // Destinations picked by clients share one client, rule backends get their own
    let client = match conn.match_source {
        Some(_) => {
            let authority = upstream_uri
                .authority()
                .map(|a| a.as_str())
                .unwrap_or_default();
            resources.pool.get_client(authority)
        }
        None => resources.pool.shared_client(),
    };

    let result = forward_http_request(
        &client,
        &upstream_uri,
        parts.method,
        &parts.headers,
        body,
        limits.timeout(),
        limits.max_response_body_bytes,
    )
    .await;

    match result {
        Ok((response, bytes)) => {
            debug!("Forwarded {} -> {} bytes", url, bytes);
            response
        }
        Err(e) => {
            resources.metrics.record_upstream_error();
            error_response(&upstream_error_page(&e, url))
        }
    }
}
