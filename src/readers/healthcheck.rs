use crate::server::ServerResources;
use anyhow::{Context, Result};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Liveness and metrics endpoint
pub struct HealthcheckServer {
    resources: ServerResources,
}

impl HealthcheckServer {
    pub fn new(resources: ServerResources) -> Self {
        Self { resources }
    }

    pub async fn start(&self) -> Result<()> {
        let server_config = &self.resources.config.healthcheck;
        if !server_config.enabled {
            info!("Healthcheck server is disabled");
            return Ok(());
        }

        let bind_addr = format!("{}:{}", server_config.bind_address, server_config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("Failed to bind healthcheck server to {}", bind_addr))?;

        info!(
            "Healthcheck server listening on {} at path {}",
            bind_addr, server_config.path
        );

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let resources = self.resources.clone();
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let service = service_fn(move |req| {
                            let resources = resources.clone();
                            async move { Ok::<_, Infallible>(handle_healthcheck(&req, &resources)) }
                        });

                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            error!("Healthcheck connection error from {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Healthcheck accept error: {}", e);
                }
            }
        }
    }
}

fn json_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// Answer `/metrics` and the configured health path
pub fn handle_healthcheck<B>(
    req: &Request<B>,
    resources: &ServerResources,
) -> Response<Full<Bytes>> {
    if req.method() != Method::GET {
        return json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            serde_json::json!({ "error": "method not allowed" }).to_string(),
        );
    }

    let path = req.uri().path();

    if path == "/metrics" || path == "/stats" {
        let snapshot = resources.metrics.snapshot();
        return match serde_json::to_string(&snapshot) {
            Ok(body) => json_response(StatusCode::OK, body),
            Err(e) => {
                error!("Failed to serialize metrics: {}", e);
                json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "metrics unavailable" }).to_string(),
                )
            }
        };
    }

    if path != resources.config.healthcheck.path {
        return json_response(
            StatusCode::NOT_FOUND,
            serde_json::json!({ "error": "not found" }).to_string(),
        );
    }

    let rewriter = resources.rewriter.current();
    let response = serde_json::json!({
        "status": "healthy",
        "service": "reverse-rewrite",
        "rules": rewriter.registry().len(),
        "reverse_only": rewriter.reverse_only(),
    });
    json_response(StatusCode::OK, response.to_string())
}
