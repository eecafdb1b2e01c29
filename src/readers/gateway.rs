use crate::proxy::handle_http_request;
use crate::server::ServerResources;
use anyhow::{Context, Result};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Plain HTTP listener rewriting and forwarding client requests
pub struct GatewayServer {
    resources: ServerResources,
}

impl GatewayServer {
    pub fn new(resources: ServerResources) -> Self {
        Self { resources }
    }

    /// Bind the configured gateway address
    pub async fn bind(&self) -> Result<TcpListener> {
        let server_config = &self.resources.config.gateway;
        let bind_addr = format!("{}:{}", server_config.bind_address, server_config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("Failed to bind gateway server to {}", bind_addr))?;
        info!("Gateway server listening on TCP {}", bind_addr);
        Ok(listener)
    }

    pub async fn start(&self) -> Result<()> {
        if !self.resources.config.gateway.enabled {
            info!("Gateway server is disabled");
            return Ok(());
        }
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Accept connections until the listener fails permanently
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("New gateway connection from {}", addr);
                    let resources = self.resources.clone();
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let service = service_fn(move |req| {
                            let resources = resources.clone();
                            async move { handle_http_request(req, &resources, Some(addr)).await }
                        });

                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            error!("Gateway connection error from {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Gateway accept error: {}", e);
                    // Avoid a tight loop while the error persists
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                }
            }
        }
    }
}
