//! Shared helpers for the gateway integration tests.

use reverse_rewrite::config::AppConfig;
use reverse_rewrite::metrics::Metrics;
use reverse_rewrite::readers::GatewayServer;
use reverse_rewrite::rewrite::create_rewriter;
use reverse_rewrite::server::ServerResources;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Start a backend that answers every request with its own request head
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let end = head.windows(4).position(|w| w == b"\r\n\r\n").unwrap_or(head.len());
                let body = String::from_utf8_lossy(&head[..end]).to_string();

                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Serve the gateway on an ephemeral port
#[allow(dead_code)]
pub async fn start_gateway(config: AppConfig) -> (SocketAddr, ServerResources) {
    let rewriter = create_rewriter(&config.reverse);
    let resources = ServerResources::new(Arc::new(config), rewriter, Arc::new(Metrics::new()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = GatewayServer::new(resources.clone());
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });

    (addr, resources)
}

/// HTTP client that never picks up proxy settings from the environment
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
