use crate::config::UpstreamConfig;
use dashmap::DashMap;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client type with HTTPS support
pub type HttpClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Keeps one HTTP client per rule backend so connections to the same
/// backend are reused.
///
/// Only authorities named by reverse proxy rules get their own client, so the
/// map is bounded by the configured rules. Forward proxy traffic, whose
/// destinations are chosen by clients, shares a single client.
pub struct ConnectionPool {
    clients: Arc<DashMap<String, Arc<HttpClient>>>,
    shared: OnceLock<Arc<HttpClient>>,
    keepalive_timeout: Duration,
    connection_timeout: Duration,
    max_idle_connections: usize,
}

impl ConnectionPool {
    /// Create a new connection pool with default settings
    pub fn new() -> Self {
        Self::from_config(&UpstreamConfig::default())
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::with_config(
            config.keepalive(),
            config.connect_timeout(),
            config.max_idle_connections,
        )
    }

    pub fn with_config(
        keepalive_timeout: Duration,
        connection_timeout: Duration,
        max_idle_connections: usize,
    ) -> Self {
        Self {
            clients: Arc::new(DashMap::new()),
            shared: OnceLock::new(),
            keepalive_timeout,
            connection_timeout,
            max_idle_connections,
        }
    }

    /// Get or create the HTTP client for a backend authority like `backend:8080`
    pub fn get_client(&self, authority: &str) -> Arc<HttpClient> {
        if let Some(client) = self.clients.get(authority) {
            debug!("Reusing existing HTTP client for backend: {}", authority);
            return Arc::clone(client.value());
        }

        debug!("Creating new HTTP client for backend: {}", authority);
        let client = Arc::new(self.create_client());

        // Another task may have raced us here, keep whichever got inserted first
        let entry = self
            .clients
            .entry(authority.to_string())
            .or_insert_with(|| Arc::clone(&client));
        Arc::clone(entry.value())
    }

    /// Client used for destinations that no rule names
    pub fn shared_client(&self) -> Arc<HttpClient> {
        Arc::clone(self.shared.get_or_init(|| Arc::new(self.create_client())))
    }

    /// Number of per-backend clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    fn create_client(&self) -> HttpClient {
        let mut http_connector = HttpConnector::new();
        http_connector.set_keepalive(Some(self.keepalive_timeout));
        http_connector.set_connect_timeout(Some(self.connection_timeout));
        http_connector.enforce_http(false);

        let builder = match HttpsConnectorBuilder::new().with_native_roots() {
            Ok(builder) => builder,
            Err(e) => {
                warn!("Failed to load native root certificates, using bundled roots: {}", e);
                HttpsConnectorBuilder::new().with_webpki_roots()
            }
        };
        let https_connector = builder
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .wrap_connector(http_connector);

        Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(self.max_idle_connections)
            .pool_idle_timeout(self.keepalive_timeout)
            .set_host(false) // Host is set from the rewritten url
            .build(https_connector)
    }
}

impl Default for ConnectionPool {
    fn default() -> Self {
        Self::new()
    }
}
