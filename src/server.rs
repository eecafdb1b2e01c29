/// Common server startup utilities
use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::rewrite::SharedRewriter;
use crate::upstream::ConnectionPool;
use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Common server startup helper
pub struct ServerStarter;

impl ServerStarter {
    /// Spawn a server future, logging the error it ends with
    pub fn start_server<F, Fut>(
        name: &str,
        enabled: bool,
        bind_addr: &str,
        resources: ServerResources,
        server_future: F,
    ) -> Option<JoinHandle<()>>
    where
        F: FnOnce(ServerResources) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        if !enabled {
            info!("{} server is disabled", name);
            return None;
        }

        let task_name = name.to_string();
        let handle = tokio::spawn(async move {
            if let Err(e) = server_future(resources).await {
                error!("{} server error: {:#}", task_name, e);
            }
        });

        info!("{} server started on {}", name, bind_addr);
        Some(handle)
    }
}

/// Common resources shared across servers
#[derive(Clone)]
pub struct ServerResources {
    pub config: Arc<AppConfig>,
    pub rewriter: SharedRewriter,
    pub metrics: Arc<Metrics>,
    pub pool: Arc<ConnectionPool>,
}

impl ServerResources {
    pub fn new(config: Arc<AppConfig>, rewriter: SharedRewriter, metrics: Arc<Metrics>) -> Self {
        let pool = Arc::new(ConnectionPool::from_config(&config.upstream));
        Self {
            config,
            rewriter,
            metrics,
            pool,
        }
    }
}
