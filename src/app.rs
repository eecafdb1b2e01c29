use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::readers::{GatewayServer, HealthcheckServer};
use crate::rewrite::{RewriterHandle, SharedRewriter, create_rewriter};
use crate::server::{ServerResources, ServerStarter};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub struct App {
    config: Arc<AppConfig>,
    config_path: Option<PathBuf>,
    pub rewriter: SharedRewriter,
    pub metrics: Arc<Metrics>,
    handles: Vec<JoinHandle<()>>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let rewriter = create_rewriter(&config.reverse);
        info!(
            "Loaded {} reverse proxy rules",
            rewriter.current().registry().len()
        );
        Self {
            config: Arc::new(config),
            config_path: None,
            rewriter,
            metrics: Arc::new(Metrics::new()),
            handles: Vec::new(),
        }
    }

    /// Remember where the configuration came from so SIGHUP can re-read it
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn resources(&self) -> ServerResources {
        ServerResources::new(
            Arc::clone(&self.config),
            Arc::clone(&self.rewriter),
            Arc::clone(&self.metrics),
        )
    }

    pub fn start(&mut self) -> Result<()> {
        info!("Starting reverse rewriting proxy...");
        let resources = self.resources();
        let gateway_config = &self.config.gateway;
        let healthcheck_config = &self.config.healthcheck;

        let gateway = ServerStarter::start_server(
            "Gateway",
            gateway_config.enabled,
            &format!("{}:{}", gateway_config.bind_address, gateway_config.port),
            resources.clone(),
            |resources| async move { GatewayServer::new(resources).start().await },
        );
        let healthcheck = ServerStarter::start_server(
            "Healthcheck",
            healthcheck_config.enabled,
            &format!(
                "{}:{}",
                healthcheck_config.bind_address, healthcheck_config.port
            ),
            resources,
            |resources| async move { HealthcheckServer::new(resources).start().await },
        );
        self.handles.extend(gateway);
        self.handles.extend(healthcheck);

        #[cfg(unix)]
        {
            let reload = self.spawn_reload_listener();
            self.handles.extend(reload);
        }

        info!("All enabled servers started");
        Ok(())
    }

    /// Publish the reverse proxy rules of a new configuration.
    ///
    /// Listener and upstream settings only take effect after a restart.
    pub fn reload(&self, config: &AppConfig) {
        let previous = self.rewriter.reload(&config.reverse);
        info!(
            "Reverse proxy rules reloaded, {} previous rules retired",
            previous.registry().len()
        );
    }

    #[cfg(unix)]
    fn spawn_reload_listener(&self) -> Option<JoinHandle<()>> {
        use tokio::signal::unix::{SignalKind, signal};

        let path = self.config_path.clone()?;
        let rewriter = Arc::clone(&self.rewriter);

        Some(tokio::spawn(async move {
            let mut hangup = match signal(SignalKind::hangup()) {
                Ok(hangup) => hangup,
                Err(e) => {
                    error!("Failed to register SIGHUP handler: {}", e);
                    return;
                }
            };
            info!("SIGHUP reloads reverse proxy rules from {:?}", path);

            while hangup.recv().await.is_some() {
                info!("SIGHUP received, reloading configuration...");
                if let Err(e) = reload_rules(&rewriter, &path) {
                    error!("Failed to reload config: {:#}. Keeping current rules.", e);
                }
            }
        }))
    }

    pub async fn wait_for_shutdown(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!("Server task failed: {}", e);
                }
            }
        }
        info!("All servers stopped");
    }
}

/// Re-read the configuration file and publish its rules
pub fn reload_rules(rewriter: &RewriterHandle, path: &Path) -> Result<()> {
    let config = AppConfig::from_file(path)?;
    let previous = rewriter.reload(&config.reverse);
    info!(
        "Reverse proxy rules reloaded from {:?}, {} previous rules retired",
        path,
        previous.registry().len()
    );
    Ok(())
}
