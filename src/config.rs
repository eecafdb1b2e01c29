use crate::error::{ReverseProxyError, ReverseProxyResult, ToReverseProxyError};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub reverse: ReverseConfig,
    pub gateway: ServerPortConfig,
    pub healthcheck: HealthcheckConfig,
    pub upstream: UpstreamConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverseConfig {
    /// Refuse requests no rule matches instead of forward proxying them
    pub reverse_only: bool,
    /// Pin clients to their backend with a tracking cookie
    pub reverse_magic: bool,
    /// Rules in declaration order; later rules take precedence
    pub rules: Vec<RuleConfig>,
}

/// A single `path -> url` or `host -> url` mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Request path prefix, defaults to `/` when neither path nor host is set
    pub path: Option<String>,
    /// `Host` header prefix
    pub host: Option<String>,
    /// Backend base url, e.g. `http://backend:8080/`
    pub url: Option<String>,
}

impl RuleConfig {
    pub fn path(path: &str, url: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            host: None,
            url: Some(url.to_string()),
        }
    }

    pub fn host(host: &str, url: &str) -> Self {
        Self {
            path: None,
            host: Some(host.to_string()),
            url: Some(url.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerPortConfig {
    pub enabled: bool,
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerPortConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0".to_string(),
            port: 8888,
        }
    }
}

impl ServerPortConfig {
    pub fn socket_addr(&self) -> ReverseProxyResult<SocketAddr> {
        parse_socket_addr(&self.bind_address, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthcheckConfig {
    pub enabled: bool,
    pub bind_address: String,
    pub port: u16,
    pub path: String,
}

impl HealthcheckConfig {
    pub fn socket_addr(&self) -> ReverseProxyResult<SocketAddr> {
        parse_socket_addr(&self.bind_address, self.port)
    }
}

impl Default for HealthcheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1".to_string(),
            port: 8889,
            path: "/health".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Total time allowed for a backend request
    pub timeout_secs: u64,
    pub keepalive_secs: u64,
    pub connect_timeout_secs: u64,
    /// Max idle connections kept per backend
    pub max_idle_connections: usize,
    /// Largest client request body forwarded, larger ones get 413
    pub max_request_body_bytes: usize,
    /// Largest backend response body relayed, larger ones get 502
    pub max_response_body_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            keepalive_secs: 60,
            connect_timeout_secs: 10,
            max_idle_connections: 10,
            max_request_body_bytes: 10 * 1024 * 1024,
            max_response_body_bytes: 64 * 1024 * 1024,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `reverse_rewrite=debug`
    pub level: String,
    /// Log file; console only when unset
    pub file: Option<String>,
    pub json: bool,
    /// Rotate the log file daily
    pub rotation: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            json: false,
            rotation: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse config file")?;
        Ok(config)
    }

    /// Load configuration from file or use default
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config file, using defaults: {:#}", e);
            Self::default()
        })
    }

    /// Check listener, upstream and logging settings.
    ///
    /// Reverse proxy rules are not checked here: a broken rule is logged and
    /// skipped when the registry is built, the remaining rules stay active.
    pub fn validate(&self) -> Result<()> {
        if self.gateway.enabled {
            if self.gateway.port == 0 {
                return Err(ReverseProxyError::Config("Gateway port must not be 0".into()).into());
            }
            self.gateway.socket_addr()?;
        }

        if self.healthcheck.enabled {
            if self.healthcheck.port == 0 {
                return Err(
                    ReverseProxyError::Config("Healthcheck port must not be 0".into()).into(),
                );
            }
            self.healthcheck.socket_addr()?;
            if !self.healthcheck.path.starts_with('/') {
                bail!(
                    "Healthcheck path must start with '/': {}",
                    self.healthcheck.path
                );
            }
        }

        if self.upstream.timeout_secs == 0 {
            bail!("Upstream timeout must be greater than 0");
        }
        if self.upstream.max_request_body_bytes == 0 || self.upstream.max_response_body_bytes == 0 {
            bail!("Upstream body limits must be greater than 0");
        }

        EnvFilter::from_str(&self.logging.level)
            .with_context(|| format!("Invalid log level: {}", self.logging.level))?;

        Ok(())
    }
}

fn parse_socket_addr(bind_address: &str, port: u16) -> ReverseProxyResult<SocketAddr> {
    format!("{}:{}", bind_address, port)
        .parse::<SocketAddr>()
        .to_reverse_proxy_error(&format!("listen address {}:{}", bind_address, port))
}
