use anyhow::{Context, Result};
use reverse_rewrite::app::App;
use reverse_rewrite::config::AppConfig;
use reverse_rewrite::logging;
use tracing::info;

/// Environment variable overriding the configuration file location
const CONFIG_ENV: &str = "REVERSE_REWRITE_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "config.toml".to_string());

    // Load config first (before logging init) to get logging config
    let config = AppConfig::load_or_default(&config_path);

    // Validate configuration before starting
    config
        .validate()
        .context("Configuration validation failed")?;

    // Initialize logging system
    let _guard =
        logging::init_logging(&config.logging).context("Failed to initialize logging system")?;

    info!("Reverse rewriting proxy starting...");
    info!(
        "Logging initialized - level: {}, file: {:?}, json: {}",
        config.logging.level, config.logging.file, config.logging.json
    );

    let mut app = App::new(config).with_config_path(&config_path);
    app.start().context("Failed to start reverse rewriting proxy")?;

    info!("Reverse rewriting proxy started successfully. Press Ctrl+C to shutdown.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutdown signal received, shutting down gracefully...");
    app.wait_for_shutdown().await;

    Ok(())
}
