use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::path::Path;
use std::str::FromStr;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Initialize logging system based on configuration
///
/// `RUST_LOG` takes precedence over the configured level. With a log file
/// configured, the file gets the configured format and the console stays in
/// plain text. The returned guard must be kept alive to flush file output.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.level.clone());

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    match &config.file {
        Some(log_file) => {
            let (writer, file_guard) = open_log_file(log_file, config.rotation)?;
            guard = Some(file_guard);
            layers.push(fmt_layer(writer, config.json, &log_level));
            layers.push(fmt_layer(std::io::stderr, false, &log_level));
        }
        None => layers.push(fmt_layer(std::io::stderr, config.json, &log_level)),
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("Failed to install global tracing subscriber")?;

    Ok(guard)
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::from_str(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn fmt_layer<W>(writer: W, json: bool, level: &str) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339());

    if json {
        layer.json().with_filter(env_filter(level)).boxed()
    } else {
        layer.with_filter(env_filter(level)).boxed()
    }
}

fn open_log_file(log_file: &str, rotation: bool) -> Result<(NonBlocking, WorkerGuard)> {
    let path = Path::new(log_file);

    if rotation {
        let file_appender = tracing_appender::rolling::daily(
            path.parent().unwrap_or_else(|| Path::new(".")),
            path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("reverse-rewrite.log"),
        );
        return Ok(tracing_appender::non_blocking(file_appender));
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", log_file))?;
    Ok(tracing_appender::non_blocking(file))
}
