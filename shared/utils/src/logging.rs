use anyhow::{Context, Result};
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    let file = open_log_file(config)?;

    let installed = match (config.format.as_str(), file) {
        ("json", Some(file)) => registry
            .with(fmt::layer().json().with_span_events(FmtSpan::CLOSE).with_writer(file))
            .try_init(),
        ("json", None) => registry
            .with(fmt::layer().json().with_span_events(FmtSpan::CLOSE).with_writer(std::io::stderr))
            .try_init(),
        (_, Some(file)) => registry
            .with(fmt::layer().with_span_events(FmtSpan::CLOSE).with_ansi(false).with_writer(file))
            .try_init(),
        (_, None) => registry
            .with(fmt::layer().with_span_events(FmtSpan::CLOSE).with_writer(std::io::stderr))
            .try_init(),
    };
    installed.context("Failed to install tracing subscriber")?;

    tracing::info!(level = %config.level, format = %config.format, "Logging initialized");
    Ok(())
}

fn open_log_file(config: &LoggingConfig) -> Result<Option<Arc<File>>> {
    let Some(path) = &config.file_path else {
        return Ok(None);
    };

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path))?;

    Ok(Some(Arc::new(file)))
}
