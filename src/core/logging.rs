// src/core/logging.rs
//! Tracing subscriber setup

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::core::config_manager::LoggingSettings;

/// Install the global subscriber. `RUST_LOG` wins over the configured filter.
/// With `logging.file` set, events are written there as JSON lines.
pub fn init(settings: &LoggingSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .context("Invalid log filter")?;

    match &settings.file {
        Some(path) => {
            let file = open_log_file(path)?;

            Registry::default()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(Mutex::new(file))
                        .with_current_span(false)
                        .with_span_list(false),
                )
                .try_init()
                .context("Logging already initialised")?;
        }
        None => {
            Registry::default()
                .with(filter)
                .with(fmt::layer())
                .try_init()
                .context("Logging already initialised")?;
        }
    }

    Ok(())
}

/// Append handle on `path`, creating missing parent directories first
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}
