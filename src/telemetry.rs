//! Tracing initialization.
//!
//! - `STUDYDRAW_LOG` overrides the filter (e.g. "debug" or
//!   "info,studydraw::engine=debug"); otherwise the configured filter is used.
//! - The terminal UI owns stdout, so events go to `studydraw.log` in the data
//!   directory, without ANSI colours.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "STUDYDRAW_LOG";
const LOG_FILE: &str = "studydraw.log";

pub fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE)
}

pub fn init_tracing(data_dir: &Path, default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    std::fs::create_dir_all(data_dir)?;
    let path = log_path(data_dir);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
