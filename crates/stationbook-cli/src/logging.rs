// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! File logging through `tracing`.
//!
//! The TUI owns the terminal, so log lines go to a daily-rolled file under
//! the platform data directory (for example
//! `~/.local/share/stationbook/logs/`). `STATIONBOOK_LOG` overrides the
//! configured filter:
//!
//! ```bash
//! STATIONBOOK_LOG=stationbook_app=debug,info stationbook --demo
//! ```

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::APP_NAME;

const LOG_ENV: &str = "STATIONBOOK_LOG";
const LOG_FILE_PREFIX: &str = "stationbook";

/// Installs the global subscriber and returns the log directory.
pub fn init(configured_filter: &str) -> Result<PathBuf> {
    let log_dir = log_directory();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("create log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(&log_dir)
        .with_context(|| format!("open log file in {}", log_dir.display()))?;

    let filter = select_filter(env::var(LOG_ENV).ok(), configured_filter)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = %log_dir.display(),
        "stationbook starting"
    );
    Ok(log_dir)
}

pub fn parse_filter(directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directive).with_context(|| format!("invalid filter directive {directive:?}"))
}

/// The environment override wins when it parses; a bad override falls back
/// to the configured filter rather than failing startup.
fn select_filter(env_value: Option<String>, configured: &str) -> Result<EnvFilter> {
    if let Some(raw) = env_value.filter(|raw| !raw.trim().is_empty()) {
        match parse_filter(&raw) {
            Ok(filter) => return Ok(filter),
            Err(error) => eprintln!("ignoring {LOG_ENV}: {error:#}"),
        }
    }
    parse_filter(configured)
}

fn log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join(APP_NAME).join("logs")
}
