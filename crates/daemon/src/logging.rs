// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing setup: daemon log file plus stderr.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::env;
use crate::lifecycle::{Config, LifecycleError};

/// Install the global subscriber. Keep the guard alive until exit so
/// buffered lines reach the log file.
pub fn init(config: &Config) -> Result<WorkerGuard, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;
    let file_name = config
        .log_path
        .file_name()
        .ok_or_else(|| LifecycleError::Logging("log path has no file name".to_string()))?;
    let dir = config.log_path.parent().unwrap_or(&config.state_dir);

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_new(env::log_filter())
        .map_err(|e| LifecycleError::Logging(e.to_string()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| LifecycleError::Logging(e.to_string()))?;

    Ok(guard)
}
