// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

pub const DEFAULT_CONTROL_ADDR: &str = "127.0.0.1:7070";
pub const DEFAULT_PROXY_PORT: u16 = 8080;

/// Resolve state directory: HP_STATE_DIR > XDG_STATE_HOME/hotpush > ~/.local/state/hotpush
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("HP_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("hotpush"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/hotpush"))
}

/// Control listener address (`HP_CONTROL_ADDR`).
pub fn control_addr() -> String {
    non_empty("HP_CONTROL_ADDR").unwrap_or_else(|| DEFAULT_CONTROL_ADDR.to_string())
}

/// Proxy listener address: HP_LISTEN_ADDR > 0.0.0.0:$PORT > 0.0.0.0:8080
pub fn proxy_addr() -> String {
    if let Some(addr) = non_empty("HP_LISTEN_ADDR") {
        return addr;
    }
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PROXY_PORT);
    format!("0.0.0.0:{port}")
}

/// Shared secret for control connections. Validated in the Hello handshake.
pub fn auth_token() -> Option<String> {
    non_empty("HP_AUTH_TOKEN")
}

/// Per-frame IPC timeout (default 30s, configurable via `HP_IPC_TIMEOUT_MS`).
pub fn ipc_timeout() -> Duration {
    std::env::var("HP_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

/// Log filter directive (`HP_LOG`), e.g. `info` or `hp_daemon=debug`.
pub fn log_filter() -> String {
    non_empty("HP_LOG").unwrap_or_else(|| "info".to_string())
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
