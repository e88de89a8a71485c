// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;
use std::sync::Arc;

use fs2::FileExt;
use tokio::net::TcpListener;
use tracing::info;

use crate::proxy::Proxy;
use crate::slot::BuildSlot;

use super::{Config, DaemonState, LifecycleError, StartupResult};

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Don't clean up if we failed to acquire the lock:
            // the PID file belongs to the already-running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    // 1. Create state directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents races
    // Open without truncating so a running daemon's PID survives a failed attempt.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Working directory persists across restarts; an unchanged tree needs no re-upload
    std::fs::create_dir_all(&config.work_dir)?;

    // 4. Bind listeners (LAST - only after all validation passes)
    let control = bind(&config.control_addr).await?;
    let slot = Arc::new(BuildSlot::new(config.work_dir.clone()));
    let proxy = Proxy::new(bind(&config.proxy_addr).await?, Arc::clone(&slot))?;
    info!(
        control = %control.local_addr()?,
        proxy = %proxy.local_addr()?,
        work_dir = %config.work_dir.display(),
        "daemon listening"
    );

    let daemon = DaemonState { config: config.clone(), lock_file, slot };
    Ok(StartupResult { daemon, control, proxy })
}

async fn bind(addr: &str) -> Result<TcpListener, LifecycleError> {
    TcpListener::bind(addr).await.map_err(|e| LifecycleError::BindFailed(addr.to_string(), e))
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
