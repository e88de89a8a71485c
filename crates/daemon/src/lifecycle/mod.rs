// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: configuration, startup, serving, shutdown.

mod startup;
pub use startup::startup;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::env;
use crate::listener::{ListenCtx, Listener};
use crate::proxy::Proxy;
use crate::slot::BuildSlot;

const PROXY_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/hotpush)
    pub state_dir: PathBuf,
    /// Working directory the app is synced into and built from
    pub work_dir: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Address of the control listener
    pub control_addr: String,
    /// Address of the public traffic proxy
    pub proxy_addr: String,
    /// Shared secret required in the Hello handshake, if set
    pub auth_token: Option<String>,
    /// Per-frame read/write timeout on control connections
    pub ipc_timeout: Duration,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, LifecycleError> {
        let mut config = Self::for_state_dir(env::state_dir()?);
        config.control_addr = env::control_addr();
        config.proxy_addr = env::proxy_addr();
        config.auth_token = env::auth_token();
        config.ipc_timeout = env::ipc_timeout();
        Ok(config)
    }

    /// Paths derived from `state_dir`, loopback ephemeral listeners, no token.
    pub fn for_state_dir(state_dir: PathBuf) -> Self {
        Self {
            work_dir: state_dir.join("app"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            control_addr: "127.0.0.1:0".to_string(),
            proxy_addr: "127.0.0.1:0".to_string(),
            auth_token: None,
            ipc_timeout: Duration::from_secs(30),
            state_dir,
        }
    }
}

/// Daemon state during operation.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub slot: Arc<BuildSlot>,
}

/// Result of daemon startup: the daemon state plus its bound listeners.
pub struct StartupResult {
    pub daemon: DaemonState,
    pub control: TcpListener,
    pub proxy: Proxy,
}

impl DaemonState {
    /// Stop the running app and remove the PID file.
    pub async fn shutdown(&self) {
        info!("Shutting down daemon...");
        self.slot.shutdown().await;

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // Lock file is released when self.lock_file is dropped
        info!("Daemon shutdown complete");
    }
}

/// Serve control and proxy traffic until `cancel` fires, then shut down.
pub async fn serve(startup: StartupResult, cancel: CancellationToken) {
    let StartupResult { daemon, control, proxy } = startup;

    let ctx = Arc::new(ListenCtx {
        slot: Arc::clone(&daemon.slot),
        auth_token: daemon.config.auth_token.clone(),
        timeout: daemon.config.ipc_timeout,
    });
    let listener = tokio::spawn(Listener::new(control, ctx).run(cancel.clone()));
    let proxy = tokio::spawn(proxy.run(cancel.clone()));

    cancel.cancelled().await;
    let _ = listener.await;
    // In-flight forwarded requests get a grace period, then the app is killed anyway
    if tokio::time::timeout(PROXY_DRAIN_TIMEOUT, proxy).await.is_err() {
        warn!("proxy still draining requests at shutdown");
    }
    daemon.shutdown().await;
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind {0}: {1}")]
    BindFailed(String, std::io::Error),

    #[error("Failed to set up logging: {0}")]
    Logging(String),

    #[error("Failed to set up proxy client: {0}")]
    ProxyClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
