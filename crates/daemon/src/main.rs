// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! hpd: the hotpush daemon.

use std::process::ExitCode;

use hp_daemon::{logging, serve, startup, Config, LifecycleError};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("hpd: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("hpd: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Failed to start daemon: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), LifecycleError> {
    let result = startup(&config).await?;
    info!(version = env!("CARGO_PKG_VERSION"), "hpd ready");

    let cancel = CancellationToken::new();
    let server = tokio::spawn(serve(result, cancel.clone()));

    wait_for_signal().await?;
    info!("signal received, stopping");
    cancel.cancel();
    let _ = server.await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<(), LifecycleError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = term.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Result<(), LifecycleError> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
