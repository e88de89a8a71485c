// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deploy command: sync the app directory, then build and start it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use hp_core::{snapshot, AppConfig, BuildId};
use hp_wire::ErrorKind;

use crate::client::{ClientError, ControlClient};
use crate::exit_error::ExitError;
use crate::output::format_log;
use crate::upload::{expand_needed, upload_all, UploadSummary};

/// What a successful deploy did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployed {
    pub build_id: BuildId,
    pub address: String,
    pub removed: usize,
    pub uploaded: UploadSummary,
}

/// The app root is the directory holding the config file.
pub fn app_root(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

pub async fn deploy(client: &ControlClient, config_path: &Path, workers: usize) -> Result<Deployed> {
    let config_text = std::fs::read_to_string(config_path)
        .with_context(|| format!("could not read {}", config_path.display()))?;
    AppConfig::parse(&config_text)
        .with_context(|| format!("invalid config {}", config_path.display()))?;

    let root = app_root(config_path);
    let local = snapshot(&root).with_context(|| format!("could not scan {}", root.display()))?;

    let created = client.create_build(config_text, local.clone()).await?;
    let needed = expand_needed(&local, &created.need_files)?;
    tracing::info!(build_id = %created.build_id, files = needed.len(), "uploading");

    let transport = Arc::new(client.clone());
    let uploaded = upload_all(transport, &created.build_id, needed, &root, workers).await?;

    let started = match client.start_build(Some(&created.build_id)).await {
        Ok(started) => started,
        Err(ClientError::Rejected { kind: ErrorKind::CompileFailed, message, log }) => {
            if let Some(log) = log {
                eprint!("{}", format_log(&log));
            }
            return Err(ExitError::compile_failed(message).into());
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Deployed {
        build_id: started.build_id,
        address: started.address,
        removed: created.removed,
        uploaded,
    })
}

pub async fn handle(client: &ControlClient, config_path: &Path, workers: usize) -> Result<()> {
    let deployed = deploy(client, config_path, workers).await?;
    println!(
        "Uploaded {} file(s), removed {} stale path(s)",
        deployed.uploaded.sent, deployed.removed
    );
    println!("Build {} running at {}", deployed.build_id, deployed.address);
    Ok(())
}

#[cfg(test)]
#[path = "deploy_tests.rs"]
mod tests;
