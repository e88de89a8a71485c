// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daemon's single build slot.
//!
//! `create`, `start_build`, `stop`, and `status` hold the write lock for
//! their whole duration, compile and process start included, so builds
//! are fully serialized. `put_file` and `forward_target` only read.

use std::path::{Path, PathBuf};

use hp_core::{diff, snapshot, AppConfig, BuildId, ConfigError, DirectorySnapshot, SnapshotError};
use hp_wire::{BuildStatus, ErrorKind};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::build::{BuildError, BuildRecord};
use crate::workdir::{self, WorkdirError};

/// Shown by the proxy before anything has been deployed.
pub const NO_APP_MESSAGE: &str =
    "No app to run. Use `hp deploy` to upload the application code.";

/// Errors from slot operations, each mapped to a wire [`ErrorKind`]
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("no build has been created")]
    NoBuild,

    #[error("build id {requested} does not match the live build {live}")]
    BuildIdMismatch { requested: BuildId, live: BuildId },

    #[error("missing dir list")]
    EmptySnapshot,

    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("could not stop existing binary: {0}")]
    StopExisting(#[source] BuildError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("could not get needed files: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Workdir(#[from] WorkdirError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SlotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SlotError::NoBuild => ErrorKind::NotFound,
            SlotError::BuildIdMismatch { .. }
            | SlotError::EmptySnapshot
            | SlotError::Config(_)
            | SlotError::Workdir(WorkdirError::InvalidPath(_)) => ErrorKind::BadRequest,
            SlotError::Workdir(WorkdirError::ChecksumMismatch { .. }) => {
                ErrorKind::ChecksumMismatch
            }
            SlotError::Build(BuildError::InvalidState { .. }) => ErrorKind::Conflict,
            SlotError::Build(BuildError::Compile { .. }) => ErrorKind::CompileFailed,
            SlotError::StopExisting(_)
            | SlotError::Build(_)
            | SlotError::Snapshot(_)
            | SlotError::Workdir(_)
            | SlotError::Io(_) => ErrorKind::Internal,
        }
    }

    /// Captured compiler output, for errors that carry one.
    pub fn log(&self) -> Option<String> {
        match self {
            SlotError::Build(BuildError::Compile { log, .. }) => Some(log.clone()),
            _ => None,
        }
    }
}

/// Result of [`BuildSlot::create`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedBuild {
    pub build_id: BuildId,
    /// Paths the client must upload; directory entries stand for their subtree
    pub need_files: Vec<String>,
    /// Paths deleted from the working directory
    pub removed: Vec<String>,
}

/// Result of [`BuildSlot::start_build`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedBuild {
    pub build_id: BuildId,
    pub address: String,
}

/// Where the proxy should send a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Forward {
    Upstream(String),
    /// Plain-text diagnostic for a 503 response
    Unavailable(String),
}

/// Coordinator for the one live [`BuildRecord`].
#[derive(Debug)]
pub struct BuildSlot {
    work_dir: PathBuf,
    live: RwLock<Option<BuildRecord>>,
}

impl BuildSlot {
    pub fn new(work_dir: PathBuf) -> Self {
        Self { work_dir, live: RwLock::new(None) }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Replace the live build and reconcile the working directory with `files`.
    ///
    /// A running app is stopped first; if that fails the create is aborted
    /// and the old build stays live. Stale paths are deleted and declared
    /// directories created before returning. Files still to be uploaded
    /// come back in `need_files`.
    pub async fn create(
        &self,
        config_text: &str,
        files: DirectorySnapshot,
    ) -> Result<CreatedBuild, SlotError> {
        let config = AppConfig::parse(config_text)?;
        if files.is_empty() {
            return Err(SlotError::EmptySnapshot);
        }

        let mut live = self.live.write().await;
        if let Some(previous) = live.as_mut() {
            previous.refresh();
            if previous.is_running() {
                previous.stop().await.map_err(SlotError::StopExisting)?;
            }
        }

        tokio::fs::create_dir_all(&self.work_dir).await?;
        let record = BuildRecord::new(BuildId::new(), self.work_dir.clone(), config)?;
        let build_id = record.id().clone();
        let record = live.insert(record);

        let root = self.work_dir.clone();
        let have = tokio::task::spawn_blocking(move || snapshot(&root))
            .await
            .map_err(|e| SlotError::Io(std::io::Error::other(e)))??;
        let changes = diff(&have, &files);

        for stale in &changes.remove {
            workdir::remove_path(&self.work_dir, &stale.path).await?;
        }
        for dir in files.iter().filter(|e| e.is_dir) {
            workdir::create_dir(&self.work_dir, &dir.path).await?;
        }

        let need_files = changes.add_paths();
        if !need_files.is_empty() {
            record.mark_fetching();
        }
        info!(
            %build_id,
            need = need_files.len(),
            removed = changes.remove.len(),
            "build created"
        );

        Ok(CreatedBuild { build_id, need_files, removed: changes.remove_paths() })
    }

    /// Write one uploaded file into the working directory.
    pub async fn put_file(
        &self,
        build_id: &BuildId,
        dest: &str,
        hash: &str,
        content: &[u8],
    ) -> Result<(), SlotError> {
        let live = self.live.read().await;
        let record = live.as_ref().ok_or(SlotError::NoBuild)?;
        check_id(record, Some(build_id))?;
        workdir::write_verified(&self.work_dir, dest, hash, content).await?;
        Ok(())
    }

    /// Compile the live build, then start it.
    pub async fn start_build(&self, build_id: Option<&BuildId>) -> Result<StartedBuild, SlotError> {
        let mut live = self.live.write().await;
        let record = live.as_mut().ok_or(SlotError::NoBuild)?;
        check_id(record, build_id)?;

        record.build().await?;
        record.start().await?;

        let address = record.listen_address().unwrap_or_default().to_string();
        Ok(StartedBuild { build_id: record.id().clone(), address })
    }

    pub async fn stop(&self, build_id: Option<&BuildId>) -> Result<(), SlotError> {
        let mut live = self.live.write().await;
        let record = live.as_mut().ok_or(SlotError::NoBuild)?;
        check_id(record, build_id)?;
        record.refresh();
        record.stop().await?;
        Ok(())
    }

    /// Current state of the live build, noticing an app that exited on its own.
    pub async fn status(&self) -> Option<BuildStatus> {
        let mut live = self.live.write().await;
        live.as_mut().map(|record| {
            record.refresh();
            record.status()
        })
    }

    pub async fn forward_target(&self) -> Forward {
        let live = self.live.read().await;
        match live.as_ref() {
            None => Forward::Unavailable(NO_APP_MESSAGE.to_string()),
            Some(record) => match (record.is_running(), record.listen_address()) {
                (true, Some(address)) => Forward::Upstream(address.to_string()),
                _ => Forward::Unavailable(format!(
                    "state: {}\n{}",
                    record.state(),
                    record.output().contents()
                )),
            },
        }
    }

    /// Stop a running app before the daemon exits.
    pub async fn shutdown(&self) {
        let mut live = self.live.write().await;
        if let Some(record) = live.as_mut() {
            record.refresh();
            if record.is_running() {
                if let Err(e) = record.stop().await {
                    warn!(build_id = %record.id(), error = %e, "failed to stop app on shutdown");
                }
            }
        }
    }
}

#[cfg(test)]
impl BuildSlot {
    pub(crate) async fn install(&self, record: BuildRecord) {
        *self.live.write().await = Some(record);
    }
}

fn check_id(record: &BuildRecord, requested: Option<&BuildId>) -> Result<(), SlotError> {
    match requested {
        Some(id) if id != record.id() => Err(SlotError::BuildIdMismatch {
            requested: id.clone(),
            live: record.id().clone(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "slot_tests.rs"]
mod tests;
