// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upload pipeline: a fixed pool of workers pushing files to the daemon.
//!
//! The first failure cancels the pool. Workers keep draining the queue so
//! the producer never blocks, but anything dequeued after cancellation is
//! skipped rather than sent. Failed transfers are not retried.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hp_core::{hash_bytes, BuildId, DirEntry, DirectorySnapshot};
use hp_wire::ErrorKind;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::{ClientError, ControlClient};

pub const DEFAULT_UPLOAD_WORKERS: usize = 15;

/// Errors from transferring one file
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("checksum mismatch for {path}: {message}")]
    ChecksumMismatch { path: String, message: String },

    #[error("upload of {path} failed: {message}")]
    Remote { path: String, message: String },

    #[error("{path} is no longer in the local tree")]
    NotInLocalTree { path: String },

    #[error("upload worker failed: {0}")]
    Worker(String),
}

/// Destination for uploaded files.
#[async_trait]
pub trait FileTransport: Send + Sync {
    async fn put_file(
        &self,
        build_id: &BuildId,
        path: &str,
        hash: &str,
        content: Vec<u8>,
    ) -> Result<(), TransferError>;
}

#[async_trait]
impl FileTransport for ControlClient {
    async fn put_file(
        &self,
        build_id: &BuildId,
        path: &str,
        hash: &str,
        content: Vec<u8>,
    ) -> Result<(), TransferError> {
        ControlClient::put_file(self, build_id, path, hash, &content).await.map_err(|e| match e {
            ClientError::Rejected { kind: ErrorKind::ChecksumMismatch, message, .. } => {
                TransferError::ChecksumMismatch { path: path.to_string(), message }
            }
            other => TransferError::Remote { path: path.to_string(), message: other.to_string() },
        })
    }
}

/// Counts from a completed upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub sent: usize,
    pub skipped: usize,
}

/// Turn the daemon's (directory-collapsed) need list into leaf files.
///
/// A directory entry stands for every file beneath it in `local`. A path
/// the local tree does not have means the tree changed after the snapshot
/// was taken, and fails the deploy.
pub fn expand_needed(local: &DirectorySnapshot, need: &[String]) -> Result<Vec<String>, TransferError> {
    let index: HashMap<&str, &DirEntry> = local.iter().map(|e| (e.path.as_str(), e)).collect();
    let mut files = Vec::new();
    for path in need {
        match index.get(path.as_str()) {
            Some(entry) if entry.is_dir => files.extend(
                local.iter().filter(|e| !e.is_dir && e.is_within(entry)).map(|e| e.path.clone()),
            ),
            Some(entry) => files.push(entry.path.clone()),
            None => return Err(TransferError::NotInLocalTree { path: path.clone() }),
        }
    }
    Ok(files)
}

/// Upload `files` (relative to `local_root`) with `workers` concurrent tasks.
///
/// Returns the first transfer error once every worker has drained.
pub async fn upload_all(
    transport: Arc<dyn FileTransport>,
    build_id: &BuildId,
    files: Vec<String>,
    local_root: &Path,
    workers: usize,
) -> Result<UploadSummary, TransferError> {
    let workers = workers.max(1);
    let (tx, rx) = mpsc::channel::<String>(workers);
    let rx = Arc::new(tokio::sync::Mutex::new(rx));
    let cancel = CancellationToken::new();
    let first_error: Arc<Mutex<Option<TransferError>>> = Arc::new(Mutex::new(None));
    let sent = Arc::new(AtomicUsize::new(0));
    let skipped = Arc::new(AtomicUsize::new(0));

    let mut set = JoinSet::new();
    for _ in 0..workers {
        let worker = Worker {
            transport: Arc::clone(&transport),
            build_id: build_id.clone(),
            local_root: local_root.to_path_buf(),
            rx: Arc::clone(&rx),
            cancel: cancel.clone(),
            first_error: Arc::clone(&first_error),
            sent: Arc::clone(&sent),
            skipped: Arc::clone(&skipped),
        };
        set.spawn(worker.run());
    }

    for path in files {
        if tx.send(path).await.is_err() {
            break;
        }
    }
    drop(tx);

    while let Some(joined) = set.join_next().await {
        if let Err(e) = joined {
            first_error.lock().get_or_insert(TransferError::Worker(e.to_string()));
        }
    }

    let summary =
        UploadSummary { sent: sent.load(Ordering::SeqCst), skipped: skipped.load(Ordering::SeqCst) };
    if let Some(e) = first_error.lock().take() {
        debug!(sent = summary.sent, skipped = summary.skipped, "upload aborted");
        return Err(e);
    }
    Ok(summary)
}

struct Worker {
    transport: Arc<dyn FileTransport>,
    build_id: BuildId,
    local_root: std::path::PathBuf,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<String>>>,
    cancel: CancellationToken,
    first_error: Arc<Mutex<Option<TransferError>>>,
    sent: Arc<AtomicUsize>,
    skipped: Arc<AtomicUsize>,
}

impl Worker {
    async fn run(self) {
        loop {
            let next = self.rx.lock().await.recv().await;
            let Some(path) = next else {
                break;
            };
            if self.cancel.is_cancelled() {
                self.skipped.fetch_add(1, Ordering::SeqCst);
                continue;
            }
            match self.transfer(&path).await {
                Ok(()) => {
                    self.sent.fetch_add(1, Ordering::SeqCst);
                }
                Err(e) => {
                    warn!(%path, error = %e, "upload failed");
                    self.first_error.lock().get_or_insert(e);
                    self.cancel.cancel();
                }
            }
        }
    }

    async fn transfer(&self, path: &str) -> Result<(), TransferError> {
        let content = tokio::fs::read(self.local_root.join(path))
            .await
            .map_err(|source| TransferError::Read { path: path.to_string(), source })?;
        let hash = hash_bytes(&content);
        debug!(%path, bytes = content.len(), "uploading");
        self.transport.put_file(&self.build_id, path, &hash, content).await
    }
}

#[cfg(test)]
#[path = "upload_tests.rs"]
mod tests;
