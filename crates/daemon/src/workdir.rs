// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem operations confined to the daemon's working directory.
//!
//! Every relative path arriving from a client goes through [`resolve`]
//! before it touches the disk.

use std::io;
use std::path::{Component, Path, PathBuf};

use hp_core::hash_bytes;
use thiserror::Error;

/// Errors from working-directory file operations
#[derive(Debug, Error)]
pub enum WorkdirError {
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    #[error("sum did not match for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch { path: String, expected: String, actual: String },

    #[error("could not create directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("could not write file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("could not remove {path}: {source}")]
    Remove {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Join a client-supplied relative path onto `root`.
///
/// Only plain components are accepted: no `..`, no `.`, no leading `/`.
pub fn resolve(root: &Path, rel: &str) -> Result<PathBuf, WorkdirError> {
    let rel_path = Path::new(rel);
    let mut components = rel_path.components().peekable();
    if rel.is_empty() || components.peek().is_none() {
        return Err(WorkdirError::InvalidPath(rel.to_string()));
    }
    if !components.all(|c| matches!(c, Component::Normal(_))) {
        return Err(WorkdirError::InvalidPath(rel.to_string()));
    }
    Ok(root.join(rel_path))
}

/// Write `content` to `rel` if it hashes to `expected_hash`.
///
/// Bytes go to a hidden temp file next to the destination and are renamed
/// into place, so readers see either the old file or the complete new one.
pub async fn write_verified(
    root: &Path,
    rel: &str,
    expected_hash: &str,
    content: &[u8],
) -> Result<PathBuf, WorkdirError> {
    let dest = resolve(root, rel)?;

    let actual = hash_bytes(content);
    if actual != expected_hash {
        return Err(WorkdirError::ChecksumMismatch {
            path: rel.to_string(),
            expected: expected_hash.to_string(),
            actual,
        });
    }

    let parent = dest.parent().unwrap_or(root);
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|source| WorkdirError::CreateDir { path: rel.to_string(), source })?;

    let file_name = dest.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let tmp = parent.join(format!(".{}.{}.tmp", file_name, nanoid::nanoid!(8)));
    let write_err = |source| WorkdirError::Write { path: rel.to_string(), source };

    tokio::fs::write(&tmp, content).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp, &dest).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(write_err(e));
    }
    Ok(dest)
}

/// Delete a file or directory tree. A path that is already gone is not an error.
pub async fn remove_path(root: &Path, rel: &str) -> Result<(), WorkdirError> {
    let target = resolve(root, rel)?;
    let remove_err = |source| WorkdirError::Remove { path: rel.to_string(), source };

    let meta = match tokio::fs::symlink_metadata(&target).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(remove_err(e)),
    };
    let result = if meta.is_dir() {
        tokio::fs::remove_dir_all(&target).await
    } else {
        tokio::fs::remove_file(&target).await
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(remove_err(e)),
    }
}

/// `mkdir -p` for a relative directory.
pub async fn create_dir(root: &Path, rel: &str) -> Result<(), WorkdirError> {
    let target = resolve(root, rel)?;
    tokio::fs::create_dir_all(&target)
        .await
        .map_err(|source| WorkdirError::CreateDir { path: rel.to_string(), source })
}

#[cfg(test)]
#[path = "workdir_tests.rs"]
mod tests;
