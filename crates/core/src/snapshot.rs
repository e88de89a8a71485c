// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content-addressed directory snapshots.
//!
//! A snapshot lists every file and directory beneath a root, with paths
//! relative to that root using `/` separators. Files carry the hex SHA-256
//! of their full contents; directories carry no hash.

use std::cmp::Ordering;
use std::fs::File;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors from walking or hashing a directory tree
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("could not walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("could not hash {}: {source}", path.display())]
    Hash {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("wanted {} to be in dir {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
}

/// One file or directory in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirEntry {
    /// Path relative to the snapshot root, `/`-separated
    pub path: String,
    #[serde(default)]
    pub is_dir: bool,
    /// Hex content digest; empty for directories
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash: String,
}

impl DirEntry {
    pub fn file(path: impl Into<String>, hash: impl Into<String>) -> Self {
        Self { path: path.into(), is_dir: false, hash: hash.into() }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self { path: path.into(), is_dir: true, hash: String::new() }
    }

    /// True if `dir` is a directory entry strictly above this entry.
    pub fn is_within(&self, dir: &DirEntry) -> bool {
        dir.is_dir
            && self.path.len() > dir.path.len()
            && self.path.starts_with(dir.path.as_str())
            && self.path.as_bytes()[dir.path.len()] == b'/'
    }
}

/// Order paths component by component, so a directory sorts directly
/// before everything beneath it (`a` < `a/b` < `a-b`).
pub fn compare_paths(a: &str, b: &str) -> Ordering {
    a.split('/').cmp(b.split('/'))
}

/// A list of entries describing a directory tree.
///
/// Entries are kept in whatever order they were produced in; [`sort`]
/// puts them in canonical path order.
///
/// [`sort`]: DirectorySnapshot::sort
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectorySnapshot(Vec<DirEntry>);

impl DirectorySnapshot {
    pub fn new(entries: Vec<DirEntry>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.0
    }

    pub fn into_entries(self) -> Vec<DirEntry> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DirEntry> {
        self.0.iter()
    }

    /// Sort into canonical order (see [`compare_paths`]).
    pub fn sort(&mut self) {
        self.0.sort_by(|a, b| compare_paths(&a.path, &b.path));
    }

    pub fn sorted(mut self) -> Self {
        self.sort();
        self
    }

    /// Look up an entry by relative path.
    pub fn get(&self, path: &str) -> Option<&DirEntry> {
        self.0.iter().find(|e| e.path == path)
    }
}

impl From<Vec<DirEntry>> for DirectorySnapshot {
    fn from(entries: Vec<DirEntry>) -> Self {
        Self(entries)
    }
}

impl FromIterator<DirEntry> for DirectorySnapshot {
    fn from_iter<I: IntoIterator<Item = DirEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DirectorySnapshot {
    type Item = &'a DirEntry;
    type IntoIter = std::slice::Iter<'a, DirEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Walk `root` recursively and describe every entry beneath it.
///
/// The root itself is not included. Symlinks are not followed as
/// directories; a symlink to a file is hashed through the link.
pub fn snapshot(root: &Path) -> Result<DirectorySnapshot, SnapshotError> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = entry
            .map_err(|source| SnapshotError::Walk { path: root.to_path_buf(), source })?;
        let rel = entry.path().strip_prefix(root).map_err(|_| SnapshotError::OutsideRoot {
            path: entry.path().to_path_buf(),
            root: root.to_path_buf(),
        })?;
        let path = relative_slash_path(rel)?;

        if entry.file_type().is_dir() {
            entries.push(DirEntry::dir(path));
        } else {
            let hash = hash_file(entry.path())?;
            entries.push(DirEntry::file(path, hash));
        }
    }
    Ok(DirectorySnapshot(entries))
}

/// Hex SHA-256 of a file's full contents, streamed from disk.
pub fn hash_file(path: &Path) -> Result<String, SnapshotError> {
    let hash_err = |source| SnapshotError::Hash { path: path.to_path_buf(), source };
    let mut file = File::open(path).map_err(hash_err)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(hash_err)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Hex SHA-256 of an in-memory buffer.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn relative_slash_path(rel: &Path) -> Result<String, SnapshotError> {
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(s) => parts.push(s),
                None => return Err(SnapshotError::NonUtf8Path(rel.to_path_buf())),
            },
            _ => {
                return Err(SnapshotError::OutsideRoot {
                    path: rel.to_path_buf(),
                    root: PathBuf::from("."),
                })
            }
        }
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
