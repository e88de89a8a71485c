// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tree differ: the add/remove sets that turn one snapshot into another.
//!
//! Both snapshots are sorted into canonical order and merged in a single
//! pass. Output lists are directory-collapsed: an entry beneath a directory
//! that was just emitted to the same list is implied and skipped. Callers
//! that need every file (the upload pipeline) re-walk collapsed directories.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::snapshot::{compare_paths, DirEntry, DirectorySnapshot};

/// Entries to create/overwrite and entries to delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub add: Vec<DirEntry>,
    pub remove: Vec<DirEntry>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    pub fn add_paths(&self) -> Vec<String> {
        self.add.iter().map(|e| e.path.clone()).collect()
    }

    pub fn remove_paths(&self) -> Vec<String> {
        self.remove.iter().map(|e| e.path.clone()).collect()
    }
}

/// Compute what must change for a tree described by `have` to match `want`.
///
/// - same path, file/dir type differs: `have` to remove, `want` to add
/// - same path, both files, hashes differ: `want` to add (the upload overwrites)
/// - path only in `want`: add
/// - path only in `have`: remove
pub fn diff(have: &DirectorySnapshot, want: &DirectorySnapshot) -> DiffResult {
    let have = have.clone().sorted();
    let want = want.clone().sorted();
    let (have, want) = (have.entries(), want.entries());

    let mut result = DiffResult::default();
    let (mut h, mut w) = (0, 0);

    while h < have.len() && w < want.len() {
        let (ours, theirs) = (&have[h], &want[w]);
        match compare_paths(&ours.path, &theirs.path) {
            Ordering::Equal => {
                if ours.is_dir != theirs.is_dir {
                    push_collapsed(&mut result.remove, ours);
                    push_collapsed(&mut result.add, theirs);
                } else if !ours.is_dir && ours.hash != theirs.hash {
                    push_collapsed(&mut result.add, theirs);
                }
                h += 1;
                w += 1;
            }
            Ordering::Greater => {
                push_collapsed(&mut result.add, theirs);
                w += 1;
            }
            Ordering::Less => {
                push_collapsed(&mut result.remove, ours);
                h += 1;
            }
        }
    }

    for entry in &want[w..] {
        push_collapsed(&mut result.add, entry);
    }
    for entry in &have[h..] {
        push_collapsed(&mut result.remove, entry);
    }

    result
}

/// Append unless the last entry is a directory that already covers `entry`.
fn push_collapsed(list: &mut Vec<DirEntry>, entry: &DirEntry) {
    if let Some(last) = list.last() {
        if entry.is_within(last) {
            return;
        }
    }
    list.push(entry.clone());
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;
