// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;

use proptest::prelude::*;

use super::*;

fn snap(entries: Vec<DirEntry>) -> DirectorySnapshot {
    DirectorySnapshot::new(entries)
}

fn paths(entries: &[DirEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.path.as_str()).collect()
}

#[test]
fn two_disjoint_files() {
    let have = snap(vec![DirEntry::file("a", "1")]);
    let want = snap(vec![DirEntry::file("b", "2")]);

    let result = diff(&have, &want);
    assert_eq!(paths(&result.add), vec!["b"]);
    assert_eq!(paths(&result.remove), vec!["a"]);
}

#[test]
fn only_want_collapses_new_directory() {
    let have = snap(vec![]);
    let want = snap(vec![
        DirEntry::file("a", "1"),
        DirEntry::file("c", "3"),
        DirEntry::dir("b"),
        DirEntry::file("b/a", "2"),
    ]);

    let result = diff(&have, &want);
    assert!(result.remove.is_empty());
    assert_eq!(paths(&result.add), vec!["a", "b", "c"]);
}

#[test]
fn want_extends_have_adds_everything_new() {
    let have = snap(vec![]);
    let want = snap(vec![
        DirEntry::file("a", "1"),
        DirEntry::file("b", "2"),
        DirEntry::dir("c"),
        DirEntry::file("c/a", "3"),
    ]);

    let result = diff(&have, &want);
    assert!(result.remove.is_empty());
    // c/a is implied by the directory entry c
    assert_eq!(paths(&result.add), vec!["a", "b", "c"]);
    assert!(result.add.iter().find(|e| e.path == "c").unwrap().is_dir);
}

#[test]
fn file_becomes_directory() {
    let have = snap(vec![DirEntry::file("a", "1")]);
    let want = snap(vec![DirEntry::dir("a"), DirEntry::file("a/b", "2")]);

    let result = diff(&have, &want);
    assert_eq!(result.remove, vec![DirEntry::file("a", "1")]);
    assert_eq!(result.add, vec![DirEntry::dir("a")]);
}

#[test]
fn directory_becomes_file() {
    let have = snap(vec![DirEntry::dir("a"), DirEntry::file("a/b", "2")]);
    let want = snap(vec![DirEntry::file("a", "1")]);

    let result = diff(&have, &want);
    assert_eq!(result.remove, vec![DirEntry::dir("a")]);
    assert_eq!(result.add, vec![DirEntry::file("a", "1")]);
}

#[test]
fn hash_mismatch_replaces_file() {
    let have = snap(vec![DirEntry::file("a", "a")]);
    let want = snap(vec![DirEntry::file("a", "b")]);

    let result = diff(&have, &want);
    assert_eq!(result.add, vec![DirEntry::file("a", "b")]);
    assert!(result.remove.is_empty());
}

#[test]
fn removed_subtree_collapses_to_directory() {
    let have = snap(vec![
        DirEntry::file("main.go", "m"),
        DirEntry::dir("vendor"),
        DirEntry::dir("vendor/lib"),
        DirEntry::file("vendor/lib/a.go", "1"),
        DirEntry::file("vendor/lib/b.go", "2"),
        DirEntry::file("vendor/c.go", "3"),
    ]);
    let want = snap(vec![DirEntry::file("main.go", "m")]);

    let result = diff(&have, &want);
    assert!(result.add.is_empty());
    assert_eq!(paths(&result.remove), vec!["vendor"]);
}

#[test]
fn identical_directories_are_consistent() {
    let have = snap(vec![DirEntry::dir("d"), DirEntry::file("d/x", "1")]);
    let want = snap(vec![DirEntry::dir("d"), DirEntry::file("d/x", "2")]);

    let result = diff(&have, &want);
    assert!(result.remove.is_empty());
    assert_eq!(paths(&result.add), vec!["d/x"]);
}

#[test]
fn unsorted_inputs_are_sorted_first() {
    let have = snap(vec![DirEntry::file("z", "1"), DirEntry::file("a", "1")]);
    let want = snap(vec![DirEntry::file("a", "1"), DirEntry::file("m", "2"), DirEntry::file("z", "1")]);

    let result = diff(&have, &want);
    assert_eq!(paths(&result.add), vec!["m"]);
    assert!(result.remove.is_empty());
}

#[test]
fn sibling_with_shared_prefix_is_not_collapsed() {
    let have = snap(vec![]);
    let want = snap(vec![DirEntry::dir("a"), DirEntry::file("a/x", "1"), DirEntry::file("ab", "2")]);

    let result = diff(&have, &want);
    assert_eq!(paths(&result.add), vec!["a", "ab"]);
}

#[test]
fn add_and_remove_share_path_only_on_type_swap() {
    let have = snap(vec![DirEntry::file("a", "1"), DirEntry::file("b", "1")]);
    let want = snap(vec![DirEntry::dir("a"), DirEntry::file("b", "2")]);

    let result = diff(&have, &want);
    assert_eq!(paths(&result.remove), vec!["a"]);
    assert_eq!(paths(&result.add), vec!["a", "b"]);
}

// --- property tests ---

/// Build a consistent tree from arbitrary file paths: every proper prefix
/// becomes a directory, and a file whose path is also a directory is dropped.
fn build_tree(files: Vec<(Vec<u8>, u8)>) -> DirectorySnapshot {
    let mut dirs = BTreeMap::new();
    let mut leaves = BTreeMap::new();
    for (segments, hash) in files {
        let names: Vec<String> = segments.iter().map(|s| format!("n{}", s)).collect();
        for depth in 1..names.len() {
            let dir = names[..depth].join("/");
            dirs.insert(dir.clone(), DirEntry::dir(dir));
        }
        let path = names.join("/");
        leaves.insert(path.clone(), DirEntry::file(path, format!("h{}", hash)));
    }
    leaves.retain(|path, _| !dirs.contains_key(path));
    dirs.into_values().chain(leaves.into_values()).collect()
}

fn arb_tree() -> impl Strategy<Value = DirectorySnapshot> {
    prop::collection::vec((prop::collection::vec(0u8..3, 1..4), 0u8..3), 0..12)
        .prop_map(build_tree)
}

/// Apply a diff to a path map the way the daemon + uploader would: delete
/// removed subtrees, then materialize added entries (re-walking `want`
/// beneath added directories).
fn apply(have: &DirectorySnapshot, want: &DirectorySnapshot, result: &DiffResult) -> BTreeMap<String, DirEntry> {
    let mut tree: BTreeMap<String, DirEntry> =
        have.iter().map(|e| (e.path.clone(), e.clone())).collect();

    for removed in &result.remove {
        tree.retain(|path, entry| path != &removed.path && !entry.is_within(removed));
    }
    for added in &result.add {
        if !added.is_dir {
            // Overwriting a file is only valid when nothing else sits there
            tree.retain(|path, _| path != &added.path);
        }
        tree.insert(added.path.clone(), added.clone());
        if added.is_dir {
            for entry in want.iter().filter(|e| e.is_within(added)) {
                tree.insert(entry.path.clone(), entry.clone());
            }
        }
    }
    tree
}

proptest! {
    #[test]
    fn diff_with_self_is_empty(tree in arb_tree()) {
        let result = diff(&tree, &tree);
        prop_assert!(result.is_empty(), "{:?}", result);
    }

    #[test]
    fn applying_diff_reaches_want(have in arb_tree(), want in arb_tree()) {
        let result = diff(&have, &want);
        let applied = apply(&have, &want, &result);
        let expected: BTreeMap<String, DirEntry> =
            want.iter().map(|e| (e.path.clone(), e.clone())).collect();
        prop_assert_eq!(applied, expected);
    }

    #[test]
    fn output_lists_are_collapsed(have in arb_tree(), want in arb_tree()) {
        let result = diff(&have, &want);
        for list in [&result.add, &result.remove] {
            for a in list.iter() {
                for b in list.iter() {
                    prop_assert!(!a.is_within(b), "{} nested under {}", a.path, b.path);
                }
            }
        }
    }
}
