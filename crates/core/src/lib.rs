// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hp-core: shared types for the hotpush daemon and CLI
//!
//! Directory snapshots, the tree differ, build identity/state, and the
//! application config format.

pub mod macros;

pub mod build;
pub mod config;
pub mod diff;
pub mod snapshot;

pub use build::{BuildId, BuildState};
pub use config::{AppConfig, BuildSection, ConfigError};
pub use diff::{diff, DiffResult};
pub use snapshot::{hash_bytes, hash_file, snapshot, DirEntry, DirectorySnapshot, SnapshotError};
