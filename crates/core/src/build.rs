// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build identity and lifecycle state.
//!
//! A build is one create → upload → compile → run cycle in the daemon's
//! single build slot. The state machine itself lives in the daemon; this
//! module only defines the vocabulary shared with clients.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a build.
    ///
    /// Allocated fresh on every create request, even though the working
    /// directory is reused across builds.
    pub struct BuildId("bld-");
}

/// Lifecycle state of a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    /// Allocated, working directory already matches the client tree
    #[default]
    Created,
    /// Allocated, waiting for the client to upload needed files
    Fetching,
    /// Compiler is running
    Building,
    /// Compiled artifact is ready to start
    Built,
    /// Artifact process was spawned
    Running,
    /// Process was killed or exited on its own
    Stopped,
}

impl BuildState {
    /// True when a compile may be attempted from this state.
    pub fn can_build(&self) -> bool {
        matches!(self, BuildState::Created | BuildState::Fetching | BuildState::Built)
    }
}

crate::simple_display! {
    BuildState {
        Created => "created",
        Fetching => "fetching",
        Building => "building",
        Built => "built",
        Running => "running",
        Stopped => "stopped",
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
