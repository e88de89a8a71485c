// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use hp_core::{BuildId, DirectorySnapshot};
use serde::{Deserialize, Serialize};

/// Request from CLI to daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Version handshake; always the first request on a connection
    Hello {
        version: String,
        /// Shared secret, checked when the daemon has one configured
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },

    /// Allocate a new build and diff the working directory against `files`
    CreateBuild {
        /// Application config text (`hotpush.toml`)
        config: String,
        /// Client's snapshot of the app directory
        files: DirectorySnapshot,
    },

    /// Write one file into the working directory.
    ///
    /// Followed on the wire by a raw frame of exactly `size` bytes.
    PutFile {
        build_id: BuildId,
        /// Destination path relative to the working directory
        path: String,
        /// Hex digest of the content, verified by the daemon
        hash: String,
        size: u64,
    },

    /// Compile and start the live build
    StartBuild {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        build_id: Option<BuildId>,
    },

    /// Report state, address and log of the live build
    Status,

    /// Kill the running build
    StopBuild {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        build_id: Option<BuildId>,
    },
}

impl Request {
    /// Short name for logging without dumping payloads.
    pub fn name(&self) -> &'static str {
        match self {
            Request::Hello { .. } => "hello",
            Request::CreateBuild { .. } => "create_build",
            Request::PutFile { .. } => "put_file",
            Request::StartBuild { .. } => "start_build",
            Request::Status => "status",
            Request::StopBuild { .. } => "stop_build",
        }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
