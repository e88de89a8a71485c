// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use hp_core::BuildId;
use serde::{Deserialize, Serialize};

use super::{BuildStatus, ErrorKind};

/// Response from daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success
    Ok,

    /// Version handshake response
    Hello { version: String },

    /// Build allocated; the client must upload `need_files`
    BuildCreated {
        build_id: BuildId,
        /// Paths to upload; a directory means everything beneath it
        need_files: Vec<String>,
        /// Number of stale paths deleted from the working directory
        #[serde(default)]
        removed: usize,
    },

    /// File stored in the working directory
    FileWritten { path: String },

    /// Build compiled and its process spawned
    BuildStarted {
        build_id: BuildId,
        address: String,
        message: String,
    },

    /// Live build status (`None` when nothing was ever deployed)
    Status { build: Option<Box<BuildStatus>> },

    /// Error response
    Error {
        kind: ErrorKind,
        message: String,
        /// Captured build output, when the failure has one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        log: Option<String>,
    },
}

impl Response {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error { kind, message: message.into(), log: None }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
