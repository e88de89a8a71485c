// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Payload types shared by several responses.

use hp_core::{BuildId, BuildState};
use serde::{Deserialize, Serialize};

/// Snapshot of the live build for status display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildStatus {
    pub build_id: BuildId,
    pub state: BuildState,
    /// `host:port` of the running app, once started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub runtime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm: Option<String>,
    /// Accumulated compiler and app output
    #[serde(default)]
    pub log: String,
}

/// Machine-readable error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or incomplete request
    BadRequest,
    /// Missing or wrong auth token, or version mismatch
    Unauthorized,
    /// No live build, or a different build id
    NotFound,
    /// Operation not valid in the build's current state
    Conflict,
    /// Uploaded bytes did not match the declared hash
    ChecksumMismatch,
    /// Compiler exited unsuccessfully; `log` holds its output
    CompileFailed,
    /// Filesystem or process failure on the daemon
    Internal,
}

impl ErrorKind {
    /// HTTP-style status code for display.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest | ErrorKind::ChecksumMismatch => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::CompileFailed | ErrorKind::Internal => 500,
        }
    }
}

hp_core::simple_display! {
    ErrorKind {
        BadRequest => "bad request",
        Unauthorized => "unauthorized",
        NotFound => "not found",
        Conflict => "conflict",
        ChecksumMismatch => "checksum mismatch",
        CompileFailed => "compile failed",
        Internal => "internal error",
    }
}
