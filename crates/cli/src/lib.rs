// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! hp: client side of hotpush.
//!
//! Snapshots the local app directory, asks the daemon what changed,
//! uploads the difference, and triggers the build.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod client;
pub mod color;
pub mod commands;
pub mod exit_error;
pub mod output;
pub mod upload;

pub use client::{ClientError, ControlClient, DEFAULT_TARGET};
pub use exit_error::ExitError;
pub use upload::{upload_all, FileTransport, TransferError, UploadSummary, DEFAULT_UPLOAD_WORKERS};
