// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control protocol between the `hp` CLI and the `hpd` daemon.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload. A
//! `PutFile` request is followed by one more frame carrying the raw file
//! bytes.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod request;
mod response;
mod types;
mod wire;

pub use request::Request;
pub use response::Response;
pub use types::{BuildStatus, ErrorKind};
pub use wire::{decode, encode, read_message, write_message, ProtocolError, MAX_MESSAGE_SIZE};
pub use wire::{read_request, read_response, write_request, write_response};

/// Protocol version; client and daemon must match exactly.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");
