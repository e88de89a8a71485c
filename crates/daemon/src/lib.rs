// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! hotpush daemon library
//!
//! Owns the working directory and the single build slot, and serves the
//! control protocol and the public traffic proxy.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod build;
pub mod env;
pub mod lifecycle;
pub mod listener;
pub mod logging;
pub mod proxy;
pub mod slot;
pub mod workdir;

pub use build::{BuildError, BuildRecord};
pub use lifecycle::{serve, startup, Config, LifecycleError, StartupResult};
pub use slot::{BuildSlot, Forward, SlotError};
