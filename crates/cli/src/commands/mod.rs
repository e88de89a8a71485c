// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subcommand handlers.

pub mod deploy;
pub mod status;
pub mod stop;
