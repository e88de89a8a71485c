// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use hp_wire::BuildStatus;

use crate::color;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Human-readable status block: id, state, address, then the log.
pub fn format_status(status: &BuildStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", color::header("Build"), status.build_id));
    out.push_str(&format!("  {} {}\n", color::context("state:  "), status.state));
    out.push_str(&format!("  {} {}\n", color::context("runtime:"), status.runtime));
    if let Some(vm) = &status.vm {
        out.push_str(&format!("  {} {}\n", color::context("vm:     "), vm));
    }
    if let Some(address) = &status.address {
        out.push_str(&format!("  {} {}\n", color::context("address:"), address));
    }
    if !status.log.is_empty() {
        out.push_str(&format_log(&status.log));
    }
    out
}

/// Framed build/app output.
pub fn format_log(log: &str) -> String {
    let mut out = format!("╭── {} ──\n", color::header("log"));
    for line in log.lines() {
        out.push_str(&color::muted(line));
        out.push('\n');
    }
    out.push_str(&format!("╰── {} ──\n", color::header("end log")));
    out
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
