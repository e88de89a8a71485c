// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application config (`hotpush.toml`).
//!
//! The client sends the file verbatim; the daemon parses it to pick a
//! toolchain and the environment for the running app.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runtimes the daemon knows how to compile.
pub const SUPPORTED_RUNTIMES: &[&str] = &["go", "custom"];

/// Errors from parsing or validating an application config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing config")]
    Empty,
    #[error("missing runtime")]
    MissingRuntime,
    #[error("unsupported runtime '{0}' (expected one of: go, custom)")]
    UnsupportedRuntime(String),
    #[error("runtime 'custom' requires a [build] section")]
    MissingBuild,
    #[error("[build] command must not be empty")]
    EmptyBuildCommand,
    #[error("[build] artifact must not be empty")]
    EmptyArtifact,
}

/// Parsed application config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Toolchain name (`go` or `custom`)
    #[serde(default)]
    pub runtime: String,
    /// VM type; informational, reported in status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm: Option<String>,
    /// Extra environment for the running app, in declaration order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env_variables: IndexMap<String, String>,
    /// Compile command for the `custom` runtime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSection>,
}

/// `[build]` section for the `custom` runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSection {
    /// Program and arguments, run in the working directory
    pub command: Vec<String>,
    /// Path of the produced executable, relative to the working directory
    pub artifact: String,
    /// Directory exposed to the app via `LD_LIBRARY_PATH`
    #[serde(default = "default_library_dir")]
    pub library_dir: String,
}

fn default_library_dir() -> String {
    "lib".to_string()
}

impl AppConfig {
    /// Parse and validate config text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Err(ConfigError::Empty);
        }
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runtime.is_empty() {
            return Err(ConfigError::MissingRuntime);
        }
        if !SUPPORTED_RUNTIMES.contains(&self.runtime.as_str()) {
            return Err(ConfigError::UnsupportedRuntime(self.runtime.clone()));
        }
        if self.runtime == "custom" {
            let build = self.build.as_ref().ok_or(ConfigError::MissingBuild)?;
            if !matches!(build.command.first(), Some(program) if !program.is_empty()) {
                return Err(ConfigError::EmptyBuildCommand);
            }
            if build.artifact.is_empty() {
                return Err(ConfigError::EmptyArtifact);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
