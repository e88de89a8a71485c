// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compile command, artifact location, and library search path per runtime.

use std::path::{Path, PathBuf};

use hp_core::{AppConfig, ConfigError};

use super::environ::{append_search_path, get_env, set_env, EnvList};

/// Directory under the working directory that holds vendored Go packages.
pub const GO_PATH_DIR: &str = "_gopath";

/// How to compile and launch one runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub program: String,
    pub args: Vec<String>,
    /// Executable produced by the compile step, relative to the working directory
    pub artifact: PathBuf,
    /// Search-path variable pointed at `library_dir` inside the working directory
    pub library_var: &'static str,
    pub library_dir: String,
}

impl Toolchain {
    pub fn for_config(config: &AppConfig) -> Result<Self, ConfigError> {
        match config.runtime.as_str() {
            "go" => Ok(Self {
                program: "go".to_string(),
                args: ["build", "-tags", "appenginevm", "-o", "a.out"].map(String::from).to_vec(),
                artifact: PathBuf::from("a.out"),
                library_var: "GOPATH",
                library_dir: GO_PATH_DIR.to_string(),
            }),
            "custom" => {
                let build = config.build.as_ref().ok_or(ConfigError::MissingBuild)?;
                let (program, args) =
                    build.command.split_first().ok_or(ConfigError::EmptyBuildCommand)?;
                if build.artifact.is_empty() {
                    return Err(ConfigError::EmptyArtifact);
                }
                Ok(Self {
                    program: program.clone(),
                    args: args.to_vec(),
                    artifact: PathBuf::from(&build.artifact),
                    library_var: "LD_LIBRARY_PATH",
                    library_dir: build.library_dir.clone(),
                })
            }
            "" => Err(ConfigError::MissingRuntime),
            other => Err(ConfigError::UnsupportedRuntime(other.to_string())),
        }
    }

    pub fn library_path(&self, work_dir: &Path) -> String {
        work_dir.join(&self.library_dir).to_string_lossy().into_owned()
    }

    /// Compiler environment: the inherited search path is extended, not replaced.
    pub fn compile_env(&self, work_dir: &Path, base: EnvList) -> EnvList {
        let mut env = base;
        let value = append_search_path(get_env(&env, self.library_var), &self.library_path(work_dir));
        set_env(&mut env, self.library_var, value);
        env
    }

    /// Search-path binding for the running app.
    pub fn run_binding(&self, work_dir: &Path) -> (&'static str, String) {
        (self.library_var, self.library_path(work_dir))
    }
}

#[cfg(test)]
#[path = "toolchain_tests.rs"]
mod tests;
