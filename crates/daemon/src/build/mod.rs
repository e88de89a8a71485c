// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build lifecycle: compile the working directory, run the artifact, stop it.
//!
//! A [`BuildRecord`] owns the child process handle for as long as the
//! record lives. Children are spawned with `kill_on_drop`, so replacing
//! the record in the slot always attempts to terminate the old process.

mod environ;
mod output;
mod toolchain;

pub use environ::{get_env, merge_env, process_env, set_env, EnvList};
pub use output::OutputLog;
pub use toolchain::{Toolchain, GO_PATH_DIR};

use std::path::{Path, PathBuf};
use std::process::Stdio;

use hp_core::{AppConfig, BuildId, BuildState, ConfigError};
use hp_wire::BuildStatus;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Errors from build lifecycle operations
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot {op} a build in state {state}")]
    InvalidState { op: &'static str, state: BuildState },

    #[error("build failed: {status}")]
    Compile { status: String, log: String },

    #[error("could not run binary: {0}")]
    ProcessLaunch(#[source] std::io::Error),

    #[error("tried to stop binary when process not running")]
    NoProcess,
}

/// The single live build: config, working directory, state, and process.
#[derive(Debug)]
pub struct BuildRecord {
    id: BuildId,
    state: BuildState,
    work_dir: PathBuf,
    config: AppConfig,
    toolchain: Toolchain,
    listen_address: Option<String>,
    output: OutputLog,
    child: Option<Child>,
}

impl BuildRecord {
    pub fn new(id: BuildId, work_dir: PathBuf, config: AppConfig) -> Result<Self, ConfigError> {
        let toolchain = Toolchain::for_config(&config)?;
        Ok(Self {
            id,
            state: BuildState::Created,
            work_dir,
            config,
            toolchain,
            listen_address: None,
            output: OutputLog::new(),
            child: None,
        })
    }

    pub fn id(&self) -> &BuildId {
        &self.id
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn listen_address(&self) -> Option<&str> {
        self.listen_address.as_deref()
    }

    pub fn output(&self) -> &OutputLog {
        &self.output
    }

    pub fn is_running(&self) -> bool {
        self.state == BuildState::Running
    }

    /// Mark the record as waiting on uploads. Only meaningful before the first compile.
    pub fn mark_fetching(&mut self) {
        if self.state == BuildState::Created {
            self.state = BuildState::Fetching;
        }
    }

    /// Compile the working directory.
    ///
    /// Combined compiler output lands in the output log. If the compile
    /// fails, or the call is abandoned or unwinds part way, the state
    /// reverts to what it was before so the client can fix the source
    /// and retry.
    pub async fn build(&mut self) -> Result<(), BuildError> {
        if !self.state.can_build() {
            return Err(BuildError::InvalidState { op: "build", state: self.state });
        }
        let building = Transition::begin(&mut self.state, BuildState::Building);
        info!(build_id = %self.id, program = %self.toolchain.program, "compiling");

        match compile(&self.toolchain, &self.work_dir, &self.output).await {
            Ok(()) => {
                building.finish(BuildState::Built);
                info!(build_id = %self.id, "compile succeeded");
                Ok(())
            }
            Err(e) => {
                drop(building);
                warn!(build_id = %self.id, error = %e, "compile failed");
                Err(e)
            }
        }
    }

    /// Launch the compiled artifact on a freshly allocated port.
    ///
    /// The port is found by binding `127.0.0.1:0` and releasing the socket
    /// before the child starts. Another process can claim the port in
    /// between; the app then fails to bind and exits, which `refresh`
    /// reports as `Stopped`.
    pub async fn start(&mut self) -> Result<(), BuildError> {
        if self.state != BuildState::Built {
            return Err(BuildError::InvalidState { op: "start", state: self.state });
        }

        let port = allocate_port().map_err(BuildError::ProcessLaunch)?;
        let address = format!("127.0.0.1:{port}");
        let env = self.run_env(port);
        let artifact = self.work_dir.join(&self.toolchain.artifact);

        let mut child = Command::new(&artifact)
            .current_dir(&self.work_dir)
            .env_clear()
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                self.output.append_line(&format!("could not run {}: {}", artifact.display(), e));
                BuildError::ProcessLaunch(e)
            })?;

        if let Some(out) = child.stdout.take() {
            self.output.pump(out);
        }
        if let Some(err) = child.stderr.take() {
            self.output.pump(err);
        }

        info!(build_id = %self.id, pid = ?child.id(), %address, "app started");
        self.child = Some(child);
        self.listen_address = Some(address);
        self.state = BuildState::Running;
        Ok(())
    }

    /// Environment for the app: process env, then `PORT`, the library
    /// search path, and the config's variables in declaration order.
    pub fn run_env(&self, port: u16) -> EnvList {
        let (library_var, library_path) = self.toolchain.run_binding(&self.work_dir);
        let env = merge_env(
            process_env(),
            [("PORT", port.to_string()), (library_var, library_path)],
        );
        merge_env(env, self.config.env_variables.iter().map(|(k, v)| (k, v.clone())))
    }

    /// Kill the running app.
    ///
    /// A `Running` record without a child handle still moves to `Stopped`
    /// but reports [`BuildError::NoProcess`].
    pub async fn stop(&mut self) -> Result<(), BuildError> {
        if self.state != BuildState::Running {
            return Err(BuildError::InvalidState { op: "stop", state: self.state });
        }

        let Some(mut child) = self.child.take() else {
            warn!(build_id = %self.id, "running build has no process handle");
            self.state = BuildState::Stopped;
            return Err(BuildError::NoProcess);
        };

        if let Ok(Some(status)) = child.try_wait() {
            self.output.append_line(&format!("process exited: {status}"));
            self.state = BuildState::Stopped;
            return Ok(());
        }

        if let Err(e) = child.kill().await {
            self.child = Some(child);
            return Err(BuildError::Io(e));
        }

        info!(build_id = %self.id, "app stopped");
        self.state = BuildState::Stopped;
        Ok(())
    }

    /// Notice a child that exited on its own since the last look.
    pub fn refresh(&mut self) {
        if self.state != BuildState::Running {
            return;
        }
        let Some(child) = self.child.as_mut() else {
            return;
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                info!(build_id = %self.id, %status, "app exited");
                self.output.append_line(&format!("process exited: {status}"));
                self.child = None;
                self.state = BuildState::Stopped;
            }
            Ok(None) => {}
            Err(e) => warn!(build_id = %self.id, error = %e, "could not poll app process"),
        }
    }

    pub fn status(&self) -> BuildStatus {
        BuildStatus {
            build_id: self.id.clone(),
            state: self.state,
            address: self.listen_address.clone(),
            runtime: self.config.runtime.clone(),
            vm: self.config.vm.clone(),
            log: self.output.contents(),
        }
    }

    #[cfg(test)]
    pub(crate) fn force_state(&mut self, state: BuildState) {
        self.state = state;
    }

    #[cfg(test)]
    pub(crate) fn force_running(&mut self, address: &str) {
        self.state = BuildState::Running;
        self.listen_address = Some(address.to_string());
    }
}

/// A state change that rolls back unless explicitly finished.
struct Transition<'a> {
    state: &'a mut BuildState,
    prior: BuildState,
    finished: bool,
}

impl<'a> Transition<'a> {
    fn begin(state: &'a mut BuildState, next: BuildState) -> Self {
        let prior = std::mem::replace(state, next);
        Self { state, prior, finished: false }
    }

    fn finish(mut self, next: BuildState) {
        *self.state = next;
        self.finished = true;
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *self.state = self.prior;
        }
    }
}

async fn compile(toolchain: &Toolchain, work_dir: &Path, output: &OutputLog) -> Result<(), BuildError> {
    let env = toolchain.compile_env(work_dir, process_env());
    let mut cmd = Command::new(&toolchain.program);
    cmd.args(&toolchain.args)
        .current_dir(work_dir)
        .env_clear()
        .envs(env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| {
        let status = format!("could not run {}: {}", toolchain.program, e);
        output.append_line(&status);
        BuildError::Compile { status, log: output.contents() }
    })?;

    let pumps: Vec<_> = [
        child.stdout.take().map(|out| output.pump(out)),
        child.stderr.take().map(|err| output.pump(err)),
    ]
    .into_iter()
    .flatten()
    .collect();

    let status = child.wait().await?;
    for pump in pumps {
        if let Err(e) = pump.await {
            debug!(error = %e, "compiler output pump did not finish");
        }
    }

    if status.success() {
        Ok(())
    } else {
        Err(BuildError::Compile { status: status.to_string(), log: output.contents() })
    }
}

/// Ask the kernel for a free loopback port, then release it.
pub fn allocate_port() -> std::io::Result<u16> {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0))?;
    Ok(listener.local_addr()?.port())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
