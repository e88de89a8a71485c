// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for specs: an in-process daemon and a scratch app directory.

use std::path::PathBuf;
use std::time::Duration;

pub use hp_cli::commands::deploy::deploy;
pub use hp_cli::{ClientError, ControlClient, ExitError};
pub use hp_core::BuildState;
pub use hp_wire::ErrorKind;
use hp_daemon::{serve, startup, Config};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const SPEC_WAIT_MAX_MS: u64 = 5_000;

/// Config whose compile step marks `app.sh` executable.
pub const SCRIPT_CONFIG: &str = r#"runtime = "custom"

[build]
command = ["chmod", "+x", "app.sh"]
artifact = "app.sh"

[env_variables]
GREETING = "hello from config"
"#;

pub const APP_SCRIPT: &str = "#!/bin/sh\necho \"$GREETING on $PORT\"\nexec sleep 60\n";

pub struct Daemon {
    _state: TempDir,
    pub control: String,
    pub proxy: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Daemon {
    pub async fn start() -> Self {
        Self::start_with_token(None).await
    }

    pub async fn start_with_token(token: Option<&str>) -> Self {
        let state = tempfile::tempdir().unwrap();
        let mut config = Config::for_state_dir(state.path().to_path_buf());
        config.auth_token = token.map(String::from);
        config.ipc_timeout = Duration::from_secs(10);

        let result = startup(&config).await.unwrap();
        let control = result.control.local_addr().unwrap().to_string();
        let proxy = result.proxy.local_addr().unwrap().to_string();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(serve(result, cancel.clone()));

        Self { _state: state, control, proxy, cancel, task }
    }

    pub fn client(&self) -> ControlClient {
        ControlClient::new(self.control.clone(), None)
    }

    /// Stop serving and wait for the running app to be killed.
    pub async fn stop(self) {
        self.cancel.cancel();
        tokio::time::timeout(Duration::from_millis(SPEC_WAIT_MAX_MS), self.task)
            .await
            .expect("daemon did not shut down")
            .unwrap();
    }
}

/// A scratch application directory containing `hotpush.toml`.
pub struct App {
    dir: TempDir,
}

impl App {
    pub fn new(config: &str) -> Self {
        let app = Self { dir: tempfile::tempdir().unwrap() };
        app.file("hotpush.toml", config);
        app
    }

    /// The standard shell app with a couple of source files.
    pub fn script() -> Self {
        let app = Self::new(SCRIPT_CONFIG);
        app.file("app.sh", APP_SCRIPT);
        app.file("src/a.txt", "alpha");
        app.file("src/b.txt", "beta");
        app
    }

    pub fn file(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    pub fn remove(&self, rel: &str) {
        std::fs::remove_file(self.dir.path().join(rel)).unwrap();
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("hotpush.toml")
    }
}

/// Send a bare GET to `addr` and return the whole response.
pub async fn http_get(addr: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

/// Poll the daemon's status until `check` accepts the log, or give up.
pub async fn wait_for_log(client: &ControlClient, check: impl Fn(&str) -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(SPEC_WAIT_MAX_MS);
    while tokio::time::Instant::now() < deadline {
        if let Ok(Some(status)) = client.status().await {
            if check(&status.log) {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
