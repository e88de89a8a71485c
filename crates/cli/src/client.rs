// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-protocol client for the hotpush daemon.
//!
//! Every call opens a fresh TCP connection, performs the Hello handshake,
//! sends one request, and reads one response.

use std::time::Duration;

use hp_core::{BuildId, DirectorySnapshot};
use hp_wire::{self as wire, BuildStatus, ErrorKind, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// Daemon control address used when `--target` is not given.
pub const DEFAULT_TARGET: &str = "127.0.0.1:7070";

/// Frame timeout for ordinary requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Wait for a `StartBuild` response, which includes the whole compile.
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(600);

/// Errors from talking to the daemon
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to daemon at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("daemon version {daemon} does not match client version {client}")]
    VersionMismatch { daemon: String, client: String },

    #[error("{message}")]
    Rejected { kind: ErrorKind, message: String, log: Option<String> },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ClientError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ClientError::Rejected { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Result of a create request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub build_id: BuildId,
    pub need_files: Vec<String>,
    pub removed: usize,
}

/// Result of a start request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    pub build_id: BuildId,
    pub address: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ControlClient {
    addr: String,
    token: Option<String>,
    timeout: Duration,
}

impl ControlClient {
    pub fn new(addr: impl Into<String>, token: Option<String>) -> Self {
        Self { addr: addr.into(), token, timeout: DEFAULT_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Connect and complete the Hello handshake.
    async fn open(&self) -> Result<(OwnedReadHalf, OwnedWriteHalf), ClientError> {
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| ClientError::Protocol(ProtocolError::Timeout))?
            .map_err(|source| ClientError::Connect { addr: self.addr.clone(), source })?;
        let (mut reader, mut writer) = stream.into_split();

        let hello = Request::Hello {
            version: wire::PROTOCOL_VERSION.to_string(),
            token: self.token.clone(),
        };
        wire::write_request(&mut writer, &hello, self.timeout).await?;
        match wire::read_response(&mut reader, self.timeout).await? {
            Response::Hello { version } if version == wire::PROTOCOL_VERSION => Ok((reader, writer)),
            Response::Hello { version } => Err(ClientError::VersionMismatch {
                daemon: version,
                client: wire::PROTOCOL_VERSION.to_string(),
            }),
            other => Err(reject(other)),
        }
    }

    /// Send one request, optionally followed by a raw body frame.
    async fn call(
        &self,
        request: &Request,
        body: Option<&[u8]>,
        response_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let (mut reader, mut writer) = self.open().await?;
        wire::write_request(&mut writer, request, self.timeout).await?;
        if let Some(body) = body {
            tokio::time::timeout(self.timeout, wire::write_message(&mut writer, body))
                .await
                .map_err(|_| ProtocolError::Timeout)??;
        }
        let response = wire::read_response(&mut reader, response_timeout).await?;
        match response {
            Response::Error { .. } => Err(reject(response)),
            other => Ok(other),
        }
    }

    /// Check that the daemon is reachable and speaks our version.
    pub async fn hello(&self) -> Result<(), ClientError> {
        self.open().await.map(|_| ())
    }

    pub async fn create_build(
        &self,
        config: String,
        files: DirectorySnapshot,
    ) -> Result<Created, ClientError> {
        let request = Request::CreateBuild { config, files };
        match self.call(&request, None, self.timeout).await? {
            Response::BuildCreated { build_id, need_files, removed } => {
                Ok(Created { build_id, need_files, removed })
            }
            other => Err(reject(other)),
        }
    }

    pub async fn put_file(
        &self,
        build_id: &BuildId,
        path: &str,
        hash: &str,
        content: &[u8],
    ) -> Result<(), ClientError> {
        let request = Request::PutFile {
            build_id: build_id.clone(),
            path: path.to_string(),
            hash: hash.to_string(),
            size: content.len() as u64,
        };
        match self.call(&request, Some(content), self.timeout).await? {
            Response::FileWritten { .. } => Ok(()),
            other => Err(reject(other)),
        }
    }

    pub async fn start_build(&self, build_id: Option<&BuildId>) -> Result<Started, ClientError> {
        let request = Request::StartBuild { build_id: build_id.cloned() };
        match self.call(&request, None, BUILD_TIMEOUT.max(self.timeout)).await? {
            Response::BuildStarted { build_id, address, message } => {
                Ok(Started { build_id, address, message })
            }
            other => Err(reject(other)),
        }
    }

    pub async fn status(&self) -> Result<Option<BuildStatus>, ClientError> {
        match self.call(&Request::Status, None, self.timeout).await? {
            Response::Status { build } => Ok(build.map(|b| *b)),
            other => Err(reject(other)),
        }
    }

    pub async fn stop_build(&self, build_id: Option<&BuildId>) -> Result<(), ClientError> {
        let request = Request::StopBuild { build_id: build_id.cloned() };
        match self.call(&request, None, self.timeout).await? {
            Response::Ok => Ok(()),
            other => Err(reject(other)),
        }
    }
}

fn reject(response: Response) -> ClientError {
    match response {
        Response::Error { kind, message, log } => ClientError::Rejected { kind, message, log },
        other => ClientError::UnexpectedResponse(format!("{other:?}")),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
