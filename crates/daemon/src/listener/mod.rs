// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control listener.
//!
//! Each TCP connection carries a Hello handshake followed by exactly one
//! request. `PutFile` requests are followed by one raw frame holding the
//! file bytes.

use std::sync::Arc;
use std::time::Duration;

use hp_wire::{self as wire, ErrorKind, ProtocolError, Request, Response, PROTOCOL_VERSION};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::slot::{BuildSlot, SlotError};

/// Shared daemon context for all request handlers.
pub struct ListenCtx {
    pub slot: Arc<BuildSlot>,
    /// When set, clients must present this token in the Hello handshake.
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

/// Listener task for accepting control connections.
pub struct Listener {
    tcp: TcpListener,
    ctx: Arc<ListenCtx>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl Listener {
    pub fn new(tcp: TcpListener, ctx: Arc<ListenCtx>) -> Self {
        Self { tcp, ctx }
    }

    /// Accept connections until `cancel` fires, spawning a task for each.
    pub async fn run(self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.tcp.accept() => match result {
                    Ok((stream, addr)) => {
                        debug!("control connection from {}", addr);
                        let ctx = Arc::clone(&self.ctx);
                        tokio::spawn(async move {
                            let (reader, writer) = stream.into_split();
                            if let Err(e) = handle_connection(reader, writer, &ctx).await {
                                log_connection_error(e);
                            }
                        });
                    }
                    Err(e) => error!("TCP accept error: {}", e),
                },
            }
        }
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => debug!("Client disconnected"),
        ConnectionError::Protocol(ProtocolError::Timeout) => warn!("Connection timeout"),
        _ => error!("Connection error: {}", e),
    }
}

/// Handle a single client connection.
///
/// Requests are not raced against client disconnect: a compile holds the
/// slot's write lock and must run to completion to leave the build in a
/// consistent state.
pub async fn handle_connection<R, W>(
    mut reader: R,
    mut writer: W,
    ctx: &ListenCtx,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let hello = wire::read_request(&mut reader, ctx.timeout).await?;
    let Request::Hello { token, version } = hello else {
        let response = Response::error(ErrorKind::BadRequest, "connections must start with Hello");
        wire::write_response(&mut writer, &response, ctx.timeout).await?;
        return Ok(());
    };
    if let Some(expected) = &ctx.auth_token {
        if token.as_deref() != Some(expected.as_str()) {
            warn!(client_version = %version, "rejected control connection: bad token");
            let response = Response::error(ErrorKind::Unauthorized, "unauthorized");
            wire::write_response(&mut writer, &response, ctx.timeout).await?;
            return Ok(());
        }
    }
    let greeting = Response::Hello { version: PROTOCOL_VERSION.to_string() };
    wire::write_response(&mut writer, &greeting, ctx.timeout).await?;

    let request = match wire::read_request(&mut reader, ctx.timeout).await {
        Ok(request) => request,
        // Hello-only connections are version probes
        Err(ProtocolError::ConnectionClosed) => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    if matches!(request, Request::Status) {
        debug!(request = request.name(), "received request");
    } else {
        info!(request = request.name(), "received request");
    }

    let response = match request {
        Request::PutFile { build_id, path, hash, size } => {
            let body = read_body(&mut reader, ctx.timeout).await?;
            if body.len() as u64 != size {
                Response::error(
                    ErrorKind::BadRequest,
                    format!("{path}: expected {size} bytes, got {}", body.len()),
                )
            } else {
                match ctx.slot.put_file(&build_id, &path, &hash, &body).await {
                    Ok(()) => Response::FileWritten { path },
                    Err(e) => error_response(e),
                }
            }
        }
        other => handle_request(other, ctx).await,
    };

    debug!("Sending response: {:?}", response);
    wire::write_response(&mut writer, &response, ctx.timeout).await?;
    Ok(())
}

async fn read_body<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Vec<u8>, ProtocolError> {
    tokio::time::timeout(timeout, wire::read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

/// Handle a request that carries no trailing body.
async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Hello { .. } => Response::Hello { version: PROTOCOL_VERSION.to_string() },

        Request::CreateBuild { config, files } => match ctx.slot.create(&config, files).await {
            Ok(created) => Response::BuildCreated {
                build_id: created.build_id,
                need_files: created.need_files,
                removed: created.removed.len(),
            },
            Err(e) => error_response(e),
        },

        Request::PutFile { path, .. } => {
            Response::error(ErrorKind::BadRequest, format!("{path}: missing file body"))
        }

        Request::StartBuild { build_id } => match ctx.slot.start_build(build_id.as_ref()).await {
            Ok(started) => Response::BuildStarted {
                message: format!("Build {} running at {}", started.build_id, started.address),
                build_id: started.build_id,
                address: started.address,
            },
            Err(e) => error_response(e),
        },

        Request::Status => Response::Status { build: ctx.slot.status().await.map(Box::new) },

        Request::StopBuild { build_id } => match ctx.slot.stop(build_id.as_ref()).await {
            Ok(()) => Response::Ok,
            Err(e) => error_response(e),
        },
    }
}

fn error_response(e: SlotError) -> Response {
    warn!(error = %e, "request failed");
    Response::Error { kind: e.kind(), message: e.to_string(), log: e.log() }
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
