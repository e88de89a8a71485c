// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Public traffic proxy.
//!
//! Each HTTP request is routed on its own. It goes to the running app when
//! there is one, and otherwise gets a plain-text 503 carrying the build
//! state and log. Every response leaving the proxy carries the daemon
//! version in `X-Hotpush`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use hp_wire::PROTOCOL_VERSION;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::slot::{BuildSlot, Forward};

pub const VERSION_HEADER: &str = "x-hotpush";

/// Request bodies are buffered before forwarding.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Connection-scoped headers that must not cross the proxy.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Clone)]
struct ProxyState {
    slot: Arc<BuildSlot>,
    client: reqwest::Client,
}

pub struct Proxy {
    listener: TcpListener,
    state: ProxyState,
}

impl Proxy {
    pub fn new(listener: TcpListener, slot: Arc<BuildSlot>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { listener, state: ProxyState { slot, client } })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self, cancel: CancellationToken) {
        let app = Router::new().fallback(handle).with_state(self.state);
        if let Err(e) =
            axum::serve(self.listener, app).with_graceful_shutdown(cancel.cancelled_owned()).await
        {
            error!("proxy server error: {}", e);
        }
        info!("proxy stopped");
    }
}

async fn handle(State(state): State<ProxyState>, request: Request) -> Response {
    let mut response = match state.slot.forward_target().await {
        Forward::Upstream(address) => forward(&state.client, &address, request).await,
        Forward::Unavailable(text) => plain(StatusCode::SERVICE_UNAVAILABLE, text),
    };
    response.headers_mut().insert(VERSION_HEADER, HeaderValue::from_static(PROTOCOL_VERSION));
    response
}

async fn forward(client: &reqwest::Client, address: &str, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    let url = format!("http://{address}{path}");
    debug!(method = %parts.method, %url, "forwarding");

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            return plain(StatusCode::PAYLOAD_TOO_LARGE, format!("could not read request body: {e}\n"))
        }
    };
    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);

    let mut upstream = client.request(parts.method, url).headers(headers);
    if !body.is_empty() {
        upstream = upstream.body(body);
    }

    match upstream.send().await {
        Ok(reply) => {
            let status = reply.status();
            let mut headers = reply.headers().clone();
            strip_hop_by_hop(&mut headers);

            let mut response = Response::new(Body::from_stream(reply.bytes_stream()));
            *response.status_mut() = status;
            *response.headers_mut() = headers;
            response
        }
        Err(e) => {
            warn!(%address, error = %e, "app unreachable");
            plain(StatusCode::BAD_GATEWAY, format!("could not reach app at {address}: {e}\n"))
        }
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

fn plain(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
