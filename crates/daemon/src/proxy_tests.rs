// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::routing::{get, post};
use hp_core::{AppConfig, BuildId};

use crate::build::BuildRecord;
use crate::slot::NO_APP_MESSAGE;

use super::*;

struct Fixture {
    _dir: tempfile::TempDir,
    slot: Arc<BuildSlot>,
    base: String,
    client: reqwest::Client,
    cancel: CancellationToken,
}

impl Fixture {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let slot = Arc::new(BuildSlot::new(dir.path().join("app")));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let proxy = Proxy::new(listener, Arc::clone(&slot)).unwrap();
        let base = format!("http://{}", proxy.local_addr().unwrap());
        let cancel = CancellationToken::new();
        tokio::spawn(proxy.run(cancel.clone()));
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        Self { _dir: dir, slot, base, client, cancel }
    }

    /// Pretend an app is running at `address`.
    async fn running_at(&self, address: &str) {
        let config = AppConfig { runtime: "go".to_string(), ..Default::default() };
        let mut record =
            BuildRecord::new(BuildId::new(), self.slot.work_dir().to_path_buf(), config).unwrap();
        record.force_running(address);
        self.slot.install(record).await;
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(format!("{}{}", self.base, path)).send().await.unwrap()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Stand-in app: greets on `/hello`, echoes POST bodies on `/echo`.
async fn stand_in_app() -> String {
    let app = Router::new()
        .route("/hello", get(|| async { ([("x-app", "stand-in")], "hello from app") }))
        .route("/echo", post(|body: String| async move { format!("echo: {body}") }));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

fn version_of(response: &reqwest::Response) -> Option<&str> {
    response.headers().get(VERSION_HEADER).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn no_build_answers_503_with_version() {
    let fx = Fixture::new().await;
    let response = fx.get("/").await;

    assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(version_of(&response), Some(PROTOCOL_VERSION));
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/plain; charset=utf-8"
    );
    assert_eq!(response.text().await.unwrap(), NO_APP_MESSAGE);
}

#[tokio::test]
async fn forwarded_response_keeps_app_headers_and_gains_version() {
    let app = stand_in_app().await;
    let fx = Fixture::new().await;
    fx.running_at(&app).await;

    let response = fx.get("/hello").await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(version_of(&response), Some(PROTOCOL_VERSION));
    assert_eq!(response.headers().get("x-app").unwrap(), "stand-in");
    assert_eq!(response.text().await.unwrap(), "hello from app");
}

#[tokio::test]
async fn request_body_reaches_the_app() {
    let app = stand_in_app().await;
    let fx = Fixture::new().await;
    fx.running_at(&app).await;

    let response =
        fx.client.post(format!("{}/echo", fx.base)).body("ping").send().await.unwrap();

    assert_eq!(response.text().await.unwrap(), "echo: ping");
}

#[tokio::test]
async fn app_status_codes_pass_through() {
    let app = stand_in_app().await;
    let fx = Fixture::new().await;
    fx.running_at(&app).await;

    let response = fx.get("/missing").await;

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    assert_eq!(version_of(&response), Some(PROTOCOL_VERSION));
}

#[tokio::test]
async fn routing_is_decided_per_request_on_a_kept_alive_connection() {
    let app = stand_in_app().await;
    let fx = Fixture::new().await;

    // The client pools connections, so both requests share one socket
    let before = fx.get("/hello").await;
    assert_eq!(before.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    before.text().await.unwrap();

    fx.running_at(&app).await;
    let after = fx.get("/hello").await;
    assert_eq!(after.status(), reqwest::StatusCode::OK);
    assert_eq!(after.text().await.unwrap(), "hello from app");
}

#[tokio::test]
async fn unreachable_app_answers_502() {
    let closed = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
    let fx = Fixture::new().await;
    fx.running_at(&closed.to_string()).await;

    let response = fx.get("/").await;

    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
    assert_eq!(version_of(&response), Some(PROTOCOL_VERSION));
    assert!(response.text().await.unwrap().contains("could not reach app"));
}

#[test]
fn hop_by_hop_headers_are_stripped() {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
    headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));

    strip_hop_by_hop(&mut headers);

    assert_eq!(headers.len(), 1);
    assert!(headers.contains_key(header::CONTENT_TYPE));
}
