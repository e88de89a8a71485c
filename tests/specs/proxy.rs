// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proxy specs: what the front door answers when no app is serving.

use crate::prelude::*;

#[tokio::test]
async fn proxy_without_a_build_explains_how_to_deploy() {
    let daemon = Daemon::start().await;

    let response = http_get(&daemon.proxy).await;
    assert!(response.starts_with("HTTP/1.1 503"), "{response}");
    assert!(response.to_ascii_lowercase().contains("\r\nx-hotpush: "), "{response}");
    assert!(response.ends_with("No app to run. Use `hp deploy` to upload the application code."), "{response}");

    daemon.stop().await;
}

#[tokio::test]
async fn proxy_after_compile_failure_shows_state_and_log() {
    let daemon = Daemon::start().await;
    let app = App::new(
        r#"runtime = "custom"

[build]
command = ["sh", "-c", "echo undefined: handler >&2; exit 1"]
artifact = "app"
"#,
    );
    let client = daemon.client();
    deploy(&client, &app.config_path(), 2).await.unwrap_err();

    let response = http_get(&daemon.proxy).await;
    let body = response.split("\r\n\r\n").nth(1).unwrap_or_default();
    similar_asserts::assert_eq!(body, "state: fetching\nundefined: handler\n");

    daemon.stop().await;
}

#[tokio::test]
async fn proxy_after_stop_reports_stopped() {
    let daemon = Daemon::start().await;
    let app = App::script();
    let client = daemon.client();
    deploy(&client, &app.config_path(), 4).await.unwrap();
    client.stop_build(None).await.unwrap();

    let response = http_get(&daemon.proxy).await;
    assert!(response.starts_with("HTTP/1.1 503"), "{response}");
    assert!(response.contains("state: stopped"), "{response}");

    daemon.stop().await;
}
