// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-channel authentication specs.

use crate::prelude::*;

const TOKEN: &str = "s3cret";

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let daemon = Daemon::start_with_token(Some(TOKEN)).await;

    let err = daemon.client().status().await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));

    daemon.stop().await;
}

#[tokio::test]
async fn wrong_token_cannot_deploy() {
    let daemon = Daemon::start_with_token(Some(TOKEN)).await;
    let app = App::script();
    let client = ControlClient::new(daemon.control.clone(), Some("guess".to_string()));

    let err = deploy(&client, &app.config_path(), 2).await.unwrap_err();
    let rejected = err.downcast_ref::<ClientError>().expect("ClientError");
    assert_eq!(rejected.kind(), Some(ErrorKind::Unauthorized));

    daemon.stop().await;
}

#[tokio::test]
async fn matching_token_is_accepted() {
    let daemon = Daemon::start_with_token(Some(TOKEN)).await;
    let client = ControlClient::new(daemon.control.clone(), Some(TOKEN.to_string()));

    client.hello().await.unwrap();
    assert!(client.status().await.unwrap().is_none());

    daemon.stop().await;
}
