// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deploy specs: incremental sync, build, and run.

use crate::prelude::*;

#[tokio::test]
async fn first_deploy_uploads_everything_and_runs_the_app() {
    let daemon = Daemon::start().await;
    let app = App::script();
    let client = daemon.client();

    let deployed = deploy(&client, &app.config_path(), 4).await.unwrap();

    // hotpush.toml, app.sh, src/a.txt, src/b.txt
    assert_eq!(deployed.uploaded.sent, 4);
    assert_eq!(deployed.removed, 0);
    assert!(deployed.address.starts_with("127.0.0.1:"), "{}", deployed.address);

    let status = client.status().await.unwrap().expect("live build");
    assert_eq!(status.build_id, deployed.build_id);
    assert_eq!(status.state, BuildState::Running);
    assert_eq!(status.address.as_deref(), Some(deployed.address.as_str()));

    let port = deployed.address.rsplit(':').next().unwrap().to_string();
    let expected = format!("hello from config on {port}");
    assert!(wait_for_log(&client, |log| log.contains(&expected)).await, "app never logged {expected}");

    daemon.stop().await;
}

#[tokio::test]
async fn redeploy_of_unchanged_tree_uploads_nothing() {
    let daemon = Daemon::start().await;
    let app = App::script();
    let client = daemon.client();

    let first = deploy(&client, &app.config_path(), 4).await.unwrap();
    let second = deploy(&client, &app.config_path(), 4).await.unwrap();

    assert_eq!(second.uploaded.sent, 0);
    assert_eq!(second.removed, 0);
    assert_ne!(first.build_id, second.build_id);
    assert_eq!(client.status().await.unwrap().unwrap().state, BuildState::Running);

    daemon.stop().await;
}

#[tokio::test]
async fn redeploy_sends_only_changes_and_removes_deleted_paths() {
    let daemon = Daemon::start().await;
    let app = App::script();
    let client = daemon.client();
    deploy(&client, &app.config_path(), 4).await.unwrap();

    app.file("src/a.txt", "alpha, edited");
    app.remove("src/b.txt");
    let deployed = deploy(&client, &app.config_path(), 4).await.unwrap();

    assert_eq!(deployed.uploaded.sent, 1);
    assert_eq!(deployed.removed, 1);

    daemon.stop().await;
}

#[tokio::test]
async fn compile_failure_exits_with_compile_code() {
    let daemon = Daemon::start().await;
    let app = App::new(
        r#"runtime = "custom"

[build]
command = ["sh", "-c", "echo 'syntax error near line 3' >&2; exit 1"]
artifact = "app"
"#,
    );
    let client = daemon.client();

    let err = deploy(&client, &app.config_path(), 2).await.unwrap_err();
    let exit = err.downcast_ref::<ExitError>().expect("ExitError");
    assert_eq!(exit.code, 2);

    let status = client.status().await.unwrap().expect("live build");
    assert_ne!(status.state, BuildState::Running);
    assert!(status.log.contains("syntax error near line 3"), "{}", status.log);

    daemon.stop().await;
}

#[tokio::test]
async fn invalid_config_is_rejected_before_contacting_the_daemon() {
    let daemon = Daemon::start().await;
    let app = App::new("runtime = \"cobol\"\n");
    let client = daemon.client();

    let err = deploy(&client, &app.config_path(), 2).await.unwrap_err();
    assert!(format!("{err:#}").contains("invalid config"), "{err:#}");
    assert!(client.status().await.unwrap().is_none());

    daemon.stop().await;
}

#[tokio::test]
async fn stop_leaves_the_build_stopped() {
    let daemon = Daemon::start().await;
    let app = App::script();
    let client = daemon.client();
    deploy(&client, &app.config_path(), 4).await.unwrap();

    client.stop_build(None).await.unwrap();
    assert_eq!(client.status().await.unwrap().unwrap().state, BuildState::Stopped);

    let err = client.stop_build(None).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Conflict));

    daemon.stop().await;
}
