//! Socket-file lifecycle: stale-file recovery, clean teardown, restart.

use serde_json::json;

use skillwire::message::METHOD_NOT_FOUND;
use skillwire::WireError;

use super::test_helpers::{register_echo, wire_pair};

/// Starting over a stale socket file left by an unclean prior run succeeds
/// instead of failing with an address-in-use error.
#[tokio::test]
async fn start_over_stale_socket_file_succeeds() {
    let (_dir, mut server, client) = wire_pair("RevivedSkill");
    register_echo(&mut server);

    std::fs::write(server.socket_path(), b"").expect("plant stale socket file");

    server.start().await.expect("start must replace the stale file");

    let result = client
        .call("echo", &[json!("back")])
        .await
        .expect("call after stale recovery succeeds");
    assert_eq!(result, json!("back"));
    server.stop().await.expect("server stops");
}

/// `stop()` removes the socket file and is idempotent.
#[tokio::test]
async fn stop_removes_socket_file_and_is_idempotent() {
    let (_dir, mut server, _client) = wire_pair("TidySkill");
    register_echo(&mut server);

    server.start().await.expect("server starts");
    let path = server.socket_path();
    assert!(path.exists(), "socket file exists while running");

    server.stop().await.expect("first stop succeeds");
    assert!(!path.exists(), "socket file removed at stop");

    server.stop().await.expect("second stop is a no-op");
}

/// `stop()` on a server that was never started is a no-op.
#[tokio::test]
async fn stop_before_start_is_a_noop() {
    let (_dir, mut server, _client) = wire_pair("IdleSkill");
    server.stop().await.expect("stop without start succeeds");
}

/// A stopped server can be started again on the same path.
#[tokio::test]
async fn restart_after_stop_serves_again() {
    let (_dir, mut server, client) = wire_pair("PhoenixSkill");
    register_echo(&mut server);

    server.start().await.expect("first start");
    server.stop().await.expect("stop");
    server.start().await.expect("second start");

    let result = client
        .call("echo", &[json!(2)])
        .await
        .expect("call after restart succeeds");
    assert_eq!(result, json!(2));
    server.stop().await.expect("final stop");
}

/// Starting an already-running server is refused.
#[tokio::test]
async fn double_start_is_refused() {
    let (_dir, mut server, _client) = wire_pair("GreedySkill");
    server.start().await.expect("first start");

    let err = server.start().await.expect_err("second start must fail");
    assert!(
        matches!(err, WireError::Startup(_)),
        "expected WireError::Startup, got: {err:?}"
    );
    server.stop().await.expect("server stops");
}

/// The registry is snapshotted at `start()`: registrations made afterwards
/// do not reach the running listener.
#[tokio::test]
async fn registration_after_start_does_not_reach_running_listener() {
    let (_dir, mut server, client) = wire_pair("FrozenSkill");
    register_echo(&mut server);
    server.start().await.expect("server starts");

    server.register_handler("late", |_params| async move { Ok(json!("late")) });

    let err = client
        .call("late", &[])
        .await
        .expect_err("late registration must be invisible");
    match err {
        WireError::Rpc { code, .. } => assert_eq!(code, METHOD_NOT_FOUND),
        other => panic!("expected WireError::Rpc, got: {other:?}"),
    }
    server.stop().await.expect("server stops");
}
