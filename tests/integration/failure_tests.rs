//! Failure surfaces: unknown methods, handler errors, unreachable workers,
//! and call timeouts.

use std::time::{Duration, Instant};

use serde_json::{json, Value};

use skillwire::message::{INTERNAL_ERROR, METHOD_NOT_FOUND};
use skillwire::WireError;

use super::test_helpers::{register_echo, wire_pair, wire_pair_with_timeout};

/// Calling an unregistered method always yields `-32601`, regardless of the
/// supplied parameters.
#[tokio::test]
async fn unknown_method_yields_method_not_found() {
    let (_dir, mut server, client) = wire_pair("SparseSkill");
    register_echo(&mut server);
    server.start().await.expect("server starts");

    let err = client
        .call("doesNotExist", &[json!({"anything": true})])
        .await
        .expect_err("unknown method must fail");

    match err {
        WireError::Rpc { code, message, .. } => {
            assert_eq!(code, METHOD_NOT_FOUND);
            assert!(message.contains("doesNotExist"), "got: {message}");
        }
        other => panic!("expected WireError::Rpc, got: {other:?}"),
    }
    server.stop().await.expect("server stops");
}

/// A handler failing with "boom" yields `-32603` with the message in
/// `error.data`, and the server stays usable for subsequent calls.
#[tokio::test]
async fn handler_failure_yields_internal_error_and_server_survives() {
    let (_dir, mut server, client) = wire_pair("FlakySkill");
    register_echo(&mut server);
    server.register_handler("explode", |_params: Option<Value>| async move {
        Err::<Value, _>(WireError::Handler("boom".to_owned()))
    });
    server.start().await.expect("server starts");

    let err = client
        .call("explode", &[])
        .await
        .expect_err("failing handler must fail the call");

    match err {
        WireError::Rpc { code, data, .. } => {
            assert_eq!(code, INTERNAL_ERROR);
            let data = data.expect("error.data present");
            assert!(data.to_string().contains("boom"), "got: {data}");
        }
        other => panic!("expected WireError::Rpc, got: {other:?}"),
    }

    // Same server, fresh connection: still answering.
    let result = client
        .call("echo", &[json!("still alive")])
        .await
        .expect("echo after failure succeeds");
    assert_eq!(result, json!("still alive"));
    server.stop().await.expect("server stops");
}

/// With no listener bound, a call fails quickly with a connection-class
/// failure instead of waiting out the timeout.
#[tokio::test]
async fn call_without_listener_fails_fast() {
    let (_dir, _server, client) =
        wire_pair_with_timeout("AbsentSkill", Duration::from_secs(30));

    let started = Instant::now();
    let err = client
        .call("anything", &[])
        .await
        .expect_err("no listener must fail the call");
    let elapsed = started.elapsed();

    assert!(
        matches!(err, WireError::Transport(_)),
        "expected WireError::Transport, got: {err:?}"
    );
    assert!(
        elapsed < Duration::from_secs(1),
        "refusal must not consume the timeout budget, took {elapsed:?}"
    );
}

/// A handler that never returns fails the call once the configured timeout
/// elapses, and the client holds no connection afterwards.
#[tokio::test]
async fn unanswered_call_times_out() {
    let (_dir, mut server, client) =
        wire_pair_with_timeout("StuckSkill", Duration::from_millis(250));
    server.register_handler("hang", |_params: Option<Value>| async move {
        std::future::pending::<()>().await;
        Ok(Value::Null)
    });
    server.start().await.expect("server starts");

    let started = Instant::now();
    let err = client
        .call("hang", &[])
        .await
        .expect_err("hung handler must time out");
    let elapsed = started.elapsed();

    assert!(
        matches!(err, WireError::Timeout(_)),
        "expected WireError::Timeout, got: {err:?}"
    );
    assert!(
        elapsed >= Duration::from_millis(250),
        "timed out early: {elapsed:?}"
    );
    assert!(
        elapsed < Duration::from_secs(2),
        "timeout fired far too late: {elapsed:?}"
    );

    server.stop().await.expect("server stops despite hung handler");
}
