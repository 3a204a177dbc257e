//! Shared fixtures for the integration suite.
//!
//! Every test gets its own temp directory as the socket base dir, so suites
//! can run in parallel without rendezvous collisions, and the 2-second client
//! timeout keeps a wedged exchange from stalling the whole run.

use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;

use skillwire::{ClientOptions, ServerOptions, SkillClient, SkillServer};

/// Install a per-process test subscriber honoring `RUST_LOG`; later calls
/// are no-ops.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build a server/client pair sharing a fresh temp base dir.
///
/// The temp dir must stay alive for the duration of the test; dropping it
/// unlinks the socket out from under both sides.
pub fn wire_pair(skill: &str) -> (TempDir, SkillServer, SkillClient) {
    wire_pair_with_timeout(skill, Duration::from_secs(2))
}

/// Same as [`wire_pair`] but with an explicit client call timeout.
pub fn wire_pair_with_timeout(
    skill: &str,
    timeout: Duration,
) -> (TempDir, SkillServer, SkillClient) {
    init_tracing();
    let dir = tempfile::tempdir().expect("create temp dir");
    let server = SkillServer::with_options(
        skill,
        ServerOptions {
            base_dir: dir.path().to_path_buf(),
        },
    );
    let client = SkillClient::with_options(
        skill,
        ClientOptions {
            base_dir: dir.path().to_path_buf(),
            timeout,
        },
    );
    (dir, server, client)
}

/// Register an `echo` handler that resolves to its raw `params` unchanged.
pub fn register_echo(server: &mut SkillServer) {
    server.register_handler("echo", |params: Option<Value>| async move {
        Ok(params.unwrap_or(Value::Null))
    });
}
