//! Skill server: listener, per-connection decode loop, and dispatch.
//!
//! A [`SkillServer`] binds a Unix domain socket at the path derived from its
//! skill name, accepts any number of concurrent connections, and answers
//! line-delimited JSON-RPC requests from coordinators.
//!
//! ## Task topology
//!
//! One accept task owns the listener. Each accepted connection gets its own
//! task owning a [`FramedRead`] decode buffer; every complete frame is
//! dispatched on a further spawned task, so a slow handler never blocks the
//! read loop or other requests on the same connection. Responses funnel
//! through an mpsc channel into a single writer task per connection, which
//! serializes them onto the socket in completion order — correlation is by
//! id, never by position.
//!
//! ## Error responses
//!
//! | Condition                  | Response                                   |
//! |----------------------------|--------------------------------------------|
//! | Frame is not valid JSON    | `-32700` parse error, `id: null`           |
//! | Method not registered      | `-32601` method not found                  |
//! | Handler returned an error  | `-32603`, message in `error.data`          |
//!
//! All three leave the connection open. Requests without an `id` are
//! notifications: the handler still runs, but no response is written.

use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use interprocess::local_socket::tokio::{SendHalf, Stream};
use interprocess::local_socket::{tokio::prelude::*, GenericFilePath, ListenerOptions};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::codec::{Frame, WireCodec};
use crate::config::ServerOptions;
use crate::message::{Request, Response};
use crate::naming::socket_path;
use crate::{Result, WireError};

/// Boxed future produced by a skill handler.
type HandlerFuture = BoxFuture<'static, Result<Value>>;

/// A registered skill handler: raw decoded `params` in, result value out.
type Handler = Arc<dyn Fn(Option<Value>) -> HandlerFuture + Send + Sync>;

/// Live listener state, present between `start()` and `stop()`.
struct ListenerState {
    cancel: CancellationToken,
    tracker: TaskTracker,
    accept_handle: JoinHandle<()>,
    socket_path: PathBuf,
}

/// Worker-side skill server.
///
/// Register handlers, then [`start`](Self::start) to bind and accept. The
/// handler registry is snapshotted at `start()`; registrations after that
/// point only take effect on a later `start()`.
pub struct SkillServer {
    skill: String,
    options: ServerOptions,
    handlers: HashMap<String, Handler>,
    listener: Option<ListenerState>,
}

impl SkillServer {
    /// Create a server for the given skill identifier with default options.
    #[must_use]
    pub fn new(skill: impl Into<String>) -> Self {
        Self::with_options(skill, ServerOptions::default())
    }

    /// Create a server with explicit options (e.g. a non-default base dir).
    #[must_use]
    pub fn with_options(skill: impl Into<String>, options: ServerOptions) -> Self {
        Self {
            skill: skill.into(),
            options,
            handlers: HashMap::new(),
            listener: None,
        }
    }

    /// Path of the socket this server binds (derived, never configured).
    #[must_use]
    pub fn socket_path(&self) -> PathBuf {
        socket_path(&self.options.base_dir, &self.skill)
    }

    /// Associate `method` with a handler.
    ///
    /// A later registration for the same name replaces the earlier one. The
    /// handler receives the request's raw decoded `params` value; no arity or
    /// shape validation happens here.
    pub fn register_handler<F, Fut>(&mut self, method: impl Into<String>, handler: F)
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.handlers
            .insert(method.into(), Arc::new(move |params| Box::pin(handler(params))));
    }

    /// Bind the socket and start accepting connections.
    ///
    /// A stale socket file left by an uncleanly terminated previous run is
    /// removed before binding, so restarts never fail with an
    /// address-in-use error while no listener is actually alive.
    ///
    /// # Errors
    ///
    /// [`WireError::Startup`] if the server is already running, if the stale
    /// file cannot be removed, or if the listener cannot be created (e.g.
    /// base directory permissions).
    pub async fn start(&mut self) -> Result<()> {
        if self.listener.is_some() {
            return Err(WireError::Startup(format!(
                "server for skill '{}' already started",
                self.skill
            )));
        }

        let path = self.socket_path();
        remove_stale_socket(&path).await?;

        let name = path
            .clone()
            .to_fs_name::<GenericFilePath>()
            .map_err(|err| {
                WireError::Startup(format!(
                    "invalid socket path '{}': {err}",
                    path.display()
                ))
            })?;

        let listener = ListenerOptions::new().name(name).create_tokio().map_err(|err| {
            WireError::Startup(format!(
                "failed to bind socket '{}': {err}",
                path.display()
            ))
        })?;

        info!(skill = %self.skill, path = %path.display(), "skill server listening");

        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();
        let handlers = Arc::new(self.handlers.clone());

        let accept_handle = tokio::spawn(
            accept_loop(listener, handlers, cancel.clone(), tracker.clone())
                .instrument(info_span!("skill_server", skill = %self.skill)),
        );

        self.listener = Some(ListenerState {
            cancel,
            tracker,
            accept_handle,
            socket_path: path,
        });

        Ok(())
    }

    /// Stop accepting, terminate open connections, and remove the socket file.
    ///
    /// Resolves once every connection task has exited and the file is gone.
    /// A no-op if the server was never started (idempotent).
    ///
    /// # Errors
    ///
    /// [`WireError::Io`] if the socket file exists but cannot be removed.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(state) = self.listener.take() else {
            return Ok(());
        };

        state.cancel.cancel();
        if let Err(err) = state.accept_handle.await {
            warn!(skill = %self.skill, %err, "accept task panicked during shutdown");
        }

        state.tracker.close();
        state.tracker.wait().await;

        match tokio::fs::remove_file(&state.socket_path).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                return Err(WireError::Io(format!(
                    "failed to remove socket '{}': {err}",
                    state.socket_path.display()
                )))
            }
        }

        info!(skill = %self.skill, "skill server stopped");
        Ok(())
    }
}

/// Remove a leftover socket file from a prior run, tolerating absence.
async fn remove_stale_socket(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "removed stale socket file");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(WireError::Startup(format!(
            "failed to remove stale socket '{}': {err}",
            path.display()
        ))),
    }
}

/// Accept connections until cancelled; one task per connection.
async fn accept_loop(
    listener: interprocess::local_socket::tokio::Listener,
    handlers: Arc<HashMap<String, Handler>>,
    cancel: CancellationToken,
    tracker: TaskTracker,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("accept loop shutting down");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok(stream) => {
                        let handlers = Arc::clone(&handlers);
                        let conn_cancel = cancel.clone();
                        tracker.spawn(
                            handle_connection(stream, handlers, conn_cancel)
                                .instrument(info_span!("skill_conn")),
                        );
                    }
                    Err(err) => {
                        warn!(%err, "accept failed");
                    }
                }
            }
        }
    }
}

/// Read-decode-dispatch loop for one connection.
///
/// The connection is never closed from this side except at `stop()`; framing
/// and dispatch errors are answered in-band and the loop continues.
async fn handle_connection(
    stream: Stream,
    handlers: Arc<HashMap<String, Handler>>,
    cancel: CancellationToken,
) {
    let (reader, writer) = stream.split();
    let mut frames = FramedRead::new(reader, WireCodec::new());
    let (response_tx, response_rx) = mpsc::channel::<Response>(64);

    let writer_handle = tokio::spawn(write_responses(writer, response_rx, cancel.clone()));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("connection cancelled by shutdown");
                break;
            }

            frame = frames.next() => {
                match frame {
                    None => {
                        debug!("peer closed connection");
                        break;
                    }
                    Some(Ok(Frame::Line(line))) => {
                        dispatch_frame(&line, &handlers, &response_tx);
                    }
                    Some(Ok(Frame::Malformed(msg))) => {
                        // Overlong or non-UTF-8 line: answer in-band, keep reading.
                        warn!(error = msg.as_str(), "unframeable input, answering with parse error");
                        send_response(&response_tx, Response::parse_error(msg));
                    }
                    Some(Err(err)) => {
                        warn!(%err, "read failed, closing connection");
                        break;
                    }
                }
            }
        }
    }

    // Dropping our sender lets the writer drain in-flight dispatch tasks.
    drop(response_tx);
    if let Err(err) = writer_handle.await {
        warn!(%err, "writer task panicked");
    }
}

/// Decode one frame and spawn its dispatch so subsequent reads never wait.
fn dispatch_frame(
    line: &str,
    handlers: &Arc<HashMap<String, Handler>>,
    response_tx: &mpsc::Sender<Response>,
) {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return;
    }

    let request: Request = match serde_json::from_str(trimmed) {
        Ok(request) => request,
        Err(err) => {
            debug!(%err, "frame failed to decode as a request");
            send_response(response_tx, Response::parse_error(err.to_string()));
            return;
        }
    };

    let method = request.method;
    let id = request.id;

    let Some(handler) = handlers.get(&method).cloned() else {
        if let Some(id) = id {
            send_response(response_tx, Response::method_not_found(Some(id), &method));
        } else {
            warn!(%method, "notification for unregistered method dropped");
        }
        return;
    };

    let response_tx = response_tx.clone();
    tokio::spawn(async move {
        let outcome = handler(request.params).await;
        match (id, outcome) {
            (Some(id), Ok(result)) => {
                let _ = response_tx.send(Response::success(Some(id), result)).await;
            }
            (Some(id), Err(err)) => {
                let detail = handler_detail(err);
                let _ = response_tx
                    .send(Response::internal_error(Some(id), detail))
                    .await;
            }
            (None, Ok(_)) => {}
            (None, Err(err)) => {
                warn!(%method, %err, "notification handler failed");
            }
        }
    });
}

/// Extract the handler's own message for `error.data`, unwrapping the
/// [`WireError::Handler`] variant so the peer sees the raw failure text.
fn handler_detail(err: WireError) -> String {
    match err {
        WireError::Handler(msg) => msg,
        other => other.to_string(),
    }
}

/// Queue a response without blocking the read loop.
fn send_response(response_tx: &mpsc::Sender<Response>, response: Response) {
    let response_tx = response_tx.clone();
    tokio::spawn(async move {
        let _ = response_tx.send(response).await;
    });
}

/// Writer task: serialize responses from the channel onto the socket.
///
/// Exits when the channel closes (read loop and all dispatch tasks done) or
/// on cancellation.
async fn write_responses(
    mut writer: SendHalf,
    mut response_rx: mpsc::Receiver<Response>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("writer cancelled by shutdown");
                break;
            }

            response = response_rx.recv() => {
                let Some(response) = response else {
                    break;
                };
                let mut bytes = match serde_json::to_vec(&response) {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        warn!(%err, "failed to serialize response, dropping");
                        continue;
                    }
                };
                bytes.push(b'\n');
                if let Err(err) = writer.write_all(&bytes).await {
                    warn!(%err, "failed to write response, closing writer");
                    break;
                }
            }
        }
    }
}
