//! Coordinator-side caller.
//!
//! A [`SkillClient`] opens one connection per call, writes a single request
//! frame, and waits for the response whose id matches — racing a wall-clock
//! timeout the whole way. Correlation ids are UUID v4 strings, unique per
//! call, so rapid concurrent calls against the same worker can never
//! cross-match.
//!
//! Call lifecycle: `Idle → Connecting → RequestSent → AwaitingResponse →
//! {Settled(Result) | Settled(Error) | TimedOut | ConnectionFailed} → Closed`.
//! The first terminal state wins; a response arriving after the timeout fired
//! has nowhere to land because the connection is already dropped.

use std::path::PathBuf;

use futures_util::StreamExt;
use interprocess::local_socket::tokio::{SendHalf, Stream};
use interprocess::local_socket::{tokio::prelude::*, GenericFilePath};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio_util::codec::FramedRead;
use tracing::debug;
use uuid::Uuid;

use crate::codec::{Frame, WireCodec};
use crate::config::ClientOptions;
use crate::message::{collapse_args, Request, RequestId, Response};
use crate::naming::socket_path;
use crate::{Result, WireError};

/// Coordinator-side handle for calling one skill's operations.
#[derive(Debug, Clone)]
pub struct SkillClient {
    skill: String,
    options: ClientOptions,
}

impl SkillClient {
    /// Create a client for the given skill identifier with default options.
    #[must_use]
    pub fn new(skill: impl Into<String>) -> Self {
        Self::with_options(skill, ClientOptions::default())
    }

    /// Create a client with explicit options (base dir, timeout).
    #[must_use]
    pub fn with_options(skill: impl Into<String>, options: ClientOptions) -> Self {
        Self {
            skill: skill.into(),
            options,
        }
    }

    /// Path of the socket this client connects to (derived, never configured).
    #[must_use]
    pub fn socket_path(&self) -> PathBuf {
        socket_path(&self.options.base_dir, &self.skill)
    }

    /// Invoke `method` on the worker and wait for its correlated result.
    ///
    /// Arguments collapse into the wire `params` value: none → absent, one →
    /// that value, several → an ordered array.
    ///
    /// # Errors
    ///
    /// - [`WireError::Rpc`] — the server answered with a structured error.
    /// - [`WireError::Transport`] — connection refused, reset, or closed
    ///   before a matching response (surfaced immediately, not via timeout).
    /// - [`WireError::Timeout`] — no settlement within the configured
    ///   deadline; the connection is dropped when the timer fires.
    pub async fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        let id = RequestId::Str(Uuid::new_v4().to_string());
        let request = Request::call(method, collapse_args(args), id.clone());
        let timeout = self.options.timeout;

        match tokio::time::timeout(timeout, self.exchange(&request, &id)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(WireError::Timeout(format!(
                "no response for '{method}' on skill '{}' within {timeout:?}",
                self.skill
            ))),
        }
    }

    /// Send a fire-and-forget notification: one id-less request frame, no
    /// reply awaited.
    ///
    /// # Errors
    ///
    /// [`WireError::Transport`] if the connection or write fails;
    /// [`WireError::Codec`] if the request cannot be serialized.
    pub async fn notify(&self, method: &str, args: &[Value]) -> Result<()> {
        let request = Request::notification(method, collapse_args(args));
        let stream = self.connect().await?;
        let (_reader, mut writer) = stream.split();
        write_request(&mut writer, &request).await
    }

    /// One full connect–write–await exchange, without the timeout race.
    async fn exchange(&self, request: &Request, id: &RequestId) -> Result<Value> {
        let stream = self.connect().await?;
        let (reader, mut writer) = stream.split();

        write_request(&mut writer, request).await?;

        let mut frames = FramedRead::new(reader, WireCodec::new());
        // `decode_eof` gives any unterminated trailing text one last decode
        // attempt when the peer closes, so the loop sees every frame.
        while let Some(frame) = frames.next().await {
            match frame {
                Ok(Frame::Line(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Response>(trimmed) {
                        Ok(response) if response.id.as_ref() == Some(id) => {
                            return settle(response);
                        }
                        Ok(response) => {
                            debug!(
                                got = ?response.id,
                                want = %id,
                                "skipping response with non-matching id"
                            );
                        }
                        Err(err) => {
                            debug!(%err, "skipping undecodable frame");
                        }
                    }
                }
                Ok(Frame::Malformed(msg)) => {
                    debug!(error = msg.as_str(), "skipping unframeable input");
                }
                Err(err) => {
                    return Err(WireError::Transport(err.to_string()));
                }
            }
        }

        Err(WireError::Transport(format!(
            "connection to skill '{}' closed before a matching response",
            self.skill
        )))
    }

    /// Open a fresh connection to the derived socket path.
    ///
    /// Connection-level failures (refused, missing socket) surface here
    /// immediately rather than waiting out the call timeout.
    async fn connect(&self) -> Result<Stream> {
        let path = self.socket_path();
        let name = path
            .clone()
            .to_fs_name::<GenericFilePath>()
            .map_err(|err| {
                WireError::Transport(format!(
                    "invalid socket path '{}': {err}",
                    path.display()
                ))
            })?;

        Stream::connect(name).await.map_err(|err| {
            WireError::Transport(format!(
                "failed to connect to '{}': {err}",
                path.display()
            ))
        })
    }
}

/// Map a matched response to the call's outcome.
fn settle(response: Response) -> Result<Value> {
    if let Some(error) = response.error {
        return Err(WireError::Rpc {
            code: error.code,
            message: error.message,
            data: error.data,
        });
    }
    response.result.ok_or_else(|| {
        WireError::Codec("response frame carried neither result nor error".to_owned())
    })
}

/// Serialize `request` as one `\n`-terminated frame and write it out.
async fn write_request(writer: &mut SendHalf, request: &Request) -> Result<()> {
    let mut bytes = serde_json::to_vec(request)
        .map_err(|err| WireError::Codec(format!("failed to serialize request: {err}")))?;
    bytes.push(b'\n');
    writer
        .write_all(&bytes)
        .await
        .map_err(|err| WireError::Transport(format!("write failed: {err}")))
}
