//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

/// Shared crate result type.
pub type Result<T> = std::result::Result<T, WireError>;

/// Wire-protocol error enumeration covering all failure domains.
#[derive(Debug, Clone, PartialEq)]
pub enum WireError {
    /// Frame-level failure: a frame that could not be serialized, or a
    /// response violating the one-of-result-or-error shape. Malformed
    /// inbound lines are not errors at this level; they decode to
    /// [`Frame::Malformed`](crate::codec::Frame) and are answered in-band.
    Codec(String),
    /// Listener could not be created (bind failure after stale-file cleanup).
    Startup(String),
    /// Connection-level failure: refused, reset, or closed before settlement.
    Transport(String),
    /// The call's wall-clock timeout elapsed before a matching response.
    Timeout(String),
    /// Failure raised inside a skill handler; surfaced to the peer as a
    /// `-32603` internal-error response.
    Handler(String),
    /// File-system or socket I/O failure outside an established exchange.
    Io(String),
    /// The server answered with a structured error object ("server said no",
    /// as opposed to "could not reach/answer").
    Rpc {
        /// JSON-RPC error code (e.g. `-32601`).
        code: i64,
        /// Human-readable error message from the server.
        message: String,
        /// Optional method-specific detail payload.
        data: Option<serde_json::Value>,
    },
}

impl Display for WireError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Codec(msg) => write!(f, "codec: {msg}"),
            Self::Startup(msg) => write!(f, "startup: {msg}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Timeout(msg) => write!(f, "timeout: {msg}"),
            Self::Handler(msg) => write!(f, "handler: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
            Self::Rpc { code, message, .. } => write!(f, "server error {code}: {message}"),
        }
    }
}

impl std::error::Error for WireError {}

impl From<std::io::Error> for WireError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
