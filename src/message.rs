//! JSON-RPC wire model for skill calls.
//!
//! One frame carries exactly one [`Request`] or [`Response`] object. The
//! dialect pins `protocolVersion` to `"2.0"`; `params` and `result` are
//! opaque JSON values owned by the skill, never inspected by the protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Protocol version carried by every frame.
pub const PROTOCOL_VERSION: &str = "2.0";

/// Reserved code for a frame that is not valid JSON.
pub const PARSE_ERROR: i64 = -32700;

/// Reserved code for a request naming an unregistered method.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Reserved code for a handler that failed while computing a result.
pub const INTERNAL_ERROR: i64 = -32603;

fn protocol_version() -> String {
    PROTOCOL_VERSION.to_owned()
}

/// Correlation id attached to a call expecting a reply.
///
/// Matching is by value equality; the protocol never interprets the content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric id.
    Num(i64),
    /// String id (the client emits UUID v4 strings).
    Str(String),
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Num(n)
    }
}

/// One inbound call frame (coordinator → worker).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Fixed dialect version; tolerated if absent on decode.
    #[serde(rename = "protocolVersion", default = "protocol_version")]
    pub protocol_version: String,
    /// Name of the registered handler to invoke.
    pub method: String,
    /// Opaque call payload; absent when the caller supplied no arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Correlation id; absent for fire-and-forget notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl Request {
    /// Build a call frame expecting a correlated reply.
    #[must_use]
    pub fn call(method: impl Into<String>, params: Option<Value>, id: RequestId) -> Self {
        Self {
            protocol_version: protocol_version(),
            method: method.into(),
            params,
            id: Some(id),
        }
    }

    /// Build an id-less notification frame (no reply expected).
    #[must_use]
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            protocol_version: protocol_version(),
            method: method.into(),
            params,
            id: None,
        }
    }
}

/// Structured error payload of a failed call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Reserved or method-specific error code.
    pub code: i64,
    /// Human-readable description.
    pub message: String,
    /// Optional detail payload (e.g. the handler's failure message).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// One outbound reply frame (worker → coordinator).
///
/// Exactly one of `result` / `error` is serialized. `id` echoes the request,
/// or is `null` when the request could not be decoded at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Fixed dialect version; tolerated if absent on decode.
    #[serde(rename = "protocolVersion", default = "protocol_version")]
    pub protocol_version: String,
    /// Handler result on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Structured error on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
    /// Correlation id echoed from the request (serialized as `null` when the
    /// request was undecodable).
    #[serde(default)]
    pub id: Option<RequestId>,
}

impl Response {
    /// Build a result response for a successful handler invocation.
    #[must_use]
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            protocol_version: protocol_version(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Build an error response with the given code and message.
    #[must_use]
    pub fn failure(
        id: Option<RequestId>,
        code: i64,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        Self {
            protocol_version: protocol_version(),
            result: None,
            error: Some(ErrorObject {
                code,
                message: message.into(),
                data,
            }),
            id,
        }
    }

    /// `-32700` response for a frame that failed to decode; id is `null`
    /// because the originating id (if any) is unrecoverable.
    #[must_use]
    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self::failure(
            None,
            PARSE_ERROR,
            format!("parse error: {}", detail.into()),
            None,
        )
    }

    /// `-32601` response for a request naming an unregistered method.
    #[must_use]
    pub fn method_not_found(id: Option<RequestId>, method: &str) -> Self {
        Self::failure(
            id,
            METHOD_NOT_FOUND,
            format!("method not found: {method}"),
            None,
        )
    }

    /// `-32603` response for a handler failure; the failure message travels
    /// in `error.data`.
    #[must_use]
    pub fn internal_error(id: Option<RequestId>, detail: impl Into<String>) -> Self {
        Self::failure(
            id,
            INTERNAL_ERROR,
            "internal error",
            Some(Value::String(detail.into())),
        )
    }
}

/// Collapse a caller's argument list into the wire `params` value.
///
/// Zero arguments → no `params` field; one argument → that value verbatim;
/// several arguments → an ordered JSON array of them.
#[must_use]
pub fn collapse_args(args: &[Value]) -> Option<Value> {
    match args {
        [] => None,
        [one] => Some(one.clone()),
        many => Some(Value::Array(many.to_vec())),
    }
}
