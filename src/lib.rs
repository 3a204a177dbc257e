//! Local JSON-RPC bridge for out-of-process skill workers.
//!
//! A coordinator invokes named operations ("skills") living in independently
//! started worker processes, over Unix domain sockets, with newline-delimited
//! JSON-RPC 2.0 frames. Both sides derive the rendezvous socket path from the
//! skill's logical name, so no addresses are ever exchanged.
//!
//! - [`SkillServer`] — worker side: register handlers, bind, dispatch.
//! - [`SkillClient`] — coordinator side: one connection per call, id
//!   correlation, wall-clock timeout.
//!
//! ```no_run
//! use serde_json::{json, Value};
//! use skillwire::{Result, SkillClient, SkillServer};
//!
//! # async fn demo() -> Result<()> {
//! let mut server = SkillServer::new("WebBrowserSkill");
//! server.register_handler("echo", |params: Option<Value>| async move {
//!     Ok(params.unwrap_or(Value::Null))
//! });
//! server.start().await?;
//!
//! let client = SkillClient::new("WebBrowserSkill");
//! let result = client.call("echo", &[json!({"a": 1})]).await?;
//! assert_eq!(result, json!({"a": 1}));
//!
//! server.stop().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod client;
pub mod codec;
pub mod config;
pub mod errors;
pub mod message;
pub mod naming;
pub mod server;

pub use client::SkillClient;
pub use config::{ClientOptions, ServerOptions};
pub use errors::{Result, WireError};
pub use server::SkillServer;
