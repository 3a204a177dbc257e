//! Client and server tuning options.
//!
//! Both sides must derive the socket path from the same base directory; the
//! defaults here mirror the reference deployment (`/tmp`, 30-second call
//! timeout).

use std::path::PathBuf;
use std::time::Duration;

/// Default base directory for skill sockets.
pub const DEFAULT_BASE_DIR: &str = "/tmp";

/// Default wall-clock timeout for an unanswered call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Tuning options for [`SkillClient`](crate::client::SkillClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Directory under which skill sockets live.
    pub base_dir: PathBuf,
    /// Wall-clock deadline racing every call.
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Tuning options for [`SkillServer`](crate::server::SkillServer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    /// Directory under which the listening socket is created.
    pub base_dir: PathBuf,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
        }
    }
}
