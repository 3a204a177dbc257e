//! Deterministic skill-name to socket-path derivation.
//!
//! Client and server never exchange addresses: both derive the rendezvous
//! path from the skill's logical identifier, so the two functions here must
//! stay byte-for-byte stable across versions.

use std::path::{Path, PathBuf};

/// Suffix appended to every skill socket file.
const SOCKET_SUFFIX: &str = ".sock";

/// Convert a mixed-case identifier to a lowercase, underscore-separated token.
///
/// An underscore is inserted at each lowercase-to-uppercase transition, then
/// the whole string is lowercased: `"WebBrowserSkill"` → `"web_browser_skill"`.
/// Pure and infallible.
#[must_use]
pub fn snake_case(identifier: &str) -> String {
    let mut out = String::with_capacity(identifier.len() + 4);
    let mut prev_lowercase = false;

    for ch in identifier.chars() {
        if ch.is_uppercase() && prev_lowercase {
            out.push('_');
        }
        prev_lowercase = ch.is_lowercase();
        out.extend(ch.to_lowercase());
    }

    out
}

/// Derive the socket path for a skill under `base_dir`.
///
/// Yields `{base_dir}/{snake_case(identifier)}.sock`. Both sides of the
/// protocol call this with the same identifier and base directory.
#[must_use]
pub fn socket_path(base_dir: &Path, identifier: &str) -> PathBuf {
    let mut file = snake_case(identifier);
    file.push_str(SOCKET_SUFFIX);
    base_dir.join(file)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
