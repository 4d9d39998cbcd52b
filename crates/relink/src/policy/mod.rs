//! Startup policy resolution.
//!
//! Two small text sources next to the host executable drive the agent's
//! behavior: a `key=value` config file gating the matchmaking block, and a
//! single-line file carrying a backend URL override. Both are read exactly
//! once, at startup; every consumer afterwards sees an already-validated
//! value. A missing or malformed source never fails startup — it collapses
//! to the documented default.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

/// Config key gating the matchmaking suppression hook.
pub const BLOCK_READY_KEY: &str = "block_set_ready_for_match";

/// Default flag config file, looked up in the host's working directory.
pub const FLAG_SOURCE: &str = "Server.config";

/// Default backend override file, looked up in the host's working directory.
pub const URL_SOURCE: &str = "backend.txt";

/// Required scheme for a backend override. Anything else is discarded.
pub const URL_SCHEME: &str = "https://";

/// Immutable policy values consumed once at startup.
#[derive(Debug, Clone)]
pub struct Policy {
    /// Whether the matchmaking ready-up call is suppressed.
    pub block_ready_for_match: bool,
    /// Validated backend URL override, if one was configured.
    pub backend_url: Option<String>,
}

impl Policy {
    /// Resolve the full policy from the default source files.
    pub fn resolve() -> Self {
        Self::resolve_from(FLAG_SOURCE, URL_SOURCE)
    }

    /// Resolve the full policy from explicit source paths.
    pub fn resolve_from<P: AsRef<Path>, Q: AsRef<Path>>(flag_path: P, url_path: Q) -> Self {
        let policy = Self {
            block_ready_for_match: load_flag(flag_path, BLOCK_READY_KEY),
            backend_url: load_url(url_path),
        };

        info!(
            "Policy resolved: block_ready_for_match={}, backend override {}",
            policy.block_ready_for_match,
            match &policy.backend_url {
                Some(url) => format!("set ({url})"),
                None => "not set".to_string(),
            }
        );
        policy
    }
}

/// Look up a boolean flag in a `key=value` config source.
///
/// A matching line's trailing character decides the value: `1` means
/// enabled, anything else disabled. A missing file or absent key yields the
/// conservative default `true` — the restrictive behavior applies unless
/// configuration explicitly turns it off.
pub fn load_flag<P: AsRef<Path>>(path: P, key: &str) -> bool {
    let content = match fs::read_to_string(path.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            log_read_failure(path.as_ref(), &e);
            return true;
        }
    };

    let prefix = format!("{key}=");
    for line in content.lines() {
        if line.starts_with(&prefix) {
            return line.trim_end().ends_with('1');
        }
    }

    debug!("Key {key:?} not found in {:?}, defaulting to enabled", path.as_ref());
    true
}

/// Read a backend URL override from a single-line text source.
///
/// The whole file is read and trimmed of surrounding whitespace; the value
/// is accepted only if it is non-empty and starts with `https://`. Any read
/// or validation failure collapses to `None` so the caller falls back to
/// its hardcoded default.
pub fn load_url<P: AsRef<Path>>(path: P) -> Option<String> {
    let content = match fs::read_to_string(path.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            log_read_failure(path.as_ref(), &e);
            return None;
        }
    };

    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }

    if !trimmed.starts_with(URL_SCHEME) {
        warn!("Backend override must start with {URL_SCHEME}, ignoring {trimmed:?}");
        return None;
    }

    info!("Loaded backend override: {trimmed}");
    Some(trimmed.to_string())
}

fn log_read_failure(path: &Path, e: &io::Error) {
    if e.kind() == io::ErrorKind::NotFound {
        debug!("Config source {path:?} not present");
    } else {
        warn!("Failed to read config source {path:?}: {e}");
    }
}
