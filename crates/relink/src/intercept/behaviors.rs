//! Interceptor behavior logic.
//!
//! Each hooked function maps to exactly one behavior, fixed at design
//! time: observe (log and forward), rewrite (synthesize a result, never
//! forward), or suppress (swallow the call behind a policy flag). The
//! logic here is pure so it can be exercised without a live hook; the
//! platform thunks only adapt calling conventions around these functions.

use tracing::{debug, info};

use crate::intercept::AgentContext;

/// Backend used when no valid override is configured.
pub const DEFAULT_BACKEND: &str = "https://127.0.0.1:8443";

/// What the calling thunk should do after the behavior ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition<T> {
    /// Call through to the displaced original.
    Forward,
    /// Skip the original and hand this result to the host.
    Return(T),
}

/// Pass-through-with-observation: log the call, then forward unchanged.
pub fn observe_call<T>(name: &str) -> Disposition<T> {
    debug!("{name} called, passing through");
    Disposition::Forward
}

/// Rewrite behavior for the URL construction routine.
///
/// Builds the outbound URL from the configured override, or from the
/// hardcoded default when none is configured. Never consults the host's
/// compiled-in logic — reaching it is exactly what this hook prevents.
pub fn rewrite_url(ctx: &AgentContext, call_path: &str) -> String {
    info!("GetUrl called with path {call_path:?}");

    let prefix = ctx.backend_url.as_deref().unwrap_or(DEFAULT_BACKEND);
    format!("{prefix}{call_path}")
}

/// Suppress behavior for the matchmaking ready-up routine.
///
/// Suppression is opt-in: with the policy flag clear this is a transparent
/// pass-through. With it set, the call is logged and swallowed; the
/// original's result is `void`, so the sentinel is simply "do nothing".
pub fn ready_for_match(ctx: &AgentContext) -> Disposition<()> {
    if !ctx.block_ready_for_match {
        return observe_call("SetReadyForMatch");
    }

    info!("Blocked SetReadyForMatch");
    Disposition::Return(())
}
