//! Shared state visible to interceptors.
//!
//! Interceptors run on arbitrary host threads, so the context is built
//! once by the setup worker, published before any hook is enabled, and
//! immutable from then on. Publication through a `OnceLock` makes the
//! write-once invariant a type-level fact instead of a convention.

use std::sync::OnceLock;

use crate::policy::Policy;

/// Read-only state consumed by the interceptor set.
///
/// Addresses are zero when the corresponding host facility was never
/// resolved or hooked; interceptors treat zero as "not available".
#[derive(Debug, Clone, Default)]
pub struct AgentContext {
    /// Validated backend URL override from the policy loader.
    pub backend_url: Option<String>,
    /// Whether the matchmaking ready-up call is suppressed.
    pub block_ready_for_match: bool,
    /// Displaced original of the ready-up routine.
    pub original_set_ready: u64,
    /// Address of the host's global allocator pointer, for strings the
    /// host will own and eventually free.
    pub host_alloc: u64,
}

impl AgentContext {
    pub fn from_policy(policy: &Policy) -> Self {
        Self {
            backend_url: policy.backend_url.clone(),
            block_ready_for_match: policy.block_ready_for_match,
            original_set_ready: 0,
            host_alloc: 0,
        }
    }
}

static CONTEXT: OnceLock<AgentContext> = OnceLock::new();

/// Publish the context for the raw interceptor entry points.
///
/// Must happen after install (so the original callables are known) and
/// before enable (so no interceptor can observe a missing context).
/// Returns `false` if a context was already published.
pub fn publish(ctx: AgentContext) -> bool {
    CONTEXT.set(ctx).is_ok()
}

/// The published context, if the agent finished installing.
pub fn published() -> Option<&'static AgentContext> {
    CONTEXT.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_is_write_once() {
        // Shares one process-wide slot with every test in this binary, so
        // this is the only test that publishes.
        let first = AgentContext {
            backend_url: Some("https://first.example".into()),
            ..Default::default()
        };
        let second = AgentContext::default();

        assert!(publish(first));
        assert!(!publish(second));
        assert_eq!(
            published().unwrap().backend_url.as_deref(),
            Some("https://first.example")
        );
    }
}
