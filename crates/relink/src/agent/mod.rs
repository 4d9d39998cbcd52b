//! Agent lifecycle orchestration.
//!
//! One dedicated worker thread drives the whole setup sequence:
//! `Resolving` turns configured offsets into absolute addresses,
//! `Installing` batches every allowed hook install, `Enabling` flips them
//! live, and then the worker exits (`Running`). The sequential state
//! machine is what guarantees install-before-enable and
//! write-context-before-enable; no synchronization is involved because
//! only this thread performs setup.

use std::thread;

use tracing::{error, info};

use crate::engine::{HookBackend, HookEngine};
use crate::error::{Error, Result};
use crate::intercept::{self, AgentContext};
use crate::policy::Policy;
use crate::resolve::{self, ModuleBase, OffsetTable};

/// Default offset-table override file, looked up next to the host.
pub const OFFSET_SOURCE: &str = "offsets.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Unattached,
    Attaching,
    Resolving,
    Installing,
    Enabling,
    Running,
    Detaching,
}

/// Absolute entry points of the replacement functions.
///
/// Fixed at load time; the signatures behind these addresses must match
/// the hooked originals byte for byte.
#[derive(Debug, Clone, Copy)]
pub struct Replacements {
    pub get_url: u64,
    pub set_ready_for_match: u64,
}

/// Setup orchestrator. Owns the hook engine and the lifecycle state.
pub struct Agent<B: HookBackend> {
    engine: HookEngine<B>,
    state: AgentState,
}

impl<B: HookBackend> Agent<B> {
    pub fn new(backend: B) -> Self {
        Self {
            engine: HookEngine::new(backend),
            state: AgentState::Unattached,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn engine(&self) -> &HookEngine<B> {
        &self.engine
    }

    /// Run the full setup sequence, publishing the interceptor context
    /// through the process-wide slot.
    pub fn startup(
        &mut self,
        base: ModuleBase,
        offsets: &OffsetTable,
        policy: &Policy,
        replacements: &Replacements,
    ) -> Result<()> {
        self.startup_with(base, offsets, policy, replacements, intercept::publish)
    }

    /// Setup sequence with an explicit context publisher, so tests can
    /// avoid the process-wide slot.
    pub fn startup_with<F>(
        &mut self,
        base: ModuleBase,
        offsets: &OffsetTable,
        policy: &Policy,
        replacements: &Replacements,
        publish: F,
    ) -> Result<()>
    where
        F: FnOnce(AgentContext) -> bool,
    {
        self.state = AgentState::Resolving;
        let get_url_target = base.resolve(offsets.get_url);
        let set_ready_target = base.resolve(offsets.set_ready_for_match);
        let host_alloc = base.resolve(offsets.g_malloc);
        info!(
            "Resolved targets: get_url={get_url_target:#x}, set_ready_for_match={set_ready_target:#x}, allocator={host_alloc:#x} (base {:#x})",
            base.addr()
        );

        // Installing. A failure here aborts the remaining sequence;
        // behaviors already installed stay installed — they are
        // independent, and half of the protection beats none.
        self.state = AgentState::Installing;
        self.engine.initialize()?;
        self.engine.install(get_url_target, replacements.get_url)?;

        if policy.block_ready_for_match {
            self.engine
                .install(set_ready_target, replacements.set_ready_for_match)?;
        } else {
            info!("SetReadyForMatch hook disabled by config");
        }

        // The context carries the displaced originals, so it can only be
        // built after install — and must be visible before enable.
        let mut ctx = AgentContext::from_policy(policy);
        ctx.original_set_ready = self.engine.original(set_ready_target).unwrap_or(0);
        ctx.host_alloc = host_alloc;
        if !publish(ctx) {
            return Err(Error::EngineInit(
                "interceptor context already published".into(),
            ));
        }

        self.state = AgentState::Enabling;
        let targets: Vec<u64> = self.engine.bindings().iter().map(|b| b.target).collect();
        for target in targets {
            self.engine.enable(target)?;
        }

        self.state = AgentState::Running;
        info!("Agent running, {} hook(s) live", self.engine.bindings().len());
        Ok(())
    }

    /// Best-effort reversal, for symmetry and tests. In normal operation
    /// the host terminates with the hooks still installed.
    pub fn shutdown(&mut self) -> Result<()> {
        self.state = AgentState::Detaching;
        self.engine.teardown()
    }
}

/// Spawn the setup worker.
///
/// Called from the host's attach event, which must not block: all file IO
/// (policy sources, offset overrides) and every engine operation happen on
/// the spawned thread. Fatal errors are logged and terminate only the
/// worker; the host keeps running unhooked.
pub fn spawn_startup<B>(
    backend: B,
    base: ModuleBase,
    replacements: Replacements,
) -> thread::JoinHandle<()>
where
    B: HookBackend + Send + 'static,
{
    thread::spawn(move || {
        let policy = Policy::resolve();
        let offsets = resolve::load_offsets_or_builtin(OFFSET_SOURCE);

        let mut agent = Agent::new(backend);
        agent.state = AgentState::Attaching;
        match agent.startup(base, &offsets, &policy, &replacements) {
            Ok(()) => info!("Agent setup complete, worker exiting"),
            Err(e) => error!("Agent startup aborted during {:?}: {e}", agent.state()),
        }
    })
}
