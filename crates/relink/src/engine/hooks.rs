//! Hook binding bookkeeping.
//!
//! The engine guarantees at most one binding per target address and a
//! strict install-before-enable ordering, independent of which backend does
//! the actual patching. All methods run on the single setup thread; the
//! engine needs no internal synchronization.

use tracing::{debug, info};

use crate::engine::HookBackend;
use crate::error::{Error, Result};

/// One installed redirection: target, replacement, and the callable
/// address of the displaced original.
#[derive(Debug, Clone, Copy)]
pub struct HookBinding {
    pub target: u64,
    pub replacement: u64,
    pub original: u64,
    pub enabled: bool,
}

/// Hook installation and activation, backed by a swappable mechanism.
pub struct HookEngine<B: HookBackend> {
    backend: B,
    bindings: Vec<HookBinding>,
    initialized: bool,
}

impl<B: HookBackend> HookEngine<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            bindings: Vec::new(),
            initialized: false,
        }
    }

    /// Initialize the underlying mechanism. Must succeed before any other
    /// operation; a second call without an intervening teardown is an error.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Err(Error::EngineInit("engine already initialized".into()));
        }
        self.backend.acquire()?;
        self.initialized = true;
        debug!("Hook engine initialized");
        Ok(())
    }

    /// Install a hook binding `target` to `replacement`.
    ///
    /// Builds the trampoline but does not alter control flow at the target;
    /// a separate [`enable`](Self::enable) activates the redirection. A
    /// second install for the same target fails and leaves engine state
    /// untouched.
    pub fn install(&mut self, target: u64, replacement: u64) -> Result<()> {
        if !self.initialized {
            return Err(Error::HookCreate {
                target,
                reason: "engine not initialized".into(),
            });
        }
        if self.binding(target).is_some() {
            return Err(Error::HookCreate {
                target,
                reason: "target already hooked".into(),
            });
        }

        let original = self.backend.prepare(target, replacement)?;
        self.bindings.push(HookBinding {
            target,
            replacement,
            original,
            enabled: false,
        });
        info!("Installed hook at {target:#x} (original relocated to {original:#x})");
        Ok(())
    }

    /// Activate the redirection for an installed binding.
    ///
    /// From this point every call to the target reaches the replacement
    /// instead. Enabling an unknown target fails; it never installs as a
    /// side effect. Enabling an already-enabled binding is a no-op.
    pub fn enable(&mut self, target: u64) -> Result<()> {
        let index = self.binding_index(target).ok_or_else(|| Error::HookEnable {
            target,
            reason: "no binding installed".into(),
        })?;
        if self.bindings[index].enabled {
            return Ok(());
        }

        self.backend.set_active(target, true)?;
        self.bindings[index].enabled = true;
        info!("Enabled hook at {target:#x}");
        Ok(())
    }

    /// Deactivate the redirection for an installed binding; the binding
    /// itself stays installed and can be re-enabled.
    pub fn disable(&mut self, target: u64) -> Result<()> {
        let index = self.binding_index(target).ok_or_else(|| Error::HookEnable {
            target,
            reason: "no binding installed".into(),
        })?;
        if !self.bindings[index].enabled {
            return Ok(());
        }

        self.backend.set_active(target, false)?;
        self.bindings[index].enabled = false;
        info!("Disabled hook at {target:#x}");
        Ok(())
    }

    /// Disable every enabled binding and release the backend.
    ///
    /// Unused in normal operation (the host process terminating invalidates
    /// the hooks anyway) but required for symmetry.
    pub fn teardown(&mut self) -> Result<()> {
        let enabled: Vec<u64> = self
            .bindings
            .iter()
            .filter(|b| b.enabled)
            .map(|b| b.target)
            .collect();
        for target in enabled {
            self.disable(target)?;
        }

        self.bindings.clear();
        if self.initialized {
            self.backend.release()?;
            self.initialized = false;
        }
        debug!("Hook engine torn down");
        Ok(())
    }

    /// The displaced original's callable address for a bound target.
    pub fn original(&self, target: u64) -> Option<u64> {
        self.binding(target).map(|b| b.original)
    }

    /// Installed bindings, in install order.
    pub fn bindings(&self) -> &[HookBinding] {
        &self.bindings
    }

    pub fn is_installed(&self, target: u64) -> bool {
        self.binding(target).is_some()
    }

    pub fn is_enabled(&self, target: u64) -> bool {
        self.binding(target).is_some_and(|b| b.enabled)
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn binding(&self, target: u64) -> Option<&HookBinding> {
        self.bindings.iter().find(|b| b.target == target)
    }

    fn binding_index(&self, target: u64) -> Option<usize> {
        self.bindings.iter().position(|b| b.target == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MockBackend, MockOp};

    fn ready_engine() -> HookEngine<MockBackend> {
        let mut engine = HookEngine::new(MockBackend::new());
        engine.initialize().unwrap();
        engine
    }

    #[test]
    fn test_install_then_enable() {
        let mut engine = ready_engine();
        engine.install(0x1000, 0x2000).unwrap();
        assert!(engine.is_installed(0x1000));
        assert!(!engine.is_enabled(0x1000));

        engine.enable(0x1000).unwrap();
        assert!(engine.is_enabled(0x1000));
        assert!(engine.original(0x1000).is_some());
    }

    #[test]
    fn test_enable_before_install_fails() {
        let mut engine = ready_engine();
        let err = engine.enable(0x1000).unwrap_err();
        assert!(matches!(err, Error::HookEnable { target: 0x1000, .. }));
        // The failed enable must not have installed anything.
        assert!(!engine.is_installed(0x1000));
        assert!(engine.bindings().is_empty());
    }

    #[test]
    fn test_double_install_fails_and_preserves_state() {
        let mut engine = ready_engine();
        engine.install(0x1000, 0x2000).unwrap();
        engine.enable(0x1000).unwrap();

        let err = engine.install(0x1000, 0x3000).unwrap_err();
        assert!(matches!(err, Error::HookCreate { target: 0x1000, .. }));

        assert_eq!(engine.bindings().len(), 1);
        assert_eq!(engine.bindings()[0].replacement, 0x2000);
        assert!(engine.is_enabled(0x1000));
    }

    #[test]
    fn test_install_requires_initialization() {
        let mut engine = HookEngine::new(MockBackend::new());
        assert!(matches!(
            engine.install(0x1000, 0x2000),
            Err(Error::HookCreate { .. })
        ));
    }

    #[test]
    fn test_double_initialize_fails() {
        let mut engine = ready_engine();
        assert!(matches!(engine.initialize(), Err(Error::EngineInit(_))));
    }

    #[test]
    fn test_backend_prepare_failure_maps_to_hook_create() {
        let mut engine = HookEngine::new(MockBackend::new().fail_prepare_at(0x1000));
        engine.initialize().unwrap();

        assert!(matches!(
            engine.install(0x1000, 0x2000),
            Err(Error::HookCreate { target: 0x1000, .. })
        ));
        assert!(!engine.is_installed(0x1000));
    }

    #[test]
    fn test_backend_activation_failure_leaves_binding_disabled() {
        let mut engine = HookEngine::new(MockBackend::new().fail_activate_at(0x1000));
        engine.initialize().unwrap();
        engine.install(0x1000, 0x2000).unwrap();

        assert!(matches!(
            engine.enable(0x1000),
            Err(Error::HookEnable { target: 0x1000, .. })
        ));
        assert!(engine.is_installed(0x1000));
        assert!(!engine.is_enabled(0x1000));
    }

    #[test]
    fn test_disable_and_reenable() {
        let mut engine = ready_engine();
        engine.install(0x1000, 0x2000).unwrap();
        engine.enable(0x1000).unwrap();

        engine.disable(0x1000).unwrap();
        assert!(engine.is_installed(0x1000));
        assert!(!engine.is_enabled(0x1000));

        engine.enable(0x1000).unwrap();
        assert!(engine.is_enabled(0x1000));
    }

    #[test]
    fn test_disable_unknown_target_fails() {
        let mut engine = ready_engine();
        assert!(matches!(
            engine.disable(0x4000),
            Err(Error::HookEnable { target: 0x4000, .. })
        ));
    }

    #[test]
    fn test_teardown_disables_everything_and_releases_backend() {
        let mut engine = ready_engine();
        engine.install(0x1000, 0x2000).unwrap();
        engine.install(0x3000, 0x4000).unwrap();
        engine.enable(0x1000).unwrap();
        engine.enable(0x3000).unwrap();

        engine.teardown().unwrap();
        assert!(engine.bindings().is_empty());

        let ops = engine.backend.ops();
        assert_eq!(
            ops.iter().filter(|op| **op == MockOp::Release).count(),
            1
        );
        assert!(ops.contains(&MockOp::SetActive(0x1000, false)));
        assert!(ops.contains(&MockOp::SetActive(0x3000, false)));
    }

    #[test]
    fn test_enable_is_idempotent() {
        let mut engine = ready_engine();
        engine.install(0x1000, 0x2000).unwrap();
        engine.enable(0x1000).unwrap();
        engine.enable(0x1000).unwrap();

        let activations = engine
            .backend
            .ops()
            .iter()
            .filter(|op| **op == MockOp::SetActive(0x1000, true))
            .count();
        assert_eq!(activations, 1);
    }
}
