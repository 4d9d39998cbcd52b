use crate::error::Result;

/// The raw trampoline mechanism behind the hook engine.
///
/// A backend knows how to displace a function's entry point and hand back a
/// callable address for the displaced code; it performs no bookkeeping of
/// its own. [`HookEngine`](crate::engine::HookEngine) owns the binding
/// state and calls a backend exactly once per transition, so backends may
/// assume well-ordered inputs: `acquire` before anything else, `prepare`
/// at most once per target, `set_active` only for prepared targets.
pub trait HookBackend {
    /// Acquire whatever the mechanism needs up front (e.g. an executable
    /// slab for trampoline stubs). Failure is fatal for agent startup.
    fn acquire(&mut self) -> Result<()>;

    /// Build the redirection machinery for `target` without activating it,
    /// and return the callable address of the displaced original.
    fn prepare(&mut self, target: u64, replacement: u64) -> Result<u64>;

    /// Activate or deactivate the redirection at a prepared target.
    fn set_active(&mut self, target: u64, active: bool) -> Result<()>;

    /// Release everything `acquire` and `prepare` allocated.
    fn release(&mut self) -> Result<()>;
}
