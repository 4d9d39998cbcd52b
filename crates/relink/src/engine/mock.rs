//! Scriptable backend for engine and lifecycle tests.

use std::collections::HashSet;

use crate::engine::HookBackend;
use crate::error::{Error, Result};

/// Backend operation recorded by [`MockBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOp {
    Acquire,
    Prepare(u64, u64),
    SetActive(u64, bool),
    Release,
}

/// In-memory backend that records every call and can be scripted to fail.
///
/// `prepare` hands out `target | ORIGINAL_TAG` as the fake address of the
/// displaced original so tests can tell originals and targets apart.
#[derive(Default)]
pub struct MockBackend {
    ops: Vec<MockOp>,
    fail_acquire: bool,
    fail_prepare: HashSet<u64>,
    fail_activate: HashSet<u64>,
}

impl MockBackend {
    pub const ORIGINAL_TAG: u64 = 0xFAB0_0000_0000_0000;

    pub fn new() -> Self {
        Self::default()
    }

    /// Script `acquire` to fail, simulating an unavailable mechanism.
    pub fn fail_acquire(mut self) -> Self {
        self.fail_acquire = true;
        self
    }

    /// Script `prepare` to fail for `target`, simulating an unsuitable
    /// prologue.
    pub fn fail_prepare_at(mut self, target: u64) -> Self {
        self.fail_prepare.insert(target);
        self
    }

    /// Script `set_active` to fail for `target`.
    pub fn fail_activate_at(mut self, target: u64) -> Self {
        self.fail_activate.insert(target);
        self
    }

    /// Every backend call so far, in order.
    pub fn ops(&self) -> &[MockOp] {
        &self.ops
    }
}

impl HookBackend for MockBackend {
    fn acquire(&mut self) -> Result<()> {
        self.ops.push(MockOp::Acquire);
        if self.fail_acquire {
            return Err(Error::EngineInit("mock acquire failure".into()));
        }
        Ok(())
    }

    fn prepare(&mut self, target: u64, replacement: u64) -> Result<u64> {
        self.ops.push(MockOp::Prepare(target, replacement));
        if self.fail_prepare.contains(&target) {
            return Err(Error::HookCreate {
                target,
                reason: "mock prepare failure".into(),
            });
        }
        Ok(target | Self::ORIGINAL_TAG)
    }

    fn set_active(&mut self, target: u64, active: bool) -> Result<()> {
        self.ops.push(MockOp::SetActive(target, active));
        if self.fail_activate.contains(&target) {
            return Err(Error::HookEnable {
                target,
                reason: "mock activation failure".into(),
            });
        }
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.ops.push(MockOp::Release);
        Ok(())
    }
}
