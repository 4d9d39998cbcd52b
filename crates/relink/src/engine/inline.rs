//! Inline-patching backend for x86_64 Windows.
//!
//! Redirection works by overwriting the target's prologue with an absolute
//! indirect jump to the replacement. The displaced prologue bytes are
//! relocated into a trampoline stub followed by a jump back into the target,
//! which becomes the callable address of the original.
//!
//! The backend relocates a fixed 16-byte prologue window verbatim. Targets
//! whose first 16 bytes contain RIP-relative instructions or instruction
//! boundaries that straddle the window are not supported; the configured
//! offsets are trusted to point at functions with a plain relocatable
//! prologue, the same trust boundary as the offsets themselves.

use std::ffi::c_void;

use windows::Win32::System::Diagnostics::Debug::FlushInstructionCache;
use windows::Win32::System::Memory::{
    MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_EXECUTE_READWRITE, PAGE_PROTECTION_FLAGS,
    VirtualAlloc, VirtualFree, VirtualProtect,
};
use windows::Win32::System::Threading::GetCurrentProcess;

use crate::engine::HookBackend;
use crate::error::{Error, Result};

/// `jmp [rip+0]` followed by the 8-byte absolute destination.
const PATCH_LEN: usize = 14;

/// Prologue bytes displaced into the trampoline.
const PROLOGUE_LEN: usize = 16;

/// Per-hook slot in the trampoline slab: relocated prologue + jump back.
const TRAMPOLINE_STRIDE: usize = 48;

const SLAB_SIZE: usize = 4096;

fn absolute_jmp(dest: u64) -> [u8; PATCH_LEN] {
    let mut bytes = [0u8; PATCH_LEN];
    bytes[..6].copy_from_slice(&[0xFF, 0x25, 0x00, 0x00, 0x00, 0x00]);
    bytes[6..].copy_from_slice(&dest.to_le_bytes());
    bytes
}

struct Prepared {
    target: u64,
    original: [u8; PROLOGUE_LEN],
    patch: [u8; PATCH_LEN],
}

/// Trampoline backend patching function prologues in the current process.
pub struct InlineBackend {
    slab: *mut u8,
    next: usize,
    prepared: Vec<Prepared>,
}

// The raw slab pointer is only touched from the setup thread; the engine
// serializes all backend calls.
unsafe impl Send for InlineBackend {}

impl InlineBackend {
    pub fn new() -> Self {
        Self {
            slab: std::ptr::null_mut(),
            next: 0,
            prepared: Vec::new(),
        }
    }

    fn prepared(&self, target: u64) -> Result<&Prepared> {
        self.prepared
            .iter()
            .find(|p| p.target == target)
            .ok_or_else(|| Error::HookEnable {
                target,
                reason: "target never prepared".into(),
            })
    }

    /// Overwrite the first `len` bytes at `target` under a temporary
    /// protection change, then flush the instruction cache.
    fn patch_code(&self, target: u64, bytes: &[u8]) -> Result<()> {
        let addr = target as *mut u8;
        let mut old = PAGE_PROTECTION_FLAGS(0);

        // SAFETY: the target was prepared earlier, so its prologue is a
        // known code region of at least PROLOGUE_LEN bytes.
        unsafe {
            VirtualProtect(
                addr as *const c_void,
                bytes.len(),
                PAGE_EXECUTE_READWRITE,
                &mut old,
            )
            .map_err(|e| Error::HookEnable {
                target,
                reason: format!("VirtualProtect failed: {e}"),
            })?;

            std::ptr::copy_nonoverlapping(bytes.as_ptr(), addr, bytes.len());

            let _ = VirtualProtect(addr as *const c_void, bytes.len(), old, &mut old);
            let _ = FlushInstructionCache(
                GetCurrentProcess(),
                Some(addr as *const c_void),
                bytes.len(),
            );
        }
        Ok(())
    }
}

impl Default for InlineBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HookBackend for InlineBackend {
    fn acquire(&mut self) -> Result<()> {
        // SAFETY: plain anonymous allocation; the slab holds trampoline
        // stubs and must be executable.
        let slab = unsafe {
            VirtualAlloc(
                None,
                SLAB_SIZE,
                MEM_COMMIT | MEM_RESERVE,
                PAGE_EXECUTE_READWRITE,
            )
        };
        if slab.is_null() {
            return Err(Error::EngineInit(
                "failed to allocate executable trampoline slab".into(),
            ));
        }

        self.slab = slab as *mut u8;
        self.next = 0;
        Ok(())
    }

    fn prepare(&mut self, target: u64, replacement: u64) -> Result<u64> {
        if self.next + TRAMPOLINE_STRIDE > SLAB_SIZE {
            return Err(Error::HookCreate {
                target,
                reason: "trampoline slab exhausted".into(),
            });
        }

        let mut original = [0u8; PROLOGUE_LEN];
        // SAFETY: target is a configured function entry point inside the
        // host image; reading its prologue is part of the documented trust
        // boundary around the offset table.
        unsafe {
            std::ptr::copy_nonoverlapping(target as *const u8, original.as_mut_ptr(), PROLOGUE_LEN);
        }

        // Trampoline: displaced prologue, then jump to the rest of the
        // original function.
        let trampoline = unsafe { self.slab.add(self.next) };
        let resume = absolute_jmp(target + PROLOGUE_LEN as u64);
        // SAFETY: the slot lies within the slab allocated in acquire.
        unsafe {
            std::ptr::copy_nonoverlapping(original.as_ptr(), trampoline, PROLOGUE_LEN);
            std::ptr::copy_nonoverlapping(
                resume.as_ptr(),
                trampoline.add(PROLOGUE_LEN),
                PATCH_LEN,
            );
            let _ = FlushInstructionCache(
                GetCurrentProcess(),
                Some(trampoline as *const c_void),
                TRAMPOLINE_STRIDE,
            );
        }
        self.next += TRAMPOLINE_STRIDE;

        self.prepared.push(Prepared {
            target,
            original,
            patch: absolute_jmp(replacement),
        });
        Ok(trampoline as u64)
    }

    fn set_active(&mut self, target: u64, active: bool) -> Result<()> {
        let prepared = self.prepared(target)?;
        let mut bytes = [0u8; PATCH_LEN];
        if active {
            bytes.copy_from_slice(&prepared.patch);
        } else {
            bytes.copy_from_slice(&prepared.original[..PATCH_LEN]);
        }
        self.patch_code(target, &bytes)
    }

    fn release(&mut self) -> Result<()> {
        if !self.slab.is_null() {
            // SAFETY: the slab was allocated by VirtualAlloc in acquire and
            // no trampoline can be live once the engine releases us.
            unsafe {
                let _ = VirtualFree(self.slab as *mut c_void, 0, MEM_RELEASE);
            }
            self.slab = std::ptr::null_mut();
        }
        self.next = 0;
        self.prepared.clear();
        Ok(())
    }
}
