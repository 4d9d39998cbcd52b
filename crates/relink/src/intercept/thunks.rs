//! Raw interceptor entry points for the supported host build.
//!
//! These functions are installed over the host's own routines, so their
//! signatures must match the originals' x64 calling convention exactly.
//! Each thunk decodes the raw arguments, runs the pure behavior logic,
//! and either tail-calls the displaced original or materializes the
//! synthesized result. A panic must never unwind into the host's stack;
//! every thunk catches and degrades to its safe fallback.

use std::ffi::c_void;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::error;

use crate::intercept::{self, DEFAULT_BACKEND, Disposition};

/// Signature of the host allocator's `Malloc`, reached through the
/// allocator object's vtable.
type HostAllocFn =
    unsafe extern "system" fn(this: *mut c_void, size: usize, alignment: u32) -> *mut c_void;

/// Vtable slot of `Malloc` in the host's allocator object, after the
/// virtual destructor. A fixed fact of the supported host build, like the
/// offsets themselves.
const HOST_ALLOC_SLOT: usize = 1;

/// Allocate `size` bytes from the host's own allocator.
///
/// `slot_addr` is the resolved address of the host's global allocator
/// pointer. Returns `None` when any link in the chain is missing, in
/// which case the caller must not hand the host a buffer at all.
unsafe fn host_allocate(slot_addr: u64, size: usize) -> Option<*mut u8> {
    if slot_addr == 0 {
        return None;
    }

    // SAFETY: slot_addr was resolved from the configured allocator offset
    // inside the host image; the chain of loads mirrors the host's own
    // allocator dispatch.
    unsafe {
        let allocator = *(slot_addr as *const *mut c_void);
        if allocator.is_null() {
            return None;
        }
        let vtable = *(allocator as *const *const HostAllocFn);
        if vtable.is_null() {
            return None;
        }
        let malloc = *vtable.add(HOST_ALLOC_SLOT);
        let buf = malloc(allocator, size, 0) as *mut u8;
        if buf.is_null() { None } else { Some(buf) }
    }
}

/// The host's counted UTF-16 string, by layout.
///
/// `num` counts elements including the terminating NUL. The host owns any
/// string it receives and will eventually release the buffer through its
/// own allocator, so buffers must come from that allocator — a Rust-side
/// allocation here would send a foreign pointer down the host's free path
/// and corrupt its heap.
#[repr(C)]
pub struct HostString {
    data: *mut u16,
    num: i32,
    max: i32,
}

impl HostString {
    /// The empty string: a null buffer, which the host's release path
    /// skips. The only value that is safe to fabricate without the host
    /// allocator.
    pub const fn empty() -> Self {
        Self {
            data: std::ptr::null_mut(),
            num: 0,
            max: 0,
        }
    }

    /// Encode `s` into a buffer owned by the host allocator behind
    /// `host_alloc`. Falls back to [`empty`](Self::empty) when the
    /// allocator is unavailable.
    pub fn encode(s: &str, host_alloc: u64) -> Self {
        let mut units: Vec<u16> = s.encode_utf16().collect();
        units.push(0);
        let num = units.len() as i32;

        // SAFETY: the buffer is sized for exactly the encoded units and
        // ownership transfers to the host with the returned struct.
        let Some(buf) = (unsafe { host_allocate(host_alloc, units.len() * 2) }) else {
            error!("Host allocator unavailable, returning empty string");
            return Self::empty();
        };
        let data = buf as *mut u16;
        unsafe {
            std::ptr::copy_nonoverlapping(units.as_ptr(), data, units.len());
        }

        Self {
            data,
            num,
            max: num,
        }
    }

    pub fn to_string_lossy(&self) -> String {
        if self.data.is_null() || self.num <= 0 {
            return String::new();
        }
        // SAFETY: the host guarantees num valid UTF-16 elements behind
        // data, the last of which is the terminator.
        let units = unsafe { std::slice::from_raw_parts(self.data, self.num as usize - 1) };
        String::from_utf16_lossy(units)
    }
}

/// Signature of the displaced ready-up original.
pub type SetReadyFn = unsafe extern "system" fn(this: *mut c_void);

/// Replacement for the host's URL construction routine. Rewrite behavior:
/// the original is never called.
pub unsafe extern "system" fn get_url_thunk(
    _settings: *mut c_void,
    call_path: *const HostString,
) -> HostString {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let path = if call_path.is_null() {
            String::new()
        } else {
            // SAFETY: the host passes a live HostString reference.
            unsafe { (*call_path).to_string_lossy() }
        };

        match intercept::published() {
            Some(ctx) => intercept::rewrite_url(ctx, &path),
            // Hooks are enabled only after publication; this arm is
            // unreachable in a correctly sequenced startup.
            None => format!("{DEFAULT_BACKEND}{path}"),
        }
    }));

    let host_alloc = intercept::published().map(|ctx| ctx.host_alloc).unwrap_or(0);
    match result {
        Ok(url) => HostString::encode(&url, host_alloc),
        Err(_) => {
            error!("get_url interceptor panicked, returning default backend");
            HostString::encode(DEFAULT_BACKEND, host_alloc)
        }
    }
}

/// Replacement for the host's matchmaking ready-up routine. Suppress
/// behavior, gated by policy; pass-through when the flag is clear.
pub unsafe extern "system" fn set_ready_for_match_thunk(this: *mut c_void) {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let Some(ctx) = intercept::published() else {
            return;
        };

        match intercept::ready_for_match(ctx) {
            Disposition::Return(()) => {}
            Disposition::Forward => {
                if ctx.original_set_ready != 0 {
                    // SAFETY: original_set_ready is the trampoline the
                    // engine produced for exactly this signature.
                    let original: SetReadyFn =
                        unsafe { std::mem::transmute(ctx.original_set_ready) };
                    unsafe { original(this) };
                }
            }
        }
    }));

    if result.is_err() {
        error!("set_ready_for_match interceptor panicked, call dropped");
    }
}
