//! Module base address and offset resolution.
//!
//! The host's main image is loaded at some base address; every hookable
//! function is identified by a fixed byte offset from that base. Resolution
//! is pure arithmetic — the offsets are trusted configuration, and no
//! attempt is made to verify that the result points at executable code.

/// Load address of the host process's main executable image.
///
/// Obtained once at startup and immutable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleBase(u64);

impl ModuleBase {
    pub fn new(addr: u64) -> Self {
        Self(addr)
    }

    pub fn addr(&self) -> u64 {
        self.0
    }

    /// Absolute address of the function at `offset` bytes from the base.
    ///
    /// Wraps on overflow rather than panicking; a wrapped address is as
    /// garbage-in/garbage-out as any other bad offset.
    pub fn resolve(&self, offset: u64) -> u64 {
        self.0.wrapping_add(offset)
    }

    /// Base address of the current process's main module.
    #[cfg(target_os = "windows")]
    pub fn current_process() -> crate::Result<Self> {
        use windows::Win32::System::LibraryLoader::GetModuleHandleW;

        // SAFETY: GetModuleHandleW(None) returns the handle of the calling
        // process's executable image, which is its load address.
        let handle = unsafe { GetModuleHandleW(None) }
            .map_err(|e| crate::Error::EngineInit(format!("GetModuleHandleW failed: {e}")))?;
        Ok(Self(handle.0 as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_base_plus_offset() {
        let base = ModuleBase::new(0x7ff6_4000_0000);
        assert_eq!(base.resolve(0), 0x7ff6_4000_0000);
        assert_eq!(base.resolve(0xCEE_F00), 0x7ff6_40CE_EF00);
        assert_eq!(base.resolve(0x196_75D0), 0x7ff6_4196_75D0);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let base = ModuleBase::new(0x1_0000);
        for offset in [0u64, 1, 0x40, 0xFFFF, u64::MAX / 2] {
            assert_eq!(base.resolve(offset), base.resolve(offset));
            assert_eq!(base.resolve(offset), 0x1_0000u64.wrapping_add(offset));
        }
    }

    #[test]
    fn test_resolve_wraps_on_overflow() {
        let base = ModuleBase::new(u64::MAX);
        assert_eq!(base.resolve(1), 0);
    }
}
