use serde::{Deserialize, Serialize};

/// Byte offsets of the hookable functions, relative to the module base.
///
/// One entry per hookable behavior. Each offset must point at a function
/// whose calling convention matches the corresponding interceptor exactly;
/// that correspondence is a property of the host build and is not checked
/// at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffsetTable {
    pub version: String,
    /// Backend URL construction routine (find with "?sdk=").
    pub get_url: u64,
    /// Matchmaking ready-up routine.
    pub set_ready_for_match: u64,
    /// The host's global allocator pointer. Strings handed back to the
    /// host must come from this allocator, or the host's free path walks
    /// into foreign memory.
    pub g_malloc: u64,
}

impl Default for OffsetTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl OffsetTable {
    /// Offsets for the supported host build.
    pub fn builtin() -> Self {
        Self {
            version: "1.0.0".to_string(),
            get_url: 0xCE_EF00,
            set_ready_for_match: 0x196_75D0,
            g_malloc: 0x63E_C4A0,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.version.is_empty()
            && self.get_url != 0
            && self.set_ready_for_match != 0
            && self.g_malloc != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_valid() {
        assert!(OffsetTable::builtin().is_valid());
    }

    #[test]
    fn test_zeroed_offsets_are_invalid() {
        let mut table = OffsetTable::builtin();
        table.get_url = 0;
        assert!(!table.is_valid());

        let mut table = OffsetTable::builtin();
        table.set_ready_for_match = 0;
        assert!(!table.is_valid());

        let mut table = OffsetTable::builtin();
        table.g_malloc = 0;
        assert!(!table.is_valid());

        let mut table = OffsetTable::builtin();
        table.version.clear();
        assert!(!table.is_valid());
    }
}
