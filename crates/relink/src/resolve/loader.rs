use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::resolve::OffsetTable;

/// Load an offset table from a JSON file.
///
/// Supporting a new host build is a data change: drop an updated table next
/// to the agent instead of rebuilding it.
pub fn load_offsets<P: AsRef<Path>>(path: P) -> Result<OffsetTable> {
    let content = fs::read_to_string(path.as_ref())?;
    let table: OffsetTable = serde_json::from_str(&content)?;

    if !table.is_valid() {
        return Err(Error::InvalidOffsets(format!(
            "table version {:?} contains zeroed offsets",
            table.version
        )));
    }

    info!("Loaded offset table version {}", table.version);
    Ok(table)
}

/// Save an offset table as pretty-printed JSON.
pub fn save_offsets<P: AsRef<Path>>(table: &OffsetTable, path: P) -> Result<()> {
    let content = serde_json::to_string_pretty(table)?;
    fs::write(path.as_ref(), content)?;
    Ok(())
}

/// Load offsets from `path` if the file exists, falling back to the
/// builtin table otherwise.
pub fn load_offsets_or_builtin<P: AsRef<Path>>(path: P) -> OffsetTable {
    match load_offsets(path.as_ref()) {
        Ok(table) => table,
        Err(e) if e.is_not_found() => OffsetTable::builtin(),
        Err(e) => {
            tracing::warn!(
                "Failed to load offsets from {:?}: {e}, using builtin table",
                path.as_ref()
            );
            OffsetTable::builtin()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offsets.json");

        let table = OffsetTable::builtin();
        save_offsets(&table, &path).unwrap();

        let loaded = load_offsets(&path).unwrap();
        assert_eq!(loaded.version, table.version);
        assert_eq!(loaded.get_url, table.get_url);
        assert_eq!(loaded.set_ready_for_match, table.set_ready_for_match);
        assert_eq!(loaded.g_malloc, table.g_malloc);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = load_offsets("does-not-exist.json").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_invalid_table_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offsets.json");

        let mut table = OffsetTable::builtin();
        table.get_url = 0;
        save_offsets(&table, &path).unwrap();

        assert!(matches!(
            load_offsets(&path),
            Err(Error::InvalidOffsets(_))
        ));
    }

    #[test]
    fn test_fallback_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let table = load_offsets_or_builtin(dir.path().join("offsets.json"));
        assert_eq!(table.get_url, OffsetTable::builtin().get_url);
    }
}
