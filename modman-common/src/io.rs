// modman-common/src/io.rs
// Atomic file persistence primitives shared by the manifest and the
// artifact store index.
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, error};

use super::error::{ModmanError, Result};

/// Atomically writes data to a file using a temporary file in the same
/// directory followed by a rename. A crash mid-write never leaves a
/// half-written file at `path`.
pub fn atomic_write_file(path: &Path, content: &[u8]) -> Result<()> {
    let dir = path.parent().ok_or_else(|| {
        ModmanError::Generic(format!("Cannot get parent directory for {}", path.display()))
    })?;
    fs::create_dir_all(dir)?;

    let mut temp_file = NamedTempFile::new_in(dir)?;
    debug!(
        "Atomically writing {} bytes to {} via temp file {}",
        content.len(),
        path.display(),
        temp_file.path().display()
    );

    temp_file.write_all(content)?;
    temp_file.flush()?;
    temp_file.as_file().sync_all()?;

    temp_file.persist(path).map_err(|e| {
        error!(
            "Failed to persist temporary file over {}: {}",
            path.display(),
            e.error
        );
        ModmanError::Io(Arc::new(e.error))
    })?;
    Ok(())
}

/// Serializes `data` as pretty JSON and writes it atomically.
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    debug!("Writing JSON to: {}", path.display());
    let json_bytes = serde_json::to_vec_pretty(data).map_err(|e| ModmanError::Json(Arc::new(e)))?;
    atomic_write_file(path, &json_bytes)
}

/// Reads and deserializes a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("Reading JSON from: {}", path.display());
    let json_bytes = fs::read(path)?;
    serde_json::from_slice(&json_bytes).map_err(|e| ModmanError::Json(Arc::new(e)))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn atomic_write_replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.json");
        atomic_write_file(&path, b"first").unwrap();
        atomic_write_file(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
        // No temp file debris left behind.
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let mut data = BTreeMap::new();
        data.insert("a".to_string(), 1u64);
        data.insert("b".to_string(), 2u64);
        write_json(&path, &data).unwrap();
        let loaded: BTreeMap<String, u64> = read_json(&path).unwrap();
        assert_eq!(loaded, data);
    }
}
