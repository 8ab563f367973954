// modman-core/src/store.rs
// Content-addressable cache of downloaded mod artifacts, keyed by
// (mod id, version token). No knowledge of profiles.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use modman_common::error::{ModmanError, Result};
use modman_common::io;
use modman_common::model::{ModRelease, VersionToken};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const INDEX_FILE_NAME: &str = "index.json";

/// One immutable cached artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub mod_id: u64,
    pub version: VersionToken,
    /// Filename as reported by the provider at download time.
    pub filename: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    version: VersionToken,
    filename: String,
}

/// Newest known version token per mod id, persisted at the store root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreIndex {
    mods: BTreeMap<u64, IndexEntry>,
}

/// On-disk layout: one subdirectory per mod id, one file per version
/// token (`<token>-<filename>`), plus `index.json` at the root. Entries
/// are immutable once written; a new version token always produces a new
/// file. The only permitted overwrite is a forced re-fetch of the same
/// token, which replaces the payload via an atomic rename.
#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    index: StoreIndex,
}

impl ArtifactStore {
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        let index_path = root.join(INDEX_FILE_NAME);
        let index = if index_path.is_file() {
            io::read_json(&index_path)
                .map_err(|e| ModmanError::Store(format!("Failed to read store index: {e}")))?
        } else {
            StoreIndex::default()
        };
        Ok(Self {
            root: root.to_path_buf(),
            index,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, mod_id: u64, version: &VersionToken, filename: &str) -> PathBuf {
        self.root
            .join(mod_id.to_string())
            .join(format!("{version}-{filename}"))
    }

    /// Scratch location downloads are streamed to before `insert` moves
    /// them into place. Lives under the mod's own subdirectory so the
    /// final rename stays on one filesystem.
    pub fn scratch_path(&self, mod_id: u64, version: &VersionToken) -> PathBuf {
        Self::scratch_path_in(&self.root, mod_id, version)
    }

    pub fn scratch_path_in(root: &Path, mod_id: u64, version: &VersionToken) -> PathBuf {
        root.join(mod_id.to_string())
            .join(format!(".incoming-{version}"))
    }

    /// Newest known cached artifact for a mod id, if any.
    pub fn newest(&self, mod_id: u64) -> Option<StoredArtifact> {
        let entry = self.index.mods.get(&mod_id)?;
        let path = self.entry_path(mod_id, &entry.version, &entry.filename);
        if !path.is_file() {
            warn!(
                "Store index lists {} for mod {} but the file is missing",
                path.display(),
                mod_id
            );
            return None;
        }
        Some(StoredArtifact {
            mod_id,
            version: entry.version.clone(),
            filename: entry.filename.clone(),
            path,
        })
    }

    /// Moves a fully downloaded payload into the store and records it as
    /// the newest entry for its mod id. The payload rename is atomic and
    /// the index rewrite goes through a temp file, so a crash leaves
    /// either the previous index or the new one, never a torn state.
    pub fn insert(&mut self, release: &ModRelease, payload: &Path) -> Result<StoredArtifact> {
        let dest = self.entry_path(release.mod_id, &release.version, &release.filename);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(payload, &dest).map_err(|e| {
            ModmanError::Store(format!(
                "Failed to move artifact into store at {}: {e}",
                dest.display()
            ))
        })?;
        debug!(
            "Stored artifact for mod {} at {}",
            release.mod_id,
            dest.display()
        );

        self.index.mods.insert(
            release.mod_id,
            IndexEntry {
                version: release.version.clone(),
                filename: release.filename.clone(),
            },
        );
        self.save_index()?;

        Ok(StoredArtifact {
            mod_id: release.mod_id,
            version: release.version.clone(),
            filename: release.filename.clone(),
            path: dest,
        })
    }

    fn save_index(&self) -> Result<()> {
        io::write_json(&self.root.join(INDEX_FILE_NAME), &self.index)
    }
}
