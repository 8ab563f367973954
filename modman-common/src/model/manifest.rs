// modman-common/src/model/manifest.rs
use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::VersionToken;
use crate::error::{ModmanError, Result};
use crate::io;

/// One deployed file: where it came from and what bytes were placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub mod_id: u64,
    pub version: VersionToken,
    /// SHA-256 of the deployed file, hex encoded.
    pub fingerprint: String,
    pub updated_at: DateTime<Utc>,
}

/// Durable record of which files the pipeline has placed in a profile's
/// install directory and why. Owned exclusively by the pipeline; every
/// persisted write goes through an atomic temp-file rename, so the file
/// on disk always describes a complete deployment, never an
/// intermediate state.
///
/// Keys are install-relative paths, forward-slash normalized. The
/// `BTreeMap` ordering plus the fixed serializer make load -> save
/// byte-identical when nothing changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentManifest {
    pub profile_id: Uuid,
    pub entries: BTreeMap<String, ManifestEntry>,
}

impl DeploymentManifest {
    pub fn empty(profile_id: Uuid) -> Self {
        Self {
            profile_id,
            entries: BTreeMap::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        io::read_json(path).map_err(|e| {
            ModmanError::Manifest(format!(
                "Failed to read deployment manifest {}: {e}",
                path.display()
            ))
        })
    }

    /// Loads the persisted manifest, or an empty one on first run.
    pub fn load_or_empty(path: &Path, profile_id: Uuid) -> Result<Self> {
        if path.is_file() {
            let manifest = Self::load(path)?;
            if manifest.profile_id != profile_id {
                return Err(ModmanError::Manifest(format!(
                    "Manifest {} belongs to profile {}, expected {}",
                    path.display(),
                    manifest.profile_id,
                    profile_id
                )));
            }
            Ok(manifest)
        } else {
            debug!(
                "No deployment manifest at {}, starting empty",
                path.display()
            );
            Ok(Self::empty(profile_id))
        }
    }

    /// Atomically replaces the persisted manifest with this snapshot.
    pub fn save(&self, path: &Path) -> Result<()> {
        io::write_json(path, self)
    }

    pub fn insert(&mut self, rel_path: String, entry: ManifestEntry) {
        self.entries.insert(rel_path, entry);
    }

    pub fn get(&self, rel_path: &str) -> Option<&ManifestEntry> {
        self.entries.get(rel_path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
