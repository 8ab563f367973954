// modman-common/src/model/profile.rs
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ModmanError, Result};
use crate::io;

/// Declarative description of which mods should be installed where.
///
/// Owned by the operator and editable externally; the pipeline reads it
/// per run and never mutates the mod mapping. The only field modman
/// writes back is `id`, generated once when a profile is first loaded
/// without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Stable unique identity, keys the per-profile state directory.
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub install_directory: PathBuf,
    /// Display name -> provider mod id. Keys are unique; iteration order
    /// is the sorted display order. May be empty (no-op profile, or a
    /// standalone full uninstall when fed to cleanup).
    #[serde(default)]
    pub mods: BTreeMap<String, u64>,
}

impl Profile {
    /// Loads a profile, generating and persisting an identity if the file
    /// predates identity tracking.
    pub fn load(path: &Path) -> Result<Self> {
        let mut profile: Profile = io::read_json(path).map_err(|e| {
            ModmanError::Profile(format!("Failed to read profile {}: {e}", path.display()))
        })?;
        if profile.name.is_empty() {
            return Err(ModmanError::Profile(format!(
                "Profile {} has an empty name",
                path.display()
            )));
        }
        if profile.id.is_none() {
            let id = Uuid::new_v4();
            debug!(
                "Generating new identity {id} for profile '{}', writing back to {}",
                profile.name,
                path.display()
            );
            profile.id = Some(id);
            profile.save(path)?;
        }
        Ok(profile)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        io::write_json(path, self)
    }

    /// Writes an empty skeleton for the operator to fill in.
    pub fn create_empty(path: &Path, name: &str) -> Result<Self> {
        let profile = Profile {
            id: Some(Uuid::new_v4()),
            name: name.to_string(),
            install_directory: PathBuf::new(),
            mods: BTreeMap::new(),
        };
        profile.save(path)?;
        Ok(profile)
    }

    /// Identity is always present after `load`.
    pub fn id(&self) -> Uuid {
        self.id.unwrap_or(Uuid::nil())
    }

    pub fn install_path(&self) -> &Path {
        &self.install_directory
    }
}
