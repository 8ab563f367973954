// modman-core/src/lock.rs
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use modman_common::error::{ModmanError, Result};
use tracing::{debug, warn};

/// Exclusive advisory lock over one profile's deployment manifest.
///
/// Backed by a lock file created with `O_EXCL` in the profile's state
/// directory and holding the owner pid. Deploy and Cleanup must hold it;
/// Download and Stage never touch the manifest or the live install
/// directory and run unlocked. Released on drop.
#[derive(Debug)]
pub struct ManifestLock {
    path: PathBuf,
}

impl ManifestLock {
    pub fn acquire(path: &Path, profile_name: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    ModmanError::Locked(profile_name.to_string(), path.to_path_buf())
                } else {
                    ModmanError::from(e)
                }
            })?;
        // Owner pid recorded for operator diagnosis of a stale lock.
        let _ = write!(file, "{}", std::process::id());
        debug!("Acquired manifest lock {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for ManifestLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(
                "Failed to remove manifest lock {}: {}",
                self.path.display(),
                e
            );
        } else {
            debug!("Released manifest lock {}", self.path.display());
        }
    }
}
