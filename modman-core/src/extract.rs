// modman-core/src/extract.rs
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use modman_common::error::{ModmanError, Result};
use tracing::{debug, error, warn};
use zip::read::ZipArchive;

/// Extracts a mod zip archive into `target_dir`, preserving the archive's
/// internal layout. Entry paths are validated component by component;
/// `..`, absolute paths and anything escaping `target_dir` abort the
/// extraction. Symlink entries are skipped (mod archives have no
/// legitimate use for them).
pub fn extract_zip_archive(archive_path: &Path, target_dir: &Path) -> Result<()> {
    debug!(
        "Extracting archive '{}' to '{}'",
        archive_path.display(),
        target_dir.display()
    );
    fs::create_dir_all(target_dir)?;

    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| {
        ModmanError::Generic(format!(
            "Failed to open ZIP {}: {e}",
            archive_path.display()
        ))
    })?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| {
            ModmanError::Generic(format!(
                "Error reading ZIP index {i} in {}: {e}",
                archive_path.display()
            ))
        })?;

        let entry_path = match entry.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => {
                debug!("Skipping unsafe ZIP entry name {}", entry.name());
                continue;
            }
        };

        let mut target_path = target_dir.to_path_buf();
        for comp in entry_path.components() {
            match comp {
                Component::Normal(p) => target_path.push(p),
                Component::CurDir => {}
                Component::ParentDir => {
                    error!(
                        "Unsafe '..' in ZIP path {} in {}",
                        entry_path.display(),
                        archive_path.display()
                    );
                    return Err(ModmanError::Generic(format!(
                        "Unsafe '..' component in ZIP path {}",
                        entry_path.display()
                    )));
                }
                Component::Prefix(_) | Component::RootDir => {
                    return Err(ModmanError::Generic(format!(
                        "Disallowed component in ZIP path {}",
                        entry_path.display()
                    )));
                }
            }
        }
        if !target_path.starts_with(target_dir) {
            error!(
                "ZIP path traversal detected: {} -> {}",
                entry_path.display(),
                target_path.display()
            );
            return Err(ModmanError::Generic(format!(
                "ZIP path traversal detected in {}",
                archive_path.display()
            )));
        }

        if entry.is_dir() {
            fs::create_dir_all(&target_path)?;
            continue;
        }
        if entry.is_symlink() {
            warn!(
                "Skipping symlink entry {} in {}",
                entry_path.display(),
                archive_path.display()
            );
            continue;
        }

        if let Some(parent) = target_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut out_file = File::create(&target_path)?;
        io::copy(&mut entry, &mut out_file)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                if target_path.is_file() {
                    fs::set_permissions(&target_path, fs::Permissions::from_mode(mode))?;
                }
            }
        }
    }
    debug!("Finished ZIP extraction for {}", archive_path.display());
    Ok(())
}

/// Relative install path of `path` below `root`, forward-slash
/// normalized. These strings key the staged file set and the deployment
/// manifest.
pub fn normalized_rel_path(path: &Path, root: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).map_err(|_| {
        ModmanError::Generic(format!(
            "{} is not below {}",
            path.display(),
            root.display()
        ))
    })?;
    let mut parts = Vec::new();
    for comp in rel.components() {
        match comp {
            Component::Normal(p) => parts.push(p.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(ModmanError::Generic(format!(
                    "Unsafe component in relative path {}",
                    rel.display()
                )))
            }
        }
    }
    Ok(parts.join("/"))
}

/// Re-checks a manifest-supplied relative path before it is joined to the
/// install directory. Rejects anything that could escape the root.
pub fn is_safe_rel_path(rel: &str) -> bool {
    if rel.is_empty() {
        return false;
    }
    let path = PathBuf::from(rel);
    path.components()
        .all(|c| matches!(c, Component::Normal(_)))
}
