// modman-core/src/pipeline/cleanup.rs
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use modman_common::config::Config;
use modman_common::error::{ModmanError, Result};
use modman_common::model::{diff_manifests, DeploymentManifest, Profile};
use tracing::{debug, info, warn};

use crate::extract::is_safe_rel_path;
use crate::lock::ManifestLock;
use crate::pipeline::deploy::DeployOutcome;
use crate::report::CleanupReport;

/// Cleanup phase following a deploy: removes every path the previous
/// manifest tracked that the new one no longer does. Only
/// manifest-tracked paths are ever deleted; unrelated operator files in
/// the install directory are never touched.
pub fn run_after_deploy(
    config: &Config,
    profile: &Profile,
    outcome: &DeployOutcome,
) -> Result<CleanupReport> {
    let _lock = ManifestLock::acquire(&config.manifest_lock_path(profile.id()), &profile.name)?;
    let report = remove_orphans(profile, &outcome.previous, &outcome.current)?;

    if !report.is_clean() {
        // The swapped manifest no longer lists the failed paths; put
        // them back so a later cleanup can retry instead of leaving
        // them on disk untracked forever.
        let mut retained = outcome.current.clone();
        for (path, _) in &report.failed {
            if let Some(entry) = outcome.previous.get(path) {
                retained.insert(path.clone(), entry.clone());
            }
        }
        retained.save(&config.manifest_path(profile.id()))?;
    } else if outcome.current.is_empty() {
        // A fully uninstalled profile leaves no manifest behind.
        remove_manifest_file(config, profile)?;
    }
    Ok(report)
}

/// Standalone cleanup, driven purely off the persisted manifest: keeps
/// entries whose mod id is still declared in the profile and removes the
/// rest. With an empty mod mapping this fully uninstalls the profile.
pub fn run_standalone(config: &Config, profile: &Profile) -> Result<CleanupReport> {
    let manifest_path = config.manifest_path(profile.id());
    if !manifest_path.is_file() {
        info!(
            "No deployment manifest for profile '{}', nothing to clean up",
            profile.name
        );
        return Ok(CleanupReport::default());
    }

    let _lock = ManifestLock::acquire(&config.manifest_lock_path(profile.id()), &profile.name)?;
    let previous = DeploymentManifest::load_or_empty(&manifest_path, profile.id())?;

    let declared: BTreeSet<u64> = profile.mods.values().copied().collect();
    let mut current = DeploymentManifest::empty(profile.id());
    for (path, entry) in &previous.entries {
        if declared.contains(&entry.mod_id) {
            current.insert(path.clone(), entry.clone());
        }
    }

    let report = remove_orphans(profile, &previous, &current)?;

    // Paths that failed to delete stay tracked so a retry can remove
    // them; everything successfully removed is dropped.
    for (path, _) in &report.failed {
        if let Some(entry) = previous.get(path) {
            current.insert(path.clone(), entry.clone());
        }
    }

    if current.is_empty() {
        remove_manifest_file(config, profile)?;
    } else {
        current.save(&manifest_path)?;
    }
    Ok(report)
}

/// Deletes the paths present in `previous` but absent from `current`,
/// then prunes directories the deletions emptied, walking upward and
/// stopping at the install directory root. A delete failure for one
/// path is reported and does not block the remaining paths.
fn remove_orphans(
    profile: &Profile,
    previous: &DeploymentManifest,
    current: &DeploymentManifest,
) -> Result<CleanupReport> {
    let install_dir = profile.install_path();
    let diff = diff_manifests(previous, current);
    let mut report = CleanupReport::default();

    for rel in diff.removed {
        if !is_safe_rel_path(&rel) {
            report.failed.push((
                rel.clone(),
                ModmanError::Manifest(format!("Unsafe manifest path '{rel}'")),
            ));
            continue;
        }
        let target = install_dir.join(&rel);
        if target.is_file() {
            match fs::remove_file(&target) {
                Ok(()) => {
                    info!("Removed {}", target.display());
                    report.removed.push(rel);
                }
                Err(e) => {
                    warn!("Failed to remove {}: {}", target.display(), e);
                    report.failed.push((rel, e.into()));
                }
            }
        } else {
            // Tracked but already gone; dropping it from the manifest is
            // the reconciliation.
            warn!(
                "Manifest listed {} for profile '{}' but it no longer exists",
                target.display(),
                profile.name
            );
            report.removed.push(rel);
        }
    }

    report.pruned_dirs = prune_empty_dirs(install_dir, &report.removed);
    Ok(report)
}

/// Walks upward from each removed path's parent, deleting directories
/// that became empty, never crossing the install root.
fn prune_empty_dirs(install_dir: &Path, removed: &[String]) -> Vec<String> {
    let mut pruned = Vec::new();
    let mut seen = BTreeSet::new();
    for rel in removed {
        let mut dir = match install_dir.join(rel).parent() {
            Some(d) => d.to_path_buf(),
            None => continue,
        };
        while dir.starts_with(install_dir) && dir != install_dir {
            if !seen.insert(dir.clone()) {
                break;
            }
            let is_empty = match fs::read_dir(&dir) {
                Ok(mut entries) => entries.next().is_none(),
                Err(_) => break,
            };
            if !is_empty {
                break;
            }
            debug!("Removing empty folder: {}", dir.display());
            if fs::remove_dir(&dir).is_err() {
                break;
            }
            pruned.push(dir.to_string_lossy().into_owned());
            dir = match dir.parent() {
                Some(p) => p.to_path_buf(),
                None => break,
            };
        }
    }
    pruned
}

fn remove_manifest_file(config: &Config, profile: &Profile) -> Result<()> {
    let manifest_path = config.manifest_path(profile.id());
    if manifest_path.is_file() {
        debug!(
            "Removing empty deployment manifest {}",
            manifest_path.display()
        );
        fs::remove_file(&manifest_path)?;
    }
    Ok(())
}
