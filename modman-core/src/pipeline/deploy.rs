// modman-core/src/pipeline/deploy.rs
use std::fs;
use std::path::Path;

use chrono::Utc;
use modman_common::config::Config;
use modman_common::error::{ModmanError, Result};
use modman_common::model::{DeploymentManifest, ManifestEntry, Profile};
use modman_net::file_fingerprint;
use tracing::{debug, info};

use crate::lock::ManifestLock;
use crate::pipeline::stage::StagedSet;
use crate::report::DeployReport;

/// Result of a deploy pass. `previous` is the manifest as it stood
/// before the swap; cleanup diffs it against `current` to find orphans.
#[derive(Debug)]
pub struct DeployOutcome {
    pub report: DeployReport,
    pub previous: DeploymentManifest,
    pub current: DeploymentManifest,
}

/// Deploy phase: move every staged file into the install directory,
/// building a candidate manifest, then atomically swap the persisted
/// manifest to the candidate.
///
/// The swap is the linchpin: the manifest on disk always describes
/// either the previous complete deployment or the new one. A failure to
/// place any single file aborts before the swap — files already placed
/// this run stay behind, but the manifest still points at the old state,
/// so a retry reconciles correctly. Filesystem rollback is best-effort
/// by design, not guaranteed.
pub fn run(config: &Config, profile: &Profile, staged: &StagedSet) -> Result<DeployOutcome> {
    info!("Deploying staged mods for profile '{}'", profile.name);

    let install_dir = profile.install_path();
    ensure_writable(install_dir)?;

    let _lock = ManifestLock::acquire(&config.manifest_lock_path(profile.id()), &profile.name)?;

    let manifest_path = config.manifest_path(profile.id());
    let previous = DeploymentManifest::load_or_empty(&manifest_path, profile.id())?;
    let mut candidate = DeploymentManifest::empty(profile.id());
    let mut report = DeployReport::default();

    for file in &staged.files {
        let fingerprint = file_fingerprint(&file.source)?;
        let target = install_dir.join(&file.rel_path);

        let unchanged = previous
            .get(&file.rel_path)
            .is_some_and(|prev| prev.fingerprint == fingerprint && target.is_file());

        let entry = if unchanged {
            // No-op move; the entry is still refreshed into the
            // candidate. `updated_at` is the last time the bytes
            // actually changed, so an unchanged redeploy reproduces the
            // manifest bit-exactly.
            let prev = previous.get(&file.rel_path).cloned();
            debug!("Unchanged: {}", file.rel_path);
            report.unchanged.push(file.rel_path.clone());
            ManifestEntry {
                mod_id: file.mod_id,
                version: file.version.clone(),
                fingerprint,
                updated_at: prev.map(|p| p.updated_at).unwrap_or_else(Utc::now),
            }
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            move_file(&file.source, &target)?;
            debug!("Placed {} -> {}", file.rel_path, target.display());
            report.placed.push(file.rel_path.clone());
            ManifestEntry {
                mod_id: file.mod_id,
                version: file.version.clone(),
                fingerprint,
                updated_at: Utc::now(),
            }
        };
        candidate.insert(file.rel_path.clone(), entry);
    }

    // Atomic swap: previous complete state -> new complete state.
    candidate.save(&manifest_path)?;
    info!(
        "Deployed {} file(s) ({} unchanged) for '{}'",
        report.placed.len(),
        report.unchanged.len(),
        profile.name
    );

    Ok(DeployOutcome {
        report,
        previous,
        current: candidate,
    })
}

/// The install directory must be writable before deploy runs.
fn ensure_writable(install_dir: &Path) -> Result<()> {
    fs::create_dir_all(install_dir)
        .map_err(|_| ModmanError::InstallDirUnwritable(install_dir.to_path_buf()))?;
    let probe = tempfile::NamedTempFile::new_in(install_dir)
        .map_err(|_| ModmanError::InstallDirUnwritable(install_dir.to_path_buf()))?;
    drop(probe);
    Ok(())
}

/// Rename within a filesystem, copy+remove across filesystems (the
/// staging area lives under the cache root, the install directory often
/// does not).
fn move_file(source: &Path, target: &Path) -> Result<()> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(source, target)?;
            fs::remove_file(source)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use modman_common::model::VersionToken;
    use uuid::Uuid;

    use super::*;
    use crate::pipeline::stage::StagedFile;

    fn test_config(root: &Path) -> Config {
        Config {
            cache_root: root.to_path_buf(),
            api_base_url: "https://api.mod.io/v1".to_string(),
            api_key: None,
            game_id: None,
        }
    }

    fn test_profile(install: &Path) -> Profile {
        Profile {
            id: Some(Uuid::new_v4()),
            name: "server".to_string(),
            install_directory: install.to_path_buf(),
            mods: Default::default(),
        }
    }

    /// Builds a staging area by hand, as the stage phase would.
    fn staged_set(root: &Path, files: &[(&str, &[u8], u64)]) -> StagedSet {
        let mut out = Vec::new();
        for (rel, content, mod_id) in files {
            let source = root.join(mod_id.to_string()).join(rel);
            fs::create_dir_all(source.parent().unwrap()).unwrap();
            fs::write(&source, content).unwrap();
            out.push(StagedFile {
                rel_path: rel.to_string(),
                source,
                mod_id: *mod_id,
                version: VersionToken::new(format!("000{mod_id}-1")),
            });
        }
        StagedSet {
            root: root.to_path_buf(),
            files: out,
        }
    }

    #[test]
    fn first_deploy_places_files_and_writes_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir.path().join("cache"));
        let install = dir.path().join("install");
        let profile = test_profile(&install);

        let staging = dir.path().join("stage");
        let staged = staged_set(&staging, &[("mods/a.pak", b"aaa", 1), ("init.lua", b"lua", 2)]);

        let outcome = run(&config, &profile, &staged).unwrap();
        assert_eq!(outcome.report.placed.len(), 2);
        assert!(outcome.previous.is_empty());
        assert_eq!(outcome.current.len(), 2);
        assert_eq!(fs::read(install.join("mods/a.pak")).unwrap(), b"aaa");
        assert!(config.manifest_path(profile.id()).is_file());
        // Lock released after the pass.
        assert!(!config.manifest_lock_path(profile.id()).exists());
    }

    #[test]
    fn redeploy_with_no_changes_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir.path().join("cache"));
        let install = dir.path().join("install");
        let profile = test_profile(&install);

        let staging = dir.path().join("stage");
        let staged = staged_set(&staging, &[("mods/a.pak", b"aaa", 1)]);
        run(&config, &profile, &staged).unwrap();
        let manifest_bytes = fs::read(config.manifest_path(profile.id())).unwrap();

        // Fresh staging with identical content, as a re-run of stage
        // would produce.
        let staging2 = dir.path().join("stage2");
        let staged2 = staged_set(&staging2, &[("mods/a.pak", b"aaa", 1)]);
        let outcome = run(&config, &profile, &staged2).unwrap();

        assert!(outcome.report.placed.is_empty());
        assert_eq!(outcome.report.unchanged, vec!["mods/a.pak"]);
        // Unchanged file was not moved out of staging.
        assert!(staged2.files[0].source.is_file());
        let manifest_bytes2 = fs::read(config.manifest_path(profile.id())).unwrap();
        assert_eq!(manifest_bytes, manifest_bytes2);
    }

    #[test]
    fn changed_content_is_replaced_and_entry_refreshed() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir.path().join("cache"));
        let install = dir.path().join("install");
        let profile = test_profile(&install);

        let staged = staged_set(&dir.path().join("s1"), &[("mods/a.pak", b"old", 1)]);
        let first = run(&config, &profile, &staged).unwrap();

        let staged2 = staged_set(&dir.path().join("s2"), &[("mods/a.pak", b"new", 1)]);
        let second = run(&config, &profile, &staged2).unwrap();

        assert_eq!(second.report.placed, vec!["mods/a.pak"]);
        assert_eq!(fs::read(install.join("mods/a.pak")).unwrap(), b"new");
        assert_ne!(
            first.current.get("mods/a.pak").unwrap().fingerprint,
            second.current.get("mods/a.pak").unwrap().fingerprint
        );
    }

    #[test]
    fn placement_failure_aborts_before_the_manifest_swap() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir.path().join("cache"));
        let install = dir.path().join("install");
        let profile = test_profile(&install);

        let staged = staged_set(&dir.path().join("s1"), &[("mods/a.pak", b"aaa", 1)]);
        run(&config, &profile, &staged).unwrap();
        let manifest_bytes = fs::read(config.manifest_path(profile.id())).unwrap();

        // Block the new file's target with a directory so both the
        // rename and the copy fallback fail mid-pass.
        fs::create_dir_all(install.join("mods/b.pak")).unwrap();
        let staged2 = staged_set(
            &dir.path().join("s2"),
            &[("mods/a.pak", b"aaa", 1), ("mods/b.pak", b"bbb", 2)],
        );
        assert!(run(&config, &profile, &staged2).is_err());

        // The swap never happened: the persisted manifest still
        // describes the previous complete deployment.
        let manifest_bytes2 = fs::read(config.manifest_path(profile.id())).unwrap();
        assert_eq!(manifest_bytes, manifest_bytes2);
        // Lock released even on a failed pass.
        assert!(!config.manifest_lock_path(profile.id()).exists());
    }

    #[test]
    fn interrupted_deploy_recovers_on_rerun() {
        // Simulates a crash after files were placed but before the
        // manifest swap: install dir holds the new files, manifest still
        // describes the old (empty) state.
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir.path().join("cache"));
        let install = dir.path().join("install");
        let profile = test_profile(&install);

        fs::create_dir_all(install.join("mods")).unwrap();
        fs::write(install.join("mods/a.pak"), b"aaa").unwrap();
        // No manifest on disk: the previous run died before the swap.

        let staged = staged_set(&dir.path().join("stage"), &[("mods/a.pak", b"aaa", 1)]);
        let outcome = run(&config, &profile, &staged).unwrap();

        // Converges to the same final state an uninterrupted run reaches.
        assert_eq!(outcome.current.len(), 1);
        assert_eq!(fs::read(install.join("mods/a.pak")).unwrap(), b"aaa");
        assert!(config.manifest_path(profile.id()).is_file());
    }

    #[test]
    fn held_lock_blocks_deploy() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir.path().join("cache"));
        let install = dir.path().join("install");
        let profile = test_profile(&install);

        let _held =
            ManifestLock::acquire(&config.manifest_lock_path(profile.id()), "other").unwrap();
        let staged = staged_set(&dir.path().join("stage"), &[("a.pak", b"a", 1)]);
        assert!(matches!(
            run(&config, &profile, &staged),
            Err(ModmanError::Locked(_, _))
        ));
        // Nothing was placed and no manifest was written.
        assert!(!install.join("a.pak").exists());
        assert!(!config.manifest_path(profile.id()).exists());
    }

    #[test]
    fn unwritable_install_dir_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir.path().join("cache"));
        // A file where the install directory should be.
        let install = dir.path().join("install");
        fs::write(&install, b"not a dir").unwrap();
        let profile = test_profile(&install);

        let staged = staged_set(&dir.path().join("stage"), &[("a.pak", b"a", 1)]);
        assert!(matches!(
            run(&config, &profile, &staged),
            Err(ModmanError::InstallDirUnwritable(p)) if p == PathBuf::from(&install)
        ));
    }
}
