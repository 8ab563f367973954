// modman-core/src/pipeline/stage.rs
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use modman_common::config::Config;
use modman_common::error::{ModmanError, Result};
use modman_common::model::{Profile, VersionToken};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::extract::{extract_zip_archive, normalized_rel_path};
use crate::store::{ArtifactStore, StoredArtifact};

/// One entry of the staged file set: a file waiting in the staging area
/// and the install-relative path it will deploy to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub rel_path: String,
    /// Absolute location inside the staging area.
    pub source: PathBuf,
    pub mod_id: u64,
    pub version: VersionToken,
}

/// Output of the stage phase, consumed by deploy.
#[derive(Debug)]
pub struct StagedSet {
    pub root: PathBuf,
    pub files: Vec<StagedFile>,
}

/// Stage phase: resolve every declared mod id to its newest cached
/// artifact, extract/copy each into a freshly rebuilt staging directory
/// (one subdirectory per mod), and assemble the staged file set.
///
/// A missing artifact for any mod aborts the whole pass, since a partial
/// stage is unsafe to deploy. Two mods producing the same install path
/// is a fatal configuration error surfaced here, before any file gets
/// near the install directory.
pub fn run(config: &Config, store: &ArtifactStore, profile: &Profile) -> Result<StagedSet> {
    info!("Staging mods for profile '{}'", profile.name);

    // Resolve everything before touching the filesystem so a missing
    // artifact fails the pass without leaving a half-built staging dir.
    let mut artifacts: Vec<(String, StoredArtifact)> = Vec::new();
    for (name, &mod_id) in &profile.mods {
        let artifact = store.newest(mod_id).ok_or(ModmanError::MissingArtifact {
            mod_id,
            name: name.clone(),
        })?;
        artifacts.push((name.clone(), artifact));
    }

    // Previous staged contents are never reused across runs.
    let staging_root = config.profile_staging_dir(profile.id());
    if staging_root.exists() {
        debug!("Clearing previous staging dir {}", staging_root.display());
        fs::remove_dir_all(&staging_root)?;
    }
    fs::create_dir_all(&staging_root)?;

    let mut files: Vec<StagedFile> = Vec::new();
    let mut claimed: HashMap<String, u64> = HashMap::new();

    for (name, artifact) in &artifacts {
        let mod_dir = staging_root.join(artifact.mod_id.to_string());
        fs::create_dir_all(&mod_dir)?;

        if artifact.filename.to_ascii_lowercase().ends_with(".zip") {
            debug!("Staging '{}' from {}", name, artifact.path.display());
            extract_zip_archive(&artifact.path, &mod_dir)?;
        } else {
            // Single-file artifact: deploys under its own filename.
            debug!(
                "Staging single-file mod '{}' ({})",
                name, artifact.filename
            );
            fs::copy(&artifact.path, mod_dir.join(&artifact.filename))?;
        }

        let mut walker: Vec<_> = WalkDir::new(&mod_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .collect();
        walker.sort_by(|a, b| a.path().cmp(b.path()));

        for entry in walker {
            let rel_path = normalized_rel_path(entry.path(), &mod_dir)?;
            if let Some(&first) = claimed.get(&rel_path) {
                return Err(ModmanError::PathCollision {
                    path: rel_path,
                    first,
                    second: artifact.mod_id,
                });
            }
            claimed.insert(rel_path.clone(), artifact.mod_id);
            files.push(StagedFile {
                rel_path,
                source: entry.path().to_path_buf(),
                mod_id: artifact.mod_id,
                version: artifact.version.clone(),
            });
        }
    }

    info!(
        "Staged {} file(s) from {} mod(s) for '{}'",
        files.len(),
        artifacts.len(),
        profile.name
    );
    Ok(StagedSet {
        root: staging_root,
        files,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;

    use modman_common::model::ModRelease;
    use uuid::Uuid;

    use super::*;

    fn test_config(root: &Path) -> Config {
        Config {
            cache_root: root.to_path_buf(),
            api_base_url: "https://api.mod.io/v1".to_string(),
            api_key: None,
            game_id: None,
        }
    }

    fn test_profile(mods: &[(&str, u64)]) -> Profile {
        Profile {
            id: Some(Uuid::new_v4()),
            name: "server".to_string(),
            install_directory: PathBuf::from("/unused"),
            mods: mods.iter().map(|(n, i)| (n.to_string(), *i)).collect(),
        }
    }

    fn store_zip(store: &mut ArtifactStore, mod_id: u64, token: &str, entries: &[(&str, &[u8])]) {
        let release = ModRelease {
            mod_id,
            version: VersionToken::new(token),
            filename: format!("mod-{mod_id}.zip"),
            download_url: "https://cdn.example/f".to_string(),
            size_bytes: 0,
        };
        let scratch = store.scratch_path(mod_id, &release.version);
        fs::create_dir_all(scratch.parent().unwrap()).unwrap();
        let file = fs::File::create(&scratch).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, content) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
        store.insert(&release, &scratch).unwrap();
    }

    #[test]
    fn stages_extracted_archives_with_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let mut store = ArtifactStore::open(&config.artifacts_dir()).unwrap();
        store_zip(
            &mut store,
            1,
            "0001-1",
            &[("mods/a.pak", b"a".as_slice()), ("readme.txt", b"r".as_slice())],
        );
        let profile = test_profile(&[("A", 1)]);

        let staged = run(&config, &store, &profile).unwrap();
        let rels: Vec<_> = staged.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(rels, vec!["mods/a.pak", "readme.txt"]);
        for f in &staged.files {
            assert!(f.source.is_file());
            assert!(f.source.starts_with(&staged.root));
        }
    }

    #[test]
    fn missing_artifact_aborts_the_whole_pass() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let mut store = ArtifactStore::open(&config.artifacts_dir()).unwrap();
        store_zip(&mut store, 1, "0001-1", &[("a.pak", b"a".as_slice())]);
        // Mod 2 was never downloaded.
        let profile = test_profile(&[("A", 1), ("B", 2)]);

        let err = run(&config, &store, &profile).unwrap_err();
        assert!(matches!(
            err,
            ModmanError::MissingArtifact { mod_id: 2, .. }
        ));
        // Nothing was staged.
        assert!(!config.profile_staging_dir(profile.id()).exists());
    }

    #[test]
    fn cross_mod_path_collision_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let mut store = ArtifactStore::open(&config.artifacts_dir()).unwrap();
        store_zip(&mut store, 1, "0001-1", &[("scripts/init.lua", b"one".as_slice())]);
        store_zip(&mut store, 2, "0002-2", &[("scripts/init.lua", b"two".as_slice())]);
        let profile = test_profile(&[("A", 1), ("B", 2)]);

        let err = run(&config, &store, &profile).unwrap_err();
        match err {
            ModmanError::PathCollision { path, first, second } => {
                assert_eq!(path, "scripts/init.lua");
                assert_ne!(first, second);
            }
            other => panic!("expected PathCollision, got {other:?}"),
        }
    }

    #[test]
    fn staging_dir_is_rebuilt_each_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let mut store = ArtifactStore::open(&config.artifacts_dir()).unwrap();
        store_zip(&mut store, 1, "0001-1", &[("a.pak", b"a".as_slice())]);
        let profile = test_profile(&[("A", 1)]);

        let staged = run(&config, &store, &profile).unwrap();
        // Drop a stray file into the staging area; the next run must not
        // carry it over.
        fs::write(staged.root.join("stale.txt"), b"stale").unwrap();

        let restaged = run(&config, &store, &profile).unwrap();
        assert!(!restaged.root.join("stale.txt").exists());
        assert_eq!(restaged.files.len(), 1);
    }

    #[test]
    fn single_file_artifact_stages_under_its_filename() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let mut store = ArtifactStore::open(&config.artifacts_dir()).unwrap();

        let release = ModRelease {
            mod_id: 9,
            version: VersionToken::new("0009-9"),
            filename: "tweaks.dll".to_string(),
            download_url: "https://cdn.example/f".to_string(),
            size_bytes: 4,
        };
        let scratch = store.scratch_path(9, &release.version);
        fs::create_dir_all(scratch.parent().unwrap()).unwrap();
        fs::write(&scratch, b"dll!").unwrap();
        store.insert(&release, &scratch).unwrap();

        let profile = test_profile(&[("Tweaks", 9)]);
        let staged = run(&config, &store, &profile).unwrap();
        assert_eq!(staged.files.len(), 1);
        assert_eq!(staged.files[0].rel_path, "tweaks.dll");
    }
}
