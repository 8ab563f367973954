// modman-core/src/pipeline/download.rs
use std::fs;
use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use modman_common::error::{ModmanError, Result};
use modman_common::model::{ModRelease, Profile, VersionToken};
use modman_net::Provider;
use tracing::{debug, info, warn};

use crate::report::DownloadReport;
use crate::store::ArtifactStore;

/// Per-mod fetches are independent network calls writing to disjoint
/// store entries; this bounds how many are in flight at once.
const DOWNLOAD_CONCURRENCY: usize = 4;

enum FetchOutcome {
    Fetched(ModRelease, PathBuf),
    UpToDate,
    Failed(ModmanError),
}

/// Download phase: for each declared mod id, resolve the current release
/// and fetch its artifact unless the cached version token is already at
/// least as new (or `force` is set). A failure for one mod id is
/// reported in the returned [`DownloadReport`] and does not abort the
/// pass for the others.
///
/// Staleness comparison uses only the provider's version token, never
/// the local clock.
pub async fn run<P: Provider + Sync>(
    provider: &P,
    store: &mut ArtifactStore,
    profile: &Profile,
    force: bool,
) -> Result<DownloadReport> {
    info!("Downloading mods for profile '{}'", profile.name);
    let mut report = DownloadReport::default();

    // Snapshot newest cached tokens up front; resolve/fetch run
    // concurrently against disjoint scratch paths, while index inserts
    // happen sequentially afterwards.
    let store_root = store.root().to_path_buf();
    let targets: Vec<(String, u64, Option<VersionToken>)> = profile
        .mods
        .iter()
        .map(|(name, &mod_id)| (name.clone(), mod_id, store.newest(mod_id).map(|a| a.version)))
        .collect();

    let outcomes = stream::iter(targets.into_iter().map(|(name, mod_id, cached)| {
        let store_root = store_root.clone();
        async move {
            let outcome = fetch_one(provider, &store_root, mod_id, cached.as_ref(), force).await;
            (name, mod_id, outcome)
        }
    }))
    .buffer_unordered(DOWNLOAD_CONCURRENCY)
    .collect::<Vec<_>>()
    .await;

    for (name, mod_id, outcome) in outcomes {
        match outcome {
            FetchOutcome::Fetched(release, scratch) => match store.insert(&release, &scratch) {
                Ok(stored) => {
                    info!(
                        "Downloaded '{}' (mod {}) version {} to {}",
                        name,
                        mod_id,
                        stored.version,
                        stored.path.display()
                    );
                    report.fetched.push((name, mod_id, stored.version));
                }
                Err(e) => {
                    let _ = fs::remove_file(&scratch);
                    report.failed.push((name, mod_id, e));
                }
            },
            FetchOutcome::UpToDate => {
                debug!("'{}' (mod {}) is up to date", name, mod_id);
                report.up_to_date.push((name, mod_id));
            }
            FetchOutcome::Failed(e) => {
                warn!("Download failed for '{}' (mod {}): {}", name, mod_id, e);
                report.failed.push((name, mod_id, e));
            }
        }
    }
    Ok(report)
}

async fn fetch_one<P: Provider + Sync>(
    provider: &P,
    store_root: &Path,
    mod_id: u64,
    cached: Option<&VersionToken>,
    force: bool,
) -> FetchOutcome {
    let release = match provider.resolve(mod_id).await {
        Ok(r) => r,
        Err(e) => return FetchOutcome::Failed(e),
    };

    // Freshness check on the opaque token alone; only a strictly newer
    // remote token (or force) triggers a body fetch.
    if !force {
        if let Some(cached) = cached {
            if cached >= &release.version {
                return FetchOutcome::UpToDate;
            }
        }
    }

    let scratch = ArtifactStore::scratch_path_in(store_root, mod_id, &release.version);
    match provider.fetch(&release, &scratch).await {
        Ok(()) => FetchOutcome::Fetched(release, scratch),
        Err(e) => {
            let _ = fs::remove_file(&scratch);
            FetchOutcome::Failed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use uuid::Uuid;

    use super::*;

    /// Provider serving canned releases from memory, counting fetches.
    struct FakeProvider {
        releases: BTreeMap<u64, ModRelease>,
        fetches: AtomicUsize,
    }

    impl FakeProvider {
        fn new(releases: &[(u64, &str)]) -> Self {
            let releases = releases
                .iter()
                .map(|(id, token)| {
                    (
                        *id,
                        ModRelease {
                            mod_id: *id,
                            version: VersionToken::new(*token),
                            filename: format!("mod-{id}.pak"),
                            download_url: format!("https://cdn.example/{id}"),
                            size_bytes: 8,
                        },
                    )
                })
                .collect();
            Self {
                releases,
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl Provider for FakeProvider {
        fn resolve(
            &self,
            mod_id: u64,
        ) -> impl std::future::Future<Output = Result<ModRelease>> + Send {
            let release = self.releases.get(&mod_id).cloned();
            async move { release.ok_or(ModmanError::NotFound(mod_id)) }
        }

        fn fetch(
            &self,
            release: &ModRelease,
            dest: &Path,
        ) -> impl std::future::Future<Output = Result<()>> + Send {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let result = fs::create_dir_all(dest.parent().unwrap_or(Path::new(".")))
                .and_then(|_| fs::write(dest, format!("payload-{}", release.version)));
            async move { result.map_err(Into::into) }
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

    #[tokio::test]
    async fn fetches_missing_mods_into_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ArtifactStore::open(dir.path()).unwrap();
        let provider = FakeProvider::new(&[(1, "0000000001-1"), (2, "0000000002-2")]);
        let profile = test_profile(&[("A", 1), ("B", 2)]);

        let report = run(&provider, &mut store, &profile, false).await.unwrap();
        assert_eq!(report.fetched.len(), 2);
        assert!(report.failed.is_empty());
        assert!(store.newest(1).unwrap().path.is_file());
        assert!(store.newest(2).unwrap().path.is_file());
    }

    #[tokio::test]
    async fn cached_current_version_skips_the_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ArtifactStore::open(dir.path()).unwrap();
        let provider = FakeProvider::new(&[(1, "0000000001-1")]);
        let profile = test_profile(&[("A", 1)]);

        run(&provider, &mut store, &profile, false).await.unwrap();
        assert_eq!(provider.fetch_count(), 1);

        let report = run(&provider, &mut store, &profile, false).await.unwrap();
        assert_eq!(report.up_to_date.len(), 1);
        assert!(report.fetched.is_empty());
        // Second pass resolved but never fetched a body.
        assert_eq!(provider.fetch_count(), 1);
    }

    #[tokio::test]
    async fn newer_remote_token_triggers_a_refetch() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ArtifactStore::open(dir.path()).unwrap();
        let profile = test_profile(&[("A", 1)]);

        let old = FakeProvider::new(&[(1, "0000000001-1")]);
        run(&old, &mut store, &profile, false).await.unwrap();

        let new = FakeProvider::new(&[(1, "0000000009-9")]);
        let report = run(&new, &mut store, &profile, false).await.unwrap();
        assert_eq!(report.fetched.len(), 1);
        assert_eq!(
            store.newest(1).unwrap().version,
            VersionToken::new("0000000009-9")
        );
    }

    #[tokio::test]
    async fn force_refetches_an_up_to_date_mod() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ArtifactStore::open(dir.path()).unwrap();
        let provider = FakeProvider::new(&[(1, "0000000001-1")]);
        let profile = test_profile(&[("A", 1)]);

        run(&provider, &mut store, &profile, false).await.unwrap();
        let report = run(&provider, &mut store, &profile, true).await.unwrap();
        assert_eq!(report.fetched.len(), 1);
        assert_eq!(provider.fetch_count(), 2);
    }

    #[tokio::test]
    async fn one_failing_mod_does_not_abort_the_others() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ArtifactStore::open(dir.path()).unwrap();
        // Mod 2 is unknown to the provider.
        let provider = FakeProvider::new(&[(1, "0000000001-1")]);
        let profile = test_profile(&[("A", 1), ("B", 2)]);

        let report = run(&provider, &mut store, &profile, false).await.unwrap();
        assert_eq!(report.fetched.len(), 1);
        assert_eq!(report.failed.len(), 1);
        let (name, mod_id, err) = &report.failed[0];
        assert_eq!(name, "B");
        assert_eq!(*mod_id, 2);
        assert!(matches!(err, ModmanError::NotFound(2)));
    }
}
