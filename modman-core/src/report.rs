// modman-core/src/report.rs
// Typed per-phase results surfaced to the caller. One failing mod id or
// path never silently disappears; the CLI decides whether a batch halts.
use modman_common::error::ModmanError;
use modman_common::model::VersionToken;

/// Outcome of one download pass over a profile's mod mapping.
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// (display name, mod id, version) fetched and stored this pass.
    pub fetched: Vec<(String, u64, VersionToken)>,
    /// Mods whose cached artifact already matches the provider.
    pub up_to_date: Vec<(String, u64)>,
    /// Per-mod failures; the pass continued past each of these.
    pub failed: Vec<(String, u64, ModmanError)>,
}

impl DownloadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of one deploy pass.
#[derive(Debug, Default)]
pub struct DeployReport {
    /// Files moved into the install directory this run.
    pub placed: Vec<String>,
    /// Files skipped because their fingerprint was unchanged.
    pub unchanged: Vec<String>,
}

/// Outcome of one cleanup pass.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Relative paths removed from the install directory.
    pub removed: Vec<String>,
    /// Empty directories pruned after file removal.
    pub pruned_dirs: Vec<String>,
    /// Per-path delete failures; the pass continued past each of these.
    pub failed: Vec<(String, ModmanError)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
