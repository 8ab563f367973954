// modman-common/src/model/diff.rs
// Pure manifest diffing, independent of filesystem access so the
// add/keep/remove computation is unit-testable without touching disk.
use super::manifest::DeploymentManifest;

/// Path-level difference between two manifest snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDiff {
    /// Present in `next` only.
    pub added: Vec<String>,
    /// Present in both (regardless of fingerprint changes).
    pub kept: Vec<String>,
    /// Present in `prev` only; these are the cleanup candidates.
    pub removed: Vec<String>,
}

/// Computes the add/keep/remove sets between the previously persisted
/// manifest and a candidate. Output vectors are sorted (both inputs
/// iterate in key order).
pub fn diff_manifests(prev: &DeploymentManifest, next: &DeploymentManifest) -> ManifestDiff {
    let mut diff = ManifestDiff::default();
    for path in prev.entries.keys() {
        if next.entries.contains_key(path) {
            diff.kept.push(path.clone());
        } else {
            diff.removed.push(path.clone());
        }
    }
    for path in next.entries.keys() {
        if !prev.entries.contains_key(path) {
            diff.added.push(path.clone());
        }
    }
    diff
}
