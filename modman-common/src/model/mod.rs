// modman-common/src/model/mod.rs
// Declares the modules within the model directory.
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod diff;
pub mod manifest;
pub mod profile;

// Re-export
pub use diff::{diff_manifests, ManifestDiff};
pub use manifest::{DeploymentManifest, ManifestEntry};
pub use profile::Profile;

/// Provider-supplied opaque staleness marker for one artifact version.
///
/// The provider constructs tokens so that lexicographic order equals its
/// own recency order; the pipeline only ever compares tokens via
/// `Ord`/`Eq` and never interprets their content or consults the clock.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolved metadata for the current release of one mod, produced by
/// `Provider::resolve` and consumed by the download phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModRelease {
    pub mod_id: u64,
    pub version: VersionToken,
    /// Artifact filename as reported by the provider.
    pub filename: String,
    pub download_url: String,
    pub size_bytes: u64,
}
