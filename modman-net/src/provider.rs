// modman-net/src/provider.rs
use std::path::Path;

use modman_common::error::Result;
use modman_common::model::ModRelease;

/// Narrow capability contract the pipeline depends on. One concrete
/// implementation exists today ([`crate::modio::ModioClient`]); a new
/// provider only has to supply these two operations.
pub trait Provider {
    /// Resolves a mod id to its current release metadata.
    ///
    /// Fails with `ModmanError::NotFound` for an unknown mod id,
    /// `ModmanError::Auth` for a missing/invalid credential and
    /// `ModmanError::Transient` for retryable network failures.
    fn resolve(&self, mod_id: u64) -> impl std::future::Future<Output = Result<ModRelease>> + Send;

    /// Streams the release's binary artifact to `dest`. The write itself
    /// goes through a temp file in the destination directory, so `dest`
    /// never holds a partial download.
    fn fetch(
        &self,
        release: &ModRelease,
        dest: &Path,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
