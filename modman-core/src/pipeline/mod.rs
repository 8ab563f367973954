// modman-core/src/pipeline/mod.rs
pub mod cleanup;
pub mod deploy;
pub mod download;
pub mod stage;

use modman_common::config::Config;
use modman_common::error::Result;
use modman_common::model::Profile;
use modman_net::Provider;
use tracing::info;

use crate::report::{CleanupReport, DeployReport, DownloadReport};
use crate::store::ArtifactStore;

/// Reports from one full pipeline pass over a profile.
#[derive(Debug)]
pub struct PipelineSummary {
    pub download: DownloadReport,
    pub deploy: DeployReport,
    pub cleanup: CleanupReport,
}

/// Runs the four phases in order for one profile: download, stage,
/// deploy, cleanup. Download failures for individual mods are carried in
/// the summary but do not stop the pass as long as every declared mod
/// has some cached artifact to stage.
pub async fn run_profile<P: Provider + Sync>(
    config: &Config,
    provider: &P,
    profile: &Profile,
    force: bool,
) -> Result<PipelineSummary> {
    let mut store = ArtifactStore::open(&config.artifacts_dir())?;
    let download = download::run(provider, &mut store, profile, force).await?;

    let staged = stage::run(config, &store, profile)?;
    let outcome = deploy::run(config, profile, &staged)?;
    let cleanup = cleanup::run_after_deploy(config, profile, &outcome)?;

    info!("Pipeline complete for profile '{}'", profile.name);
    Ok(PipelineSummary {
        download,
        deploy: outcome.report,
        cleanup,
    })
}
