use clap::Args;
use colored::Colorize;
use modman_common::config::Config;
use modman_common::error::{ModmanError, Result};
use modman_core::pipeline;
use modman_core::ArtifactStore;
use tracing::error;

use crate::cli::runner::{
    build_provider, load_profile, print_cleanup_report, print_deploy_report,
    print_download_report,
};

#[derive(Args, Debug)]
pub struct Run {
    /// Names of the profiles to bring up to date
    #[arg(required = true)]
    pub names: Vec<String>,
    /// Re-fetch artifacts even when the cached version is current
    #[arg(long)]
    pub force: bool,
}

impl Run {
    /// Full pipeline per profile: download, stage, deploy, cleanup.
    /// Profiles run sequentially; a failure in one is reported and the
    /// batch moves on to the next.
    pub async fn run(&self, config: &Config) -> Result<()> {
        let provider = build_provider(config)?;
        let mut errors: Vec<(String, ModmanError)> = Vec::new();

        for name in &self.names {
            println!("{}{}", "==> ".bold().blue(), name.bold());
            let result = async {
                let profile = load_profile(config, name)?;
                pipeline::run_profile(config, &provider, &profile, self.force).await
            }
            .await;

            match result {
                Ok(summary) => {
                    // Reports carry per-mod failures that did not abort
                    // the pass; surface them here.
                    let store = ArtifactStore::open(&config.artifacts_dir())?;
                    print_download_report(&store, &summary.download);
                    print_deploy_report(&summary.deploy);
                    print_cleanup_report(&summary.cleanup);
                    if !summary.download.failed.is_empty() {
                        errors.push((
                            name.clone(),
                            ModmanError::Generic(format!(
                                "{} mod(s) failed to download",
                                summary.download.failed.len()
                            )),
                        ));
                    } else {
                        println!("✓ Profile {} is up to date", name.green());
                    }
                }
                Err(e) => {
                    error!("✖ Profile '{}' failed: {}", name, e);
                    eprintln!("✖ {}: {}", name.red(), e);
                    errors.push((name.clone(), e));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ModmanError::Generic(format!(
                "Run failed for {} of {} profile(s): {}",
                errors.len(),
                self.names.len(),
                errors
                    .iter()
                    .map(|(n, _)| n.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }
}
