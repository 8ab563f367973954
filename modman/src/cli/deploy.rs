use clap::Args;
use colored::Colorize;
use modman_common::config::Config;
use modman_common::error::Result;
use modman_core::pipeline::{cleanup, deploy, stage};
use modman_core::ArtifactStore;

use crate::cli::runner::{load_profile, print_cleanup_report, print_deploy_report};

#[derive(Args, Debug)]
pub struct Deploy {
    /// Name of the profile to deploy from cached artifacts
    pub name: String,
}

impl Deploy {
    /// Stages from the cache, swaps the deployment in, then removes
    /// whatever the previous deployment left orphaned. No network access.
    pub fn run(&self, config: &Config) -> Result<()> {
        let profile = load_profile(config, &self.name)?;
        let store = ArtifactStore::open(&config.artifacts_dir())?;

        let staged = stage::run(config, &store, &profile)?;
        let outcome = deploy::run(config, &profile, &staged)?;
        let cleaned = cleanup::run_after_deploy(config, &profile, &outcome)?;

        print_deploy_report(&outcome.report);
        print_cleanup_report(&cleaned);
        println!(
            "✓ Deployed {} file(s) to {} for {}",
            outcome.current.len(),
            profile.install_directory.display(),
            profile.name.green()
        );
        Ok(())
    }
}
