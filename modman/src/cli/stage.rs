use clap::Args;
use colored::Colorize;
use modman_common::config::Config;
use modman_common::error::Result;
use modman_core::pipeline::stage;
use modman_core::ArtifactStore;

use crate::cli::runner::load_profile;

#[derive(Args, Debug)]
pub struct Stage {
    /// Name of the profile to stage from cached artifacts
    pub name: String,
}

impl Stage {
    pub fn run(&self, config: &Config) -> Result<()> {
        let profile = load_profile(config, &self.name)?;
        let store = ArtifactStore::open(&config.artifacts_dir())?;
        let staged = stage::run(config, &store, &profile)?;
        println!(
            "✓ Staged {} file(s) for {} under {}",
            staged.files.len(),
            profile.name.green(),
            staged.root.display()
        );
        Ok(())
    }
}
