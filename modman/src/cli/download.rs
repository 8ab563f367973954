use clap::Args;
use colored::Colorize;
use modman_common::config::Config;
use modman_common::error::{ModmanError, Result};
use modman_core::pipeline::download;
use modman_core::ArtifactStore;

use crate::cli::runner::{build_provider, load_profile, print_download_report};

#[derive(Args, Debug)]
pub struct Download {
    /// Names of the profiles whose mods to download
    #[arg(required = true)]
    pub names: Vec<String>,
    /// Re-fetch artifacts even when the cached version is current
    #[arg(long)]
    pub force: bool,
}

impl Download {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let provider = build_provider(config)?;
        let mut store = ArtifactStore::open(&config.artifacts_dir())?;
        let mut failures = 0usize;

        for name in &self.names {
            println!("{}{}", "==> ".bold().blue(), name.bold());
            let profile = match load_profile(config, name) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("✖ {}: {}", name.red(), e);
                    failures += 1;
                    continue;
                }
            };
            let report = download::run(&provider, &mut store, &profile, self.force).await?;
            print_download_report(&store, &report);
            failures += report.failed.len();
        }

        if failures == 0 {
            Ok(())
        } else {
            Err(ModmanError::Generic(format!(
                "{failures} download(s) failed"
            )))
        }
    }
}
