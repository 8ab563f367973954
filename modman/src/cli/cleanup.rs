use clap::Args;
use colored::Colorize;
use modman_common::config::Config;
use modman_common::error::{ModmanError, Result};
use modman_core::pipeline::cleanup;

use crate::cli::runner::{load_profile, print_cleanup_report};

#[derive(Args, Debug)]
pub struct Cleanup {
    /// Name of the profile to reconcile against its manifest
    pub name: String,
}

impl Cleanup {
    /// Removes deployed files whose mod is no longer declared in the
    /// profile. With an empty mod mapping this uninstalls everything the
    /// manifest tracks.
    pub fn run(&self, config: &Config) -> Result<()> {
        let profile = load_profile(config, &self.name)?;
        let report = cleanup::run_standalone(config, &profile)?;
        print_cleanup_report(&report);
        if report.is_clean() {
            println!(
                "✓ Cleanup complete for {} ({} file(s) removed)",
                profile.name.green(),
                report.removed.len()
            );
            Ok(())
        } else {
            Err(ModmanError::Generic(format!(
                "{} file(s) could not be removed",
                report.failed.len()
            )))
        }
    }
}
