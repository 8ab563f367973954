use clap::Args;
use colored::Colorize;
use modman_common::config::Config;
use modman_common::error::Result;

use crate::cli::runner::load_profile;

#[derive(Args, Debug)]
pub struct Show {
    /// Name of the profile to print
    pub name: String,
}

impl Show {
    pub fn run(&self, config: &Config) -> Result<()> {
        let profile = load_profile(config, &self.name)?;
        println!("{} ({})", profile.name.bold(), profile.id());
        println!("Install directory: {}", profile.install_directory.display());
        if profile.mods.is_empty() {
            println!("{}", "No mods declared".yellow());
        } else {
            println!("Mods:");
            for (name, mod_id) in &profile.mods {
                println!("  {} -> {}", name.cyan(), mod_id);
            }
        }
        Ok(())
    }
}
