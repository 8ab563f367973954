use std::fs;

use clap::Args;
use colored::Colorize;
use modman_common::config::Config;
use modman_common::error::{ModmanError, Result};
use modman_common::model::Profile;

#[derive(Args, Debug)]
pub struct Init {
    /// Names of the profiles to create as empty skeletons
    #[arg(required = true)]
    pub names: Vec<String>,
}

impl Init {
    pub fn run(&self, config: &Config) -> Result<()> {
        fs::create_dir_all(config.profiles_dir())?;
        for name in &self.names {
            if name.contains('/') || name.contains("..") {
                return Err(ModmanError::Profile(format!(
                    "Invalid profile name '{name}' contains disallowed characters"
                )));
            }
            let path = config.profile_path(name);
            if path.exists() {
                return Err(ModmanError::Profile(format!(
                    "Profile '{name}' already exists at {}",
                    path.display()
                )));
            }
            Profile::create_empty(&path, name)?;
            println!(
                "✓ Created profile {} at {}",
                name.green(),
                path.display()
            );
            println!("  Edit it to set install_directory and the mod mapping.");
        }
        Ok(())
    }
}
