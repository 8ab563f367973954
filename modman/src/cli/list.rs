use clap::Args;
use colored::Colorize;
use modman_common::config::Config;
use modman_common::error::Result;
use modman_common::model::{DeploymentManifest, Profile};
use prettytable::{format, Cell, Row, Table};
use tracing::warn;

#[derive(Args, Debug)]
pub struct List {}

impl List {
    pub fn run(&self, config: &Config) -> Result<()> {
        let profiles_dir = config.profiles_dir();
        let mut profiles: Vec<Profile> = Vec::new();
        if profiles_dir.is_dir() {
            for entry in std::fs::read_dir(&profiles_dir)? {
                let entry = entry?;
                let path = entry.path();
                if path.extension().is_some_and(|e| e == "json") {
                    match Profile::load(&path) {
                        Ok(profile) => profiles.push(profile),
                        Err(e) => warn!("Skipping unreadable profile {}: {}", path.display(), e),
                    }
                }
            }
        }
        if profiles.is_empty() {
            println!("{}", "0 profiles configured".yellow());
            return Ok(());
        }
        profiles.sort_by(|a, b| a.name.cmp(&b.name));

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
        table.add_row(Row::new(vec![
            Cell::new("Profile").style_spec("b"),
            Cell::new("Mods").style_spec("b"),
            Cell::new("Deployed").style_spec("b"),
            Cell::new("Install Directory").style_spec("b"),
        ]));
        for profile in &profiles {
            let deployed = DeploymentManifest::load(&config.manifest_path(profile.id()))
                .map(|m| m.len().to_string())
                .unwrap_or_else(|_| "-".to_string());
            table.add_row(Row::new(vec![
                Cell::new(&profile.name).style_spec("Fb"),
                Cell::new(&profile.mods.len().to_string()),
                Cell::new(&deployed),
                Cell::new(&profile.install_directory.display().to_string()),
            ]));
        }
        table.printstd();
        println!("{}", format!("{} profile(s)", profiles.len()).bold());
        Ok(())
    }
}
