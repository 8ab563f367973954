use clap::Args;
use colored::Colorize;
use modman_common::config::Config;
use modman_common::error::Result;
use modman_common::model::DeploymentManifest;
use prettytable::{format, Cell, Row, Table};

use crate::cli::runner::load_profile;

#[derive(Args, Debug)]
pub struct Deployed {
    /// Name of the profile whose deployment manifest to print
    pub name: String,
}

impl Deployed {
    pub fn run(&self, config: &Config) -> Result<()> {
        let profile = load_profile(config, &self.name)?;
        let manifest_path = config.manifest_path(profile.id());
        if !manifest_path.is_file() {
            println!(
                "{}",
                format!("Nothing deployed for profile '{}'", profile.name).yellow()
            );
            return Ok(());
        }
        let manifest = DeploymentManifest::load_or_empty(&manifest_path, profile.id())?;

        // Invert the profile mapping once for display names.
        let names: std::collections::BTreeMap<u64, &str> = profile
            .mods
            .iter()
            .map(|(name, &id)| (id, name.as_str()))
            .collect();

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
        table.add_row(Row::new(vec![
            Cell::new("Path").style_spec("b"),
            Cell::new("Mod").style_spec("b"),
            Cell::new("Version").style_spec("b"),
            Cell::new("Updated").style_spec("b"),
        ]));
        for (path, entry) in &manifest.entries {
            let mod_label = names
                .get(&entry.mod_id)
                .map(|n| format!("{n} ({})", entry.mod_id))
                .unwrap_or_else(|| entry.mod_id.to_string());
            table.add_row(Row::new(vec![
                Cell::new(path),
                Cell::new(&mod_label).style_spec("Fb"),
                Cell::new(&entry.version.to_string()),
                Cell::new(&entry.updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            ]));
        }
        table.printstd();
        println!(
            "{}",
            format!("{} file(s) deployed for '{}'", manifest.len(), profile.name).bold()
        );
        Ok(())
    }
}
