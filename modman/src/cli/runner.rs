// modman/src/cli/runner.rs
// Shared glue between the subcommands and the pipeline crates.
use colored::Colorize;
use modman_common::config::Config;
use modman_common::error::{ModmanError, Result};
use modman_common::model::Profile;
use modman_core::{ArtifactStore, CleanupReport, DeployReport, DownloadReport};
use modman_net::ModioClient;

pub fn load_profile(config: &Config, name: &str) -> Result<Profile> {
    // Profile names double as file names; keep them path-safe.
    if name.contains('/') || name.contains("..") {
        return Err(ModmanError::Profile(format!(
            "Invalid profile name '{name}' contains disallowed characters"
        )));
    }
    let path = config.profile_path(name);
    if !path.is_file() {
        return Err(ModmanError::Profile(format!(
            "No profile '{name}' at {} (create one with 'modman init {name}')",
            path.display()
        )));
    }
    Profile::load(&path)
}

pub fn build_provider(config: &Config) -> Result<ModioClient> {
    let api_key = config.api_key.as_deref().ok_or_else(|| {
        ModmanError::Config(
            "No mod.io API key configured. Set MODMAN_API_KEY or add \
             api_key under [modio] in the config file."
                .to_string(),
        )
    })?;
    let game_id = config.game_id.ok_or_else(|| {
        ModmanError::Config(
            "No mod.io game id configured. Set MODMAN_GAME_ID or add \
             game_id under [modio] in the config file."
                .to_string(),
        )
    })?;
    ModioClient::new(&config.api_base_url, api_key, game_id)
}

pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if size >= GB {
        format!("{:.1}GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.1}MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.1}KB", size as f64 / KB as f64)
    } else {
        format!("{size}B")
    }
}

pub fn print_download_report(store: &ArtifactStore, report: &DownloadReport) {
    for (name, mod_id, version) in &report.fetched {
        let size = store
            .newest(*mod_id)
            .and_then(|a| std::fs::metadata(&a.path).ok())
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|| "?".to_string());
        println!(
            "✓ Downloaded {} (mod {}) version {} ({})",
            name.green(),
            mod_id,
            version,
            size
        );
    }
    for (name, mod_id) in &report.up_to_date {
        println!("  {} (mod {}) is up to date", name.cyan(), mod_id);
    }
    for (name, mod_id, err) in &report.failed {
        if err.is_transient() {
            eprintln!(
                "✖ {} (mod {}): {} (retrying may succeed)",
                name.red(),
                mod_id,
                err
            );
        } else {
            eprintln!("✖ {} (mod {}): {}", name.red(), mod_id, err);
        }
    }
}

pub fn print_deploy_report(report: &DeployReport) {
    for path in &report.placed {
        println!("✓ Placed {path}");
    }
    if !report.unchanged.is_empty() {
        println!("  {} file(s) unchanged", report.unchanged.len());
    }
}

pub fn print_cleanup_report(report: &CleanupReport) {
    for path in &report.removed {
        println!("✓ Removed {path}");
    }
    for dir in &report.pruned_dirs {
        println!("  Pruned empty folder {dir}");
    }
    for (path, err) in &report.failed {
        eprintln!("✖ Could not remove {}: {}", path.red(), err);
    }
}
