// modman-common/src/config.rs
use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::error::{ModmanError, Result};

// Fallback when MODMAN_CACHE_DIR is not set and no config file names one.
const DEFAULT_CACHE_DIR_NAME: &str = ".modman";
const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_API_BASE_URL: &str = "https://api.mod.io/v1";

/// On-disk configuration file layout (`~/.config/modman/config.toml`).
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    core: CoreSection,
    #[serde(default)]
    modio: ModioSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CoreSection {
    cache_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ModioSection {
    api_key: Option<String>,
    game_id: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub cache_root: PathBuf,
    pub api_base_url: String,
    /// mod.io API key. Downloads are disabled when absent; the local
    /// pipeline phases still work against the cached artifacts.
    pub api_key: Option<String>,
    /// mod.io game id the profiles' mod ids belong to.
    pub game_id: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        debug!("Loading modman configuration");

        let file_cfg = Self::read_config_file()?;

        let cache_root = env::var("MODMAN_CACHE_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .or_else(|| file_cfg.core.cache_dir.as_deref().map(expand_home))
            .unwrap_or_else(|| {
                debug!(
                    "MODMAN_CACHE_DIR not set and no cache_dir in config file, \
                     falling back to ~/{DEFAULT_CACHE_DIR_NAME}"
                );
                home_dir().join(DEFAULT_CACHE_DIR_NAME)
            });
        debug!("Effective cache root: {}", cache_root.display());

        let api_key = env::var("MODMAN_API_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .or(file_cfg.modio.api_key);

        let game_id = env::var("MODMAN_GAME_ID")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .or(file_cfg.modio.game_id);

        Ok(Self {
            cache_root,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key,
            game_id,
        })
    }

    fn read_config_file() -> Result<ConfigFile> {
        let path = Self::config_file_path();
        if !path.is_file() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(ConfigFile::default());
        }
        let text = fs::read_to_string(&path)?;
        toml::from_str(&text).map_err(|e| {
            ModmanError::Config(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    pub fn config_file_path() -> PathBuf {
        if let Ok(dir) = env::var("MODMAN_CONFIG_DIR") {
            if !dir.is_empty() {
                return PathBuf::from(dir).join(CONFIG_FILE_NAME);
            }
        }
        home_dir().join(".config").join("modman").join(CONFIG_FILE_NAME)
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Root of the content-addressable artifact store.
    pub fn artifacts_dir(&self) -> PathBuf {
        self.cache_root.join("artifacts")
    }

    pub fn staging_root(&self) -> PathBuf {
        self.cache_root.join("staging")
    }

    /// Per-profile persisted state (deployment manifests, locks).
    pub fn state_dir(&self) -> PathBuf {
        self.cache_root.join("state")
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.cache_root.join("profiles")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.cache_root.join("logs")
    }

    pub fn profile_path(&self, reference: &str) -> PathBuf {
        self.profiles_dir().join(format!("{reference}.json"))
    }

    pub fn profile_staging_dir(&self, profile_id: Uuid) -> PathBuf {
        self.staging_root().join(profile_id.to_string())
    }

    pub fn profile_state_dir(&self, profile_id: Uuid) -> PathBuf {
        self.state_dir().join(profile_id.to_string())
    }

    pub fn manifest_path(&self, profile_id: Uuid) -> PathBuf {
        self.profile_state_dir(profile_id).join("manifest.json")
    }

    pub fn manifest_lock_path(&self, profile_id: Uuid) -> PathBuf {
        self.profile_state_dir(profile_id).join("manifest.lock")
    }

    pub fn can_download(&self) -> bool {
        self.api_key.is_some()
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        home_dir().join(rest)
    } else {
        PathBuf::from(path)
    }
}
