// modman-common/src/error.rs
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ModmanError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Profile Error: {0}")]
    Profile(String),

    #[error("Mod {0} not found at provider")]
    NotFound(u64),

    #[error("Provider authentication failed: {0}")]
    Auth(String),

    #[error("Transient provider error: {0}")]
    Transient(String),

    #[error("DownloadError: Failed to download mod {0} from '{1}': {2}")]
    Download(u64, String, String),

    #[error("Artifact store error: {0}")]
    Store(String),

    #[error("No cached artifact for mod {mod_id} ('{name}'); run download first")]
    MissingArtifact { mod_id: u64, name: String },

    #[error("Staged path collision: '{path}' produced by both mod {first} and mod {second}")]
    PathCollision {
        path: String,
        first: u64,
        second: u64,
    },

    #[error("Install directory {0} is not writable")]
    InstallDirUnwritable(PathBuf),

    #[error("Deployment manifest error: {0}")]
    Manifest(String),

    #[error("Profile {0} is locked by another process (lock file: {1})")]
    Locked(String, PathBuf),

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("Generic Error: {0}")]
    Generic(String),
}

impl From<std::io::Error> for ModmanError {
    fn from(err: std::io::Error) -> Self {
        ModmanError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for ModmanError {
    fn from(err: reqwest::Error) -> Self {
        ModmanError::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for ModmanError {
    fn from(err: serde_json::Error) -> Self {
        ModmanError::Json(Arc::new(err))
    }
}

impl ModmanError {
    /// Provider errors eligible for caller-directed retry. Auth and
    /// not-found failures are permanent and never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, ModmanError::Transient(_) | ModmanError::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, ModmanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_failures_classify_as_transient() {
        assert!(ModmanError::Transient("HTTP 503".to_string()).is_transient());
        assert!(!ModmanError::NotFound(7).is_transient());
        assert!(!ModmanError::Auth("rejected credentials".to_string()).is_transient());
        assert!(!ModmanError::Validation("empty artifact".to_string()).is_transient());
    }
}
