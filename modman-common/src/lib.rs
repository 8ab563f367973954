// modman-common/src/lib.rs
pub mod config;
pub mod error;
pub mod io;
pub mod model;

// Re-export key types
pub use config::Config;
pub use error::{ModmanError, Result};
pub use model::{DeploymentManifest, ManifestEntry, ModRelease, Profile, VersionToken};
