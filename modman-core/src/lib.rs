// modman-core/src/lib.rs
pub mod extract;
pub mod lock;
pub mod pipeline;
pub mod report;
pub mod store;

pub use lock::ManifestLock;
pub use pipeline::{run_profile, PipelineSummary};
pub use report::{CleanupReport, DeployReport, DownloadReport};
pub use store::{ArtifactStore, StoredArtifact};
