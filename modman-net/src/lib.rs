// modman-net/src/lib.rs
pub mod http;
pub mod modio;
pub mod provider;
pub mod validation;

// Re-export the provider surface the pipeline consumes
pub use http::build_http_client;
pub use modio::ModioClient;
pub use provider::Provider;
pub use validation::{file_fingerprint, validate_artifact, validate_url};
