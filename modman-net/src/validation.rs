// modman-net/src/validation.rs
use std::fs::File;
use std::io;
use std::path::Path;

use modman_common::error::{ModmanError, Result};
use sha2::{Digest, Sha256};
use url::Url;

/// Computes the SHA-256 fingerprint of a file, hex encoded.
pub fn file_fingerprint(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let bytes_copied = io::copy(&mut file, &mut hasher)?;
    let actual = hex::encode(hasher.finalize());
    tracing::debug!(
        "SHA256 for {}: {} ({} bytes)",
        path.display(),
        actual,
        bytes_copied
    );
    Ok(actual)
}

/// Validates a URL, ensuring it uses the HTTPS scheme.
pub fn validate_url(url_str: &str) -> Result<()> {
    let url = Url::parse(url_str)
        .map_err(|e| ModmanError::Validation(format!("Failed to parse URL '{url_str}': {e}")))?;
    if url.scheme() == "https" {
        Ok(())
    } else {
        Err(ModmanError::Validation(format!(
            "Invalid URL scheme for '{}': Must be https, but got '{}'",
            url_str,
            url.scheme()
        )))
    }
}

/// Rejects an invalid/unparseable artifact before it reaches the store.
/// An empty download is always rejected; a file the provider names
/// `*.zip` must actually carry zip content.
pub fn validate_artifact(path: &Path, filename: &str) -> Result<()> {
    let metadata = std::fs::metadata(path)?;
    if metadata.len() == 0 {
        return Err(ModmanError::Validation(format!(
            "Downloaded artifact {} is empty",
            path.display()
        )));
    }
    if filename.to_ascii_lowercase().ends_with(".zip") {
        let kind = infer::get_from_path(path)?;
        match kind {
            Some(k) if k.extension().eq_ignore_ascii_case("zip") => Ok(()),
            detected => Err(ModmanError::Validation(format!(
                "Artifact {} claims to be a zip but detected content type is {:?}",
                path.display(),
                detected.map(|k| k.extension())
            ))),
        }
    } else {
        Ok(())
    }
}
