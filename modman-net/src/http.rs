// modman-net/src/http.rs
use std::fs;
use std::path::Path;
use std::time::Duration;

use modman_common::error::{ModmanError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use tokio::fs::File as TokioFile;
use tokio::io::AsyncWriteExt;
use tracing::debug;

const DOWNLOAD_TIMEOUT_SECS: u64 = 300;
const CONNECT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT_STRING: &str = "modman (Rust; +https://github.com/modman-rs/modman)";

pub fn build_http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| ModmanError::Generic(format!("Failed to build HTTP client: {e}")))
}

/// Maps a provider HTTP status onto the error taxonomy. `mod_id` and
/// `url` give the caller enough detail to report which mod failed.
pub(crate) fn status_to_error(status: StatusCode, mod_id: u64, url: &str) -> ModmanError {
    match status {
        StatusCode::NOT_FOUND => ModmanError::NotFound(mod_id),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ModmanError::Auth(format!(
            "Provider rejected credentials for mod {mod_id} (HTTP {status})"
        )),
        s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
            ModmanError::Transient(format!("HTTP {s} for {url}"))
        }
        s => ModmanError::Download(mod_id, url.to_string(), format!("HTTP error {s}")),
    }
}

/// Downloads `url` to `dest` through a sibling temp file plus rename, so
/// a crash mid-download never leaves partial bytes at `dest`.
pub async fn download_to_file(client: &Client, url: &str, mod_id: u64, dest: &Path) -> Result<()> {
    let temp_filename = format!(
        ".{}.download",
        dest.file_name().unwrap_or_default().to_string_lossy()
    );
    let temp_path = dest.with_file_name(temp_filename);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    debug!("Downloading {} to temporary path {}", url, temp_path.display());

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ModmanError::Transient(format!("Request to {url} failed: {e}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(status_to_error(status, mod_id, url));
    }

    let mut temp_file = TokioFile::create(&temp_path).await?;
    let mut response = response;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| ModmanError::Transient(format!("Read from {url} failed: {e}")))?
    {
        temp_file.write_all(&chunk).await?;
    }
    temp_file.flush().await?;
    drop(temp_file);

    fs::rename(&temp_path, dest)?;
    debug!("Download complete: {}", dest.display());
    Ok(())
}
