// modman-net/src/modio.rs
// REST client for the mod.io v1 API, the one concrete Provider.
use std::path::Path;

use modman_common::error::{ModmanError, Result};
use modman_common::model::{ModRelease, VersionToken};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http::{self, build_http_client};
use crate::provider::Provider;
use crate::validation::{validate_artifact, validate_url};

#[derive(Debug, Clone)]
pub struct ModioClient {
    client: Client,
    base_url: String,
    api_key: String,
    game_id: u64,
}

/// Wire shape of `GET /games/{game}/mods/{mod}/files`.
#[derive(Debug, Deserialize)]
struct FileListResponse {
    data: Vec<ModFile>,
}

#[derive(Debug, Deserialize)]
struct ModFile {
    id: u64,
    #[serde(default)]
    mod_id: u64,
    filename: String,
    date_added: u64,
    #[serde(default)]
    filesize: u64,
    download: FileDownload,
}

#[derive(Debug, Deserialize)]
struct FileDownload {
    binary_url: String,
}

impl ModioClient {
    pub fn new(base_url: &str, api_key: &str, game_id: u64) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            game_id,
        })
    }

    fn files_url(&self, mod_id: u64) -> String {
        format!(
            "{}/games/{}/mods/{}/files",
            self.base_url, self.game_id, mod_id
        )
    }

    /// Builds the opaque version token for a file. Both fields are
    /// zero-padded so lexicographic order equals provider recency order:
    /// upload timestamp first, file id as the tie breaker for files
    /// sharing a timestamp.
    fn version_token(file: &ModFile) -> VersionToken {
        VersionToken::new(format!("{:020}-{:010}", file.date_added, file.id))
    }
}

impl Provider for ModioClient {
    async fn resolve(&self, mod_id: u64) -> Result<ModRelease> {
        let url = self.files_url(mod_id);
        debug!("Resolving mod {} via {}", mod_id, url);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ModmanError::Transient(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(http::status_to_error(status, mod_id, &url));
        }

        let listing: FileListResponse = response.json().await.map_err(|e| {
            ModmanError::Transient(format!("Invalid file listing for mod {mod_id}: {e}"))
        })?;

        let newest = listing
            .data
            .into_iter()
            .max_by_key(|f| (f.date_added, f.id))
            .ok_or(ModmanError::NotFound(mod_id))?;
        if newest.mod_id != 0 && newest.mod_id != mod_id {
            warn!(
                "Provider returned file for mod {} while resolving mod {}",
                newest.mod_id, mod_id
            );
        }

        let version = Self::version_token(&newest);
        debug!(
            "Resolved mod {} -> {} ({}, {} bytes)",
            mod_id, version, newest.filename, newest.filesize
        );
        Ok(ModRelease {
            mod_id,
            version,
            filename: newest.filename,
            download_url: newest.download.binary_url,
            size_bytes: newest.filesize,
        })
    }

    async fn fetch(&self, release: &ModRelease, dest: &Path) -> Result<()> {
        validate_url(&release.download_url)?;
        http::download_to_file(&self.client, &release.download_url, release.mod_id, dest).await?;
        validate_artifact(dest, &release.filename)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(id: u64, date_added: u64) -> ModFile {
        ModFile {
            id,
            mod_id: 7,
            filename: format!("mod-{id}.zip"),
            date_added,
            filesize: 1024,
            download: FileDownload {
                binary_url: "https://cdn.example/mod.zip".to_string(),
            },
        }
    }

    #[test]
    fn version_tokens_track_provider_recency() {
        let older = ModioClient::version_token(&file(100, 1_700_000_000));
        let newer = ModioClient::version_token(&file(90, 1_800_000_000));
        assert!(newer > older);

        // Same timestamp: file id breaks the tie.
        let a = ModioClient::version_token(&file(5, 1_700_000_000));
        let b = ModioClient::version_token(&file(6, 1_700_000_000));
        assert!(b > a);

        // Tie break must hold across an id digit-count boundary too;
        // an unpadded id would make "100" sort below "99".
        let two_digits = ModioClient::version_token(&file(99, 1_700_000_000));
        let three_digits = ModioClient::version_token(&file(100, 1_700_000_000));
        assert!(three_digits > two_digits);
    }

    #[test]
    fn file_listing_deserializes() {
        let body = r#"{
            "data": [
                {
                    "id": 42,
                    "mod_id": 7,
                    "filename": "better-maps-1.2.zip",
                    "date_added": 1714000000,
                    "filesize": 2048,
                    "download": { "binary_url": "https://cdn.mod.io/f/42" }
                }
            ]
        }"#;
        let listing: FileListResponse = serde_json::from_str(body).unwrap();
        assert_eq!(listing.data.len(), 1);
        assert_eq!(listing.data[0].filename, "better-maps-1.2.zip");
        assert_eq!(listing.data[0].download.binary_url, "https://cdn.mod.io/f/42");
    }
}
