//! Forge v3 API adapter
//!
//! Fetches module version information from a Forge.
//! API endpoints:
//! - `GET /v3/modules/{owner-name}` — module with its release list
//! - `GET /v3/releases/{owner-name}-{version}` — one release with its
//!   download location
//!
//! The Forge requires a User-Agent header (handled by HttpClient). Deleted
//! releases stay in the release list with a `deleted_at` marker and are
//! skipped here.

use crate::catalog::{HttpClient, VersionCatalog};
use crate::domain::{ModuleId, Version};
use crate::error::CatalogError;
use async_trait::async_trait;
use serde::Deserialize;

/// Public Forge API base URL
pub const DEFAULT_FORGE_URL: &str = "https://forgeapi.puppet.com";

/// Forge-backed version catalog
pub struct ForgeCatalog {
    client: HttpClient,
    base_url: String,
}

/// Forge module response (the parts this tool reads)
#[derive(Debug, Deserialize)]
struct ModuleResponse {
    /// Releases of the module, abbreviated
    #[serde(default)]
    releases: Vec<ReleaseSummary>,
}

/// Abbreviated release entry inside a module response
#[derive(Debug, Deserialize)]
struct ReleaseSummary {
    /// Version number
    version: String,
    /// Set when the release was deleted from the Forge
    #[serde(default)]
    deleted_at: Option<String>,
}

/// Full release response
#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    /// Download location, relative to the Forge base URL
    file_uri: String,
    /// Archive size in bytes
    #[serde(default)]
    file_size: Option<u64>,
}

/// Where to download one release from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Absolute download URL for the release tarball
    pub download_url: String,
    /// Archive size in bytes, when the Forge reports one
    pub file_size: Option<u64>,
}

impl ForgeCatalog {
    /// Create an adapter against the public Forge
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, DEFAULT_FORGE_URL)
    }

    /// Create an adapter against a specific Forge instance
    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    /// Build the URL for a module
    fn module_url(&self, id: &ModuleId) -> String {
        format!("{}/v3/modules/{}", self.base_url, id.slug())
    }

    /// Build the URL for one release of a module
    fn release_url(&self, id: &ModuleId, version: &Version) -> String {
        format!("{}/v3/releases/{}-{}", self.base_url, id.slug(), version.raw())
    }

    /// Fetch the download location of one release
    pub async fn release(
        &self,
        id: &ModuleId,
        version: &Version,
    ) -> Result<ReleaseInfo, CatalogError> {
        let url = self.release_url(id, version);
        let response: ReleaseResponse = self.client.get_json(&url, &id.slug()).await?;

        Ok(ReleaseInfo {
            download_url: format!("{}{}", self.base_url, response.file_uri),
            file_size: response.file_size,
        })
    }

    /// Download one release tarball
    pub async fn download(
        &self,
        id: &ModuleId,
        release: &ReleaseInfo,
    ) -> Result<Vec<u8>, CatalogError> {
        self.client
            .get_bytes(&release.download_url, &id.slug())
            .await
    }
}

#[async_trait]
impl VersionCatalog for ForgeCatalog {
    async fn available_versions(&self, id: &ModuleId) -> Result<Vec<Version>, CatalogError> {
        let url = self.module_url(id);
        let response: ModuleResponse = self.client.get_json(&url, &id.slug()).await?;

        let mut versions = Vec::new();

        for release in response.releases {
            // Skip deleted releases
            if release.deleted_at.is_some() {
                continue;
            }

            if let Ok(version) = Version::parse(&release.version) {
                versions.push(version);
            }
        }

        // Newest first
        versions.sort_unstable_by(|a, b| b.cmp(a));

        Ok(versions)
    }
}
