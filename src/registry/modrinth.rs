//! Modrinth registry client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;

use super::{ModData, ModRegistry, Platform};
use crate::http::{HttpClient, NonRetryableError};
use crate::layout::is_plain_name;

pub const DEFAULT_API_URL: &str = "https://api.modrinth.com/v2";

/// Modrinth API response types (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Version {
        pub id: String,
        #[serde(default)]
        pub files: Vec<File>,
    }

    #[derive(Deserialize, Debug)]
    pub struct File {
        pub url: String,
        pub filename: String,
        #[serde(default)]
        pub primary: bool,
    }
}

pub struct ModrinthRegistry {
    http_client: HttpClient,
    api_url: String,
    loader: String,
}

impl ModrinthRegistry {
    pub fn new(http_client: HttpClient, api_url: &str, loader: &str) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            loader: loader.to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn fetch_versions(&self, slug: &str, game_version: &str) -> Result<Vec<api::Version>> {
        let url = format!("{}/project/{}/version", self.api_url, slug);
        let game_versions = serde_json::to_string(&[game_version])?;
        let loaders = serde_json::to_string(&[self.loader.as_str()])?;
        debug!("Fetching versions of {} for {} from {}...", slug, game_version, url);

        self.http_client
            .get_json_with_query(
                &url,
                &[
                    ("game_versions", game_versions.as_str()),
                    ("loaders", loaders.as_str()),
                ],
            )
            .await
    }
}

/// Whether `slug` is usable as a single URL path segment.
fn is_valid_slug(slug: &str) -> bool {
    is_plain_name(slug)
        && !slug.contains(['?', '#', '%'])
        && !slug.chars().any(char::is_whitespace)
}

/// First version (Modrinth lists newest first) that ships at least one file,
/// preferring the file flagged primary.
fn pick_release(slug: &str, versions: Vec<api::Version>) -> Option<ModData> {
    versions.into_iter().find_map(|version| {
        let mut files = version.files;
        if files.is_empty() {
            return None;
        }
        let index = files.iter().position(|f| f.primary).unwrap_or(0);
        let file = files.swap_remove(index);
        Some(ModData {
            slug: slug.to_string(),
            platform: Platform::Modrinth,
            revision_id: version.id,
            filename: file.filename,
            download_url: file.url,
        })
    })
}

#[async_trait]
impl ModRegistry for ModrinthRegistry {
    fn platform(&self) -> Platform {
        Platform::Modrinth
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_metadata(&self, slug: &str, game_version: &str) -> Result<Option<ModData>> {
        if !is_valid_slug(slug) {
            debug!("{:?} is not a valid project slug", slug);
            return Ok(None);
        }
        match self.fetch_versions(slug, game_version).await {
            Ok(versions) => Ok(pick_release(slug, versions)),
            Err(e) if matches!(
                e.downcast_ref::<NonRetryableError>(),
                Some(NonRetryableError::NotFound(_))
            ) =>
            {
                debug!("Project {} does not exist on Modrinth", slug);
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to query Modrinth for {}", slug)),
        }
    }
}
