//! Artifact transfer.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::http::HttpClient;
use crate::runtime::Runtime;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetch `url` into `dest`. On failure nothing is left at `dest`.
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Streams artifacts over HTTP into a `.part` sibling, renamed onto the
/// destination once the body is complete.
pub struct HttpDownloader<R: Runtime> {
    runtime: Arc<R>,
    http_client: HttpClient,
}

impl<R: Runtime> HttpDownloader<R> {
    pub fn new(runtime: Arc<R>, http_client: HttpClient) -> Self {
        Self {
            runtime,
            http_client,
        }
    }

    /// Best-effort removal of a partial download.
    fn discard(&self, part: &Path) {
        if !self.runtime.exists(part) {
            return;
        }
        if let Err(e) = self.runtime.remove_file(part) {
            warn!("Failed to remove partial download {:?}: {:#}", part, e);
        }
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

#[async_trait]
impl<R: Runtime> Downloader for HttpDownloader<R> {
    #[tracing::instrument(skip(self))]
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        info!("Downloading {}...", url);
        let part = part_path(dest);

        let result = self
            .http_client
            .download_file(url, || {
                self.runtime
                    .create_file(&part)
                    .with_context(|| format!("Failed to create {:?}", part))
            })
            .await;

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                self.discard(&part);
                return Err(e).with_context(|| format!("Failed to download {}", url));
            }
        };

        if let Err(e) = self.runtime.rename(&part, dest) {
            self.discard(&part);
            return Err(e).with_context(|| format!("Failed to move download into {:?}", dest));
        }
        debug!("Saved {} bytes to {:?}", bytes, dest);
        Ok(())
    }
}
