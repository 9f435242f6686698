use anyhow::Result;
use log::{debug, info};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;

use super::paths::default_root;
use crate::{
    application::ModManager,
    download::HttpDownloader,
    http::HttpClient,
    layout::WorkDir,
    registry::ModrinthRegistry,
    runtime::Runtime,
    settings::Settings,
};

/// Everything the CLI needs to open a [`ModManager`].
pub struct Config<R: Runtime> {
    pub runtime: Arc<R>,
    pub layout: WorkDir,
    pub settings: Settings,
    pub registry: ModrinthRegistry,
    pub downloader: HttpDownloader<R>,
}

impl<R: Runtime + 'static> Config<R> {
    pub fn new(runtime: R, root: Option<PathBuf>, api_url: Option<String>) -> Result<Self> {
        let runtime = Arc::new(runtime);
        let root = match root {
            Some(path) => path,
            None => default_root(runtime.as_ref())?,
        };
        info!("Using work directory: {}", root.display());

        let layout = WorkDir::new(root);
        let mut settings = Settings::load(runtime.as_ref(), &layout.settings_path())?;
        if let Some(url) = api_url {
            debug!("Overriding API URL with {}", url);
            settings.api_url = url;
        }

        let client = Client::builder().user_agent("modkeep-cli").build()?;
        let http_client = HttpClient::new(client);
        let registry =
            ModrinthRegistry::new(http_client.clone(), &settings.api_url, &settings.loader);
        let downloader = HttpDownloader::new(runtime.clone(), http_client);

        Ok(Self {
            runtime,
            layout,
            settings,
            registry,
            downloader,
        })
    }

    pub fn into_manager(self) -> Result<ModManager<R>> {
        ModManager::open(
            self.runtime,
            self.layout,
            self.settings,
            Arc::new(self.registry),
            Arc::new(self.downloader),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use tempfile::tempdir;

    #[test]
    fn test_config_uses_default_root() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_data_dir()
            .returning(|| Some(PathBuf::from("/data")));
        runtime.expect_exists().returning(|_| false);

        let config = Config::new(runtime, None, None).unwrap();
        assert_eq!(config.layout.root(), PathBuf::from("/data/modkeep"));
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.registry.api_url(), "https://api.modrinth.com/v2");
    }

    #[test]
    fn test_config_api_url_overrides_settings() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"api_url": "https://mirror.example/v2", "loader": "quilt"}"#,
        )
        .unwrap();

        let config = Config::new(RealRuntime, Some(dir.path().to_path_buf()), None).unwrap();
        assert_eq!(config.registry.api_url(), "https://mirror.example/v2");
        assert_eq!(config.settings.loader, "quilt");

        let config = Config::new(
            RealRuntime,
            Some(dir.path().to_path_buf()),
            Some("http://127.0.0.1:1234/".into()),
        )
        .unwrap();
        assert_eq!(config.registry.api_url(), "http://127.0.0.1:1234");
    }

    #[test]
    fn test_config_rejects_corrupt_settings() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), "not json").unwrap();

        assert!(Config::new(RealRuntime, Some(dir.path().to_path_buf()), None).is_err());
    }

    #[tokio::test]
    async fn test_into_manager_opens_work_dir() {
        let dir = tempdir().unwrap();
        let config = Config::new(RealRuntime, Some(dir.path().to_path_buf()), None).unwrap();
        let manager = config.into_manager().unwrap();
        assert!(manager.instances().is_empty());
        assert_eq!(manager.layout().root(), dir.path());
    }
}
