//! User-tunable settings, read from `settings.json` in the work directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::registry::DEFAULT_API_URL;
use crate::runtime::Runtime;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Modrinth API base URL
    pub api_url: String,
    /// Mod loader requested from the registry
    pub loader: String,
    /// Slugs never reported by update checks
    pub update_deny_list: Vec<String>,
    /// Game versions re-installed against another version on update
    pub version_pins: BTreeMap<String, String>,
    /// Lowest platform level on which enable/disable renames files.
    /// `None` disables the check.
    pub toggle_min_platform_level: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            loader: "fabric".to_string(),
            update_deny_list: vec!["simple-voice-chat".to_string()],
            version_pins: BTreeMap::from([("1.19.2".to_string(), "1.19".to_string())]),
            toggle_min_platform_level: Some(27),
        }
    }
}

impl Settings {
    /// Load settings from `path`; a missing file yields the defaults.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        if !runtime.exists(path) {
            return Ok(Self::default());
        }
        let content = runtime.read_to_string(path)?;
        serde_json::from_str(&content).with_context(|| format!("Invalid settings file {:?}", path))
    }

    /// Game version to install against when updating an instance on `game_version`.
    pub fn pinned_version<'a>(&'a self, game_version: &'a str) -> &'a str {
        self.version_pins
            .get(game_version)
            .map(String::as_str)
            .unwrap_or(game_version)
    }

    pub fn is_update_denied(&self, slug: &str) -> bool {
        self.update_deny_list.iter().any(|s| s == slug)
    }

    /// Whether a host reporting `level` may rename artifacts.
    pub fn toggle_supported(&self, level: Option<u32>) -> bool {
        match (self.toggle_min_platform_level, level) {
            (Some(min), Some(level)) => level >= min,
            _ => true,
        }
    }
}
