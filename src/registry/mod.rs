//! Package registry abstraction.
//!
//! The lifecycle engine only needs one question answered: "which artifact
//! of `slug` fits `game_version`?". [`ModRegistry`] is that seam; Modrinth
//! is the only source implemented.

mod modrinth;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use modrinth::{DEFAULT_API_URL, ModrinthRegistry};

/// Registry source tag stored with every installed mod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Modrinth,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Modrinth => write!(f, "modrinth"),
        }
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "modrinth" => Ok(Platform::Modrinth),
            _ => anyhow::bail!("Unknown platform: {}. Expected modrinth.", s),
        }
    }
}

/// Metadata of the artifact a registry resolved for a slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModData {
    pub slug: String,
    pub platform: Platform,
    /// Registry-assigned id of this build
    pub revision_id: String,
    pub filename: String,
    pub download_url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModRegistry: Send + Sync {
    fn platform(&self) -> Platform;

    /// Newest artifact of `slug` compatible with `game_version`.
    ///
    /// `Ok(None)` when the registry has no such project or no compatible build.
    async fn fetch_metadata(&self, slug: &str, game_version: &str) -> Result<Option<ModData>>;
}
