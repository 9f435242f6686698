//! Compatibility tiers for known packages.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

use crate::registry::Platform;
use crate::runtime::Runtime;

/// Tier reported for anything the table does not know.
pub const UNTESTED: &str = "Untested";

/// Read-only map of package name to compatibility tier.
///
/// Only Modrinth names are tracked; lookups for any other platform report
/// [`UNTESTED`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibilityTable {
    modrinth: HashMap<String, String>,
}

impl CompatibilityTable {
    pub fn from_json(json: &str) -> Result<Self> {
        let modrinth: HashMap<String, String> =
            serde_json::from_str(json).context("Failed to parse compatibility table")?;
        Ok(Self { modrinth })
    }

    /// Load the table from `path`; a missing file is an empty table.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        if !runtime.exists(path) {
            log::debug!("No compatibility table at {:?}", path);
            return Ok(Self::default());
        }
        let content = runtime.read_to_string(path)?;
        Self::from_json(&content).with_context(|| format!("Invalid table at {:?}", path))
    }

    pub fn tier(&self, platform: &str, name: &str) -> &str {
        match platform.parse::<Platform>() {
            Ok(Platform::Modrinth) => self
                .modrinth
                .get(name)
                .map(String::as_str)
                .unwrap_or(UNTESTED),
            Err(_) => UNTESTED,
        }
    }

    pub fn len(&self) -> usize {
        self.modrinth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modrinth.is_empty()
    }
}
