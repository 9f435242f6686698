use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::registry::{ModData, Platform};

/// One downloadable artifact revision.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PackageFile {
    /// Registry revision id
    pub id: String,
    pub filename: String,
    pub url: String,
}

/// An installed mod.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ModEntry {
    pub slug: String,
    pub platform: Platform,
    pub active: bool,
    pub file: PackageFile,
}

impl From<ModData> for ModEntry {
    fn from(data: ModData) -> Self {
        ModEntry {
            slug: data.slug,
            platform: data.platform,
            active: true,
            file: PackageFile {
                id: data.revision_id,
                filename: data.filename,
                url: data.download_url,
            },
        }
    }
}

/// A named game environment with its own mod set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub name: String,
    pub game_version: String,
    #[serde(default)]
    pub mods: Vec<ModEntry>,
}

impl Instance {
    pub fn new(name: impl Into<String>, game_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            game_version: game_version.into(),
            mods: Vec::new(),
        }
    }

    pub fn get_mod(&self, slug: &str) -> Option<&ModEntry> {
        self.mods.iter().find(|m| m.slug == slug)
    }

    pub fn get_mod_mut(&mut self, slug: &str) -> Option<&mut ModEntry> {
        self.mods.iter_mut().find(|m| m.slug == slug)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.get_mod(slug).is_some()
    }

    /// Appends `entry` unless the slug is already present.
    pub fn add_mod(&mut self, entry: ModEntry) -> bool {
        if self.contains(&entry.slug) {
            return false;
        }
        self.mods.push(entry);
        true
    }

    pub fn remove_mod(&mut self, slug: &str) -> Option<ModEntry> {
        let index = self.mods.iter().position(|m| m.slug == slug)?;
        Some(self.mods.remove(index))
    }
}

/// Root of the persisted inventory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct InventoryState {
    #[serde(default)]
    pub instances: BTreeMap<String, Instance>,
}

impl InventoryState {
    pub fn get_instance(&self, name: &str) -> Option<&Instance> {
        self.instances.get(name)
    }

    pub fn get_instance_mut(&mut self, name: &str) -> Option<&mut Instance> {
        self.instances.get_mut(name)
    }

    /// Inserts `instance` unless its name is taken.
    pub fn add_instance(&mut self, instance: Instance) -> bool {
        if self.instances.contains_key(&instance.name) {
            return false;
        }
        self.instances.insert(instance.name.clone(), instance);
        true
    }

    /// Imports instances from `other` that this state does not know yet.
    /// Returns the number of imported instances.
    pub fn merge_missing(&mut self, other: InventoryState) -> usize {
        let mut imported = 0;
        for (name, instance) in other.instances {
            if !self.instances.contains_key(&name) {
                self.instances.insert(name, instance);
                imported += 1;
            }
        }
        imported
    }
}
