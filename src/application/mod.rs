//! Mod lifecycle engine.
//!
//! [`ModManager`] owns the inventory and coordinates every operation on it:
//!
//! - `add` - resolve, append and download a mod
//! - `remove` - delete an artifact and forget the mod
//! - `toggle` - enable/disable by renaming the artifact
//! - `update` - update checks and remove-then-re-add updates
//!
//! Mutating operations run as spawned tasks and hand back a
//! [`OperationHandle`]; the resulting [`ModEvent`] is also broadcast to
//! [`ModManager::subscribe`] receivers. Failures end up in the event, they are
//! never returned from the task.

mod add;
mod events;
mod remove;
mod toggle;
mod update;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub use events::{ModEvent, OperationKind, Outcome, SkipReason};

use crate::download::Downloader;
use crate::error::InventoryError;
use crate::inventory::{CompatibilityTable, Instance, InventoryStore, ModEntry};
use crate::layout::{WorkDir, is_plain_name};
use crate::ops::{KeyedLocks, OperationGate, SaveScheduler};
use crate::registry::{ModData, ModRegistry, Platform};
use crate::runtime::Runtime;
use crate::settings::Settings;

/// Completion handle of a background operation.
pub type OperationHandle = JoinHandle<ModEvent>;

const EVENT_CAPACITY: usize = 64;

pub struct ModManager<R: Runtime> {
    shared: Arc<Shared<R>>,
}

impl<R: Runtime> Clone for ModManager<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<R: Runtime> {
    runtime: Arc<R>,
    layout: WorkDir,
    settings: Settings,
    store: Arc<InventoryStore<R>>,
    gate: Arc<OperationGate>,
    saver: Arc<SaveScheduler<R>>,
    locks: KeyedLocks,
    compat: CompatibilityTable,
    registry: Arc<dyn ModRegistry>,
    downloader: Arc<dyn Downloader>,
    events: broadcast::Sender<ModEvent>,
}

impl<R: Runtime + 'static> ModManager<R> {
    /// Load the inventory and compatibility table found in `layout`.
    pub fn open(
        runtime: Arc<R>,
        layout: WorkDir,
        settings: Settings,
        registry: Arc<dyn ModRegistry>,
        downloader: Arc<dyn Downloader>,
    ) -> Result<Self> {
        let store = Arc::new(InventoryStore::open(
            runtime.clone(),
            layout.inventory_path(),
        )?);
        let compat =
            CompatibilityTable::load(runtime.as_ref(), &layout.compat_path(Platform::Modrinth))?;
        let gate = OperationGate::new();
        let saver = SaveScheduler::new(store.clone(), gate.clone());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            shared: Arc::new(Shared {
                runtime,
                layout,
                settings,
                store,
                gate,
                saver,
                locks: KeyedLocks::new(),
                compat,
                registry,
                downloader,
                events,
            }),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.shared.settings
    }

    pub fn layout(&self) -> &WorkDir {
        &self.shared.layout
    }

    /// Receive a [`ModEvent`] for every finished operation.
    pub fn subscribe(&self) -> broadcast::Receiver<ModEvent> {
        self.shared.events.subscribe()
    }

    /// Register a new instance. Returns `false` if the name is taken.
    ///
    /// The name becomes a directory under `instances/`, so it must be a
    /// single plain path component.
    pub fn create_instance(&self, name: &str, game_version: &str) -> Result<bool> {
        if !is_plain_name(name) {
            return Err(InventoryError::InvalidName {
                kind: "instance",
                name: name.to_string(),
            }
            .into());
        }
        let created = self.shared.store.create_instance(name, game_version);
        if created {
            info!("Created instance {} ({})", name, game_version);
            self.shared.saver.request_save();
        }
        Ok(created)
    }

    pub fn instances(&self) -> Vec<String> {
        self.shared.store.instance_names()
    }

    pub fn instance(&self, name: &str) -> Result<Instance> {
        self.shared.store.require_instance(name)
    }

    /// Installed mods of `instance`, in installation order.
    pub fn list_installed_mods(&self, instance: &str) -> Result<Vec<ModEntry>> {
        Ok(self.instance(instance)?.mods)
    }

    pub fn compatibility(&self, platform: &str, name: &str) -> &str {
        self.shared.compat.tier(platform, name)
    }

    /// Whether an install of `slug` is in flight in any instance.
    pub fn is_downloading(&self, slug: &str) -> bool {
        self.shared.gate.is_in_flight(slug)
    }

    /// Wait until no install is in flight, then write the inventory.
    pub async fn flush(&self) -> Result<()> {
        self.shared.saver.save_now().await
    }
}

impl<R: Runtime + 'static> Shared<R> {
    /// Log and broadcast a finished operation.
    fn finish(&self, kind: OperationKind, instance: &str, slug: &str, outcome: Outcome) -> ModEvent {
        let event = ModEvent {
            kind,
            instance: instance.to_string(),
            slug: slug.to_string(),
            outcome,
        };
        match &event.outcome {
            Outcome::Failed(_) => warn!("{}", event),
            _ => info!("{}", event),
        }
        // No receivers is fine
        let _ = self.events.send(event.clone());
        event
    }

    /// Artifact directory of `instance`. Names read back from a hand-edited
    /// inventory are checked again here.
    fn instance_dir(&self, instance: &str) -> Result<PathBuf> {
        if !is_plain_name(instance) {
            return Err(InventoryError::InvalidName {
                kind: "instance",
                name: instance.to_string(),
            }
            .into());
        }
        Ok(self.layout.instance_dir(instance))
    }

    /// The entry of `slug` in `instance`, reloading the inventory on a miss.
    fn installed_mod(&self, instance: &str, slug: &str) -> Result<ModEntry> {
        self.store
            .require_instance(instance)?
            .get_mod(slug)
            .cloned()
            .ok_or_else(|| {
                InventoryError::ModNotFound {
                    instance: instance.to_string(),
                    slug: slug.to_string(),
                }
                .into()
            })
    }

    /// Ask the registry serving `platform` for `slug`.
    async fn lookup(&self, platform: Platform, slug: &str, game_version: &str) -> Result<Option<ModData>> {
        if platform != self.registry.platform() {
            return Ok(None);
        }
        self.registry.fetch_metadata(slug, game_version).await
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::download::MockDownloader;
    use crate::registry::MockModRegistry;
    use crate::runtime::RealRuntime;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_and_list_instances() {
        let (dir, manager) = manager(MockModRegistry::new(), MockDownloader::new());

        assert!(manager.create_instance("Vanilla117", "1.19.2").unwrap());
        assert!(!manager.create_instance("Vanilla117", "1.20.1").unwrap());
        assert_eq!(manager.instances(), vec!["Vanilla117"]);
        assert!(manager.list_installed_mods("Vanilla117").unwrap().is_empty());

        manager.flush().await.unwrap();
        let saved = std::fs::read_to_string(dir.path().join("mods.json")).unwrap();
        assert!(saved.contains("\"game_version\": \"1.19.2\""));
    }

    #[tokio::test]
    async fn test_create_instance_rejects_path_names() {
        let (dir, manager) = manager(MockModRegistry::new(), MockDownloader::new());

        for name in ["../outside", "/abs", "a/b", "..", ""] {
            let err = manager.create_instance(name, "1.19.2").unwrap_err();
            assert!(matches!(
                err.downcast_ref::<crate::error::InventoryError>(),
                Some(crate::error::InventoryError::InvalidName { .. })
            ));
        }
        assert!(manager.instances().is_empty());
        assert!(!dir.path().join("outside").exists());
    }

    #[tokio::test]
    async fn test_list_unknown_instance() {
        let (_dir, manager) = manager(MockModRegistry::new(), MockDownloader::new());
        let err = manager.list_installed_mods("Nope").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::error::InventoryError>(),
            Some(crate::error::InventoryError::InstanceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_compatibility() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("compat")).unwrap();
        std::fs::write(
            dir.path().join("compat/modrinth.json"),
            r#"{"sodium": "Perfect"}"#,
        )
        .unwrap();

        let manager = manager_in(
            RealRuntime,
            dir.path(),
            MockModRegistry::new(),
            MockDownloader::new(),
        );
        assert_eq!(manager.compatibility("modrinth", "sodium"), "Perfect");
        assert_eq!(manager.compatibility("modrinth", "unknown"), "Untested");
        assert_eq!(manager.compatibility("other-platform", "sodium"), "Untested");
    }

    #[tokio::test]
    async fn test_open_rejects_corrupt_inventory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("mods.json"), "{{{").unwrap();

        let result = ModManager::open(
            Arc::new(RealRuntime),
            WorkDir::new(dir.path()),
            Settings::default(),
            Arc::new(MockModRegistry::new()),
            Arc::new(MockDownloader::new()),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_list_picks_up_instances_written_elsewhere() {
        let (dir, manager) = manager(MockModRegistry::new(), MockDownloader::new());

        // Another process saved an inventory after we opened ours
        let other = manager_in(
            RealRuntime,
            dir.path(),
            MockModRegistry::new(),
            MockDownloader::new(),
        );
        other.create_instance("Shared", "1.20.1").unwrap();
        install_directly(&other, "Shared", entry("sodium", "r1"), "sodium-r1.jar");
        other.flush().await.unwrap();

        let mods = manager.list_installed_mods("Shared").unwrap();
        assert_eq!(mods.len(), 1);
        assert_eq!(mods[0].slug, "sodium");
    }
}
