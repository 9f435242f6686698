//! JSON-backed inventory store.
//!
//! The whole [`InventoryState`] lives in memory behind a mutex and is written
//! to a single document. Writes replace the document through a temporary
//! sibling and a rename, so a reader never observes a half-written file.

use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Instance, InventoryState};
use crate::error::InventoryError;
use crate::runtime::Runtime;

pub struct InventoryStore<R: Runtime> {
    runtime: Arc<R>,
    path: PathBuf,
    state: Mutex<InventoryState>,
}

impl<R: Runtime> InventoryStore<R> {
    /// Open the store, loading the document at `path` if it exists.
    pub fn open(runtime: Arc<R>, path: PathBuf) -> Result<Self> {
        let state = Self::load(runtime.as_ref(), &path)?;
        debug!(
            "Loaded {} instance(s) from {:?}",
            state.instances.len(),
            path
        );
        Ok(Self {
            runtime,
            path,
            state: Mutex::new(state),
        })
    }

    /// Read the document at `path`.
    ///
    /// A missing document is an empty inventory; a document that cannot be
    /// parsed fails with [`InventoryError::Decode`].
    #[tracing::instrument(skip(runtime))]
    pub fn load(runtime: &R, path: &Path) -> Result<InventoryState> {
        if !runtime.exists(path) {
            return Ok(InventoryState::default());
        }

        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read inventory from {:?}", path))?;

        serde_json::from_str(&content).map_err(|source| {
            InventoryError::Decode {
                path: path.to_path_buf(),
                source,
            }
            .into()
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, InventoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up an instance by name.
    ///
    /// When the in-memory root does not know the name, the document is read
    /// again and any instance missing from memory is imported before giving
    /// up. Instances already in memory are never replaced by the reload.
    pub fn instance(&self, name: &str) -> Result<Option<Instance>> {
        if let Some(instance) = self.lock().get_instance(name) {
            return Ok(Some(instance.clone()));
        }

        debug!("Instance {} not in memory, reloading {:?}", name, self.path);
        let on_disk = Self::load(self.runtime.as_ref(), &self.path)?;

        let mut state = self.lock();
        let imported = state.merge_missing(on_disk);
        if imported > 0 {
            info!("Imported {} instance(s) from {:?}", imported, self.path);
        }
        Ok(state.get_instance(name).cloned())
    }

    /// Like [`Self::instance`], but a missing instance is an error.
    pub fn require_instance(&self, name: &str) -> Result<Instance> {
        self.instance(name)?
            .ok_or_else(|| InventoryError::InstanceNotFound(name.to_string()).into())
    }

    pub fn instance_names(&self) -> Vec<String> {
        self.lock().instances.keys().cloned().collect()
    }

    /// Register a new, empty instance. Returns `false` if the name is taken.
    pub fn create_instance(&self, name: &str, game_version: &str) -> bool {
        self.lock().add_instance(Instance::new(name, game_version))
    }

    /// Run `f` against the named instance while holding the state lock.
    pub fn update_instance<T>(&self, name: &str, f: impl FnOnce(&mut Instance) -> T) -> Option<T> {
        self.lock().get_instance_mut(name).map(f)
    }

    /// Clone of the whole in-memory root.
    pub fn snapshot(&self) -> InventoryState {
        self.lock().clone()
    }

    /// Write the in-memory root to disk.
    ///
    /// Must only be called by the holder of the save gate's lock; see
    /// [`crate::ops::OperationGate::idle_lock`].
    #[tracing::instrument(skip(self))]
    pub(crate) fn persist(&self) -> Result<()> {
        let content = {
            let state = self.lock();
            serde_json::to_string_pretty(&*state).context("Failed to serialize inventory")?
        };

        if let Some(parent) = self.path.parent()
            && !self.runtime.exists(parent)
        {
            self.runtime.create_dir_all(parent)?;
        }

        let tmp_path = tmp_path_for(&self.path);
        self.runtime
            .write(&tmp_path, content.as_bytes())
            .with_context(|| format!("Failed to write inventory to {:?}", tmp_path))?;
        self.runtime
            .rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace inventory at {:?}", self.path))?;

        debug!("Saved inventory to {:?}", self.path);
        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::Sequence;
    use mockall::predicate::eq;
    use tempfile::tempdir;

    const DOC: &str = r#"{
        "instances": {
            "Vanilla117": {
                "name": "Vanilla117",
                "game_version": "1.19.2",
                "mods": [
                    {
                        "slug": "sodium",
                        "platform": "modrinth",
                        "active": true,
                        "file": {"id": "rev1", "filename": "sodium.jar", "url": "https://cdn/sodium.jar"}
                    }
                ]
            }
        }
    }"#;

    #[test]
    fn test_tmp_path_for() {
        assert_eq!(
            tmp_path_for(Path::new("/work/mods.json")),
            PathBuf::from("/work/mods.json.tmp")
        );
    }

    #[test]
    fn test_load_missing_document_is_empty() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/work/mods.json")))
            .returning(|_| false);

        let state = InventoryStore::load(&runtime, Path::new("/work/mods.json")).unwrap();
        assert!(state.instances.is_empty());
    }

    #[test]
    fn test_load_corrupt_document_fails_with_decode() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("{ not json".into()));

        let err = InventoryStore::load(&runtime, Path::new("/work/mods.json")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InventoryError>(),
            Some(InventoryError::Decode { .. })
        ));
    }

    #[test]
    fn test_load_document() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_read_to_string()
            .with(eq(PathBuf::from("/work/mods.json")))
            .returning(|_| Ok(DOC.into()));

        let state = InventoryStore::load(&runtime, Path::new("/work/mods.json")).unwrap();
        let instance = state.get_instance("Vanilla117").unwrap();
        assert_eq!(instance.game_version, "1.19.2");
        assert_eq!(instance.mods[0].file.filename, "sodium.jar");
    }

    #[test]
    fn test_persist_writes_tmp_then_renames() {
        let mut runtime = MockRuntime::new();
        let mut seq = Sequence::new();
        runtime.expect_exists().returning(|_| false).times(1);
        runtime
            .expect_create_dir_all()
            .with(eq(PathBuf::from("/work")))
            .returning(|_| Ok(()));
        runtime
            .expect_write()
            .withf(|path, contents| {
                path == Path::new("/work/mods.json.tmp")
                    && std::str::from_utf8(contents).unwrap().contains("Fabric")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        runtime
            .expect_rename()
            .with(
                eq(PathBuf::from("/work/mods.json.tmp")),
                eq(PathBuf::from("/work/mods.json")),
            )
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let store = InventoryStore {
            runtime: Arc::new(runtime),
            path: PathBuf::from("/work/mods.json"),
            state: Mutex::new(InventoryState::default()),
        };
        assert!(store.create_instance("Fabric", "1.20.1"));
        store.persist().unwrap();
    }

    #[test]
    fn test_persist_failed_write_leaves_document() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_write()
            .returning(|_, _| Err(anyhow::anyhow!("disk full")));
        runtime.expect_rename().never();

        let store = InventoryStore {
            runtime: Arc::new(runtime),
            path: PathBuf::from("/work/mods.json"),
            state: Mutex::new(InventoryState::default()),
        };
        assert!(store.persist().is_err());
    }

    #[test]
    fn test_persist_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mods.json");
        let runtime = Arc::new(RealRuntime);

        let store = InventoryStore::open(runtime.clone(), path.clone()).unwrap();
        store.create_instance("Vanilla117", "1.19.2");
        store.create_instance("Fabric", "1.20.1");
        store.persist().unwrap();
        assert!(!dir.path().join("mods.json.tmp").exists());

        let reopened = InventoryStore::open(runtime, path).unwrap();
        assert_eq!(reopened.snapshot(), store.snapshot());
        assert_eq!(reopened.instance_names(), vec!["Fabric", "Vanilla117"]);
    }

    #[test]
    fn test_instance_reloads_from_disk_when_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mods.json");
        let runtime = Arc::new(RealRuntime);

        let store = InventoryStore::open(runtime.clone(), path.clone()).unwrap();
        store.create_instance("InMemory", "1.20.1");

        // Another process wrote the document after we loaded it
        std::fs::write(&path, DOC).unwrap();

        let instance = store.instance("Vanilla117").unwrap().unwrap();
        assert_eq!(instance.mods.len(), 1);
        // Unsaved in-memory instance survives the reload
        assert!(store.instance("InMemory").unwrap().is_some());
        assert!(store.instance("Nowhere").unwrap().is_none());
    }

    #[test]
    fn test_instance_reload_surfaces_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mods.json");
        let store = InventoryStore::open(Arc::new(RealRuntime), path.clone()).unwrap();

        std::fs::write(&path, "garbage").unwrap();

        let err = store.instance("Vanilla117").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InventoryError>(),
            Some(InventoryError::Decode { .. })
        ));
    }

    #[test]
    fn test_require_instance_not_found() {
        let dir = tempdir().unwrap();
        let store =
            InventoryStore::open(Arc::new(RealRuntime), dir.path().join("mods.json")).unwrap();

        let err = store.require_instance("Nope").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InventoryError>(),
            Some(InventoryError::InstanceNotFound(name)) if name == "Nope"
        ));
    }

    #[test]
    fn test_update_instance() {
        let dir = tempdir().unwrap();
        let store =
            InventoryStore::open(Arc::new(RealRuntime), dir.path().join("mods.json")).unwrap();
        store.create_instance("Vanilla117", "1.19.2");

        let renamed = store.update_instance("Vanilla117", |i| {
            i.game_version = "1.20.1".into();
            i.game_version.clone()
        });
        assert_eq!(renamed.as_deref(), Some("1.20.1"));
        assert!(store.update_instance("Missing", |_| ()).is_none());
        assert!(!store.create_instance("Vanilla117", "1.18"));
    }
}
