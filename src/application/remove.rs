use std::sync::Arc;

use anyhow::{Context, Result};

use super::{ModManager, OperationHandle, OperationKind, Outcome, Shared};
use crate::error::InventoryError;
use crate::layout::find_artifact;
use crate::ops::ModKey;
use crate::runtime::Runtime;

impl<R: Runtime + 'static> ModManager<R> {
    /// Delete the artifact of `slug` and drop it from `instance`.
    ///
    /// The entry is only forgotten once the file is gone; a failed delete
    /// leaves both the inventory and the directory untouched.
    pub fn remove_mod(&self, instance: &str, slug: &str) -> OperationHandle {
        self.shared.spawn_remove(instance, slug)
    }
}

impl<R: Runtime + 'static> Shared<R> {
    pub(super) fn spawn_remove(self: &Arc<Self>, instance: &str, slug: &str) -> OperationHandle {
        let shared = Arc::clone(self);
        let instance = instance.to_string();
        let slug = slug.to_string();

        tokio::spawn(async move {
            let outcome = Outcome::from_result(shared.remove(&instance, &slug).await);
            shared.finish(OperationKind::Remove, &instance, &slug, outcome)
        })
    }

    #[tracing::instrument(skip(self))]
    pub(super) async fn remove(&self, instance: &str, slug: &str) -> Result<Outcome> {
        let _key = self.locks.acquire(&ModKey::new(instance, slug)).await;

        let entry = self.installed_mod(instance, slug)?;

        let dir = self.instance_dir(instance)?;
        let artifact = find_artifact(
            self.runtime.as_ref(),
            &dir,
            &entry.file.filename,
            entry.active,
        )?
        .ok_or_else(|| InventoryError::ArtifactMissing {
            instance: instance.to_string(),
            filename: entry.file.filename.clone(),
        })?;
        self.runtime
            .remove_file(&artifact)
            .with_context(|| format!("Failed to delete {:?}", artifact))?;

        self.store.update_instance(instance, |i| i.remove_mod(slug));
        self.saver.request_save();
        Ok(Outcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::super::SkipReason;
    use super::super::test_support::*;
    use super::*;
    use crate::download::MockDownloader;
    use crate::registry::MockModRegistry;
    use crate::runtime::{MockRuntime, RealRuntime};
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_remove_mod_deletes_file_and_entry() {
        let (dir, manager) = manager(MockModRegistry::new(), MockDownloader::new());
        manager.create_instance("Vanilla117", "1.19.2").unwrap();
        install_directly(&manager, "Vanilla117", entry("sodium", "r1"), "sodium-r1.jar");
        install_directly(&manager, "Vanilla117", entry("lithium", "r1"), "lithium-r1.jar");

        let event = manager.remove_mod("Vanilla117", "sodium").await.unwrap();
        assert!(event.is_completed());

        let mods = manager.list_installed_mods("Vanilla117").unwrap();
        assert_eq!(mods.len(), 1);
        assert_eq!(mods[0].slug, "lithium");
        assert!(!dir.path().join("instances/Vanilla117/sodium-r1.jar").exists());
        assert!(dir.path().join("instances/Vanilla117/lithium-r1.jar").exists());
    }

    #[tokio::test]
    async fn test_remove_disabled_mod() {
        let (dir, manager) = manager(MockModRegistry::new(), MockDownloader::new());
        manager.create_instance("Vanilla117", "1.19.2").unwrap();
        let mut disabled = entry("sodium", "r1");
        disabled.active = false;
        install_directly(&manager, "Vanilla117", disabled, "sodium-r1.jar.disabled");

        let event = manager.remove_mod("Vanilla117", "sodium").await.unwrap();
        assert!(event.is_completed());
        assert!(manager.list_installed_mods("Vanilla117").unwrap().is_empty());
        assert!(
            !dir.path()
                .join("instances/Vanilla117/sodium-r1.jar.disabled")
                .exists()
        );
    }

    #[tokio::test]
    async fn test_remove_unknown_mod_and_instance() {
        let (_dir, manager) = manager(MockModRegistry::new(), MockDownloader::new());
        manager.create_instance("Vanilla117", "1.19.2").unwrap();

        let event = manager.remove_mod("Vanilla117", "sodium").await.unwrap();
        assert_eq!(event.outcome, Outcome::Skipped(SkipReason::ModNotFound));

        let event = manager.remove_mod("Nope", "sodium").await.unwrap();
        assert_eq!(event.outcome, Outcome::Skipped(SkipReason::InstanceNotFound));
    }

    #[tokio::test]
    async fn test_remove_with_missing_artifact_keeps_entry() {
        let (dir, manager) = manager(MockModRegistry::new(), MockDownloader::new());
        manager.create_instance("Vanilla117", "1.19.2").unwrap();
        install_directly(&manager, "Vanilla117", entry("sodium", "r1"), "sodium-r1.jar");
        std::fs::remove_file(dir.path().join("instances/Vanilla117/sodium-r1.jar")).unwrap();

        let event = manager.remove_mod("Vanilla117", "sodium").await.unwrap();
        assert!(matches!(event.outcome, Outcome::Failed(ref m) if m.contains("sodium-r1.jar")));
        assert_eq!(manager.list_installed_mods("Vanilla117").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delete_changes_nothing() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let instance_dir = root.join("instances/Vanilla117");
        let artifact = instance_dir.join("sodium-r1.jar");

        // Real file system, except that deletes are refused
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|p| RealRuntime.exists(p));
        runtime
            .expect_read_to_string()
            .returning(|p| RealRuntime.read_to_string(p));
        runtime.expect_write().returning(|p, c| RealRuntime.write(p, c));
        runtime.expect_rename().returning(|a, b| RealRuntime.rename(a, b));
        runtime.expect_read_dir().returning(|p| RealRuntime.read_dir(p));
        runtime
            .expect_create_dir_all()
            .returning(|p| RealRuntime.create_dir_all(p));
        runtime
            .expect_remove_file()
            .returning(|_: &Path| Err(anyhow::anyhow!("permission denied")));

        let manager = manager_in(runtime, &root, MockModRegistry::new(), MockDownloader::new());
        manager.create_instance("Vanilla117", "1.19.2").unwrap();
        install_directly(&manager, "Vanilla117", entry("sodium", "r1"), "sodium-r1.jar");

        let event = manager.remove_mod("Vanilla117", "sodium").await.unwrap();
        assert!(matches!(event.outcome, Outcome::Failed(ref m) if m.contains("permission denied")));
        assert_eq!(manager.list_installed_mods("Vanilla117").unwrap().len(), 1);
        assert!(artifact.exists());
        assert_eq!(
            std::fs::read_dir(&instance_dir)
                .unwrap()
                .map(|e| e.unwrap().path())
                .collect::<Vec<PathBuf>>(),
            vec![artifact]
        );
    }
}
