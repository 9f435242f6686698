use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;

use super::{ModManager, OperationHandle, OperationKind, Outcome, Shared, SkipReason};
use crate::error::InventoryError;
use crate::layout::{artifact_name, find_artifact, is_plain_name};
use crate::ops::ModKey;
use crate::runtime::Runtime;

impl<R: Runtime + 'static> ModManager<R> {
    /// Enable or disable `slug` by renaming its artifact.
    ///
    /// Disabled artifacts carry the `.disabled` suffix. The recorded flag only
    /// changes after the rename succeeded.
    pub fn set_mod_active(&self, instance: &str, slug: &str, active: bool) -> OperationHandle {
        let shared = Arc::clone(&self.shared);
        let instance = instance.to_string();
        let slug = slug.to_string();

        tokio::spawn(async move {
            let outcome = Outcome::from_result(shared.toggle(&instance, &slug, active).await);
            shared.finish(OperationKind::Toggle, &instance, &slug, outcome)
        })
    }
}

impl<R: Runtime + 'static> Shared<R> {
    #[tracing::instrument(skip(self))]
    async fn toggle(&self, instance: &str, slug: &str, active: bool) -> Result<Outcome> {
        if !self.settings.toggle_supported(self.runtime.platform_level()) {
            return Ok(Outcome::Skipped(SkipReason::PlatformUnsupported));
        }

        let _key = self.locks.acquire(&ModKey::new(instance, slug)).await;

        let entry = self.installed_mod(instance, slug)?;
        if !is_plain_name(&entry.file.filename) {
            return Err(InventoryError::InvalidName {
                kind: "artifact",
                name: entry.file.filename,
            }
            .into());
        }

        let dir = self.instance_dir(instance)?;
        let from = find_artifact(
            self.runtime.as_ref(),
            &dir,
            &entry.file.filename,
            entry.active,
        )?
        .ok_or_else(|| InventoryError::ArtifactMissing {
            instance: instance.to_string(),
            filename: entry.file.filename.clone(),
        })?;
        let to = dir.join(artifact_name(&entry.file.filename, active));

        if from != to {
            self.runtime
                .rename(&from, &to)
                .with_context(|| format!("Failed to rename {:?} to {:?}", from, to))?;
        } else {
            debug!("{:?} already in place", to);
        }

        self.store.update_instance(instance, |i| {
            if let Some(m) = i.get_mod_mut(slug) {
                m.active = active;
            }
        });
        self.saver.request_save();
        Ok(Outcome::Completed)
    }
}
