//! Add operation: resolve, append, download.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, warn};

use super::{ModManager, OperationHandle, OperationKind, Outcome, Shared, SkipReason};
use crate::error::InventoryError;
use crate::inventory::ModEntry;
use crate::layout::is_plain_name;
use crate::ops::ModKey;
use crate::registry::Platform;
use crate::runtime::Runtime;

impl<R: Runtime + 'static> ModManager<R> {
    /// Install `slug` from `platform` into `instance`, resolved against `game_version`.
    pub fn add_mod(
        &self,
        instance: &str,
        platform: &str,
        slug: &str,
        game_version: &str,
    ) -> OperationHandle {
        self.shared.spawn_add(instance, platform, slug, game_version)
    }
}

impl<R: Runtime + 'static> Shared<R> {
    pub(super) fn spawn_add(
        self: &Arc<Self>,
        instance: &str,
        platform: &str,
        slug: &str,
        game_version: &str,
    ) -> OperationHandle {
        let shared = Arc::clone(self);
        let instance = instance.to_string();
        let platform = platform.to_string();
        let slug = slug.to_string();
        let game_version = game_version.to_string();

        tokio::spawn(async move {
            let result = shared.add(&instance, &platform, &slug, &game_version).await;
            let outcome = Outcome::from_result(result);
            if outcome == Outcome::Completed {
                shared.saver.request_save();
            }
            shared.finish(OperationKind::Add, &instance, &slug, outcome)
        })
    }

    #[tracing::instrument(skip(self))]
    async fn add(&self, instance: &str, platform: &str, slug: &str, game_version: &str) -> Result<Outcome> {
        let _in_flight = self.gate.begin(slug).await;
        let _key = self.locks.acquire(&ModKey::new(instance, slug)).await;

        self.store.require_instance(instance)?;

        let dir = self.instance_dir(instance)?;
        if !self.runtime.exists(&dir) {
            self.runtime
                .create_dir_all(&dir)
                .with_context(|| format!("Failed to create instance directory {:?}", dir))?;
        }

        let Ok(platform) = platform.parse::<Platform>() else {
            warn!("Unknown platform {} for {}", platform, slug);
            return Ok(Outcome::Skipped(SkipReason::NotInRegistry));
        };
        let Some(data) = self.lookup(platform, slug, game_version).await? else {
            return Ok(Outcome::Skipped(SkipReason::NotInRegistry));
        };

        if !is_plain_name(&data.filename) {
            return Err(InventoryError::InvalidName {
                kind: "artifact",
                name: data.filename,
            })
            .with_context(|| format!("Refusing release of {} from the registry", slug));
        }

        let entry = ModEntry::from(data);
        let appended = self
            .store
            .update_instance(instance, |i| i.add_mod(entry.clone()))
            .unwrap_or(false);
        if !appended {
            debug!("{} is already installed in {}", slug, instance);
            return Ok(Outcome::Skipped(SkipReason::AlreadyInstalled));
        }

        let dest = dir.join(&entry.file.filename);
        if let Err(e) = self.downloader.download(&entry.file.url, &dest).await {
            self.store.update_instance(instance, |i| i.remove_mod(slug));
            return Err(e);
        }

        Ok(Outcome::Completed)
    }
}
