//! Update checks and remove-then-re-add updates.

use std::sync::Arc;

use anyhow::Result;
use futures_util::future::join_all;
use log::{debug, warn};
use tokio::task::JoinHandle;

use super::{ModEvent, ModManager, OperationKind, Outcome, Shared};
use crate::inventory::ModEntry;
use crate::runtime::Runtime;

impl<R: Runtime + 'static> ModManager<R> {
    /// Entries of `instance` whose registry revision differs from the installed one.
    ///
    /// Deny-listed slugs are never reported. A failed lookup only drops that
    /// entry from the result.
    #[tracing::instrument(skip(self))]
    pub async fn check_for_updates(&self, instance: &str) -> Result<Vec<ModEntry>> {
        let current = self.shared.store.require_instance(instance)?;
        let shared = &self.shared;
        let game_version = current.game_version.as_str();

        let checks = current
            .mods
            .iter()
            .filter(|m| !shared.settings.is_update_denied(&m.slug))
            .map(|m| async move {
                match shared.lookup(m.platform, &m.slug, game_version).await {
                    Ok(Some(remote)) if remote.revision_id != m.file.id => {
                        debug!("{} {} -> {}", m.slug, m.file.id, remote.revision_id);
                        Some(m.clone())
                    }
                    Ok(_) => None,
                    Err(e) => {
                        warn!("Update check for {} failed: {:#}", m.slug, e);
                        None
                    }
                }
            });

        Ok(join_all(checks).await.into_iter().flatten().collect())
    }

    /// Update `slugs` in `instance`, one after another.
    ///
    /// Each mod is removed and then installed again as its own add, resolved
    /// against the pinned game version of the instance. An update is not
    /// atomic: a failed re-add leaves the mod uninstalled.
    pub fn update_mods(&self, instance: &str, slugs: Vec<String>) -> JoinHandle<Vec<ModEvent>> {
        let shared = Arc::clone(&self.shared);
        let instance = instance.to_string();

        tokio::spawn(async move {
            let mut events = Vec::new();
            for slug in slugs {
                events.extend(shared.update(&instance, &slug).await);
            }
            events
        })
    }
}

impl<R: Runtime + 'static> Shared<R> {
    async fn update(self: &Arc<Self>, instance: &str, slug: &str) -> Vec<ModEvent> {
        let target = self.installed_mod(instance, slug).and_then(|entry| {
            let current = self.store.require_instance(instance)?;
            let version = self.settings.pinned_version(&current.game_version).to_string();
            Ok((entry.platform, version))
        });

        let outcome = Outcome::from_result(self.remove(instance, slug).await);
        let removed = self.finish(OperationKind::Remove, instance, slug, outcome);
        let Ok((platform, version)) = target else {
            return vec![removed];
        };
        if !removed.is_completed() {
            return vec![removed];
        }

        let added = match self
            .spawn_add(instance, &platform.to_string(), slug, &version)
            .await
        {
            Ok(event) => event,
            Err(e) => ModEvent {
                kind: OperationKind::Add,
                instance: instance.to_string(),
                slug: slug.to_string(),
                outcome: Outcome::Failed(e.to_string()),
            },
        };
        vec![removed, added]
    }
}
