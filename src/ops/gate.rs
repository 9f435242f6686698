use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use tokio::sync::{Mutex, MutexGuard, watch};

/// Registry of slugs with an install in flight, and the lock every
/// inventory write goes through.
///
/// The same slug may be registered more than once (installs into two
/// instances); it stays in flight until every registration has ended.
pub struct OperationGate {
    in_flight: watch::Sender<HashMap<String, usize>>,
    save_lock: Mutex<()>,
}

impl Default for OperationGate {
    fn default() -> Self {
        Self {
            in_flight: watch::Sender::new(HashMap::new()),
            save_lock: Mutex::new(()),
        }
    }
}

impl OperationGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `slug` as in flight until the returned guard is dropped.
    ///
    /// Waits for a write holding the save lock to finish first, so a
    /// registration never lands in the middle of a save.
    pub async fn begin(self: &Arc<Self>, slug: &str) -> OperationGuard {
        let _save = self.save_lock.lock().await;
        self.in_flight.send_modify(|set| {
            *set.entry(slug.to_string()).or_default() += 1;
        });
        debug!("{} in flight", slug);
        OperationGuard {
            gate: Arc::clone(self),
            slug: slug.to_string(),
        }
    }

    /// Drop one registration of `slug`. Waiters are woken once the set is empty.
    pub fn end(&self, slug: &str) {
        self.in_flight.send_if_modified(|set| match set.get_mut(slug) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                set.remove(slug);
                set.is_empty()
            }
            None => false,
        });
        debug!("{} finished", slug);
    }

    pub fn is_in_flight(&self, slug: &str) -> bool {
        self.in_flight.borrow().contains_key(slug)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.borrow().values().sum()
    }

    /// Wait for the in-flight set to drain, then hold the save lock.
    ///
    /// The set is checked again under the lock; while the guard lives no new
    /// operation can register, so the set stays empty for the whole write.
    pub async fn idle_lock(&self) -> MutexGuard<'_, ()> {
        let mut rx = self.in_flight.subscribe();
        loop {
            // The sender lives in `self`, so this cannot fail.
            let _ = rx.wait_for(|set| set.is_empty()).await;

            let guard = self.save_lock.lock().await;
            if self.in_flight.borrow().is_empty() {
                return guard;
            }
        }
    }
}

/// Keeps a slug registered in an [`OperationGate`].
pub struct OperationGuard {
    gate: Arc<OperationGate>,
    slug: String,
}

impl OperationGuard {
    pub fn slug(&self) -> &str {
        &self.slug
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        self.gate.end(&self.slug);
    }
}
