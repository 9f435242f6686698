use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use log::{debug, warn};
use tokio::task::JoinHandle;

use super::OperationGate;
use crate::inventory::InventoryStore;
use crate::runtime::Runtime;

/// Coalescing "save when idle" trigger.
///
/// At most one deferred save exists at a time. It waits for the gate to be
/// idle, clears the pending flag and writes the inventory once; changes made
/// before that point are part of the write, later changes need a new request.
pub struct SaveScheduler<R: Runtime> {
    store: Arc<InventoryStore<R>>,
    gate: Arc<OperationGate>,
    pending: AtomicBool,
}

impl<R: Runtime + 'static> SaveScheduler<R> {
    pub fn new(store: Arc<InventoryStore<R>>, gate: Arc<OperationGate>) -> Arc<Self> {
        Arc::new(Self {
            store,
            gate,
            pending: AtomicBool::new(false),
        })
    }

    /// Schedule a save unless one is already pending.
    ///
    /// Returns the handle of the newly spawned save task, or `None` when the
    /// request was folded into the pending one.
    pub fn request_save(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Save already pending");
            return None;
        }

        let this = Arc::clone(self);
        Some(tokio::spawn(async move {
            let _lock = this.gate.idle_lock().await;
            this.pending.store(false, Ordering::Release);
            if let Err(e) = this.store.persist() {
                warn!("Failed to save inventory: {:#}", e);
            }
        }))
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Wait for the gate to be idle and write immediately.
    pub async fn save_now(&self) -> Result<()> {
        let _lock = self.gate.idle_lock().await;
        self.store.persist()
    }
}
