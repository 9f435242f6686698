//! Coordination primitives for background operations.
//!
//! - `gate` - in-flight install registry; persistence waits for it to drain
//! - `save` - single-flight debounced save task
//! - `keyed` - per-(instance, slug) async locks

mod gate;
mod keyed;
mod save;

pub use gate::{OperationGate, OperationGuard};
pub use keyed::{KeyedLocks, ModKey};
pub use save::SaveScheduler;
