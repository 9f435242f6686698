//! Installed-mod inventory: data model, JSON-backed store and the
//! compatibility table.

mod compat;
mod model;
mod store;

pub use compat::{CompatibilityTable, UNTESTED};
pub use model::{Instance, InventoryState, ModEntry, PackageFile};
pub use store::InventoryStore;
