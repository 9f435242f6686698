use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Identifies one mod inside one instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModKey {
    pub instance: String,
    pub slug: String,
}

impl ModKey {
    pub fn new(instance: &str, slug: &str) -> Self {
        Self {
            instance: instance.to_string(),
            slug: slug.to_string(),
        }
    }
}

impl fmt::Display for ModKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.instance, self.slug)
    }
}

/// One async mutex per [`ModKey`], created on first use.
///
/// Mutating operations on the same mod in the same instance run one at a
/// time; operations on different keys do not contend.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<ModKey, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: &ModKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop entries nobody holds or waits on
            locks.retain(|k, l| k == key || Arc::strong_count(l) > 1);
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
