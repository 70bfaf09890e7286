use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::OnceCell;

// ---------------------------------------------------------------------------
// KeyedCache – at-most-once construction per key
// ---------------------------------------------------------------------------

/// A read-mostly cache that builds each value at most once.
///
/// The map lock is only held long enough to fetch (or insert) the per-key
/// [`OnceCell`]; construction then runs under that cell's own lock, so two
/// threads racing on the same key build one value while different keys build
/// in parallel. Entries are never evicted or replaced.
///
/// A failed construction stores nothing: the empty slot is dropped (unless
/// another thread is already waiting on it) and the next request retries.
pub struct KeyedCache<K, V> {
    slots: Mutex<HashMap<K, Arc<OnceCell<Arc<V>>>>>,
}

impl<K: Eq + Hash + Clone, V> KeyedCache<K, V> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, building it with `init` on first use.
    pub fn get_or_try_init<E, F>(&self, key: &K, init: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let slot = {
            // A panic inside `init` never happens while this guard is held,
            // so a poisoned map is still consistent.
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.clone()).or_default())
        };
        let built = slot.get_or_try_init(|| init().map(Arc::new)).cloned();
        if built.is_err() {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            // Clones are only handed out under the map lock, so a count of two
            // (map + this call) means nobody else is waiting on the slot.
            let unused = slots
                .get(key)
                .is_some_and(|cell| Arc::ptr_eq(cell, &slot) && Arc::strong_count(&slot) == 2);
            if unused && slot.get().is_none() {
                slots.remove(key);
            }
        }
        built
    }

    /// Number of keys whose value has been built.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|cell| cell.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, V> Default for KeyedCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
