//! Identity-preserving cache of live entity snapshots.
//!
//! # Responsibility
//! - Map an identifier to at most one shared snapshot.
//! - Construct snapshots lazily through a caller-supplied loader.
//!
//! # Invariants
//! - `get_or_try_insert_with` runs the loader at most once per absent key and
//!   never for a present key; a failed load leaves the cache unchanged.
//! - After `evict`, the next lookup constructs a fresh snapshot.
//! - Not thread-safe: one owner thread per cache.

use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

/// Shared handle to one live snapshot.
pub type EntityHandle<E> = Rc<RefCell<E>>;

#[derive(Debug)]
pub struct EntityCache<I, E> {
    entries: HashMap<I, EntityHandle<E>>,
}

impl<I: Copy + Eq + Hash, E> EntityCache<I, E> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the live snapshot for `id`, constructing it when absent.
    pub fn get_or_try_insert_with<F, Err>(&mut self, id: I, load: F) -> Result<EntityHandle<E>, Err>
    where
        F: FnOnce() -> Result<E, Err>,
    {
        match self.entries.entry(id) {
            Entry::Occupied(entry) => Ok(Rc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let handle = Rc::new(RefCell::new(load()?));
                Ok(Rc::clone(entry.insert(handle)))
            }
        }
    }

    pub fn get(&self, id: I) -> Option<EntityHandle<E>> {
        self.entries.get(&id).map(Rc::clone)
    }

    pub fn contains(&self, id: I) -> bool {
        self.entries.contains_key(&id)
    }

    /// Drops the cached snapshot. Outstanding handles become stale.
    pub fn evict(&mut self, id: I) -> Option<EntityHandle<E>> {
        self.entries.remove(&id)
    }

    /// Snapshot handles currently cached, in no particular order.
    pub fn handles(&self) -> Vec<EntityHandle<E>> {
        self.entries.values().map(Rc::clone).collect()
    }
}

impl<I: Copy + Eq + Hash, E> Default for EntityCache<I, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::EntityCache;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn loader_runs_once_and_identity_is_preserved() {
        let mut cache: EntityCache<i64, String> = EntityCache::new();
        let calls = Cell::new(0);

        let first = cache
            .get_or_try_insert_with(1, || -> Result<String, ()> {
                calls.set(calls.get() + 1);
                Ok("one".to_string())
            })
            .unwrap();
        let second = cache
            .get_or_try_insert_with(1, || -> Result<String, ()> {
                calls.set(calls.get() + 1);
                Ok("other".to_string())
            })
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(*second.borrow(), "one");
    }

    #[test]
    fn failed_load_leaves_cache_empty() {
        let mut cache: EntityCache<i64, String> = EntityCache::new();
        let err = cache
            .get_or_try_insert_with(5, || Err::<String, _>("missing"))
            .unwrap_err();
        assert_eq!(err, "missing");
        assert!(!cache.contains(5));
    }

    #[test]
    fn evict_forces_reconstruction() {
        let mut cache: EntityCache<i64, u32> = EntityCache::new();
        let first = cache
            .get_or_try_insert_with(2, || Ok::<_, ()>(1))
            .unwrap();
        assert!(cache.evict(2).is_some());
        assert!(!cache.contains(2));

        let second = cache
            .get_or_try_insert_with(2, || Ok::<_, ()>(2))
            .unwrap();
        assert!(!Rc::ptr_eq(&first, &second));
        assert_eq!(*second.borrow(), 2);
    }
}
