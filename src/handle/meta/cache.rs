//! Optional descriptor cache keyed by handler type.
//!
//! Descriptors are instance-independent, so repeated registrations of the
//! same handler type can skip re-discovery. Unlike the registries, the cache
//! is required to be safe for concurrent read/write.

use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;

use crate::handle::descriptor::HandleDescriptor;

/// Concurrent-safe cache of discovered descriptor collections.
pub trait MetaCache: Send + Sync {
    /// Whether an entry exists for the handler type.
    fn contains(&self, type_id: &TypeId) -> bool;

    /// The cached descriptors for the handler type, if present.
    fn get(&self, type_id: &TypeId) -> Option<Vec<Arc<HandleDescriptor>>>;

    /// Stores the descriptors for the handler type, replacing any entry.
    fn put(&self, type_id: TypeId, descriptors: Vec<Arc<HandleDescriptor>>);

    /// Discards every entry.
    fn clear(&self);
}

/// Default [`MetaCache`] backed by a concurrent map.
#[derive(Default)]
pub struct ConcurrentMetaCache {
    entries: DashMap<TypeId, Vec<Arc<HandleDescriptor>>>,
}

impl ConcurrentMetaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetaCache for ConcurrentMetaCache {
    fn contains(&self, type_id: &TypeId) -> bool {
        self.entries.contains_key(type_id)
    }

    fn get(&self, type_id: &TypeId) -> Option<Vec<Arc<HandleDescriptor>>> {
        self.entries.get(type_id).map(|entry| entry.clone())
    }

    fn put(&self, type_id: TypeId, descriptors: Vec<Arc<HandleDescriptor>>) {
        self.entries.insert(type_id, descriptors);
    }

    fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Cashier;
    struct Sale(u32);

    fn sale_descriptors() -> Vec<Arc<HandleDescriptor>> {
        vec![Arc::new(HandleDescriptor::of(|_: &Cashier, s: &Sale| s.0))]
    }

    #[test]
    fn put_get_round_trip_shares_descriptors() {
        let cache = ConcurrentMetaCache::new();
        let type_id = TypeId::of::<Cashier>();
        assert!(!cache.contains(&type_id));

        let descriptors = sale_descriptors();
        cache.put(type_id, descriptors.clone());

        assert!(cache.contains(&type_id));
        let cached = cache.get(&type_id).unwrap();
        assert_eq!(cached.len(), 1);
        assert!(Arc::ptr_eq(&cached[0], &descriptors[0]));
    }

    #[test]
    fn clear_discards_everything() {
        let cache = ConcurrentMetaCache::new();
        cache.put(TypeId::of::<Cashier>(), sale_descriptors());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&TypeId::of::<Cashier>()).is_none());
    }

    #[test]
    fn concurrent_readers_and_writers_do_not_contend() {
        let cache = Arc::new(ConcurrentMetaCache::new());
        let mut workers = Vec::new();
        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            workers.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    cache.put(TypeId::of::<Cashier>(), sale_descriptors());
                    let _ = cache.get(&TypeId::of::<Cashier>());
                }
            }));
        }
        for worker in workers {
            worker.join().unwrap();
        }
        assert!(cache.contains(&TypeId::of::<Cashier>()));
    }
}
