//! Storage implementations for limiter state.
//!
//! Provides concurrent, sharded storage for per-key window entries.

use crate::application::ports::Storage;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Thread-safe sharded storage backed by DashMap with ahash.
///
/// DashMap provides lock-free reads and fine-grained locking for writes, so
/// checks for distinct keys proceed in parallel. Entry access holds a shard
/// lock only for the duration of the accessor closure.
pub struct ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    map: DashMap<K, V, ahash::RandomState>,
}

impl<K, V> ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a new sharded storage instance.
    pub fn new() -> Self {
        Self {
            map: DashMap::with_hasher(ahash::RandomState::new()),
        }
    }
}

impl<K, V> Default for ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedStorage")
            .field("entries", &self.map.len())
            .finish()
    }
}

impl<K, V> Storage<K, V> for ShardedStorage<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send + Sync,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        let mut entry = self.map.entry(key).or_insert_with(factory);
        accessor(entry.value_mut())
    }

    fn read(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    fn remove(&self, key: &K) {
        self.map.remove(key);
    }

    fn clear(&self) {
        self.map.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

// Arc delegation lets the governor clone cheaply while sharing one table.
impl<K, V> Storage<K, V> for Arc<ShardedStorage<K, V>>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send + Sync,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        self.as_ref().with_entry_mut(key, factory, accessor)
    }

    fn read(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.as_ref().read(key)
    }

    fn remove(&self, key: &K) {
        self.as_ref().remove(key);
    }

    fn clear(&self) {
        self.as_ref().clear();
    }

    fn len(&self) -> usize {
        self.as_ref().len()
    }

    fn is_empty(&self) -> bool {
        self.as_ref().is_empty()
    }
}
