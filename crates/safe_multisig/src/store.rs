use std::{collections::HashMap, hash::Hash};

use parking_lot::RwLock;

/// Process-lifetime keyed store shared by the caches of this crate.
///
/// Readers take a shared lock, every mutation goes through the write lock so concurrent
/// flows never interleave a read-modify-write.
#[derive(Debug)]
pub struct KeyedStore<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for KeyedStore<K, V> {
    fn default() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }
}

impl<K, V> KeyedStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.read().get(key).cloned()
    }

    pub fn set(&self, key: K, value: V) -> Option<V> {
        self.entries.write().insert(key, value)
    }

    pub fn invalidate(&self, key: &K) -> Option<V> {
        self.entries.write().remove(key)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the stored value or stores the one produced by `init`.
    ///
    /// `init` runs under the write lock, at most once per missing key.
    pub fn get_or_try_insert_with<E, F>(&self, key: K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let mut entries = self.entries.write();
        if let Some(value) = entries.get(&key) {
            return Ok(value.clone());
        }
        let value = init()?;
        entries.insert(key, value.clone());
        Ok(value)
    }

    /// Applies `update` to the entry under the write lock and stores the result.
    ///
    /// `update` sees the current value (if any). Returning `None` leaves the entry untouched.
    pub fn update<F>(&self, key: K, update: F) -> Option<V>
    where
        F: FnOnce(Option<&V>) -> Option<V>,
    {
        let mut entries = self.entries.write();
        let next = update(entries.get(&key))?;
        entries.insert(key, next.clone());
        Some(next)
    }
}
