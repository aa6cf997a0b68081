//! Keyed, ordered storage for one entity kind.

use indexmap::IndexMap;

use crate::error::{PbsError, Result};

use super::types::Entity;

/// All entities of one kind, in import order.
///
/// A set is replaced wholesale by [`DataSet::import`]; nothing else mutates
/// it. Sets that were never imported report `is_loaded() == false`.
#[derive(Debug, Clone)]
pub struct DataSet<T: Entity> {
    entries: IndexMap<T::Key, T>,
    loaded: bool,
}

impl<T: Entity> Default for DataSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> DataSet<T> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            loaded: false,
        }
    }

    /// Replace the whole set.
    pub fn import(&mut self, entities: impl IntoIterator<Item = T>) {
        self.entries = entities.into_iter().map(|e| (e.key(), e)).collect();
        self.loaded = true;
    }

    /// Drop every entity and mark the set as not loaded.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.loaded = false;
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.entries.get(key)
    }

    /// Get an entity, failing with a validation error when absent.
    pub fn try_get(&self, key: &T::Key) -> Result<&T> {
        self.entries
            .get(key)
            .ok_or_else(|| PbsError::validation(format!("Undefined {} '{}'.", T::KIND, key)))
    }

    pub fn exists(&self, key: &T::Key) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &T::Key> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    /// Entity at an import position.
    pub fn get_index(&self, index: usize) -> Option<&T> {
        self.entries.get_index(index).map(|(_, v)| v)
    }

    /// Import position of a key.
    pub fn index_of(&self, key: &T::Key) -> Option<usize> {
        self.entries.get_index_of(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}
