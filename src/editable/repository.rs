//! Editable working copy of one entity set.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{PbsError, Result};
use crate::registry::{DataSet, Entity};

use super::diff::DiffNode;
use super::editable_type::{Editable, EditableType};
use super::path::FieldEdit;

/// Entities of one kind, edited through diffs and written back on commit.
#[derive(Debug)]
pub struct EntityRepository<T: Entity> {
    entries: IndexMap<T::Key, T>,
    pending: bool,
}

impl<T: Entity + Editable> EntityRepository<T> {
    pub fn new(set: &DataSet<T>) -> Self {
        Self {
            entries: set.iter().map(|e| (e.key(), e.clone())).collect(),
            pending: false,
        }
    }

    pub fn editable_type(&self) -> &'static EditableType<T> {
        T::editable_type()
    }

    /// Discard local changes and reload from `set`.
    pub fn sync_from(&mut self, set: &DataSet<T>) {
        *self = Self::new(set);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_pending_changes(&self) -> bool {
        self.pending
    }

    pub fn entries(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn get(&self, key: &T::Key) -> Result<&T> {
        self.entries
            .get(key)
            .ok_or_else(|| PbsError::edit(format!("Cannot find entry with key {key}.")))
    }

    pub fn get_at(&self, index: usize) -> Result<&T> {
        self.entries
            .get_index(index)
            .map(|(_, v)| v)
            .ok_or_else(|| self.missing_index(index))
    }

    fn missing_index(&self, index: usize) -> PbsError {
        PbsError::edit(format!(
            "Cannot find index {index} in a collection of {} entries.",
            self.entries.len()
        ))
    }

    /// Apply an object diff to the entry under `key`.
    ///
    /// Returns the diff that actually took effect, or `None` when the entry
    /// is unchanged. A failing diff leaves the entry as it was.
    pub fn apply_edit(&mut self, key: &T::Key, diff: &DiffNode) -> Result<Option<DiffNode>> {
        let index = self
            .entries
            .get_index_of(key)
            .ok_or_else(|| PbsError::edit(format!("Cannot find key {key} in collection.")))?;
        self.apply_edit_at(index, diff)
    }

    pub fn apply_edit_at(&mut self, index: usize, diff: &DiffNode) -> Result<Option<DiffNode>> {
        let ty = T::editable_type();
        self.update_at(index, |entry| ty.apply(entry, diff))
    }

    /// Apply one path-addressed edit to the entry under `key`.
    pub fn apply_field_edit(&mut self, key: &T::Key, edit: &FieldEdit) -> Result<Option<DiffNode>> {
        let index = self
            .entries
            .get_index_of(key)
            .ok_or_else(|| PbsError::edit(format!("Cannot find key {key} in collection.")))?;
        let ty = T::editable_type();
        self.update_at(index, |entry| ty.apply_edit(entry, &edit.path().segments, edit))
    }

    fn update_at(&mut self, index: usize, edit: impl FnOnce(&mut T) -> Result<()>) -> Result<Option<DiffNode>> {
        let current = self.get_at(index)?;
        let mut updated = current.clone();
        edit(&mut updated)?;

        let Some(effective) = T::editable_type().diff(current, &updated)? else {
            return Ok(None);
        };
        if updated.key() != current.key() {
            return Err(PbsError::edit(format!(
                "Edit would change the key of {} to {}.",
                current.key(),
                updated.key()
            )));
        }
        debug!(index, key = %updated.key(), "Applied edit");
        if let Some((_, slot)) = self.entries.get_index_mut(index) {
            *slot = updated;
        }
        self.pending = true;
        Ok(Some(effective))
    }

    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        for index in [a, b] {
            if index >= self.entries.len() {
                return Err(self.missing_index(index));
            }
        }
        if a != b {
            self.entries.swap_indices(a, b);
            self.pending = true;
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &T::Key) -> Result<T> {
        let removed = self
            .entries
            .shift_remove(key)
            .ok_or_else(|| PbsError::edit(format!("Cannot find key {key} in collection.")))?;
        self.pending = true;
        Ok(removed)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        let (_, removed) = self
            .entries
            .shift_remove_index(index)
            .ok_or_else(|| self.missing_index(index))?;
        self.pending = true;
        Ok(removed)
    }

    /// Replace `set` with the working copy.
    pub fn commit(&mut self, set: &mut DataSet<T>) {
        set.import(self.entries.values().cloned());
        self.pending = false;
    }
}
