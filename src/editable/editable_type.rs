//! Property tables for editable object types.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PbsError, Result};

use super::diff::DiffNode;
use super::path::{FieldEdit, FieldPathSegment};
use super::property::{from_json, scalar, EditableProperty, Property, SharedEditor, ValueEditor};

/// A type that has an editable property table.
pub trait Editable: Sized + 'static {
    fn editable_type() -> &'static EditableType<Self>;
}

/// The ordered editable properties of `T`.
pub struct EditableType<T> {
    name: &'static str,
    properties: IndexMap<&'static str, Box<dyn EditableProperty<T>>>,
}

impl<T> fmt::Debug for EditableType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditableType")
            .field("name", &self.name)
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T> EditableType<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn property(&self, name: &str) -> Option<&dyn EditableProperty<T>> {
        self.properties.get(name).map(|p| p.as_ref())
    }

    pub fn properties(&self) -> impl Iterator<Item = &dyn EditableProperty<T>> {
        self.properties.values().map(|p| p.as_ref())
    }

    fn require(&self, name: &str) -> Result<&dyn EditableProperty<T>> {
        self.property(name)
            .ok_or_else(|| PbsError::edit(format!("No property {name} on {}.", self.name)))
    }

    /// Per-property changes from `old` to `new`, or `None` when no property
    /// differs.
    pub fn diff(&self, old: &T, new: &T) -> Result<Option<DiffNode>> {
        let mut properties = IndexMap::new();
        for property in self.properties() {
            if let Some(change) = property.diff(old, new)? {
                properties.insert(property.name().to_string(), change);
            }
        }
        Ok((!properties.is_empty()).then_some(DiffNode::Object { properties }))
    }

    /// Apply an object diff property by property.
    pub fn apply(&self, root: &mut T, node: &DiffNode) -> Result<()> {
        let DiffNode::Object { properties } = node else {
            return Err(PbsError::edit(format!(
                "Diff {} is not valid for object {}.",
                node.kind(),
                self.name
            )));
        };
        for (name, change) in properties {
            self.require(name)?.apply(root, change)?;
        }
        Ok(())
    }

    /// Apply an edit whose path starts at a property of `T`.
    pub fn apply_edit(&self, root: &mut T, path: &[FieldPathSegment], edit: &FieldEdit) -> Result<()> {
        let Some((first, rest)) = path.split_first() else {
            return Err(PbsError::edit(format!("Cannot apply {} to the root of {}.", edit.kind(), self.name)));
        };
        let FieldPathSegment::Property { name } = first else {
            return Err(PbsError::edit(format!("Expected a property segment, got {first}.")));
        };
        self.require(name)?.apply_edit(root, rest, edit)
    }
}

/// Nested objects diff per property and can also be replaced whole.
impl<T> ValueEditor<T> for EditableType<T>
where
    T: DeserializeOwned,
{
    fn diff(&self, old: &T, new: &T) -> Result<Option<DiffNode>> {
        EditableType::diff(self, old, new)
    }

    fn apply(&self, value: &mut T, node: &DiffNode) -> Result<()> {
        match node {
            DiffNode::ValueSet { new_value } => {
                *value = from_json(new_value)?;
                Ok(())
            }
            other => EditableType::apply(self, value, other),
        }
    }

    fn apply_edit(&self, value: &mut T, path: &[FieldPathSegment], edit: &FieldEdit) -> Result<()> {
        match (path.is_empty(), edit) {
            (true, FieldEdit::SetValue { new_value, .. }) => {
                *value = from_json(new_value)?;
                Ok(())
            }
            _ => EditableType::apply_edit(self, value, path, edit),
        }
    }
}

/// Editor for a nested object type.
pub fn object<T>(ty: EditableType<T>) -> SharedEditor<T>
where
    T: DeserializeOwned + 'static,
{
    Arc::new(ty)
}

/// Builder for an [`EditableType`].
pub struct EditableTypeBuilder<T> {
    name: &'static str,
    properties: IndexMap<&'static str, Box<dyn EditableProperty<T>>>,
}

impl<T: 'static> EditableTypeBuilder<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            properties: IndexMap::new(),
        }
    }

    pub fn property<V: 'static>(
        mut self,
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
        editor: SharedEditor<V>,
    ) -> Self {
        self.properties
            .insert(name, Box::new(Property::new(name, get, get_mut, editor)));
        self
    }

    /// A property replaced as a whole.
    pub fn scalar<V>(self, name: &'static str, get: fn(&T) -> &V, get_mut: fn(&mut T) -> &mut V) -> Self
    where
        V: Serialize + DeserializeOwned + PartialEq + 'static,
    {
        self.property(name, get, get_mut, scalar())
    }

    pub fn build(self) -> EditableType<T> {
        EditableType {
            name: self.name,
            properties: self.properties,
        }
    }
}
