//! Value editors and the typed properties built from them.
//!
//! A [`ValueEditor`] knows how to diff and patch one shape of value:
//! scalars, nested objects, lists, dictionaries and optionals. A
//! [`Property`] binds an editor to one field of a root type.

use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{PbsError, Result};

use super::diff::{DictionaryEditNode, DiffNode, ListEditNode};
use super::path::{FieldEdit, FieldPathSegment};

/// Diff and patch operations for values of type `V`.
pub trait ValueEditor<V>: Send + Sync {
    /// The change from `old` to `new`, or `None` when they are equal.
    fn diff(&self, old: &V, new: &V) -> Result<Option<DiffNode>>;

    /// Apply a diff produced by [`ValueEditor::diff`].
    fn apply(&self, value: &mut V, node: &DiffNode) -> Result<()>;

    /// Apply a path-addressed edit; `path` is relative to `value`.
    fn apply_edit(&self, value: &mut V, path: &[FieldPathSegment], edit: &FieldEdit) -> Result<()>;
}

/// A shared editor for values of type `V`.
pub type SharedEditor<V> = Arc<dyn ValueEditor<V>>;

pub(crate) fn to_json<V: Serialize>(value: &V) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| PbsError::edit(format!("Cannot serialize value: {e}")))
}

pub(crate) fn from_json<V: DeserializeOwned>(value: &Value) -> Result<V> {
    V::deserialize(value).map_err(|e| PbsError::edit(format!("Invalid value {value}: {e}")))
}

fn invalid_diff(node: &DiffNode, target: &str) -> PbsError {
    PbsError::edit(format!("Diff {} is not valid for {target}.", node.kind()))
}

fn invalid_edit(edit: &FieldEdit, target: &str) -> PbsError {
    PbsError::edit(format!(
        "Edit {} is not valid for {target} at '{}'.",
        edit.kind(),
        edit.path()
    ))
}

fn missing_index(index: usize, len: usize) -> PbsError {
    PbsError::edit(format!("Cannot find index {index} in list of length {len}."))
}

/// Values replaced as a whole.
pub struct ScalarEditor<V>(PhantomData<fn() -> V>);

pub fn scalar<V>() -> SharedEditor<V>
where
    V: Serialize + DeserializeOwned + PartialEq + 'static,
{
    Arc::new(ScalarEditor(PhantomData))
}

impl<V> ValueEditor<V> for ScalarEditor<V>
where
    V: Serialize + DeserializeOwned + PartialEq,
{
    fn diff(&self, old: &V, new: &V) -> Result<Option<DiffNode>> {
        if old == new {
            return Ok(None);
        }
        Ok(Some(DiffNode::value_set(to_json(new)?)))
    }

    fn apply(&self, value: &mut V, node: &DiffNode) -> Result<()> {
        match node {
            DiffNode::ValueSet { new_value } => {
                *value = from_json(new_value)?;
                Ok(())
            }
            other => Err(invalid_diff(other, "a scalar value")),
        }
    }

    fn apply_edit(&self, value: &mut V, path: &[FieldPathSegment], edit: &FieldEdit) -> Result<()> {
        if !path.is_empty() {
            return Err(PbsError::edit(format!(
                "Cannot traverse into a scalar value, path still has {} segment(s).",
                path.len()
            )));
        }
        match edit {
            FieldEdit::SetValue { new_value, .. } => {
                *value = from_json(new_value)?;
                Ok(())
            }
            other => Err(invalid_edit(other, "a scalar value")),
        }
    }
}

/// Lists diffed position by position.
pub struct ListEditor<I> {
    item: SharedEditor<I>,
}

pub fn list<I>(item: SharedEditor<I>) -> SharedEditor<Vec<I>>
where
    I: Serialize + DeserializeOwned + 'static,
{
    Arc::new(ListEditor { item })
}

impl<I> ValueEditor<Vec<I>> for ListEditor<I>
where
    I: Serialize + DeserializeOwned,
{
    /// Common positions are diffed in place; extra new items are added at
    /// the end, extra old items are removed from the back.
    fn diff(&self, old: &Vec<I>, new: &Vec<I>) -> Result<Option<DiffNode>> {
        let common = old.len().min(new.len());
        let mut edits = Vec::new();
        for index in 0..common {
            if let Some(change) = self.item.diff(&old[index], &new[index])? {
                edits.push(ListEditNode::Set { index, change });
            }
        }
        for item in &new[common..] {
            edits.push(ListEditNode::Add {
                new_value: to_json(item)?,
            });
        }
        for index in (common..old.len()).rev() {
            edits.push(ListEditNode::Remove { index });
        }

        Ok((!edits.is_empty()).then_some(DiffNode::List { edits }))
    }

    fn apply(&self, value: &mut Vec<I>, node: &DiffNode) -> Result<()> {
        let edits = match node {
            DiffNode::List { edits } => edits,
            DiffNode::ValueSet { new_value } => {
                *value = from_json(new_value)?;
                return Ok(());
            }
            other => return Err(invalid_diff(other, "a list")),
        };

        for edit in edits {
            match edit {
                ListEditNode::Set { index, change } => {
                    let len = value.len();
                    let item = value.get_mut(*index).ok_or_else(|| missing_index(*index, len))?;
                    self.item.apply(item, change)?;
                }
                ListEditNode::Add { new_value } => value.push(from_json(new_value)?),
                ListEditNode::Insert { index, new_value } => {
                    if *index > value.len() {
                        return Err(missing_index(*index, value.len()));
                    }
                    value.insert(*index, from_json(new_value)?);
                }
                ListEditNode::Remove { index } => {
                    if *index >= value.len() {
                        return Err(missing_index(*index, value.len()));
                    }
                    value.remove(*index);
                }
                ListEditNode::Swap { index_a, index_b } => {
                    let len = value.len();
                    if *index_a >= len || *index_b >= len {
                        return Err(missing_index((*index_a).max(*index_b), len));
                    }
                    value.swap(*index_a, *index_b);
                }
            }
        }
        Ok(())
    }

    fn apply_edit(&self, value: &mut Vec<I>, path: &[FieldPathSegment], edit: &FieldEdit) -> Result<()> {
        let Some((first, rest)) = path.split_first() else {
            let len = value.len();
            match edit {
                FieldEdit::SetValue { new_value, .. } => *value = from_json(new_value)?,
                FieldEdit::ListAdd { new_item, .. } => value.push(from_json(new_item)?),
                FieldEdit::ListInsert { index, new_item, .. } => {
                    if *index > len {
                        return Err(missing_index(*index, len));
                    }
                    value.insert(*index, from_json(new_item)?);
                }
                FieldEdit::ListRemoveAt { index, .. } => {
                    if *index >= len {
                        return Err(missing_index(*index, len));
                    }
                    value.remove(*index);
                }
                FieldEdit::ListSwap { index_a, index_b, .. } => {
                    if *index_a >= len || *index_b >= len {
                        return Err(missing_index((*index_a).max(*index_b), len));
                    }
                    value.swap(*index_a, *index_b);
                }
                other => return Err(invalid_edit(other, "a list")),
            }
            return Ok(());
        };

        let FieldPathSegment::ListIndex { index } = first else {
            return Err(PbsError::edit(format!(
                "First segment under a list must be a list index, got {first}."
            )));
        };
        let len = value.len();
        let item = value.get_mut(*index).ok_or_else(|| missing_index(*index, len))?;
        self.item.apply_edit(item, rest, edit)
    }
}

/// Ordered maps diffed key by key.
pub struct DictionaryEditor<K, V> {
    value: SharedEditor<V>,
    _key: PhantomData<fn() -> K>,
}

pub fn dictionary<K, V>(value: SharedEditor<V>) -> SharedEditor<IndexMap<K, V>>
where
    K: Serialize + DeserializeOwned + Eq + Hash + Clone + 'static,
    V: Serialize + DeserializeOwned + 'static,
{
    Arc::new(DictionaryEditor {
        value,
        _key: PhantomData,
    })
}

impl<K, V> DictionaryEditor<K, V>
where
    K: Serialize + DeserializeOwned + Eq + Hash + Clone,
    V: Serialize + DeserializeOwned,
{
    fn entry<'a>(map: &'a mut IndexMap<K, V>, key: &Value) -> Result<&'a mut V> {
        let parsed: K = from_json(key)?;
        map.get_mut(&parsed)
            .ok_or_else(|| PbsError::edit(format!("Cannot find key {key} in dictionary.")))
    }
}

impl<K, V> ValueEditor<IndexMap<K, V>> for DictionaryEditor<K, V>
where
    K: Serialize + DeserializeOwned + Eq + Hash + Clone,
    V: Serialize + DeserializeOwned,
{
    /// Removed keys first, then added keys, then changes to shared keys.
    fn diff(&self, old: &IndexMap<K, V>, new: &IndexMap<K, V>) -> Result<Option<DiffNode>> {
        let mut edits = Vec::new();
        for key in old.keys().filter(|k| !new.contains_key(*k)) {
            edits.push(DictionaryEditNode::Remove { key: to_json(key)? });
        }
        for (key, value) in new.iter().filter(|(k, _)| !old.contains_key(*k)) {
            edits.push(DictionaryEditNode::Add {
                key: to_json(key)?,
                value: to_json(value)?,
            });
        }
        for (key, old_value) in old {
            let Some(new_value) = new.get(key) else {
                continue;
            };
            if let Some(change) = self.value.diff(old_value, new_value)? {
                edits.push(DictionaryEditNode::Set {
                    key: to_json(key)?,
                    change,
                });
            }
        }

        Ok((!edits.is_empty()).then_some(DiffNode::Dictionary { edits }))
    }

    fn apply(&self, value: &mut IndexMap<K, V>, node: &DiffNode) -> Result<()> {
        let edits = match node {
            DiffNode::Dictionary { edits } => edits,
            DiffNode::ValueSet { new_value } => {
                *value = from_json(new_value)?;
                return Ok(());
            }
            other => return Err(invalid_diff(other, "a dictionary")),
        };

        for edit in edits {
            match edit {
                DictionaryEditNode::Set { key, change } => {
                    self.value.apply(Self::entry(value, key)?, change)?;
                }
                DictionaryEditNode::Add { key, value: item } => {
                    let parsed: K = from_json(key)?;
                    if value.contains_key(&parsed) {
                        return Err(PbsError::edit(format!("Key {key} is already in the dictionary.")));
                    }
                    value.insert(parsed, from_json(item)?);
                }
                DictionaryEditNode::Remove { key } => {
                    let parsed: K = from_json(key)?;
                    if value.shift_remove(&parsed).is_none() {
                        return Err(PbsError::edit(format!("Cannot find key {key} in dictionary.")));
                    }
                }
                DictionaryEditNode::ChangeKey { old_key, new_key } => {
                    let old: K = from_json(old_key)?;
                    let new: K = from_json(new_key)?;
                    if !value.contains_key(&old) {
                        return Err(PbsError::edit(format!("Cannot find key {old_key} in dictionary.")));
                    }
                    if old != new && value.contains_key(&new) {
                        return Err(PbsError::edit(format!("Key {new_key} is already in the dictionary.")));
                    }
                    // Keep the entry at its position.
                    let renamed: IndexMap<K, V> = value
                        .drain(..)
                        .map(|(k, v)| if k == old { (new.clone(), v) } else { (k, v) })
                        .collect();
                    *value = renamed;
                }
            }
        }
        Ok(())
    }

    fn apply_edit(
        &self,
        value: &mut IndexMap<K, V>,
        path: &[FieldPathSegment],
        edit: &FieldEdit,
    ) -> Result<()> {
        let Some((first, rest)) = path.split_first() else {
            match edit {
                FieldEdit::SetValue { new_value, .. } => *value = from_json(new_value)?,
                FieldEdit::DictionarySetEntry { key, new_value, .. } => {
                    value.insert(from_json(key)?, from_json(new_value)?);
                }
                FieldEdit::DictionaryRemoveEntry { key, .. } => {
                    let parsed: K = from_json(key)?;
                    if value.shift_remove(&parsed).is_none() {
                        return Err(PbsError::edit(format!("Cannot find key {key} in dictionary.")));
                    }
                }
                other => return Err(invalid_edit(other, "a dictionary")),
            }
            return Ok(());
        };

        let FieldPathSegment::DictionaryKey { key } = first else {
            return Err(PbsError::edit(format!(
                "First segment under a dictionary must be a dictionary key, got {first}."
            )));
        };
        self.value.apply_edit(Self::entry(value, key)?, rest, edit)
    }
}

/// Values that may be absent.
pub struct OptionalEditor<V> {
    inner: SharedEditor<V>,
}

pub fn optional<V>(inner: SharedEditor<V>) -> SharedEditor<Option<V>>
where
    V: Serialize + DeserializeOwned + PartialEq + 'static,
{
    Arc::new(OptionalEditor { inner })
}

impl<V> OptionalEditor<V> {
    fn set_value(value: &mut Option<V>) -> Result<&mut V> {
        value
            .as_mut()
            .ok_or_else(|| PbsError::edit("Cannot traverse into an optional value, no value set."))
    }
}

impl<V> ValueEditor<Option<V>> for OptionalEditor<V>
where
    V: Serialize + DeserializeOwned + PartialEq,
{
    fn diff(&self, old: &Option<V>, new: &Option<V>) -> Result<Option<DiffNode>> {
        match (old, new) {
            (None, None) => Ok(None),
            (Some(_), None) => Ok(Some(DiffNode::ValueReset)),
            (None, Some(v)) => Ok(Some(DiffNode::value_set(to_json(v)?))),
            (Some(a), Some(b)) => self.inner.diff(a, b),
        }
    }

    fn apply(&self, value: &mut Option<V>, node: &DiffNode) -> Result<()> {
        match node {
            DiffNode::ValueReset => *value = None,
            DiffNode::ValueSet { new_value } => *value = from_json(new_value)?,
            other => self.inner.apply(Self::set_value(value)?, other)?,
        }
        Ok(())
    }

    fn apply_edit(&self, value: &mut Option<V>, path: &[FieldPathSegment], edit: &FieldEdit) -> Result<()> {
        if path.is_empty() {
            match edit {
                FieldEdit::SetValue { new_value, .. } => {
                    *value = from_json(new_value)?;
                    return Ok(());
                }
                FieldEdit::OptionalReset { .. } => {
                    *value = None;
                    return Ok(());
                }
                _ => {}
            }
        }
        self.inner.apply_edit(Self::set_value(value)?, path, edit)
    }
}

/// A named field of `T`, edited through a [`ValueEditor`].
pub trait EditableProperty<T>: Send + Sync {
    fn name(&self) -> &'static str;

    fn diff(&self, old: &T, new: &T) -> Result<Option<DiffNode>>;

    fn apply(&self, root: &mut T, node: &DiffNode) -> Result<()>;

    /// `path` starts below this property.
    fn apply_edit(&self, root: &mut T, path: &[FieldPathSegment], edit: &FieldEdit) -> Result<()>;
}

/// Field accessors plus the editor for the field's value.
pub struct Property<T, V> {
    name: &'static str,
    get: fn(&T) -> &V,
    get_mut: fn(&mut T) -> &mut V,
    editor: SharedEditor<V>,
}

impl<T, V> Property<T, V> {
    pub fn new(
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
        editor: SharedEditor<V>,
    ) -> Self {
        Self {
            name,
            get,
            get_mut,
            editor,
        }
    }

    pub fn get<'a>(&self, root: &'a T) -> &'a V {
        (self.get)(root)
    }
}

impl<T, V> EditableProperty<T> for Property<T, V>
where
    T: 'static,
    V: 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn diff(&self, old: &T, new: &T) -> Result<Option<DiffNode>> {
        self.editor.diff((self.get)(old), (self.get)(new))
    }

    fn apply(&self, root: &mut T, node: &DiffNode) -> Result<()> {
        self.editor.apply((self.get_mut)(root), node)
    }

    fn apply_edit(&self, root: &mut T, path: &[FieldPathSegment], edit: &FieldEdit) -> Result<()> {
        self.editor.apply_edit((self.get_mut)(root), path, edit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editable::FieldPath;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn set(path: FieldPath, value: Value) -> FieldEdit {
        FieldEdit::SetValue {
            path,
            new_value: value,
        }
    }

    #[test]
    fn test_scalar_diff() {
        let editor = scalar::<u32>();
        assert_eq!(editor.diff(&5, &5).unwrap(), None);
        assert_eq!(editor.diff(&5, &7).unwrap(), Some(DiffNode::value_set(json!(7))));

        let mut value = 5;
        editor.apply(&mut value, &DiffNode::value_set(json!(9))).unwrap();
        assert_eq!(value, 9);
        assert!(editor.apply(&mut value, &DiffNode::ValueReset).is_err());
    }

    #[test]
    fn test_scalar_rejects_bad_json() {
        let editor = scalar::<u32>();
        let mut value = 5;
        let err = editor
            .apply_edit(&mut value, &[], &set(FieldPath::root(), json!("five")))
            .unwrap_err();
        assert!(err.to_string().starts_with("Edit error: Invalid value \"five\""));
        assert_eq!(value, 5);
    }

    #[test]
    fn test_list_diff_shrink() {
        let editor = list(scalar::<String>());
        let old = vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()];
        let new = vec!["a".to_string(), "x".to_string()];

        let diff = editor.diff(&old, &new).unwrap().unwrap();
        assert_eq!(
            diff,
            DiffNode::List {
                edits: vec![
                    ListEditNode::Set {
                        index: 1,
                        change: DiffNode::value_set(json!("x")),
                    },
                    ListEditNode::Remove { index: 3 },
                    ListEditNode::Remove { index: 2 },
                ],
            }
        );

        let mut patched = old.clone();
        editor.apply(&mut patched, &diff).unwrap();
        assert_eq!(patched, new);
    }

    #[test]
    fn test_list_diff_grow() {
        let editor = list(scalar::<u32>());
        let old = vec![1];
        let new = vec![1, 2, 3];

        let diff = editor.diff(&old, &new).unwrap().unwrap();
        let DiffNode::List { edits } = &diff else {
            panic!("expected a list diff, got {diff:?}");
        };
        assert_eq!(
            edits,
            &vec![
                ListEditNode::Add { new_value: json!(2) },
                ListEditNode::Add { new_value: json!(3) },
            ]
        );

        let mut patched = old;
        editor.apply(&mut patched, &diff).unwrap();
        assert_eq!(patched, new);
        assert_eq!(editor.diff(&new, &new).unwrap(), None);
    }

    #[test]
    fn test_list_edits() {
        let editor = list(scalar::<u32>());
        let mut value = vec![10, 20, 30];
        let at = FieldPath::root();

        editor
            .apply_edit(&mut value, &[], &FieldEdit::ListInsert { path: at.clone(), index: 1, new_item: json!(15) })
            .unwrap();
        editor
            .apply_edit(&mut value, &[], &FieldEdit::ListSwap { path: at.clone(), index_a: 0, index_b: 3 })
            .unwrap();
        editor
            .apply_edit(
                &mut value,
                &[],
                &FieldEdit::ListRemoveAt { path: at.clone(), index: 1, original_item: None },
            )
            .unwrap();
        assert_eq!(value, vec![30, 20, 10]);

        let path = FieldPath::root().index(2);
        editor.apply_edit(&mut value, &path.segments, &set(path.clone(), json!(11))).unwrap();
        assert_eq!(value, vec![30, 20, 11]);

        let err = editor
            .apply_edit(&mut value, &[], &FieldEdit::ListRemoveAt { path: at, index: 3, original_item: None })
            .unwrap_err();
        assert_eq!(err.to_string(), "Edit error: Cannot find index 3 in list of length 3.");
    }

    #[test]
    fn test_dictionary_diff_order() {
        let editor = dictionary::<String, u32>(scalar());
        let old: IndexMap<String, u32> =
            [("HP".to_string(), 45), ("ATTACK".to_string(), 49), ("SPEED".to_string(), 45)].into();
        let new: IndexMap<String, u32> =
            [("HP".to_string(), 50), ("SPEED".to_string(), 45), ("DEFENSE".to_string(), 49)].into();

        let diff = editor.diff(&old, &new).unwrap().unwrap();
        assert_eq!(
            diff,
            DiffNode::Dictionary {
                edits: vec![
                    DictionaryEditNode::Remove { key: json!("ATTACK") },
                    DictionaryEditNode::Add { key: json!("DEFENSE"), value: json!(49) },
                    DictionaryEditNode::Set { key: json!("HP"), change: DiffNode::value_set(json!(50)) },
                ],
            }
        );

        let mut patched = old.clone();
        editor.apply(&mut patched, &diff).unwrap();
        assert_eq!(patched.get("HP"), Some(&50));
        assert_eq!(patched.get("DEFENSE"), Some(&49));
        assert!(!patched.contains_key("ATTACK"));
    }

    #[test]
    fn test_dictionary_change_key_keeps_position() {
        let editor = dictionary::<String, u32>(scalar());
        let mut value: IndexMap<String, u32> =
            [("HP".to_string(), 1), ("ATTACK".to_string(), 2), ("SPEED".to_string(), 3)].into();
        let node = DiffNode::Dictionary {
            edits: vec![DictionaryEditNode::ChangeKey {
                old_key: json!("ATTACK"),
                new_key: json!("DEFENSE"),
            }],
        };
        editor.apply(&mut value, &node).unwrap();
        let keys: Vec<&str> = value.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["HP", "DEFENSE", "SPEED"]);

        let clash = DiffNode::Dictionary {
            edits: vec![DictionaryEditNode::ChangeKey { old_key: json!("HP"), new_key: json!("SPEED") }],
        };
        assert!(editor.apply(&mut value, &clash).is_err());
    }

    #[test]
    fn test_dictionary_edits() {
        let editor = dictionary::<String, u32>(scalar());
        let mut value: IndexMap<String, u32> = IndexMap::new();
        let at = FieldPath::root();
        editor
            .apply_edit(
                &mut value,
                &[],
                &FieldEdit::DictionarySetEntry { path: at.clone(), key: json!("HP"), new_value: json!(3) },
            )
            .unwrap();
        let path = FieldPath::root().key(json!("HP"));
        editor.apply_edit(&mut value, &path.segments, &set(path.clone(), json!(4))).unwrap();
        assert_eq!(value.get("HP"), Some(&4));

        editor
            .apply_edit(
                &mut value,
                &[],
                &FieldEdit::DictionaryRemoveEntry { path: at, key: json!("HP"), original_value: None },
            )
            .unwrap();
        assert!(value.is_empty());

        let missing = FieldPath::root().key(json!("SPEED"));
        assert!(editor.apply_edit(&mut value, &missing.segments, &set(missing.clone(), json!(1))).is_err());
    }

    #[test]
    fn test_optional() {
        let editor = optional(list(scalar::<u32>()));
        assert_eq!(editor.diff(&None, &None).unwrap(), None);
        assert_eq!(editor.diff(&Some(vec![1]), &None).unwrap(), Some(DiffNode::ValueReset));
        assert_eq!(editor.diff(&None, &Some(vec![1])).unwrap(), Some(DiffNode::value_set(json!([1]))));

        let nested = editor.diff(&Some(vec![1]), &Some(vec![1, 2])).unwrap().unwrap();
        assert_eq!(nested.kind(), "List");

        let mut value = None;
        assert!(editor.apply(&mut value, &nested).is_err());
        value = Some(vec![1]);
        editor.apply(&mut value, &nested).unwrap();
        assert_eq!(value, Some(vec![1, 2]));

        editor
            .apply_edit(&mut value, &[], &FieldEdit::OptionalReset { path: FieldPath::root(), original_value: None })
            .unwrap();
        assert_eq!(value, None);
    }
}
