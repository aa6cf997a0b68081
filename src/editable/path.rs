//! Paths into an editable value and the edits addressed by them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum FieldPathSegment {
    Property { name: String },
    ListIndex { index: usize },
    DictionaryKey { key: Value },
}

impl fmt::Display for FieldPathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPathSegment::Property { name } => write!(f, "{name}"),
            FieldPathSegment::ListIndex { index } => write!(f, "[{index}]"),
            FieldPathSegment::DictionaryKey { key } => write!(f, "[{key}]"),
        }
    }
}

/// Location of a field below an entity, e.g. `Pokemon.[0].Moves`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldPath {
    pub segments: Vec<FieldPathSegment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.segments.push(FieldPathSegment::Property { name: name.into() });
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(FieldPathSegment::ListIndex { index });
        self
    }

    pub fn key(mut self, key: Value) -> Self {
        self.segments.push(FieldPathSegment::DictionaryKey { key });
        self
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// A single edit made in an editor, addressed by path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$type", rename_all_fields = "camelCase")]
pub enum FieldEdit {
    SetValue {
        path: FieldPath,
        new_value: Value,
    },
    ListAdd {
        path: FieldPath,
        new_item: Value,
    },
    ListInsert {
        path: FieldPath,
        index: usize,
        new_item: Value,
    },
    ListRemoveAt {
        path: FieldPath,
        index: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original_item: Option<Value>,
    },
    ListSwap {
        path: FieldPath,
        index_a: usize,
        index_b: usize,
    },
    DictionarySetEntry {
        path: FieldPath,
        key: Value,
        new_value: Value,
    },
    DictionaryRemoveEntry {
        path: FieldPath,
        key: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original_value: Option<Value>,
    },
    OptionalReset {
        path: FieldPath,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original_value: Option<Value>,
    },
}

impl FieldEdit {
    pub fn path(&self) -> &FieldPath {
        match self {
            FieldEdit::SetValue { path, .. }
            | FieldEdit::ListAdd { path, .. }
            | FieldEdit::ListInsert { path, .. }
            | FieldEdit::ListRemoveAt { path, .. }
            | FieldEdit::ListSwap { path, .. }
            | FieldEdit::DictionarySetEntry { path, .. }
            | FieldEdit::DictionaryRemoveEntry { path, .. }
            | FieldEdit::OptionalReset { path, .. } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FieldEdit::SetValue { .. } => "SetValue",
            FieldEdit::ListAdd { .. } => "ListAdd",
            FieldEdit::ListInsert { .. } => "ListInsert",
            FieldEdit::ListRemoveAt { .. } => "ListRemoveAt",
            FieldEdit::ListSwap { .. } => "ListSwap",
            FieldEdit::DictionarySetEntry { .. } => "DictionarySetEntry",
            FieldEdit::DictionaryRemoveEntry { .. } => "DictionaryRemoveEntry",
            FieldEdit::OptionalReset { .. } => "OptionalReset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_display() {
        let path = FieldPath::root().property("a").index(0).key(json!("k"));
        assert_eq!(path.to_string(), r#"a.[0].["k"]"#);
        assert_eq!(FieldPath::root().to_string(), "");
    }

    #[test]
    fn test_field_edit_json() {
        let edit: FieldEdit = serde_json::from_value(json!({
            "$type": "ListRemoveAt",
            "path": { "segments": [{ "$type": "Property", "name": "Moves" }] },
            "index": 2
        }))
        .unwrap();
        assert_eq!(edit.kind(), "ListRemoveAt");
        assert_eq!(edit.path().to_string(), "Moves");
        assert!(matches!(edit, FieldEdit::ListRemoveAt { index: 2, original_item: None, .. }));
    }
}
