//! Structural diffs between two values of an editable type.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Change to one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum DiffNode {
    /// Replace the value.
    #[serde(rename_all = "camelCase")]
    ValueSet { new_value: Value },
    /// Clear an optional value.
    ValueReset,
    /// Changes to some properties of an object, by property name.
    Object { properties: IndexMap<String, DiffNode> },
    List { edits: Vec<ListEditNode> },
    Dictionary { edits: Vec<DictionaryEditNode> },
}

impl DiffNode {
    pub fn value_set(new_value: Value) -> Self {
        DiffNode::ValueSet { new_value }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DiffNode::ValueSet { .. } => "ValueSet",
            DiffNode::ValueReset => "ValueReset",
            DiffNode::Object { .. } => "Object",
            DiffNode::List { .. } => "List",
            DiffNode::Dictionary { .. } => "Dictionary",
        }
    }
}

/// One step of a list diff, applied in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum ListEditNode {
    Set {
        index: usize,
        change: DiffNode,
    },
    #[serde(rename_all = "camelCase")]
    Add { new_value: Value },
    #[serde(rename_all = "camelCase")]
    Insert { index: usize, new_value: Value },
    Remove { index: usize },
    #[serde(rename_all = "camelCase")]
    Swap { index_a: usize, index_b: usize },
}

/// One step of a dictionary diff; keys are JSON encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum DictionaryEditNode {
    Set { key: Value, change: DiffNode },
    Add { key: Value, value: Value },
    Remove { key: Value },
    #[serde(rename_all = "camelCase")]
    ChangeKey { old_key: Value, new_key: Value },
}
