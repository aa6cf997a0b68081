//! Interned identifiers.
//!
//! Entity keys and cross references are stored as [`Name`]s: small `Copy`
//! handles into a process-wide string table. The table is sharded into
//! buckets guarded by their own lock, with ids handed out by an atomic
//! counter, so names can be created from any thread.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
use std::sync::{OnceLock, RwLock};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const BUCKET_COUNT: usize = 16;

struct NameTable {
    buckets: Vec<RwLock<HashMap<&'static str, u32>>>,
    next_id: AtomicU32,
}

impl NameTable {
    fn new() -> Self {
        Self {
            buckets: (0..BUCKET_COUNT).map(|_| RwLock::new(HashMap::new())).collect(),
            // 0 is reserved for the empty name
            next_id: AtomicU32::new(1),
        }
    }

    fn bucket(&self, text: &str) -> &RwLock<HashMap<&'static str, u32>> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        &self.buckets[(hasher.finish() as usize) % BUCKET_COUNT]
    }

    fn intern(&self, text: &str) -> (u32, &'static str) {
        let bucket = self.bucket(text);
        {
            let map = bucket.read().unwrap_or_else(|e| e.into_inner());
            if let Some((key, id)) = map.get_key_value(text) {
                return (*id, *key);
            }
        }
        let mut map = bucket.write().unwrap_or_else(|e| e.into_inner());
        if let Some((key, id)) = map.get_key_value(text) {
            return (*id, *key);
        }
        let stored: &'static str = Box::leak(text.to_string().into_boxed_str());
        let id = self.next_id.fetch_add(1, AtomicOrdering::Relaxed);
        map.insert(stored, id);
        (id, stored)
    }

    fn len(&self) -> usize {
        self.buckets
            .iter()
            .map(|b| b.read().map(|m| m.len()).unwrap_or(0))
            .sum()
    }
}

fn table() -> &'static NameTable {
    static TABLE: OnceLock<NameTable> = OnceLock::new();
    TABLE.get_or_init(NameTable::new)
}

/// An interned, case-sensitive identifier.
#[derive(Clone, Copy)]
pub struct Name {
    id: u32,
    text: &'static str,
}

impl Name {
    /// Intern `text`, returning its handle. The empty string is [`Name::none`].
    pub fn new(text: &str) -> Self {
        if text.is_empty() {
            return Self::none();
        }
        let (id, text) = table().intern(text);
        Self { id, text }
    }

    /// The empty name.
    pub const fn none() -> Self {
        Self { id: 0, text: "" }
    }

    pub fn is_none(&self) -> bool {
        self.id == 0
    }

    pub fn is_valid(&self) -> bool {
        !self.is_none()
    }

    pub fn as_str(&self) -> &'static str {
        self.text
    }

    /// Number of distinct names interned so far.
    pub fn interned_count() -> usize {
        table().len()
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::none()
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordinal comparison of the underlying text.
impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.text.cmp(other.text)
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Name::new(text)
    }
}

impl From<String> for Name {
    fn from(text: String) -> Self {
        Name::new(&text)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.text)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.text)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Name::new(&text))
    }
}
