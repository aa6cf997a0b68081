//! Typed values produced by the field parser.

use indexmap::IndexMap;

use crate::types::Name;

/// A single parsed field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Name(Name),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The integer as a `u32`; `None` when it does not fit.
    pub fn as_uint(&self) -> Option<u32> {
        self.as_int().and_then(|n| u32::try_from(n).ok())
    }

    /// The integer as an `i32`; `None` when it does not fit.
    pub fn as_i32(&self) -> Option<i32> {
        self.as_int().and_then(|n| i32::try_from(n).ok())
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text of a string or name value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::Name(n) => Some(n.as_str()),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<Name> {
        match self {
            Value::Name(n) => Some(*n),
            Value::Str(s) => Some(Name::new(s)),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Name> for Value {
    fn from(n: Name) -> Self {
        Value::Name(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

/// One line's worth of values; `None` marks an empty optional field.
pub type Row = Vec<Option<Value>>;

/// The value stored for one key of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A single row (`Single` structure).
    Single(Row),
    /// Groups from one line (`Array`) or one row per line (`Repeating`).
    List(Vec<Row>),
}

impl FieldValue {
    /// Single-value shorthand.
    pub fn value(value: impl Into<Value>) -> Self {
        FieldValue::Single(vec![Some(value.into())])
    }

    /// One-element groups, as used for name lists.
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        FieldValue::List(values.into_iter().map(|v| vec![Some(v.into())]).collect())
    }

    pub fn rows(&self) -> &[Row] {
        match self {
            FieldValue::Single(row) => std::slice::from_ref(row),
            FieldValue::List(rows) => rows,
        }
    }

    /// Whether writing this value would produce nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Single(row) => row.iter().all(Option::is_none),
            FieldValue::List(rows) => rows.is_empty(),
        }
    }
}

/// A parsed section: header values plus fields in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub section: Row,
    pub fields: IndexMap<String, FieldValue>,
}

impl Record {
    pub fn new(section: Row) -> Self {
        Self {
            section,
            fields: IndexMap::new(),
        }
    }

    fn section_value(&self, index: usize) -> Option<&Value> {
        self.section.get(index).and_then(Option::as_ref)
    }

    pub fn section_int(&self, index: usize) -> Option<i64> {
        self.section_value(index).and_then(Value::as_int)
    }

    pub fn section_uint(&self, index: usize) -> Option<u32> {
        self.section_value(index).and_then(Value::as_uint)
    }

    pub fn section_name(&self, index: usize) -> Option<Name> {
        self.section_value(index).and_then(Value::as_name)
    }

    pub fn section_str(&self, index: usize) -> Option<&str> {
        self.section_value(index).and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// First row of a field.
    pub fn row(&self, key: &str) -> Option<&Row> {
        self.get(key).and_then(|v| v.rows().first())
    }

    /// All rows of a field (empty when absent).
    pub fn rows(&self, key: &str) -> &[Row] {
        self.get(key).map(FieldValue::rows).unwrap_or(&[])
    }

    /// First value of a field.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.row(key).and_then(|r| r.first()).and_then(Option::as_ref)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.value(key).and_then(Value::as_int)
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.value(key).and_then(Value::as_float)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.value(key).and_then(Value::as_bool)
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.value(key).and_then(Value::as_str).map(str::to_string)
    }

    pub fn name(&self, key: &str) -> Option<Name> {
        self.value(key).and_then(Value::as_name)
    }

    /// The first element of every row, as names.
    pub fn names(&self, key: &str) -> Vec<Name> {
        self.rows(key)
            .iter()
            .filter_map(|r| r.first().and_then(Option::as_ref).and_then(Value::as_name))
            .collect()
    }

    /// Every value of a single row, as integers.
    pub fn ints(&self, key: &str) -> Vec<i64> {
        match self.get(key) {
            Some(FieldValue::Single(row)) => row.iter().flatten().filter_map(Value::as_int).collect(),
            Some(FieldValue::List(rows)) => rows
                .iter()
                .filter_map(|r| r.first().and_then(Option::as_ref).and_then(Value::as_int))
                .collect(),
            None => Vec::new(),
        }
    }

    /// A non-negative integer that fits a `u32`.
    ///
    /// Unsigned and positive elements are bounded to `u32` when parsed, so
    /// this only returns `None` for a missing field.
    pub fn uint(&self, key: &str) -> Option<u32> {
        self.value(key).and_then(Value::as_uint)
    }

    pub fn int32(&self, key: &str) -> Option<i32> {
        self.value(key).and_then(Value::as_i32)
    }

    /// Every value of a single row, as `u32`s.
    pub fn uints(&self, key: &str) -> Vec<u32> {
        self.ints(key).into_iter().filter_map(|n| u32::try_from(n).ok()).collect()
    }

    /// Every value of a single row, as `i32`s.
    pub fn ints32(&self, key: &str) -> Vec<i32> {
        self.ints(key).into_iter().filter_map(|n| i32::try_from(n).ok()).collect()
    }

    /// The first element of every row, as text.
    pub fn strings(&self, key: &str) -> Vec<String> {
        self.rows(key)
            .iter()
            .filter_map(|r| r.first().and_then(Option::as_ref).and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }

    pub fn set(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    /// Set a single value; `None` leaves the field out.
    pub fn set_value<V: Into<Value>>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.set(key, FieldValue::value(value));
        }
    }

    /// Set a name list; empty lists leave the field out.
    pub fn set_names(&mut self, key: &str, names: &[Name]) {
        if !names.is_empty() {
            self.set(key, FieldValue::list(names.iter().copied()));
        }
    }

    /// Set a text list; empty lists leave the field out.
    pub fn set_strings(&mut self, key: &str, values: &[String]) {
        if !values.is_empty() {
            self.set(key, FieldValue::list(values.iter().cloned()));
        }
    }

    /// Set a boolean that is only written when true.
    pub fn set_flag(&mut self, key: &str, value: bool) {
        if value {
            self.set(key, FieldValue::value(true));
        }
    }

    /// Set a row of values from one line.
    pub fn set_row(&mut self, key: &str, row: Row) {
        if row.iter().any(Option::is_some) {
            self.set(key, FieldValue::Single(row));
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.shift_remove(key)
    }
}
