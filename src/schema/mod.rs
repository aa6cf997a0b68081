//! Per-model field tables.
//!
//! A [`Schema`] maps every PBS key of one file to its shape: how many lines
//! it may span, which typed elements make up a line, and whether it must be
//! present. Schemas are built once per model with [`SchemaBuilder`] and
//! drive both parsing ([`Schema::parse_section`]) and writing
//! ([`Schema::write_record`]).

mod value;

pub use value::{FieldValue, Record, Row, Value};

use indexmap::IndexMap;

use crate::error::{PbsError, Result};
use crate::parser::csv::{self, split_csv_line, unquote};
use crate::parser::{FileLineData, PbsSection};
use crate::registry::DataKind;
use crate::types::Name;

/// A fixed table of accepted enumeration names.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumTable {
    pub name: &'static str,
    pub values: &'static [&'static str],
}

impl EnumTable {
    pub const fn new(name: &'static str, values: &'static [&'static str]) -> Self {
        Self { name, values }
    }

    /// Case-insensitive lookup returning the table spelling.
    pub fn find(&self, raw: &str) -> Option<&'static str> {
        self.values
            .iter()
            .copied()
            .find(|v| v.eq_ignore_ascii_case(raw))
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.find(raw).is_some()
    }
}

/// Primitive shape of one CSV element.
#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    Integer,
    UnsignedInteger,
    PositiveInteger,
    Hexadecimal,
    Float,
    Boolean,
    /// An identifier: word characters, not starting with a digit.
    Name,
    String,
    /// The rest of the line, commas included.
    UnformattedText,
    /// An interned identifier without character restrictions.
    Symbol,
    Enumerable(&'static EnumTable),
    EnumerableOrInteger(&'static EnumTable),
}

/// One typed element of a line.
#[derive(Debug, Clone, Copy)]
pub struct Element {
    pub ty: FieldType,
    pub optional: bool,
    pub allow_none: bool,
    /// Kind of entity this element names, checked after parsing.
    pub reference: Option<DataKind>,
}

impl Element {
    pub const fn new(ty: FieldType) -> Self {
        Self {
            ty,
            optional: false,
            allow_none: false,
            reference: None,
        }
    }

    pub const fn int() -> Self {
        Self::new(FieldType::Integer)
    }

    pub const fn uint() -> Self {
        Self::new(FieldType::UnsignedInteger)
    }

    pub const fn positive() -> Self {
        Self::new(FieldType::PositiveInteger)
    }

    pub const fn float() -> Self {
        Self::new(FieldType::Float)
    }

    pub const fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    pub const fn name() -> Self {
        Self::new(FieldType::Name)
    }

    pub const fn string() -> Self {
        Self::new(FieldType::String)
    }

    pub const fn text() -> Self {
        Self::new(FieldType::UnformattedText)
    }

    pub const fn symbol() -> Self {
        Self::new(FieldType::Symbol)
    }

    pub const fn enumeration(table: &'static EnumTable) -> Self {
        Self::new(FieldType::Enumerable(table))
    }

    pub const fn enum_or_int(table: &'static EnumTable) -> Self {
        Self::new(FieldType::EnumerableOrInteger(table))
    }

    /// A name that must exist in the given entity set.
    pub const fn reference(kind: DataKind) -> Self {
        Self {
            reference: Some(kind),
            ..Self::new(FieldType::Symbol)
        }
    }

    pub const fn optional(self) -> Self {
        Self {
            optional: true,
            ..self
        }
    }

    pub const fn allow_none(self) -> Self {
        Self {
            optional: true,
            allow_none: true,
            ..self
        }
    }
}

/// How a key's values are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structure {
    /// One line, one group of elements.
    Single,
    /// One line, the element group repeated any number of times.
    Array,
    /// The key may appear on several lines, one group per line.
    Repeating,
}

/// Description of one key.
#[derive(Debug, Clone)]
pub struct SchemaEntry {
    pub structure: Structure,
    pub elements: Vec<Element>,
    pub required: bool,
}

impl SchemaEntry {
    pub fn single(element: Element) -> Self {
        Self::tuple(vec![element])
    }

    pub fn tuple(elements: Vec<Element>) -> Self {
        Self {
            structure: Structure::Single,
            elements,
            required: false,
        }
    }

    pub fn array(elements: Vec<Element>) -> Self {
        Self {
            structure: Structure::Array,
            elements,
            required: false,
        }
    }

    pub fn repeating(elements: Vec<Element>) -> Self {
        Self {
            structure: Structure::Repeating,
            elements,
            required: false,
        }
    }

    pub fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    /// Parse one line's value for this key.
    pub fn parse_line(&self, key: &str, raw: &str) -> std::result::Result<FieldValue, String> {
        if self.elements.len() == 1 {
            match self.elements[0].ty {
                FieldType::UnformattedText => {
                    return Ok(FieldValue::value(Value::Str(raw.trim().to_string())));
                }
                FieldType::String if self.structure != Structure::Array => {
                    let text = unquote(raw);
                    if text.is_empty() && !self.elements[0].optional {
                        return Err(format!("Expected a value for {key}."));
                    }
                    return Ok(FieldValue::value(Value::Str(text)));
                }
                _ => {}
            }
        }

        let fields = if raw.trim().is_empty() {
            Vec::new()
        } else {
            split_csv_line(raw)
        };

        match self.structure {
            Structure::Array => {
                let group = self.elements.len().max(1);
                let rows = fields
                    .chunks(group)
                    .map(|chunk| parse_group(key, chunk, &self.elements))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(FieldValue::List(rows))
            }
            Structure::Single | Structure::Repeating => {
                if fields.len() > self.elements.len() {
                    return Err(format!(
                        "Expected at most {} value(s) for {key}, but found {}.",
                        self.elements.len(),
                        fields.len()
                    ));
                }
                Ok(FieldValue::Single(parse_group(key, &fields, &self.elements)?))
            }
        }
    }
}

fn parse_group(key: &str, fields: &[String], elements: &[Element]) -> std::result::Result<Row, String> {
    elements
        .iter()
        .enumerate()
        .map(|(i, element)| match fields.get(i).map(String::as_str) {
            None | Some("") if !element.optional => Err(format!("Expected a value for {key}.")),
            None => Ok(None),
            Some(raw) => csv::parse_element(raw, element),
        })
        .collect()
}

/// Builder for a [`Schema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    file_base: &'static str,
    section: Vec<Element>,
    entries: IndexMap<&'static str, SchemaEntry>,
}

impl SchemaBuilder {
    pub fn new(file_base: &'static str) -> Self {
        Self {
            file_base,
            section: vec![Element::name()],
            entries: IndexMap::new(),
        }
    }

    /// Elements of the `[header]` line.
    pub fn section(mut self, elements: Vec<Element>) -> Self {
        self.section = elements;
        self
    }

    pub fn field(mut self, key: &'static str, entry: SchemaEntry) -> Self {
        self.entries.insert(key, entry);
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            file_base: self.file_base,
            section: self.section,
            entries: self.entries,
        }
    }
}

/// Ordered field table of one PBS file.
#[derive(Debug)]
pub struct Schema {
    file_base: &'static str,
    section: Vec<Element>,
    entries: IndexMap<&'static str, SchemaEntry>,
}

impl Schema {
    pub fn file_base(&self) -> &'static str {
        self.file_base
    }

    pub fn section_elements(&self) -> &[Element] {
        &self.section
    }

    pub fn entry(&self, key: &str) -> Option<&SchemaEntry> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &SchemaEntry)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Parse a section header into its row.
    pub fn parse_header(&self, name: &str, line: &FileLineData) -> Result<Row> {
        let fields = split_csv_line(name);
        if fields.len() > self.section.len() {
            return Err(PbsError::parse_at(
                format!(
                    "Section header has {} value(s), expected at most {}.",
                    fields.len(),
                    self.section.len()
                ),
                line,
            ));
        }
        parse_group("section", &fields, &self.section).map_err(|e| PbsError::parse_at(e, line))
    }

    /// Parse a tokenized section into a record.
    pub fn parse_section(&self, section: &PbsSection, base: &FileLineData) -> Result<Record> {
        let header_line = section.line_data(base);
        let mut record = Record::new(self.parse_header(&section.name, &header_line)?);

        for pair in &section.pairs {
            let line = header_line.with_key(&pair.key, &pair.value, pair.line_number);
            let Some(entry) = self.entry(&pair.key) else {
                return Err(PbsError::parse_at(format!("Unknown property '{}'.", pair.key), &line));
            };
            let value = entry
                .parse_line(&pair.key, &pair.value)
                .map_err(|e| PbsError::parse_at(e, &line))?;

            match (entry.structure, record.fields.get_mut(pair.key.as_str())) {
                (Structure::Repeating, Some(FieldValue::List(rows))) => {
                    rows.extend(value.rows().iter().cloned());
                }
                (Structure::Repeating, _) => {
                    record.set(pair.key.clone(), FieldValue::List(value.rows().to_vec()));
                }
                (_, Some(_)) => {
                    return Err(PbsError::parse_at(
                        format!("Property '{}' is defined more than once.", pair.key),
                        &line,
                    ));
                }
                (_, None) => record.set(pair.key.clone(), value),
            }
        }

        let missing: Vec<&str> = self
            .entries
            .iter()
            .filter(|(key, entry)| entry.required && !record.contains(key))
            .map(|(key, _)| *key)
            .collect();
        if !missing.is_empty() {
            return Err(PbsError::parse_at(
                format!(
                    "The following properties are required but were not found in the file: {}",
                    missing.join(", ")
                ),
                &header_line,
            ));
        }

        Ok(record)
    }

    /// Write a record as PBS lines, header first, keys in schema order.
    pub fn write_record(&self, record: &Record) -> Vec<String> {
        let mut lines = vec![format!("[{}]", csv::write_row(&record.section, &self.section))];

        for (key, entry) in &self.entries {
            let Some(value) = record.get(key) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            match (entry.structure, value) {
                (Structure::Repeating, _) => {
                    for row in value.rows() {
                        lines.push(format!("{} = {}", key, csv::write_row(row, &entry.elements)));
                    }
                }
                (Structure::Array, FieldValue::List(rows)) => {
                    let flat: Row = rows.iter().flatten().cloned().collect();
                    lines.push(format!("{} = {}", key, csv::write_row(&flat, &entry.elements)));
                }
                (_, _) => {
                    let row = &value.rows()[0];
                    lines.push(format!("{} = {}", key, csv::write_row(row, &entry.elements)));
                }
            }
        }
        lines
    }

    /// Every entity reference in the record, as `(kind, name, key)`.
    pub fn references(&self, record: &Record) -> Vec<(DataKind, Name, String)> {
        let mut refs = Vec::new();
        for (element, value) in self.section.iter().zip(&record.section) {
            if let (Some(kind), Some(name)) = (element.reference, value.as_ref().and_then(Value::as_name)) {
                refs.push((kind, name, "section".to_string()));
            }
        }
        for (key, entry) in &self.entries {
            for row in record.rows(key) {
                for (element, value) in entry.elements.iter().zip(row) {
                    if let (Some(kind), Some(name)) =
                        (element.reference, value.as_ref().and_then(Value::as_name))
                    {
                        refs.push((kind, name, key.to_string()));
                    }
                }
            }
        }
        refs
    }
}

/// Unwrap a value the schema guarantees, with a parse error otherwise.
pub fn require<T>(value: Option<T>, key: &str, line: &FileLineData) -> Result<T> {
    value.ok_or_else(|| PbsError::parse_at(format!("Expected a value for {key}."), line))
}

/// A PBS-shaped model with a schema and record conversions.
pub trait PbsModel: Sized {
    fn schema() -> &'static Schema;

    /// Build the model from a parsed record.
    fn from_record(record: &Record, line: &FileLineData) -> Result<Self>;

    fn to_record(&self) -> Record;
}
