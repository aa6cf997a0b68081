//! Evolution method parameters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Name, SpeciesForm};

/// Kind of value an evolution method takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterKind {
    Int,
    Item,
    Move,
    Type,
    Species,
    Name,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ParameterKind::Int => "Int",
            ParameterKind::Item => "Item",
            ParameterKind::Move => "Move",
            ParameterKind::Type => "Type",
            ParameterKind::Species => "Species",
            ParameterKind::Name => "Name",
        };
        f.write_str(label)
    }
}

/// A parsed evolution parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum EvolutionParameter {
    Int(i64),
    Item(Name),
    Move(Name),
    Type(Name),
    Species(SpeciesForm),
    Name(Name),
}

impl EvolutionParameter {
    /// Parse the raw text of an `Evolutions` parameter for a method of `kind`.
    pub fn parse(kind: ParameterKind, raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("Expected an evolution parameter.".to_string());
        }
        Ok(match kind {
            ParameterKind::Int => EvolutionParameter::Int(
                raw.parse()
                    .map_err(|_| format!("Field '{raw}' is not an integer."))?,
            ),
            ParameterKind::Item => EvolutionParameter::Item(Name::new(raw)),
            ParameterKind::Move => EvolutionParameter::Move(Name::new(raw)),
            ParameterKind::Type => EvolutionParameter::Type(Name::new(raw)),
            ParameterKind::Species => EvolutionParameter::Species(SpeciesForm::base(raw)),
            ParameterKind::Name => EvolutionParameter::Name(Name::new(raw)),
        })
    }

    pub fn kind(&self) -> ParameterKind {
        match self {
            EvolutionParameter::Int(_) => ParameterKind::Int,
            EvolutionParameter::Item(_) => ParameterKind::Item,
            EvolutionParameter::Move(_) => ParameterKind::Move,
            EvolutionParameter::Type(_) => ParameterKind::Type,
            EvolutionParameter::Species(_) => ParameterKind::Species,
            EvolutionParameter::Name(_) => ParameterKind::Name,
        }
    }

    /// The referenced name, for every kind but `Int`.
    pub fn as_name(&self) -> Option<Name> {
        match self {
            EvolutionParameter::Int(_) => None,
            EvolutionParameter::Item(n)
            | EvolutionParameter::Move(n)
            | EvolutionParameter::Type(n)
            | EvolutionParameter::Name(n) => Some(*n),
            EvolutionParameter::Species(s) => Some(s.species),
        }
    }
}

impl fmt::Display for EvolutionParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvolutionParameter::Int(n) => write!(f, "{n}"),
            EvolutionParameter::Species(s) => write!(f, "{}", s.species),
            EvolutionParameter::Item(n)
            | EvolutionParameter::Move(n)
            | EvolutionParameter::Type(n)
            | EvolutionParameter::Name(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(pub Name);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveId(pub Name);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub Name);

/// A Rust type an evaluator can receive its parameter as.
///
/// `()` stands for methods that take no parameter.
pub trait ParameterValue: Sized + 'static {
    const KIND: Option<ParameterKind>;

    /// Extract the typed value; `None` when the kinds disagree.
    fn extract(parameter: Option<&EvolutionParameter>) -> Option<Self>;
}

impl ParameterValue for () {
    const KIND: Option<ParameterKind> = None;

    fn extract(parameter: Option<&EvolutionParameter>) -> Option<Self> {
        match parameter {
            None => Some(()),
            Some(_) => None,
        }
    }
}

macro_rules! parameter_value {
    ($ty:ty, $kind:ident, $param:pat => $value:expr) => {
        impl ParameterValue for $ty {
            const KIND: Option<ParameterKind> = Some(ParameterKind::$kind);

            fn extract(parameter: Option<&EvolutionParameter>) -> Option<Self> {
                match parameter {
                    Some($param) => Some($value),
                    _ => None,
                }
            }
        }
    };
}

parameter_value!(i64, Int, EvolutionParameter::Int(n) => *n);
parameter_value!(ItemId, Item, EvolutionParameter::Item(n) => ItemId(*n));
parameter_value!(MoveId, Move, EvolutionParameter::Move(n) => MoveId(*n));
parameter_value!(TypeId, Type, EvolutionParameter::Type(n) => TypeId(*n));
parameter_value!(SpeciesForm, Species, EvolutionParameter::Species(s) => *s);
parameter_value!(Name, Name, EvolutionParameter::Name(n) => *n);
