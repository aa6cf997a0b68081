//! Enemy trainers and their parties.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::registry::{DataKind, Entity};

use super::{Name, PokemonGender};

/// Trainer type, name and optional version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrainerKey {
    pub trainer_type: Name,
    pub name: String,
    pub version: u32,
}

impl TrainerKey {
    pub fn new(trainer_type: impl Into<Name>, name: impl Into<String>, version: u32) -> Self {
        Self {
            trainer_type: trainer_type.into(),
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for TrainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version > 0 {
            write!(f, "{},{},{}", self.trainer_type, self.name, self.version)
        } else {
            write!(f, "{},{}", self.trainer_type, self.name)
        }
    }
}

/// One Pokémon of a trainer's party.
///
/// `iv` and `ev` always hold six values in stat order once compiled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainerPokemon {
    pub species: Name,
    pub level: u32,
    pub form: Option<u32>,
    pub name: Option<String>,
    pub moves: Vec<Name>,
    pub ability: Option<Name>,
    pub ability_index: Option<u32>,
    pub item: Option<Name>,
    pub gender: Option<PokemonGender>,
    pub nature: Option<Name>,
    pub iv: Vec<u32>,
    pub ev: Vec<u32>,
    pub happiness: Option<u32>,
    pub shiny: bool,
    pub super_shiny: bool,
    pub shadow: bool,
    pub ball: Option<Name>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trainer {
    pub id: TrainerKey,
    pub items: Vec<Name>,
    pub lose_text: Option<String>,
    pub pokemon: Vec<TrainerPokemon>,
}

impl Entity for Trainer {
    type Key = TrainerKey;
    const KIND: DataKind = DataKind::Trainer;

    fn key(&self) -> TrainerKey {
        self.id.clone()
    }
}
