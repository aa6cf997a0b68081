//! Elemental types and their matchups.

use serde::{Deserialize, Serialize};

use crate::registry::{DataKind, Entity};

use super::Name;

/// An elemental type such as `FIRE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokemonType {
    pub id: Name,
    pub name: String,
    pub icon_position: u32,
    pub is_special_type: bool,
    pub is_pseudo_type: bool,
    /// Types that deal double damage to this one.
    pub weaknesses: Vec<Name>,
    pub resistances: Vec<Name>,
    pub immunities: Vec<Name>,
    pub flags: Vec<String>,
}

impl PokemonType {
    pub fn is_physical_type(&self) -> bool {
        !self.is_special_type
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

impl Entity for PokemonType {
    type Key = Name;
    const KIND: DataKind = DataKind::Type;

    fn key(&self) -> Name {
        self.id
    }
}
