//! Shadow Pokémon data.

use serde::{Deserialize, Serialize};

use crate::registry::{DataKind, Entity};

use super::{Name, SpeciesForm};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowPokemon {
    pub id: SpeciesForm,
    pub gauge_size: u32,
    pub moves: Vec<Name>,
    pub flags: Vec<String>,
}

impl ShadowPokemon {
    pub const MAX_GAUGE_SIZE: u32 = 4000;
}

impl Entity for ShadowPokemon {
    type Key = SpeciesForm;
    const KIND: DataKind = DataKind::ShadowPokemon;

    fn key(&self) -> SpeciesForm {
        self.id
    }
}
