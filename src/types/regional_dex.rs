//! Regional Pokédex lists.

use serde::{Deserialize, Serialize};

use crate::registry::{DataKind, Entity};

use super::Name;

/// One numbered dex list, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionalDex {
    pub id: u32,
    pub species: Vec<Name>,
}

impl RegionalDex {
    /// 1-based dex number of a species in this list.
    pub fn number_of(&self, species: Name) -> Option<usize> {
        self.species.iter().position(|s| *s == species).map(|i| i + 1)
    }
}

impl Entity for RegionalDex {
    type Key = u32;
    const KIND: DataKind = DataKind::RegionalDex;

    fn key(&self) -> u32 {
        self.id
    }
}
