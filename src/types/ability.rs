//! Abilities.

use serde::{Deserialize, Serialize};

use crate::registry::{DataKind, Entity};

use super::Name;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    pub id: Name,
    pub name: String,
    pub description: String,
    pub flags: Vec<String>,
}

impl Entity for Ability {
    type Key = Name;
    const KIND: DataKind = DataKind::Ability;

    fn key(&self) -> Name {
        self.id
    }
}
