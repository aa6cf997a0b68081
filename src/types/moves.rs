//! Moves.

use serde::{Deserialize, Serialize};

use crate::registry::{DataKind, Entity};

use super::{MoveCategory, Name};

/// A move a Pokémon can learn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub id: Name,
    pub name: String,
    pub move_type: Option<Name>,
    pub category: MoveCategory,
    /// Base damage; 0 for status moves.
    pub power: u32,
    pub accuracy: u32,
    pub total_pp: u32,
    pub target: Option<Name>,
    pub priority: i32,
    pub function_code: String,
    pub flags: Vec<String>,
    pub effect_chance: u32,
    pub description: String,
}

impl Move {
    pub fn is_damaging(&self) -> bool {
        self.category != MoveCategory::Status
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

impl Entity for Move {
    type Key = Name;
    const KIND: DataKind = DataKind::Move;

    fn key(&self) -> Name {
        self.id
    }
}
