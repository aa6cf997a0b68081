//! Items.

use serde::{Deserialize, Serialize};

use crate::registry::{DataKind, Entity};

use super::{BattleUse, FieldUse, Name};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Name,
    pub name: String,
    pub name_plural: String,
    pub portion_name: Option<String>,
    pub portion_name_plural: Option<String>,
    pub pocket: u32,
    pub price: u32,
    pub sell_price: u32,
    pub bp_price: u32,
    pub field_use: FieldUse,
    pub battle_use: BattleUse,
    pub flags: Vec<String>,
    pub consumable: bool,
    pub show_quantity: bool,
    /// Move taught by a TM, HM or TR.
    pub move_id: Option<Name>,
    pub description: String,
}

impl Item {
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    pub fn is_poke_ball(&self) -> bool {
        self.has_flag("PokeBall")
    }

    pub fn is_machine(&self) -> bool {
        matches!(self.field_use, FieldUse::TM | FieldUse::HM | FieldUse::TR)
    }
}

impl Entity for Item {
    type Key = Name;
    const KIND: DataKind = DataKind::Item;

    fn key(&self) -> Name {
        self.id
    }
}
