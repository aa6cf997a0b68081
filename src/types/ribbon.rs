//! Ribbons.

use serde::{Deserialize, Serialize};

use crate::registry::{DataKind, Entity};

use super::Name;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ribbon {
    pub id: Name,
    pub name: String,
    pub icon_position: u32,
    pub description: String,
    pub flags: Vec<String>,
}

impl Entity for Ribbon {
    type Key = Name;
    const KIND: DataKind = DataKind::Ribbon;

    fn key(&self) -> Name {
        self.id
    }
}
