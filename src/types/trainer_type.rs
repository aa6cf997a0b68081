//! Trainer classes.

use serde::{Deserialize, Serialize};

use crate::registry::{DataKind, Entity};

use super::{Name, TrainerGender};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerType {
    pub id: Name,
    pub name: String,
    pub gender: TrainerGender,
    pub base_money: u32,
    pub skill_level: u32,
    pub flags: Vec<String>,
    pub intro_bgm: Option<String>,
    pub battle_bgm: Option<String>,
    pub victory_bgm: Option<String>,
}

impl TrainerType {
    pub fn is_male(&self) -> bool {
        self.gender == TrainerGender::Male
    }

    pub fn is_female(&self) -> bool {
        self.gender == TrainerGender::Female
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

impl Entity for TrainerType {
    type Key = Name;
    const KIND: DataKind = DataKind::TrainerType;

    fn key(&self) -> Name {
        self.id
    }
}
