//! Global and per-player metadata.

use serde::{Deserialize, Serialize};

use crate::registry::{DataKind, Entity};

use super::Name;

/// A map position and facing used for the player's home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapPosition {
    pub map: u32,
    pub x: u32,
    pub y: u32,
    pub direction: u32,
}

/// Global metadata, always section `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub id: u32,
    pub start_money: u32,
    pub start_item_storage: Vec<Name>,
    pub home: Option<MapPosition>,
    pub storage_creator: Option<String>,
    pub wild_battle_bgm: Option<String>,
    pub trainer_battle_bgm: Option<String>,
    pub wild_victory_bgm: Option<String>,
    pub trainer_victory_bgm: Option<String>,
    pub wild_capture_me: Option<String>,
    pub surf_bgm: Option<String>,
    pub bicycle_bgm: Option<String>,
}

impl Entity for Metadata {
    type Key = u32;
    const KIND: DataKind = DataKind::Metadata;

    fn key(&self) -> u32 {
        self.id
    }
}

/// Metadata for one player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMetadata {
    pub id: u32,
    pub trainer_type: Name,
    pub walk_charset: String,
    pub run_charset: String,
    pub cycle_charset: String,
    pub surf_charset: String,
    pub dive_charset: String,
    pub fish_charset: String,
    pub surf_fish_charset: String,
    pub home: Option<MapPosition>,
}

impl Entity for PlayerMetadata {
    type Key = u32;
    const KIND: DataKind = DataKind::PlayerMetadata;

    fn key(&self) -> u32 {
        self.id
    }
}
