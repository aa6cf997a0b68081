//! Sprite positioning for each species form.

use serde::{Deserialize, Serialize};

use crate::registry::{DataKind, Entity};

use super::SpeciesForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesMetrics {
    pub id: SpeciesForm,
    pub back_sprite: Point,
    pub front_sprite: Point,
    pub front_sprite_altitude: i32,
    pub shadow_x: i32,
    pub shadow_size: u32,
}

impl SpeciesMetrics {
    /// Metrics used when a form has none of its own.
    pub fn default_for(id: SpeciesForm) -> Self {
        Self {
            id,
            back_sprite: Point::default(),
            front_sprite: Point::default(),
            front_sprite_altitude: 0,
            shadow_x: 0,
            shadow_size: 2,
        }
    }
}

impl Entity for SpeciesMetrics {
    type Key = SpeciesForm;
    const KIND: DataKind = DataKind::SpeciesMetrics;

    fn key(&self) -> SpeciesForm {
        self.id
    }
}
