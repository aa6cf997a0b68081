//! Species and their forms.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::evolution::EvolutionParameter;
use crate::registry::{DataKind, Entity};

use super::enums::STAT_PBS_ORDER;
use super::{MegaMessage, Name};

/// A species plus form number; form 0 is the base form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpeciesForm {
    pub species: Name,
    pub form: u32,
}

impl SpeciesForm {
    pub fn new(species: impl Into<Name>, form: u32) -> Self {
        Self {
            species: species.into(),
            form,
        }
    }

    pub fn base(species: impl Into<Name>) -> Self {
        Self::new(species, 0)
    }

    /// Parse `NAME` or `NAME_form`, as used by encounter slots.
    pub fn parse_suffixed(raw: &str) -> Self {
        if let Some((species, form)) = raw.rsplit_once('_') {
            if let Ok(form) = form.parse::<u32>() {
                return Self::new(species, form);
            }
        }
        Self::base(raw)
    }
}

impl From<Name> for SpeciesForm {
    fn from(species: Name) -> Self {
        Self::base(species)
    }
}

impl fmt::Display for SpeciesForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.form > 0 {
            write!(f, "{},{}", self.species, self.form)
        } else {
            write!(f, "{}", self.species)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpMove {
    pub level: u32,
    pub move_id: Name,
}

/// One evolution edge of a species.
///
/// Forward edges name the species evolved into. Previous edges
/// (`is_previous`) name the species this one evolves from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionInfo {
    pub species: Name,
    pub method: Name,
    pub parameter: Option<EvolutionParameter>,
    #[serde(default)]
    pub is_previous: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub id: SpeciesForm,
    pub name: String,
    pub form_name: Option<String>,
    pub category: String,
    pub pokedex_entry: String,
    pub pokedex_form: Option<u32>,
    pub types: Vec<Name>,
    pub base_stats: IndexMap<Name, u32>,
    pub evs: IndexMap<Name, u32>,
    pub base_exp: u32,
    pub growth_rate: Name,
    pub gender_ratio: Name,
    pub catch_rate: u32,
    pub happiness: u32,
    pub level_up_moves: Vec<LevelUpMove>,
    pub tutor_moves: Vec<Name>,
    pub egg_moves: Vec<Name>,
    pub abilities: Vec<Name>,
    pub hidden_abilities: Vec<Name>,
    pub wild_item_common: Vec<Name>,
    pub wild_item_uncommon: Vec<Name>,
    pub wild_item_rare: Vec<Name>,
    pub egg_groups: Vec<Name>,
    pub hatch_steps: u32,
    pub incense: Option<Name>,
    pub offspring: Vec<Name>,
    pub evolutions: Vec<EvolutionInfo>,
    /// Height in tenths of a metre.
    pub height: u32,
    /// Weight in tenths of a kilogram.
    pub weight: u32,
    pub color: Name,
    pub shape: Name,
    pub habitat: Option<Name>,
    pub generation: u32,
    pub flags: Vec<String>,
    pub mega_stone: Option<Name>,
    pub mega_move: Option<Name>,
    pub unmega_form: u32,
    pub mega_message: MegaMessage,
}

impl Species {
    /// A species with every field at its `pokemon.txt` default.
    pub fn new(id: SpeciesForm) -> Self {
        Self {
            id,
            name: "Unnamed".to_string(),
            form_name: None,
            category: "???".to_string(),
            pokedex_entry: "???".to_string(),
            pokedex_form: None,
            types: vec![Name::new("NORMAL")],
            base_stats: STAT_PBS_ORDER.iter().map(|s| (Name::new(s), 1)).collect(),
            evs: IndexMap::new(),
            base_exp: 100,
            growth_rate: Name::new("Medium"),
            gender_ratio: Name::new("Female50Percent"),
            catch_rate: 255,
            happiness: 70,
            level_up_moves: Vec::new(),
            tutor_moves: Vec::new(),
            egg_moves: Vec::new(),
            abilities: Vec::new(),
            hidden_abilities: Vec::new(),
            wild_item_common: Vec::new(),
            wild_item_uncommon: Vec::new(),
            wild_item_rare: Vec::new(),
            egg_groups: vec![Name::new("Undiscovered")],
            hatch_steps: 1,
            incense: None,
            offspring: Vec::new(),
            evolutions: Vec::new(),
            height: 1,
            weight: 1,
            color: Name::new("Red"),
            shape: Name::new("Head"),
            habitat: None,
            generation: 0,
            flags: Vec::new(),
            mega_stone: None,
            mega_move: None,
            unmega_form: 0,
            mega_message: MegaMessage::default(),
        }
    }

    pub fn species_id(&self) -> Name {
        self.id.species
    }

    pub fn form(&self) -> u32 {
        self.id.form
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    pub fn base_stat_total(&self) -> u32 {
        self.base_stats.values().sum()
    }

    /// Forward evolution edges.
    pub fn forward_evolutions(&self) -> impl Iterator<Item = &EvolutionInfo> {
        self.evolutions.iter().filter(|e| !e.is_previous)
    }

    /// The species this one evolves from, or itself.
    pub fn previous_species(&self) -> Name {
        self.evolutions
            .iter()
            .find(|e| e.is_previous)
            .map(|e| e.species)
            .unwrap_or(self.id.species)
    }

    /// Form index of a `DefaultForm_N` flag, if any.
    pub fn default_form(&self) -> Option<u32> {
        self.flags
            .iter()
            .find_map(|f| f.strip_prefix("DefaultForm_"))
            .and_then(|n| n.parse().ok())
    }
}

impl Entity for Species {
    type Key = SpeciesForm;
    const KIND: DataKind = DataKind::Species;

    fn key(&self) -> SpeciesForm {
        self.id
    }
}
