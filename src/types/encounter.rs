//! Wild encounter tables.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::registry::{DataKind, Entity};

use super::{Name, SpeciesForm};

/// What triggers an encounter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterTrigger {
    None,
    Land,
    Cave,
    Water,
    Fishing,
    Contest,
}

/// A built-in encounter type such as `Land` or `OldRod`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterType {
    pub id: Name,
    pub trigger: EncounterTrigger,
    /// Default step chance when the type line gives none.
    pub trigger_chance: u32,
}

impl EncounterType {
    fn new(id: &str, trigger: EncounterTrigger, trigger_chance: u32) -> Self {
        Self {
            id: Name::new(id),
            trigger,
            trigger_chance,
        }
    }

    /// The default encounter type table.
    pub fn defaults() -> Vec<EncounterType> {
        use EncounterTrigger::{Cave, Contest, Fishing, Land, Water};
        let mut types = Vec::new();
        for suffix in ["", "Day", "Night", "Morning", "Afternoon", "Evening"] {
            types.push(Self::new(&format!("Land{suffix}"), Land, 21));
        }
        types.push(Self::new("PokeRadar", Land, 20));
        for suffix in ["", "Day", "Night", "Morning", "Afternoon", "Evening"] {
            types.push(Self::new(&format!("Cave{suffix}"), Cave, 5));
        }
        for suffix in ["", "Day", "Night", "Morning", "Afternoon", "Evening"] {
            types.push(Self::new(&format!("Water{suffix}"), Water, 2));
        }
        for rod in ["OldRod", "GoodRod", "SuperRod"] {
            types.push(Self::new(rod, Fishing, 0));
        }
        types.push(Self::new("RockSmash", EncounterTrigger::None, 50));
        types.push(Self::new("HeadbuttLow", EncounterTrigger::None, 0));
        types.push(Self::new("HeadbuttHigh", EncounterTrigger::None, 0));
        types.push(Self::new("BugContest", Contest, 21));
        types
    }
}

impl Entity for EncounterType {
    type Key = Name;
    const KIND: DataKind = DataKind::EncounterType;

    fn key(&self) -> Name {
        self.id
    }
}

/// Map id plus map version; version 0 is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EncounterId {
    pub map: u32,
    pub version: u32,
}

impl EncounterId {
    pub const fn new(map: u32, version: u32) -> Self {
        Self { map, version }
    }
}

impl fmt::Display for EncounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version > 0 {
            write!(f, "{:03},{}", self.map, self.version)
        } else {
            write!(f, "{:03}", self.map)
        }
    }
}

/// One weighted slot of an encounter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterSlot {
    pub chance: u32,
    pub species: SpeciesForm,
    pub min_level: u32,
    pub max_level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    pub id: EncounterId,
    pub step_chances: IndexMap<Name, u32>,
    pub types: IndexMap<Name, Vec<EncounterSlot>>,
}

impl Encounter {
    pub fn has_type(&self, encounter_type: Name) -> bool {
        self.types.get(&encounter_type).is_some_and(|s| !s.is_empty())
    }
}

impl Entity for Encounter {
    type Key = EncounterId;
    const KIND: DataKind = DataKind::Encounter;

    fn key(&self) -> EncounterId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_trigger_chances() {
        let types = EncounterType::defaults();
        let chance = |id: &str| {
            types
                .iter()
                .find(|t| t.id == id)
                .map(|t| t.trigger_chance)
        };
        assert_eq!(chance("Land"), Some(21));
        assert_eq!(chance("PokeRadar"), Some(20));
        assert_eq!(chance("CaveNight"), Some(5));
        assert_eq!(chance("WaterDay"), Some(2));
        assert_eq!(chance("SuperRod"), Some(0));
        assert_eq!(chance("RockSmash"), Some(50));
        assert_eq!(chance("BugContest"), Some(21));
    }

    #[test]
    fn test_id_display() {
        assert_eq!(EncounterId::new(5, 0).to_string(), "005");
        assert_eq!(EncounterId::new(12, 1).to_string(), "012,1");
    }
}
