//! Runtime state the evolution checks read.
//!
//! These are deliberately small: only what the built-in methods look at.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::enums::PokemonGender;
use crate::types::Name;

/// A move a Pokémon knows, with its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownMove {
    pub id: Name,
    pub move_type: Name,
}

/// A party Pokémon as seen by the evolution checks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pokemon {
    pub species: Name,
    pub form: u32,
    pub level: u32,
    pub gender: Option<PokemonGender>,
    pub happiness: u32,
    pub beauty: u32,
    pub personality_value: u32,
    pub attack: u32,
    pub defense: u32,
    pub types: Vec<Name>,
    pub moves: Vec<KnownMove>,
    pub item: Option<Name>,
    pub ability: Option<Name>,
    pub is_egg: bool,
    pub tags: HashSet<String>,
}

impl Pokemon {
    pub fn new(species: impl Into<Name>, level: u32) -> Self {
        Self {
            species: species.into(),
            level,
            ..Self::default()
        }
    }

    pub fn is_male(&self) -> bool {
        self.gender == Some(PokemonGender::Male)
    }

    pub fn is_female(&self) -> bool {
        self.gender == Some(PokemonGender::Female)
    }

    pub fn has_item(&self, item: Name) -> bool {
        self.item == Some(item)
    }

    pub fn has_ability(&self, ability: Name) -> bool {
        self.ability == Some(ability)
    }

    pub fn has_type(&self, ty: Name) -> bool {
        self.types.contains(&ty)
    }

    pub fn knows_move(&self, id: Name) -> bool {
        self.moves.iter().any(|m| m.id == id)
    }

    pub fn knows_move_of_type(&self, ty: Name) -> bool {
        self.moves.iter().any(|m| m.move_type == ty)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeOfDay {
    Morning,
    #[default]
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn is_day(self) -> bool {
        self != TimeOfDay::Night
    }

    pub fn is_night(self) -> bool {
        self == TimeOfDay::Night
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverworldWeather {
    #[default]
    None,
    Sun,
    Rain,
    Snow,
    Sandstorm,
    /// Any weather the level methods do not name.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TravelMode {
    #[default]
    Walking,
    Cycling,
    Surfing,
    Diving,
}

/// The world around an evolving Pokémon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionEnvironment {
    pub time_of_day: TimeOfDay,
    pub weather: OverworldWeather,
    pub travel: TravelMode,
    pub map_id: u32,
    pub region: u32,
    /// Flags of the current map, e.g. `DarkMap`.
    pub map_flags: Vec<String>,
    /// The other party members.
    pub party: Vec<Pokemon>,
    pub party_limit: usize,
    /// Item counts in the bag.
    pub bag: HashMap<Name, u32>,
    /// Critical hits landed in the last battle, by party index.
    pub critical_hits: Vec<u32>,
    /// Lowers the happiness threshold from 220 to 160.
    pub happiness_soft_cap: bool,
}

impl Default for EvolutionEnvironment {
    fn default() -> Self {
        Self {
            time_of_day: TimeOfDay::default(),
            weather: OverworldWeather::default(),
            travel: TravelMode::default(),
            map_id: 0,
            region: 0,
            map_flags: Vec::new(),
            party: Vec::new(),
            party_limit: 6,
            bag: HashMap::new(),
            critical_hits: Vec::new(),
            happiness_soft_cap: false,
        }
    }
}

impl EvolutionEnvironment {
    pub fn has_map_flag(&self, flag: &str) -> bool {
        self.map_flags.iter().any(|f| f == flag)
    }

    /// Whether the party has room, counting the evolving Pokémon.
    pub fn party_full(&self) -> bool {
        self.party.len() + 1 >= self.party_limit
    }

    pub fn bag_has(&self, item: Name) -> bool {
        self.bag.get(&item).copied().unwrap_or(0) > 0
    }

    /// Remove one of `item` from the bag; false when there is none.
    pub fn take_from_bag(&mut self, item: Name) -> bool {
        match self.bag.get_mut(&item) {
            Some(count) if *count > 0 => {
                *count -= 1;
                if *count == 0 {
                    self.bag.remove(&item);
                }
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_from_bag() {
        let ball = Name::new("POKEBALL");
        let mut env = EvolutionEnvironment::default();
        env.bag.insert(ball, 1);
        assert!(env.take_from_bag(ball));
        assert!(!env.bag_has(ball));
        assert!(!env.take_from_bag(ball));
    }

    #[test]
    fn test_party_full_counts_self() {
        let mut env = EvolutionEnvironment::default();
        env.party = vec![Pokemon::new("A", 1); 4];
        assert!(!env.party_full());
        env.party.push(Pokemon::new("B", 1));
        assert!(env.party_full());
    }

    #[test]
    fn test_time_of_day() {
        assert!(TimeOfDay::Morning.is_day());
        assert!(TimeOfDay::Evening.is_day());
        assert!(TimeOfDay::Night.is_night());
    }
}
