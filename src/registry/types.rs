//! Entity kind definitions for the registry.
//!
//! Every game data set is identified by its kind. Schema elements name the
//! kind they reference so existence checks can be done generically.

use std::fmt;
use std::hash::Hash;

/// The kind of game data entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataKind {
    Type,
    Ability,
    Move,
    Item,
    Species,
    SpeciesMetrics,
    ShadowPokemon,
    Ribbon,
    RegionalDex,
    MapConnection,
    Encounter,
    EncounterType,
    TrainerType,
    Trainer,
    Metadata,
    PlayerMetadata,
    Evolution,
}

impl DataKind {
    /// Every kind, in declaration order.
    pub const ALL: [DataKind; 17] = [
        DataKind::Type,
        DataKind::Ability,
        DataKind::Move,
        DataKind::Item,
        DataKind::Species,
        DataKind::SpeciesMetrics,
        DataKind::ShadowPokemon,
        DataKind::Ribbon,
        DataKind::RegionalDex,
        DataKind::MapConnection,
        DataKind::Encounter,
        DataKind::EncounterType,
        DataKind::TrainerType,
        DataKind::Trainer,
        DataKind::Metadata,
        DataKind::PlayerMetadata,
        DataKind::Evolution,
    ];

    /// Get the short name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            DataKind::Type => "type",
            DataKind::Ability => "ability",
            DataKind::Move => "move",
            DataKind::Item => "item",
            DataKind::Species => "species",
            DataKind::SpeciesMetrics => "species_metrics",
            DataKind::ShadowPokemon => "shadow_pokemon",
            DataKind::Ribbon => "ribbon",
            DataKind::RegionalDex => "regional_dex",
            DataKind::MapConnection => "map_connection",
            DataKind::Encounter => "encounter",
            DataKind::EncounterType => "encounter_type",
            DataKind::TrainerType => "trainer_type",
            DataKind::Trainer => "trainer",
            DataKind::Metadata => "metadata",
            DataKind::PlayerMetadata => "player_metadata",
            DataKind::Evolution => "evolution",
        }
    }

    /// Whether the set is built in rather than compiled from a PBS file.
    pub fn is_builtin(&self) -> bool {
        matches!(self, DataKind::Evolution | DataKind::EncounterType)
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A stored game data entity.
pub trait Entity: Clone {
    /// Primary key type.
    type Key: Clone + Eq + Hash + fmt::Debug + fmt::Display;

    /// Kind of the set this entity lives in.
    const KIND: DataKind;

    fn key(&self) -> Self::Key;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_unique() {
        let mut names: Vec<&str> = DataKind::ALL.iter().map(|k| k.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), DataKind::ALL.len());
    }

    #[test]
    fn test_builtin_kinds() {
        assert!(DataKind::Evolution.is_builtin());
        assert!(!DataKind::Species.is_builtin());
    }
}
