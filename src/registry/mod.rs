//! Game data registry.
//!
//! The registry holds one [`DataSet`] per entity kind. It is an explicit
//! context object: compilers receive it by reference, import into it, and
//! later compilers read what earlier ones imported.
//!
//! # Example
//!
//! ```ignore
//! use pbs::registry::GameData;
//!
//! let mut data = GameData::new();
//! data.types.import(compiled_types);
//!
//! let fire = data.types.try_get(&Name::new("FIRE"))?;
//! ```

mod data_set;
pub mod types;

pub use data_set::DataSet;
pub use types::{DataKind, Entity};

use crate::evolution::Evolution;
use crate::types::{
    Ability, Encounter, EncounterType, Item, MapConnection, Metadata, Move, Name, PlayerMetadata,
    PokemonType, RegionalDex, Ribbon, ShadowPokemon, Species, SpeciesForm, SpeciesMetrics,
    Trainer, TrainerType,
};

/// Every entity set of a game.
#[derive(Debug, Clone)]
pub struct GameData {
    pub types: DataSet<PokemonType>,
    pub abilities: DataSet<Ability>,
    pub moves: DataSet<Move>,
    pub items: DataSet<Item>,
    pub species: DataSet<Species>,
    pub species_metrics: DataSet<SpeciesMetrics>,
    pub shadow_pokemon: DataSet<ShadowPokemon>,
    pub ribbons: DataSet<Ribbon>,
    pub regional_dexes: DataSet<RegionalDex>,
    pub map_connections: DataSet<MapConnection>,
    pub encounters: DataSet<Encounter>,
    pub encounter_types: DataSet<EncounterType>,
    pub trainer_types: DataSet<TrainerType>,
    pub trainers: DataSet<Trainer>,
    pub metadata: DataSet<Metadata>,
    pub player_metadata: DataSet<PlayerMetadata>,
    pub evolutions: DataSet<Evolution>,
    /// Map names by id, supplied by the map layer when known.
    pub map_names: std::collections::HashMap<u32, String>,
}

impl Default for GameData {
    fn default() -> Self {
        Self::new()
    }
}

impl GameData {
    /// Create a registry with the built-in tables loaded.
    pub fn new() -> Self {
        let mut data = Self::empty();
        data.evolutions.import(Evolution::defaults());
        data.encounter_types.import(EncounterType::defaults());
        data
    }

    /// Create a registry with nothing loaded, not even the built-in tables.
    pub fn empty() -> Self {
        Self {
            types: DataSet::new(),
            abilities: DataSet::new(),
            moves: DataSet::new(),
            items: DataSet::new(),
            species: DataSet::new(),
            species_metrics: DataSet::new(),
            shadow_pokemon: DataSet::new(),
            ribbons: DataSet::new(),
            regional_dexes: DataSet::new(),
            map_connections: DataSet::new(),
            encounters: DataSet::new(),
            encounter_types: DataSet::new(),
            trainer_types: DataSet::new(),
            trainers: DataSet::new(),
            metadata: DataSet::new(),
            player_metadata: DataSet::new(),
            evolutions: DataSet::new(),
            map_names: Default::default(),
        }
    }

    /// Whether the set of the given kind has been imported.
    pub fn is_loaded(&self, kind: DataKind) -> bool {
        match kind {
            DataKind::Type => self.types.is_loaded(),
            DataKind::Ability => self.abilities.is_loaded(),
            DataKind::Move => self.moves.is_loaded(),
            DataKind::Item => self.items.is_loaded(),
            DataKind::Species => self.species.is_loaded(),
            DataKind::SpeciesMetrics => self.species_metrics.is_loaded(),
            DataKind::ShadowPokemon => self.shadow_pokemon.is_loaded(),
            DataKind::Ribbon => self.ribbons.is_loaded(),
            DataKind::RegionalDex => self.regional_dexes.is_loaded(),
            DataKind::MapConnection => self.map_connections.is_loaded(),
            DataKind::Encounter => self.encounters.is_loaded(),
            DataKind::EncounterType => self.encounter_types.is_loaded(),
            DataKind::TrainerType => self.trainer_types.is_loaded(),
            DataKind::Trainer => self.trainers.is_loaded(),
            DataKind::Metadata => self.metadata.is_loaded(),
            DataKind::PlayerMetadata => self.player_metadata.is_loaded(),
            DataKind::Evolution => self.evolutions.is_loaded(),
        }
    }

    /// Number of entities of the given kind.
    pub fn len(&self, kind: DataKind) -> usize {
        match kind {
            DataKind::Type => self.types.len(),
            DataKind::Ability => self.abilities.len(),
            DataKind::Move => self.moves.len(),
            DataKind::Item => self.items.len(),
            DataKind::Species => self.species.len(),
            DataKind::SpeciesMetrics => self.species_metrics.len(),
            DataKind::ShadowPokemon => self.shadow_pokemon.len(),
            DataKind::Ribbon => self.ribbons.len(),
            DataKind::RegionalDex => self.regional_dexes.len(),
            DataKind::MapConnection => self.map_connections.len(),
            DataKind::Encounter => self.encounters.len(),
            DataKind::EncounterType => self.encounter_types.len(),
            DataKind::TrainerType => self.trainer_types.len(),
            DataKind::Trainer => self.trainers.len(),
            DataKind::Metadata => self.metadata.len(),
            DataKind::PlayerMetadata => self.player_metadata.len(),
            DataKind::Evolution => self.evolutions.len(),
        }
    }

    /// Whether an entity named `name` exists in the set of `kind`.
    ///
    /// Species are looked up by their base form. Kinds without a name key
    /// never contain a name.
    pub fn contains_name(&self, kind: DataKind, name: Name) -> bool {
        match kind {
            DataKind::Type => self.types.exists(&name),
            DataKind::Ability => self.abilities.exists(&name),
            DataKind::Move => self.moves.exists(&name),
            DataKind::Item => self.items.exists(&name),
            DataKind::Species => self.species.exists(&SpeciesForm::base(name)),
            DataKind::Ribbon => self.ribbons.exists(&name),
            DataKind::EncounterType => self.encounter_types.exists(&name),
            DataKind::TrainerType => self.trainer_types.exists(&name),
            DataKind::Evolution => self.evolutions.exists(&name),
            DataKind::SpeciesMetrics
            | DataKind::ShadowPokemon
            | DataKind::RegionalDex
            | DataKind::MapConnection
            | DataKind::Encounter
            | DataKind::Trainer
            | DataKind::Metadata
            | DataKind::PlayerMetadata => false,
        }
    }

    /// Base forms of every species, in import order.
    pub fn all_species(&self) -> impl Iterator<Item = &Species> {
        self.species.iter().filter(|s| s.form() == 0)
    }

    /// Look up a species form, falling back to the base form.
    pub fn species_form(&self, species: Name, form: u32) -> Option<&Species> {
        self.species
            .get(&SpeciesForm::new(species, form))
            .or_else(|| self.species.get(&SpeciesForm::base(species)))
    }

    /// Name of a map, when known.
    pub fn map_name(&self, map: u32) -> Option<&str> {
        self.map_names.get(&map).map(String::as_str)
    }

    /// Counts of every loaded kind, in declaration order.
    pub fn summary(&self) -> Vec<(DataKind, usize)> {
        DataKind::ALL
            .iter()
            .filter(|k| self.is_loaded(**k))
            .map(|k| (*k, self.len(*k)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ribbon(id: &str) -> Ribbon {
        Ribbon {
            id: Name::new(id),
            name: id.to_string(),
            icon_position: 0,
            description: String::new(),
            flags: vec![],
        }
    }

    #[test]
    fn test_new_preloads_builtin_tables() {
        let data = GameData::new();
        assert!(data.is_loaded(DataKind::Evolution));
        assert!(data.is_loaded(DataKind::EncounterType));
        assert!(!data.is_loaded(DataKind::Species));
        assert!(data.contains_name(DataKind::Evolution, Name::new("Level")));
        assert!(data.contains_name(DataKind::EncounterType, Name::new("Land")));
    }

    #[test]
    fn test_contains_name_by_kind() {
        let mut data = GameData::new();
        data.ribbons.import(vec![ribbon("HOENNCOOL")]);
        assert!(data.contains_name(DataKind::Ribbon, Name::new("HOENNCOOL")));
        assert!(!data.contains_name(DataKind::Ribbon, Name::new("HOENNBEAUTY")));
        assert!(!data.contains_name(DataKind::Trainer, Name::new("HOENNCOOL")));
    }

    #[test]
    fn test_summary_lists_loaded_kinds() {
        let mut data = GameData::empty();
        data.ribbons.import(vec![ribbon("A"), ribbon("B")]);
        assert_eq!(data.summary(), vec![(DataKind::Ribbon, 2)]);
    }
}
