//! Core game data types.
//!
//! Every compiled entity lives here, keyed by an interned [`Name`] or a
//! composite key. Entities are immutable once imported into a
//! [`GameData`](crate::registry::GameData) registry.

mod ability;
mod encounter;
pub mod enums;
mod item;
mod map_connection;
mod metadata;
mod metrics;
mod moves;
mod name;
mod pokemon_type;
mod regional_dex;
mod ribbon;
mod shadow;
mod species;
mod trainer;
mod trainer_type;

pub use ability::Ability;
pub use encounter::{Encounter, EncounterId, EncounterSlot, EncounterTrigger, EncounterType};
pub use enums::{BattleUse, FieldUse, MegaMessage, MoveCategory, PokemonGender, TrainerGender};
pub use item::Item;
pub use map_connection::{Direction, MapConnection};
pub use metadata::{MapPosition, Metadata, PlayerMetadata};
pub use metrics::{Point, SpeciesMetrics};
pub use moves::Move;
pub use name::Name;
pub use pokemon_type::PokemonType;
pub use regional_dex::RegionalDex;
pub use ribbon::Ribbon;
pub use shadow::ShadowPokemon;
pub use species::{EvolutionInfo, LevelUpMove, Species, SpeciesForm};
pub use trainer::{Trainer, TrainerKey, TrainerPokemon};
pub use trainer_type::TrainerType;
