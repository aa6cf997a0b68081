//! Evolution rules.
//!
//! An [`Evolution`] is a named method such as `Level` or `TradeItem`, with
//! the kind of parameter it takes. The runtime checks for each method live
//! in a [`MethodEvaluator`]; [`EvolutionService`] validates at construction
//! that every evaluator agrees with the method table and then dispatches by
//! method name.
//!
//! # Example
//!
//! ```ignore
//! use pbs::evolution::EvolutionService;
//!
//! let service = EvolutionService::with_defaults(&data.evolutions)?;
//! let param = EvolutionParameter::Int(16);
//! if service.on_level_up(Name::new("Level"), &mut pokemon, &mut env, Some(&param)) {
//!     // evolve
//! }
//! ```

mod evaluator;
mod family;
mod methods;
mod parameter;
mod pokemon;
mod service;

use serde::{Deserialize, Serialize};

use crate::registry::{DataKind, Entity};
use crate::types::Name;

pub use evaluator::{
    BattleBondCanEvolve, CanEvolveEvaluator, EvaluatorBuilder, EverstoneCanEvolve,
    EvolutionConditions, IsEggCanEvolve, MethodEvaluator,
};
pub use family::{
    baby_species, breeding_can_produce, evolutions, family_species, previous_species, FamilyEdge,
};
pub use methods::default_evaluators;
pub use parameter::{EvolutionParameter, ItemId, MoveId, ParameterKind, ParameterValue, TypeId};
pub use pokemon::{
    EvolutionEnvironment, KnownMove, OverworldWeather, Pokemon, TimeOfDay, TravelMode,
};
pub use service::EvolutionService;

/// A named evolution method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evolution {
    pub id: Name,
    pub name: String,
    /// Kind of parameter the method takes, if any.
    pub parameter: Option<ParameterKind>,
    /// Checked on every level up, not only when a level is reached.
    pub any_level_up: bool,
}

impl Entity for Evolution {
    type Key = Name;
    const KIND: DataKind = DataKind::Evolution;

    fn key(&self) -> Name {
        self.id
    }
}

/// `(id, parameter, any_level_up)` for every built-in method.
const DEFAULT_METHODS: &[(&str, Option<ParameterKind>, bool)] = {
    use ParameterKind::{Int, Item, Move, Name as Text, Species, Type};
    &[
        ("Level", Some(Int), false),
        ("LevelMale", Some(Int), false),
        ("LevelFemale", Some(Int), false),
        ("LevelDay", Some(Int), false),
        ("LevelNight", Some(Int), false),
        ("LevelMorning", Some(Int), false),
        ("LevelAfternoon", Some(Int), false),
        ("LevelEvening", Some(Int), false),
        ("LevelNoWeather", Some(Int), false),
        ("LevelSun", Some(Int), false),
        ("LevelRain", Some(Int), false),
        ("LevelSnow", Some(Int), false),
        ("LevelSandstorm", Some(Int), false),
        ("LevelCycling", Some(Int), false),
        ("LevelSurfing", Some(Int), false),
        ("LevelDiving", Some(Int), false),
        ("LevelDarkness", Some(Int), false),
        ("LevelDarkInParty", Some(Int), false),
        ("AttackGreater", Some(Int), false),
        ("AtkDefEqual", Some(Int), false),
        ("DefenseGreater", Some(Int), false),
        ("Silcoon", Some(Int), false),
        ("Cascoon", Some(Int), false),
        ("Ninjask", Some(Int), false),
        ("Shedinja", Some(Int), false),
        ("Happiness", None, true),
        ("HappinessMale", None, true),
        ("HappinessFemale", None, true),
        ("HappinessDay", None, true),
        ("HappinessNight", None, true),
        ("HappinessMove", Some(Move), true),
        ("HappinessMoveType", Some(Type), true),
        ("HappinessHoldItem", Some(Item), true),
        ("MaxHappiness", None, true),
        ("Beauty", Some(Int), true),
        ("HoldItem", Some(Item), true),
        ("HoldItemMale", Some(Item), true),
        ("HoldItemFemale", Some(Item), true),
        ("DayHoldItem", Some(Item), true),
        ("NightHoldItem", Some(Item), true),
        ("HoldItemHappiness", Some(Item), true),
        ("HasMove", Some(Move), true),
        ("HasMoveType", Some(Type), true),
        ("HasInParty", Some(Species), true),
        ("Location", Some(Int), true),
        ("LocationFlag", Some(Text), true),
        ("Region", Some(Int), true),
        ("Item", Some(Item), false),
        ("ItemMale", Some(Item), false),
        ("ItemFemale", Some(Item), false),
        ("ItemDay", Some(Item), false),
        ("ItemNight", Some(Item), false),
        ("ItemHappiness", Some(Item), false),
        ("Trade", None, false),
        ("TradeMale", None, false),
        ("TradeFemale", None, false),
        ("TradeDay", None, false),
        ("TradeNight", None, false),
        ("TradeItem", Some(Item), false),
        ("TradeSpecies", Some(Species), false),
        ("BattleDealCriticalHit", Some(Int), false),
        ("Event", Some(Int), false),
        ("EventAfterDamageTaken", Some(Int), false),
    ]
};

impl Evolution {
    /// The built-in method table.
    pub fn defaults() -> Vec<Evolution> {
        DEFAULT_METHODS
            .iter()
            .map(|(id, parameter, any_level_up)| Evolution {
                id: Name::new(id),
                name: id.to_string(),
                parameter: *parameter,
                any_level_up: *any_level_up,
            })
            .collect()
    }
}
