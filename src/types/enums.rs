//! Static enumerations used by PBS fields.
//!
//! Most of these only exist as name tables for validation. The few the
//! compilers branch on are real Rust enums generated by [`name_enum!`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::EnumTable;

macro_rules! name_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident in $table:ident = $label:literal {
            $($variant:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        $vis enum $name {
            $($variant),+
        }

        pub static $table: EnumTable = EnumTable::new($label, &[$(stringify!($variant)),+]);

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }

            /// Case-insensitive lookup by name.
            pub fn from_name(raw: &str) -> Option<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(raw))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

name_enum! {
    /// Damage category of a move.
    pub enum MoveCategory in MOVE_CATEGORIES = "DamageCategory" {
        Physical,
        Special,
        Status,
    }
}

name_enum! {
    /// How an item is used outside battle.
    pub enum FieldUse in FIELD_USES = "FieldUse" {
        NoFieldUse,
        OnPokemon,
        Direct,
        TM,
        HM,
        TR,
    }
}

name_enum! {
    /// How an item is used in battle.
    pub enum BattleUse in BATTLE_USES = "BattleUse" {
        NoBattleUse,
        OnPokemon,
        OnMove,
        OnBattler,
        OnFoe,
        Direct,
    }
}

name_enum! {
    pub enum TrainerGender in TRAINER_GENDERS = "TrainerGender" {
        Male,
        Female,
        Unknown,
        Mixed,
    }
}

name_enum! {
    pub enum PokemonGender in POKEMON_GENDERS = "PokemonGender" {
        Male,
        Female,
        Genderless,
    }
}

name_enum! {
    /// Message shown when a Pokémon mega evolves.
    pub enum MegaMessage in MEGA_MESSAGES = "MegaMessageType" {
        Normal,
        Move,
    }
}

impl Default for MegaMessage {
    fn default() -> Self {
        MegaMessage::Normal
    }
}

/// Main stats, in declaration order.
pub static STATS: EnumTable = EnumTable::new(
    "Stat",
    &["HP", "ATTACK", "DEFENSE", "SPECIAL_ATTACK", "SPECIAL_DEFENSE", "SPEED"],
);

/// Order in which `BaseStats` values are written in `pokemon.txt`.
pub const STAT_PBS_ORDER: [&str; 6] = [
    "HP",
    "ATTACK",
    "DEFENSE",
    "SPEED",
    "SPECIAL_ATTACK",
    "SPECIAL_DEFENSE",
];

pub static GENDER_RATIOS: EnumTable = EnumTable::new(
    "GenderRatio",
    &[
        "AlwaysMale",
        "AlwaysFemale",
        "Genderless",
        "FemaleOneEighth",
        "Female25Percent",
        "Female50Percent",
        "Female75Percent",
        "FemaleSevenEighths",
    ],
);

pub static GROWTH_RATES: EnumTable = EnumTable::new(
    "GrowthRate",
    &["Medium", "Erratic", "Fluctuating", "Parabolic", "Fast", "Slow"],
);

pub static EGG_GROUPS: EnumTable = EnumTable::new(
    "EggGroup",
    &[
        "Undiscovered",
        "Monster",
        "Water1",
        "Bug",
        "Flying",
        "Field",
        "Fairy",
        "Grass",
        "Humanlike",
        "Water3",
        "Mineral",
        "Amorphous",
        "Water2",
        "Ditto",
        "Dragon",
    ],
);

pub static BODY_COLORS: EnumTable = EnumTable::new(
    "BodyColor",
    &["Red", "Blue", "Yellow", "Green", "Black", "Brown", "Purple", "Gray", "White", "Pink"],
);

pub static BODY_SHAPES: EnumTable = EnumTable::new(
    "BodyShape",
    &[
        "Head",
        "Serpentine",
        "Finned",
        "HeadArms",
        "HeadBase",
        "BipedalTail",
        "HeadLegs",
        "Quadruped",
        "Winged",
        "Multiped",
        "MultiBody",
        "Bipedal",
        "MultiWinged",
        "Insectoid",
    ],
);

pub static HABITATS: EnumTable = EnumTable::new(
    "Habitat",
    &[
        "Grassland",
        "Forest",
        "WatersEdge",
        "Sea",
        "Cave",
        "Mountain",
        "RoughTerrain",
        "Urban",
        "Rare",
    ],
);

pub static NATURES: EnumTable = EnumTable::new(
    "Nature",
    &[
        "HARDY", "LONELY", "BRAVE", "ADAMANT", "NAUGHTY", "BOLD", "DOCILE", "RELAXED", "IMPISH",
        "LAX", "TIMID", "HASTY", "SERIOUS", "JOLLY", "NAIVE", "MODEST", "MILD", "QUIET", "BASHFUL",
        "RASH", "CALM", "GENTLE", "SASSY", "CAREFUL", "QUIRKY",
    ],
);

pub static TARGETS: EnumTable = EnumTable::new(
    "Target",
    &[
        "None",
        "User",
        "NearAlly",
        "UserOrNearAlly",
        "AllAllies",
        "UserAndAllies",
        "NearFoe",
        "RandomNearFoe",
        "AllNearFoes",
        "Foe",
        "AllFoes",
        "NearOther",
        "AllNearOthers",
        "Other",
        "AllBattlers",
        "UserSide",
        "FoeSide",
        "BothSides",
    ],
);
