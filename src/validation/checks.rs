//! Cross-set checks on compiled game data.
//!
//! Each check takes a `&GameData` and returns a `ValidationResult`. Checks
//! only look at sets that are loaded, and only report warnings: anything
//! that makes the data unusable already fails the compile.

use std::collections::HashSet;

use crate::registry::GameData;
use crate::types::{Name, SpeciesForm};

use super::warning::{Diagnostic, ValidationResult};

/// Largest party the battle system supports.
pub const MAX_PARTY_SIZE: usize = 6;

/// Check that every base species form has sprite metrics.
pub fn check_species_metrics(data: &GameData) -> ValidationResult {
    let mut result = ValidationResult::new();
    if !data.species.is_loaded() || !data.species_metrics.is_loaded() {
        return result;
    }

    for species in data.all_species() {
        if !data.species_metrics.exists(&SpeciesForm::base(species.species_id())) {
            result.push(
                Diagnostic::warning(
                    "pbs::metrics::missing",
                    format!("Species {} has no metrics", species.species_id()),
                )
                .with_help("Add a section for it to pokemon_metrics.txt"),
            );
        }
    }

    result
}

/// Check that no trainer has more Pokémon than fit in a party.
pub fn check_party_sizes(data: &GameData) -> ValidationResult {
    let mut result = ValidationResult::new();

    for trainer in data.trainers.iter() {
        if trainer.pokemon.len() > MAX_PARTY_SIZE {
            result.push(
                Diagnostic::warning(
                    "pbs::trainers::party-size",
                    format!(
                        "Trainer {} has {} Pokémon; only the first {} are used",
                        trainer.id,
                        trainer.pokemon.len(),
                        MAX_PARTY_SIZE
                    ),
                )
                .with_help("Split the party or remove Pokémon"),
            );
        }
    }

    result
}

/// Check that every species appears in at least one regional dex.
pub fn check_dex_coverage(data: &GameData) -> ValidationResult {
    let mut result = ValidationResult::new();
    if data.regional_dexes.is_empty() {
        return result;
    }

    let listed: HashSet<Name> = data
        .regional_dexes
        .iter()
        .flat_map(|dex| dex.species.iter().copied())
        .collect();

    for species in data.all_species() {
        if !listed.contains(&species.species_id()) {
            result.push(Diagnostic::warning(
                "pbs::regional-dex::unlisted",
                format!("Species {} is not in any regional dex", species.species_id()),
            ));
        }
    }

    result
}
