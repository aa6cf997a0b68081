//! Evolutionary family lookups over compiled species.

use std::collections::HashSet;

use crate::registry::GameData;
use crate::types::{Name, Species, SpeciesForm};

use super::parameter::EvolutionParameter;

/// One forward step inside a family.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyEdge {
    pub from: Name,
    pub to: Name,
    pub method: Name,
    pub parameter: Option<EvolutionParameter>,
}

fn base(data: &GameData, species: Name) -> Option<&Species> {
    data.species.get(&SpeciesForm::base(species))
}

/// Every forward evolution reachable from `species`, depth first.
///
/// Direct evolutions are visited in species import order. Edges whose
/// method is empty are skipped.
pub fn evolutions(data: &GameData, species: Name) -> Vec<FamilyEdge> {
    let mut edges = Vec::new();
    let mut seen = HashSet::from([species]);
    collect(data, species, &mut seen, &mut edges);
    edges
}

fn collect(data: &GameData, species: Name, seen: &mut HashSet<Name>, out: &mut Vec<FamilyEdge>) {
    let Some(entry) = base(data, species) else {
        return;
    };
    let mut direct: Vec<_> = entry
        .forward_evolutions()
        .filter(|e| e.method.is_valid())
        .collect();
    direct.sort_by_key(|e| {
        data.species
            .index_of(&SpeciesForm::base(e.species))
            .unwrap_or(usize::MAX)
    });
    for evo in direct {
        out.push(FamilyEdge {
            from: species,
            to: evo.species,
            method: evo.method,
            parameter: evo.parameter.clone(),
        });
        if seen.insert(evo.species) {
            collect(data, evo.species, seen, out);
        }
    }
}

/// The species `species` evolves from, or itself.
pub fn previous_species(data: &GameData, species: Name) -> Name {
    base(data, species)
        .map(Species::previous_species)
        .unwrap_or(species)
}

/// The first stage of the family.
///
/// With `incense` set, a stage only counts as a baby when it needs no
/// incense or its incense is one of the given items.
pub fn baby_species(data: &GameData, species: Name, incense: Option<(Name, Name)>) -> Name {
    let mut current = species;
    let mut seen = HashSet::from([species]);
    loop {
        let Some(entry) = base(data, current) else {
            return current;
        };
        let mut previous = current;
        for evo in entry.evolutions.iter().filter(|e| e.is_previous) {
            let accepted = match incense {
                None => true,
                Some((a, b)) => match base(data, evo.species).and_then(|s| s.incense) {
                    None => true,
                    Some(needed) => needed == a || needed == b,
                },
            };
            if accepted {
                previous = evo.species;
            }
        }
        if previous == current || !seen.insert(previous) {
            return current;
        }
        current = previous;
    }
}

/// Every species of the family, starting with the baby.
pub fn family_species(data: &GameData, species: Name) -> Vec<Name> {
    let baby = baby_species(data, species, None);
    let mut family = vec![baby];
    for edge in evolutions(data, baby) {
        if !family.contains(&edge.to) {
            family.push(edge.to);
        }
    }
    family
}

/// Whether breeding `species` with `other` can produce an egg of its family.
pub fn breeding_can_produce(data: &GameData, species: Name, other: Name) -> bool {
    let other_family = family_species(data, other);
    match base(data, species) {
        Some(entry) if !entry.offspring.is_empty() => {
            entry.offspring.iter().any(|o| other_family.contains(o))
        }
        _ => other_family.contains(&species),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EvolutionInfo;

    fn edge(species: &str, method: &str, param: i64, previous: bool) -> EvolutionInfo {
        EvolutionInfo {
            species: Name::new(species),
            method: Name::new(method),
            parameter: Some(EvolutionParameter::Int(param)),
            is_previous: previous,
        }
    }

    fn species(id: &str, evolutions: Vec<EvolutionInfo>) -> Species {
        let mut s = Species::new(SpeciesForm::base(id));
        s.evolutions = evolutions;
        s
    }

    fn pikachu_line() -> GameData {
        let mut data = GameData::new();
        let mut pichu = species("PICHU", vec![edge("PIKACHU", "Happiness", 0, false)]);
        pichu.evolutions[0].parameter = None;
        data.species.import(vec![
            pichu,
            species(
                "PIKACHU",
                vec![edge("RAICHU", "Item", 0, false), edge("PICHU", "Happiness", 0, true)],
            ),
            species("RAICHU", vec![edge("PIKACHU", "Item", 0, true)]),
        ]);
        data
    }

    #[test]
    fn test_previous_species() {
        let data = pikachu_line();
        assert_eq!(previous_species(&data, Name::new("RAICHU")), Name::new("PIKACHU"));
        assert_eq!(previous_species(&data, Name::new("PICHU")), Name::new("PICHU"));
    }

    #[test]
    fn test_baby_species_walks_to_first_stage() {
        let data = pikachu_line();
        assert_eq!(baby_species(&data, Name::new("RAICHU"), None), Name::new("PICHU"));
    }

    #[test]
    fn test_baby_species_respects_incense() {
        let mut data = GameData::new();
        let mut azurill = species("AZURILL", vec![edge("MARILL", "Happiness", 0, false)]);
        azurill.incense = Some(Name::new("SEAINCENSE"));
        data.species.import(vec![
            azurill,
            species("MARILL", vec![edge("AZURILL", "Happiness", 0, true)]),
        ]);
        let none = Name::none();
        assert_eq!(
            baby_species(&data, Name::new("MARILL"), Some((none, none))),
            Name::new("MARILL")
        );
        assert_eq!(
            baby_species(&data, Name::new("MARILL"), Some((Name::new("SEAINCENSE"), none))),
            Name::new("AZURILL")
        );
    }

    #[test]
    fn test_family_species() {
        let data = pikachu_line();
        let family = family_species(&data, Name::new("PIKACHU"));
        assert_eq!(family, vec![Name::new("PICHU"), Name::new("PIKACHU"), Name::new("RAICHU")]);
        assert!(breeding_can_produce(&data, Name::new("PICHU"), Name::new("RAICHU")));
    }

    #[test]
    fn test_evolutions_survive_cycles() {
        let mut data = GameData::new();
        data.species.import(vec![
            species("A", vec![edge("B", "Level", 5, false)]),
            species("B", vec![edge("A", "Level", 5, false)]),
        ]);
        let edges = evolutions(&data, Name::new("A"));
        assert_eq!(edges.len(), 2);
    }
}
