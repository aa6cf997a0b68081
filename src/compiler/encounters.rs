//! `encounters.txt`: wild encounter tables per map.
//!
//! ```text
//! [005]          map 5, or [005,1] for version 1
//! Land,21        encounter type with optional step chance
//!     20,RATTATA,3,5
//!     10,PIDGEY_1,4
//! ```

use std::collections::HashSet;
use std::io::BufRead;
use std::path::PathBuf;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::{PbsError, Result};
use crate::parser::csv::parse_uint;
use crate::parser::{open_file, FileLineData, Lines};
use crate::registry::GameData;
use crate::schema::Element;
use crate::settings::SettingsHandle;
use crate::types::{Encounter, EncounterId, EncounterSlot, Name, SpeciesForm};

use super::writer::PbsText;
use super::{CompileContext, PbsCompiler};

const FILE_BASE: &str = "encounters";

pub struct EncounterCompiler {
    settings: SettingsHandle,
}

/// Encounter being read, finished when the next header or the end is reached.
struct OpenEncounter {
    encounter: Encounter,
    current_type: Option<Name>,
}

impl EncounterCompiler {
    pub fn new(settings: SettingsHandle) -> Self {
        Self { settings }
    }

    pub fn path(&self) -> PathBuf {
        self.settings.read().pbs_file(FILE_BASE)
    }

    pub fn compile_from<R: BufRead>(
        &self,
        reader: R,
        base: FileLineData,
        data: &mut GameData,
        ctx: &mut CompileContext,
    ) -> Result<()> {
        let max_level = self.settings.read().max_level;
        let mut used = HashSet::new();
        let mut encounters = Vec::new();
        let mut open: Option<OpenEncounter> = None;

        for line in Lines::new(reader, ctx.cancel.clone()) {
            let line = line?;
            let line_data = base.with_line(&line.text, line.number);
            let at = |e: String| PbsError::parse_at(e, &line_data);

            if is_slot_line(&line.text) {
                let Some(current) = open.as_mut() else {
                    return Err(at("Expected a map number, got a slot instead.".to_string()));
                };
                let Some(encounter_type) = current.current_type else {
                    return Err(at("Encounter slot given before an encounter type.".to_string()));
                };
                let slot = parse_slot(&line.text, max_level, data).map_err(at)?;
                current
                    .encounter
                    .types
                    .entry(encounter_type)
                    .or_default()
                    .push(slot);
                continue;
            }

            if let Some(header) = map_header(&line.text) {
                let id = parse_id(header).map_err(at)?;
                if let Some(done) = open.take() {
                    encounters.push(finalize(done.encounter));
                }
                if !used.insert(id) {
                    return Err(at(format!("Encounters for map '{}' are defined twice.", id.map)));
                }
                open = Some(OpenEncounter {
                    encounter: Encounter {
                        id,
                        step_chances: IndexMap::new(),
                        types: IndexMap::new(),
                    },
                    current_type: None,
                });
                continue;
            }

            let Some(current) = open.as_mut() else {
                return Err(at(format!("Expected a map number, got \"{}\" instead.", line.text)));
            };
            let mut fields = line.text.split(',').map(str::trim);
            let type_name = Name::new(fields.next().unwrap_or_default());
            let Some(encounter_type) = data.encounter_types.get(&type_name) else {
                return Err(at(format!("Undefined encounter type {type_name}.")));
            };
            let step_chance = match fields.next().filter(|s| !s.is_empty()) {
                Some(raw) => parse_uint(raw, &Element::positive()).map_err(at)?,
                None => encounter_type.trigger_chance,
            };
            current.encounter.step_chances.insert(type_name, step_chance);
            current.encounter.types.entry(type_name).or_default();
            current.current_type = Some(type_name);
        }

        if let Some(done) = open.take() {
            encounters.push(finalize(done.encounter));
        }
        debug!(count = encounters.len(), "Importing encounters");
        data.encounters.import(encounters);
        Ok(())
    }

    pub fn render(&self, data: &GameData) -> PbsText {
        let mut text = PbsText::new();
        for encounter in data.encounters.iter() {
            text.separator();
            let header = format!("[{}]", encounter.id);
            match data.map_name(encounter.id.map) {
                Some(name) => text.line(format!("{header} # {name}")),
                None => text.line(header),
            }
            for (encounter_type, slots) in &encounter.types {
                if slots.is_empty() {
                    continue;
                }
                match encounter.step_chances.get(encounter_type) {
                    Some(chance) if *chance > 0 => text.line(format!("{encounter_type},{chance}")),
                    _ => text.line(encounter_type.to_string()),
                }
                for slot in slots {
                    let species = format_species(slot.species);
                    if slot.min_level == slot.max_level {
                        text.line(format!("    {},{},{}", slot.chance, species, slot.min_level));
                    } else {
                        text.line(format!(
                            "    {},{},{},{}",
                            slot.chance, species, slot.min_level, slot.max_level
                        ));
                    }
                }
            }
        }
        text
    }
}

fn is_slot_line(text: &str) -> bool {
    text.split_once(',')
        .is_some_and(|(first, _)| !first.is_empty() && first.bytes().all(|b| b.is_ascii_digit()))
}

fn map_header(text: &str) -> Option<&str> {
    text.strip_prefix('[')?.strip_suffix(']').map(str::trim)
}

fn parse_id(header: &str) -> std::result::Result<EncounterId, String> {
    let mut parts = header.split(',').map(str::trim);
    let map = parse_uint(parts.next().unwrap_or_default(), &Element::uint())?;
    let version = match parts.next() {
        Some(raw) => parse_uint(raw, &Element::uint())?,
        None => 0,
    };
    Ok(EncounterId::new(map, version))
}

/// `NAME_n` is form `n` of `NAME` unless species are loaded and that form
/// does not exist, in which case the whole token names a species.
fn slot_species(raw: &str, data: &GameData) -> SpeciesForm {
    let suffixed = SpeciesForm::parse_suffixed(raw);
    if suffixed.form > 0 && data.species.is_loaded() && !data.species.exists(&suffixed) {
        return SpeciesForm::base(raw);
    }
    suffixed
}

fn parse_slot(text: &str, max_level: u32, data: &GameData) -> std::result::Result<EncounterSlot, String> {
    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    if fields.len() < 3 {
        return Err(format!("Expected a species entry line, got \"{text}\" instead."));
    }
    let chance = parse_uint(fields[0], &Element::positive())?;
    let species = slot_species(fields[1], data);
    if data.species.is_loaded() && !data.species.exists(&species) {
        return Err(format!("Undefined species '{}'.", fields[1]));
    }
    let min_level = parse_uint(fields[2], &Element::uint())?;
    let max_level_field = match fields.get(3).filter(|s| !s.is_empty()) {
        Some(raw) => parse_uint(raw, &Element::uint())?,
        None => min_level,
    };
    for level in [min_level, max_level_field] {
        if level > max_level {
            return Err(format!("Level number {level} is not valid (max. {max_level})."));
        }
    }
    if min_level > max_level_field {
        return Err("Minimum level is greater than maximum level.".to_string());
    }
    Ok(EncounterSlot {
        chance,
        species,
        min_level,
        max_level: max_level_field,
    })
}

/// Merge identical slots into their first occurrence and sort by chance.
fn finalize(mut encounter: Encounter) -> Encounter {
    for slots in encounter.types.values_mut() {
        let mut merged: Vec<EncounterSlot> = Vec::with_capacity(slots.len());
        for slot in slots.drain(..) {
            let same = merged.iter_mut().find(|m| {
                m.species == slot.species
                    && m.min_level == slot.min_level
                    && m.max_level == slot.max_level
            });
            match same {
                Some(first) => first.chance += slot.chance,
                None => merged.push(slot),
            }
        }
        merged.sort_by(|a, b| {
            b.chance
                .cmp(&a.chance)
                .then_with(|| a.species.to_string().cmp(&b.species.to_string()))
        });
        *slots = merged;
    }
    encounter
}

fn format_species(species: SpeciesForm) -> String {
    if species.form == 0 {
        species.species.to_string()
    } else {
        format!("{}_{}", species.species, species.form)
    }
}

impl PbsCompiler for EncounterCompiler {
    fn order(&self) -> i32 {
        13
    }

    fn file_names(&self) -> Vec<PathBuf> {
        vec![self.path()]
    }

    fn compile(&self, data: &mut GameData, ctx: &mut CompileContext) -> Result<()> {
        let path = self.path();
        info!("Compiling PBS file \"{}\"", path.display());
        let reader = open_file(&path)?;
        self.compile_from(reader, FileLineData::new(&path), data, ctx)
    }

    fn write_to_file(&self, data: &GameData, _ctx: &mut CompileContext) -> Result<()> {
        let path = self.path();
        info!("Writing PBS file \"{}\"", path.display());
        self.render(data).write_to(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PbsCompilerSettings;
    use crate::types::Species;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn compile_with(text: &str, data: &mut GameData, settings: SettingsHandle) -> Result<()> {
        EncounterCompiler::new(settings).compile_from(
            Cursor::new(text.to_string()),
            FileLineData::new("PBS/encounters.txt"),
            data,
            &mut CompileContext::new(),
        )
    }

    fn compile(text: &str, data: &mut GameData) -> Result<()> {
        compile_with(text, data, SettingsHandle::default())
    }

    fn slot(chance: u32, species: &str, min: u32, max: u32) -> EncounterSlot {
        EncounterSlot {
            chance,
            species: SpeciesForm::parse_suffixed(species),
            min_level: min,
            max_level: max,
        }
    }

    #[test]
    fn test_compile_encounters() {
        let text = "\
[005] # Route 1
Land,25
    50,PIDGEY,2,4
    50,RATTATA,2
[005,1]
OldRod
    100,MAGIKARP_1,5,10
";
        let mut data = GameData::new();
        compile(text, &mut data).unwrap();

        let route = data.encounters.try_get(&EncounterId::new(5, 0)).unwrap();
        assert_eq!(route.step_chances[&Name::new("Land")], 25);
        assert_eq!(
            route.types[&Name::new("Land")],
            vec![slot(50, "PIDGEY", 2, 4), slot(50, "RATTATA", 2, 2)]
        );

        let fishing = data.encounters.try_get(&EncounterId::new(5, 1)).unwrap();
        assert_eq!(fishing.step_chances[&Name::new("OldRod")], 0);
        assert_eq!(fishing.types[&Name::new("OldRod")][0].species, SpeciesForm::new("MAGIKARP", 1));
    }

    #[test]
    fn test_default_step_chance() {
        let mut data = GameData::new();
        compile("[001]\nCave\n    100,ZUBAT,10\n", &mut data).unwrap();
        let cave = data.encounters.try_get(&EncounterId::new(1, 0)).unwrap();
        assert_eq!(cave.step_chances[&Name::new("Cave")], 5);
    }

    #[test]
    fn test_duplicates_merge_into_first() {
        let text = "\
[002]
Land
    10,RATTATA,3
    20,PIDGEY,3
    15,RATTATA,3
    5,RATTATA,3
    25,RATTATA,4
";
        let mut data = GameData::new();
        compile(text, &mut data).unwrap();
        let slots = &data.encounters.try_get(&EncounterId::new(2, 0)).unwrap().types[&Name::new("Land")];
        assert_eq!(
            slots,
            &vec![
                slot(30, "RATTATA", 3, 3),
                slot(25, "RATTATA", 4, 4),
                slot(20, "PIDGEY", 3, 3),
            ]
        );
    }

    #[test]
    fn test_equal_chances_sort_by_species() {
        let mut data = GameData::new();
        compile("[003]\nLand\n    10,ZUBAT,3\n    10,ABRA,3\n    40,PIDGEY,3\n", &mut data).unwrap();
        let slots = &data.encounters.try_get(&EncounterId::new(3, 0)).unwrap().types[&Name::new("Land")];
        let order: Vec<String> = slots.iter().map(|s| s.species.to_string()).collect();
        assert_eq!(order, vec!["PIDGEY", "ABRA", "ZUBAT"]);
    }

    #[test]
    fn test_map_defined_twice() {
        let mut data = GameData::new();
        let err = compile("[004]\nLand\n    1,ABRA,3\n[4]\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Encounters for map '4' are defined twice."));
        assert!(!data.encounters.is_loaded());
    }

    #[test]
    fn test_level_out_of_range_is_rejected() {
        let mut data = GameData::new();
        let err = compile("[006]\nLand\n    10,ABRA,4294967301\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Field '4294967301' is out of range."));
        assert!(!data.encounters.is_loaded());

        let err = compile("[4294967296]\nLand\n    10,ABRA,5\n", &mut GameData::new()).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_undefined_encounter_type() {
        let mut data = GameData::new();
        let err = compile("[004]\nSky\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Undefined encounter type Sky."));
    }

    #[test]
    fn test_level_limits() {
        let mut data = GameData::new();
        let settings = SettingsHandle::new(PbsCompilerSettings {
            max_level: 50,
            ..Default::default()
        });
        let err = compile_with("[004]\nLand\n    1,ABRA,3,51\n", &mut data, settings).unwrap_err();
        assert!(err.to_string().contains("Level number 51 is not valid (max. 50)."));

        let err = compile("[004]\nLand\n    1,ABRA,9,3\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Minimum level is greater than maximum level."));
    }

    #[test]
    fn test_slot_before_type() {
        let mut data = GameData::new();
        let err = compile("[004]\n    1,ABRA,3\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Encounter slot given before an encounter type."));
    }

    #[test]
    fn test_species_checked_once_loaded() {
        let mut data = GameData::new();
        data.species.import(vec![Species::new(SpeciesForm::base("ABRA"))]);
        compile("[004]\nLand\n    1,ABRA,3\n", &mut data).unwrap();
        let err = compile("[004]\nLand\n    1,ABRA_2,3\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Undefined species 'ABRA_2'."));
    }

    #[test]
    fn test_numbered_species_name_is_not_a_form() {
        let mut data = GameData::new();
        data.species.import(vec![
            Species::new(SpeciesForm::base("ROTOM")),
            Species::new(SpeciesForm::new("ROTOM", 1)),
            Species::new(SpeciesForm::base("PORYGON_2")),
        ]);
        compile("[010]\nLand\n    60,PORYGON_2,20\n    40,ROTOM_1,20\n", &mut data).unwrap();

        let land = &data.encounters.try_get(&EncounterId::new(10, 0)).unwrap().types[&Name::new("Land")];
        assert_eq!(land[0].species, SpeciesForm::base("PORYGON_2"));
        assert_eq!(land[1].species, SpeciesForm::new("ROTOM", 1));

        let err = compile("[011]\nLand\n    100,ROTOM_7,20\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Undefined species 'ROTOM_7'."));
    }

    #[test]
    fn test_write_encounters() {
        let text = "\
[012,1]
Water
    60,TENTACOOL,14,19
[005]
Land,25
    50,RATTATA,2
    50,PIDGEY_1,2,4
";
        let mut data = GameData::new();
        compile(text, &mut data).unwrap();
        data.map_names.insert(5, "Route 1".to_string());

        let written = EncounterCompiler::new(SettingsHandle::default())
            .render(&data)
            .render();
        insta::assert_snapshot!("encounters_written", written);
    }
}
