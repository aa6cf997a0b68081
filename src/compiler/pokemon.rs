//! `pokemon.txt`: base forms of every species.
//!
//! The species fields are shared with `pokemon_forms.txt`. Both files parse
//! into a [`SpeciesFields`] where every key is optional; base species fill
//! the gaps from [`Species::new`], forms fill them from their base species.

use std::collections::HashSet;
use std::sync::OnceLock;

use indexmap::IndexMap;

use crate::error::{PbsError, Result};
use crate::evolution::EvolutionParameter;
use crate::parser::FileLineData;
use crate::registry::{DataKind, DataSet, GameData};
use crate::schema::{
    require, Element, FieldValue, PbsModel, Record, Row, Schema, SchemaBuilder, SchemaEntry, Value,
};
use crate::types::enums::{
    BODY_COLORS, BODY_SHAPES, EGG_GROUPS, GENDER_RATIOS, GROWTH_RATES, HABITATS, STATS,
    STAT_PBS_ORDER,
};
use crate::types::{EvolutionInfo, LevelUpMove, Name, Species, SpeciesForm};

use super::pipeline::RecordCompiler;
use super::CompileContext;

/// One `Evolution = Species,Method[,Parameter]` line, parameter untyped.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionLine {
    pub species: Name,
    pub method: Name,
    pub parameter: Option<String>,
}

/// The species keys of a section. `None` means the key was not given.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpeciesFields {
    pub name: Option<String>,
    pub form_name: Option<String>,
    pub types: Option<Vec<Name>>,
    /// In `BaseStats` order: HP, Attack, Defense, Speed, Sp. Atk, Sp. Def.
    pub base_stats: Option<Vec<u32>>,
    pub gender_ratio: Option<Name>,
    pub growth_rate: Option<Name>,
    pub base_exp: Option<u32>,
    pub evs: Option<Vec<(Name, u32)>>,
    pub catch_rate: Option<u32>,
    pub happiness: Option<u32>,
    pub abilities: Option<Vec<Name>>,
    pub hidden_abilities: Option<Vec<Name>>,
    pub moves: Option<Vec<LevelUpMove>>,
    pub tutor_moves: Option<Vec<Name>>,
    pub egg_moves: Option<Vec<Name>>,
    pub egg_groups: Option<Vec<Name>>,
    pub hatch_steps: Option<u32>,
    pub incense: Option<Name>,
    pub offspring: Option<Vec<Name>>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub color: Option<Name>,
    pub shape: Option<Name>,
    pub habitat: Option<Name>,
    pub category: Option<String>,
    pub pokedex: Option<String>,
    pub generation: Option<u32>,
    pub flags: Option<Vec<String>>,
    pub wild_item_common: Option<Vec<Name>>,
    pub wild_item_uncommon: Option<Vec<Name>>,
    pub wild_item_rare: Option<Vec<Name>>,
    pub evolutions: Option<Vec<EvolutionLine>>,
}

/// Add every species key to `builder`, in file order.
pub(super) fn species_fields(builder: SchemaBuilder) -> SchemaBuilder {
    let names = |kind| SchemaEntry::array(vec![Element::reference(kind)]);
    builder
        .field("Name", SchemaEntry::single(Element::string()))
        .field("FormName", SchemaEntry::single(Element::string()))
        .field("Types", names(DataKind::Type))
        .field("BaseStats", SchemaEntry::tuple(vec![Element::positive(); 6]))
        .field("GenderRatio", SchemaEntry::single(Element::enumeration(&GENDER_RATIOS)))
        .field("GrowthRate", SchemaEntry::single(Element::enumeration(&GROWTH_RATES)))
        .field("BaseExp", SchemaEntry::single(Element::positive()))
        .field(
            "EVs",
            SchemaEntry::array(vec![Element::enumeration(&STATS), Element::positive()]),
        )
        .field("CatchRate", SchemaEntry::single(Element::positive()))
        .field("Happiness", SchemaEntry::single(Element::uint()))
        .field("Abilities", names(DataKind::Ability))
        .field("HiddenAbilities", names(DataKind::Ability))
        .field(
            "Moves",
            SchemaEntry::array(vec![Element::uint(), Element::reference(DataKind::Move)]),
        )
        .field("TutorMoves", names(DataKind::Move))
        .field("EggMoves", names(DataKind::Move))
        .field("EggGroups", SchemaEntry::array(vec![Element::enumeration(&EGG_GROUPS)]))
        .field("HatchSteps", SchemaEntry::single(Element::positive()))
        .field("Incense", SchemaEntry::single(Element::reference(DataKind::Item)))
        .field("Offspring", names(DataKind::Species))
        .field("Height", SchemaEntry::single(Element::float()))
        .field("Weight", SchemaEntry::single(Element::float()))
        .field("Color", SchemaEntry::single(Element::enumeration(&BODY_COLORS)))
        .field("Shape", SchemaEntry::single(Element::enumeration(&BODY_SHAPES)))
        .field("Habitat", SchemaEntry::single(Element::enumeration(&HABITATS)))
        .field("Category", SchemaEntry::single(Element::string()))
        .field("Pokedex", SchemaEntry::single(Element::text()))
        .field("Generation", SchemaEntry::single(Element::uint()))
        .field("Flags", SchemaEntry::array(vec![Element::string()]))
        .field("WildItemCommon", names(DataKind::Item))
        .field("WildItemUncommon", names(DataKind::Item))
        .field("WildItemRare", names(DataKind::Item))
        .field(
            "Evolution",
            SchemaEntry::repeating(vec![
                Element::reference(DataKind::Species),
                Element::reference(DataKind::Evolution),
                Element::string().optional(),
            ]),
        )
}

fn names(record: &Record, key: &str) -> Option<Vec<Name>> {
    record.contains(key).then(|| record.names(key))
}

fn pairs(record: &Record, key: &str) -> Option<Vec<(Name, u32)>> {
    record.contains(key).then(|| {
        record
            .rows(key)
            .iter()
            .filter_map(|row| match row.as_slice() {
                [Some(Value::Name(name)), Some(n)] => n.as_uint().map(|n| (*name, n)),
                _ => None,
            })
            .collect()
    })
}

fn tenths(value: f64) -> u32 {
    (value * 10.0).round().max(0.0) as u32
}

fn unit(value: u32) -> f64 {
    value as f64 / 10.0
}

impl SpeciesFields {
    pub fn from_record(record: &Record) -> Self {
        Self {
            name: record.string("Name"),
            form_name: record.string("FormName"),
            types: names(record, "Types"),
            base_stats: record
                .contains("BaseStats")
                .then(|| record.uints("BaseStats")),
            gender_ratio: record.name("GenderRatio"),
            growth_rate: record.name("GrowthRate"),
            base_exp: record.uint("BaseExp"),
            evs: pairs(record, "EVs"),
            catch_rate: record.uint("CatchRate"),
            happiness: record.uint("Happiness"),
            abilities: names(record, "Abilities"),
            hidden_abilities: names(record, "HiddenAbilities"),
            moves: record.contains("Moves").then(|| {
                record
                    .rows("Moves")
                    .iter()
                    .filter_map(|row| match row.as_slice() {
                        [Some(level), Some(Value::Name(move_id))] => level.as_uint().map(|level| LevelUpMove {
                            level,
                            move_id: *move_id,
                        }),
                        _ => None,
                    })
                    .collect()
            }),
            tutor_moves: names(record, "TutorMoves"),
            egg_moves: names(record, "EggMoves"),
            egg_groups: names(record, "EggGroups"),
            hatch_steps: record.uint("HatchSteps"),
            incense: record.name("Incense"),
            offspring: names(record, "Offspring"),
            height: record.float("Height"),
            weight: record.float("Weight"),
            color: record.name("Color"),
            shape: record.name("Shape"),
            habitat: record.name("Habitat"),
            category: record.string("Category"),
            pokedex: record.string("Pokedex"),
            generation: record.uint("Generation"),
            flags: record.contains("Flags").then(|| record.strings("Flags")),
            wild_item_common: names(record, "WildItemCommon"),
            wild_item_uncommon: names(record, "WildItemUncommon"),
            wild_item_rare: names(record, "WildItemRare"),
            evolutions: record.contains("Evolution").then(|| {
                record
                    .rows("Evolution")
                    .iter()
                    .filter_map(|row| {
                        let value = |i: usize| row.get(i).and_then(Option::as_ref);
                        Some(EvolutionLine {
                            species: value(0)?.as_name()?,
                            method: value(1)?.as_name()?,
                            parameter: value(2).and_then(Value::as_str).map(str::to_string),
                        })
                    })
                    .collect()
            }),
        }
    }

    pub fn write_record(&self, record: &mut Record) {
        let list = |record: &mut Record, key: &str, names: &Option<Vec<Name>>| {
            if let Some(names) = names {
                record.set_names(key, names);
            }
        };
        let set_rows = |record: &mut Record, key: &str, rows: Vec<Row>| {
            if !rows.is_empty() {
                record.set(key, FieldValue::List(rows));
            }
        };

        record.set_value("Name", self.name.as_deref());
        record.set_value("FormName", self.form_name.as_deref());
        list(record, "Types", &self.types);
        if let Some(stats) = &self.base_stats {
            record.set_row("BaseStats", stats.iter().map(|n| Some(Value::from(*n))).collect());
        }
        record.set_value("GenderRatio", self.gender_ratio);
        record.set_value("GrowthRate", self.growth_rate);
        record.set_value("BaseExp", self.base_exp);
        if let Some(evs) = &self.evs {
            let rows = evs
                .iter()
                .map(|(stat, n)| vec![Some(Value::Name(*stat)), Some(Value::from(*n))])
                .collect();
            set_rows(record, "EVs", rows);
        }
        record.set_value("CatchRate", self.catch_rate);
        record.set_value("Happiness", self.happiness);
        list(record, "Abilities", &self.abilities);
        list(record, "HiddenAbilities", &self.hidden_abilities);
        if let Some(moves) = &self.moves {
            let rows = moves
                .iter()
                .map(|m| vec![Some(Value::from(m.level)), Some(Value::Name(m.move_id))])
                .collect();
            set_rows(record, "Moves", rows);
        }
        list(record, "TutorMoves", &self.tutor_moves);
        list(record, "EggMoves", &self.egg_moves);
        list(record, "EggGroups", &self.egg_groups);
        record.set_value("HatchSteps", self.hatch_steps);
        record.set_value("Incense", self.incense);
        list(record, "Offspring", &self.offspring);
        record.set_value("Height", self.height);
        record.set_value("Weight", self.weight);
        record.set_value("Color", self.color);
        record.set_value("Shape", self.shape);
        record.set_value("Habitat", self.habitat);
        record.set_value("Category", self.category.as_deref());
        record.set_value("Pokedex", self.pokedex.as_deref());
        record.set_value("Generation", self.generation);
        if let Some(flags) = &self.flags {
            record.set_strings("Flags", flags);
        }
        list(record, "WildItemCommon", &self.wild_item_common);
        list(record, "WildItemUncommon", &self.wild_item_uncommon);
        list(record, "WildItemRare", &self.wild_item_rare);
        if let Some(evolutions) = &self.evolutions {
            let rows = evolutions
                .iter()
                .map(|e| {
                    vec![
                        Some(Value::Name(e.species)),
                        Some(Value::Name(e.method)),
                        e.parameter.clone().map(Value::Str),
                    ]
                })
                .collect();
            set_rows(record, "Evolution", rows);
        }
    }

    /// Every field of `species`, as written for a base species.
    pub fn from_species(species: &Species) -> Self {
        Self {
            name: Some(species.name.clone()),
            form_name: species.form_name.clone(),
            types: Some(species.types.clone()),
            base_stats: Some(
                STAT_PBS_ORDER
                    .iter()
                    .map(|s| species.base_stats.get(&Name::new(s)).copied().unwrap_or(1))
                    .collect(),
            ),
            gender_ratio: Some(species.gender_ratio),
            growth_rate: Some(species.growth_rate),
            base_exp: Some(species.base_exp),
            evs: Some(species.evs.iter().map(|(s, n)| (*s, *n)).collect()),
            catch_rate: Some(species.catch_rate),
            happiness: Some(species.happiness),
            abilities: Some(species.abilities.clone()),
            hidden_abilities: Some(species.hidden_abilities.clone()),
            moves: Some(species.level_up_moves.clone()),
            tutor_moves: Some(species.tutor_moves.clone()),
            egg_moves: Some(species.egg_moves.clone()),
            egg_groups: Some(species.egg_groups.clone()),
            hatch_steps: Some(species.hatch_steps),
            incense: species.incense,
            offspring: Some(species.offspring.clone()),
            height: Some(unit(species.height)),
            weight: Some(unit(species.weight)),
            color: Some(species.color),
            shape: Some(species.shape),
            habitat: species.habitat,
            category: Some(species.category.clone()),
            pokedex: Some(species.pokedex_entry.clone()),
            generation: Some(species.generation),
            flags: Some(species.flags.clone()),
            wild_item_common: Some(species.wild_item_common.clone()),
            wild_item_uncommon: Some(species.wild_item_uncommon.clone()),
            wild_item_rare: Some(species.wild_item_rare.clone()),
            evolutions: Some(
                species
                    .forward_evolutions()
                    .map(|e| EvolutionLine {
                        species: e.species,
                        method: e.method,
                        parameter: e.parameter.as_ref().map(EvolutionParameter::to_string),
                    })
                    .collect(),
            ),
        }
    }

    /// Drop every field whose value equals the one in `base`.
    pub fn without(self, base: &SpeciesFields) -> Self {
        fn changed<T: PartialEq>(value: Option<T>, base: &Option<T>) -> Option<T> {
            if value.as_ref() == base.as_ref() {
                None
            } else {
                value
            }
        }
        Self {
            name: changed(self.name, &base.name),
            form_name: changed(self.form_name, &base.form_name),
            types: changed(self.types, &base.types),
            base_stats: changed(self.base_stats, &base.base_stats),
            gender_ratio: changed(self.gender_ratio, &base.gender_ratio),
            growth_rate: changed(self.growth_rate, &base.growth_rate),
            base_exp: changed(self.base_exp, &base.base_exp),
            evs: changed(self.evs, &base.evs),
            catch_rate: changed(self.catch_rate, &base.catch_rate),
            happiness: changed(self.happiness, &base.happiness),
            abilities: changed(self.abilities, &base.abilities),
            hidden_abilities: changed(self.hidden_abilities, &base.hidden_abilities),
            moves: changed(self.moves, &base.moves),
            tutor_moves: changed(self.tutor_moves, &base.tutor_moves),
            egg_moves: changed(self.egg_moves, &base.egg_moves),
            egg_groups: changed(self.egg_groups, &base.egg_groups),
            hatch_steps: changed(self.hatch_steps, &base.hatch_steps),
            incense: changed(self.incense, &base.incense),
            offspring: changed(self.offspring, &base.offspring),
            height: changed(self.height, &base.height),
            weight: changed(self.weight, &base.weight),
            color: changed(self.color, &base.color),
            shape: changed(self.shape, &base.shape),
            habitat: changed(self.habitat, &base.habitat),
            category: changed(self.category, &base.category),
            pokedex: changed(self.pokedex, &base.pokedex),
            generation: changed(self.generation, &base.generation),
            flags: changed(self.flags, &base.flags),
            wild_item_common: changed(self.wild_item_common, &base.wild_item_common),
            wild_item_uncommon: changed(self.wild_item_uncommon, &base.wild_item_uncommon),
            wild_item_rare: changed(self.wild_item_rare, &base.wild_item_rare),
            evolutions: changed(self.evolutions, &base.evolutions),
        }
    }

    pub fn dedup_types(&mut self) {
        if let Some(types) = &mut self.types {
            let mut seen = HashSet::new();
            types.retain(|t| seen.insert(*t));
        }
    }

    /// Overwrite the fields of `species` that were given.
    pub fn apply_to(self, species: &mut Species, data: &GameData, line: &FileLineData) -> Result<()> {
        if let Some(v) = self.name {
            species.name = v;
        }
        if let Some(v) = self.form_name {
            species.form_name = Some(v);
        }
        if let Some(v) = self.types {
            species.types = v;
        }
        if let Some(stats) = self.base_stats {
            species.base_stats = STAT_PBS_ORDER
                .iter()
                .zip(stats)
                .map(|(s, n)| (Name::new(s), n))
                .collect();
        }
        if let Some(v) = self.gender_ratio {
            species.gender_ratio = v;
        }
        if let Some(v) = self.growth_rate {
            species.growth_rate = v;
        }
        if let Some(v) = self.base_exp {
            species.base_exp = v;
        }
        if let Some(evs) = self.evs {
            let mut map = IndexMap::new();
            for (stat, amount) in evs {
                *map.entry(stat).or_insert(0) += amount;
            }
            species.evs = map;
        }
        if let Some(v) = self.catch_rate {
            species.catch_rate = v;
        }
        if let Some(v) = self.happiness {
            species.happiness = v;
        }
        if let Some(v) = self.abilities {
            species.abilities = v;
        }
        if let Some(v) = self.hidden_abilities {
            species.hidden_abilities = v;
        }
        if let Some(mut v) = self.moves {
            v.sort_by_key(|m| m.level);
            species.level_up_moves = v;
        }
        if let Some(v) = self.tutor_moves {
            species.tutor_moves = v;
        }
        if let Some(v) = self.egg_moves {
            species.egg_moves = v;
        }
        if let Some(v) = self.egg_groups {
            species.egg_groups = v;
        }
        if let Some(v) = self.hatch_steps {
            species.hatch_steps = v;
        }
        if let Some(v) = self.incense {
            species.incense = Some(v);
        }
        if let Some(v) = self.offspring {
            species.offspring = v;
        }
        if let Some(v) = self.height {
            species.height = tenths(v);
        }
        if let Some(v) = self.weight {
            species.weight = tenths(v);
        }
        if let Some(v) = self.color {
            species.color = v;
        }
        if let Some(v) = self.shape {
            species.shape = v;
        }
        if let Some(v) = self.habitat {
            species.habitat = Some(v);
        }
        if let Some(v) = self.category {
            species.category = v;
        }
        if let Some(v) = self.pokedex {
            species.pokedex_entry = v;
        }
        if let Some(v) = self.generation {
            species.generation = v;
        }
        if let Some(v) = self.flags {
            species.flags = v;
        }
        if let Some(v) = self.wild_item_common {
            species.wild_item_common = v;
        }
        if let Some(v) = self.wild_item_uncommon {
            species.wild_item_uncommon = v;
        }
        if let Some(v) = self.wild_item_rare {
            species.wild_item_rare = v;
        }
        if let Some(lines) = self.evolutions {
            let previous: Vec<EvolutionInfo> = species
                .evolutions
                .drain(..)
                .filter(|e| e.is_previous)
                .collect();
            for evolution in &lines {
                species.evolutions.push(typed_evolution(evolution, data, line)?);
            }
            species.evolutions.extend(previous);
        }
        Ok(())
    }
}

/// Type the parameter of one evolution line by its method.
fn typed_evolution(evolution: &EvolutionLine, data: &GameData, line: &FileLineData) -> Result<EvolutionInfo> {
    let raw = format!(
        "{},{}{}",
        evolution.species,
        evolution.method,
        evolution.parameter.as_deref().map(|p| format!(",{p}")).unwrap_or_default()
    );
    let at = line.with_key("Evolution", &raw, line.line_number);
    let Some(method) = data.evolutions.get(&evolution.method) else {
        return Err(PbsError::parse_at(
            format!("Undefined evolution method {}.", evolution.method),
            &at,
        ));
    };
    let parameter = match (method.parameter, evolution.parameter.as_deref()) {
        (Some(_), None) => {
            return Err(PbsError::parse_at(
                format!(
                    "Evolution method {} requires a parameter, but none was given.",
                    method.name
                ),
                &at,
            ));
        }
        (None, Some(_)) => {
            return Err(PbsError::parse_at(
                format!("Evolution method {} does not take a parameter.", method.name),
                &at,
            ));
        }
        (None, None) => None,
        (Some(kind), Some(raw)) => Some(
            EvolutionParameter::parse(kind, raw).map_err(|e| PbsError::parse_at(e, &at))?,
        ),
    };
    Ok(EvolutionInfo {
        species: evolution.species,
        method: evolution.method,
        parameter,
        is_previous: false,
    })
}

/// Check offspring, evolution targets and typed evolution parameters.
///
/// `known` is the set of species ids valid as a reference. Parameters naming
/// items, moves or types are checked only when that set is loaded.
pub(super) fn check_species_links(
    entities: &[Species],
    known: &HashSet<Name>,
    data: &GameData,
) -> Result<()> {
    let mut errors = Vec::new();
    let undefined_species = |name: Name, owner: &Species, key: &str| PbsError::Validation {
        message: format!("Species '{name}' is not defined."),
        help: Some(format!("Referenced by species {}, key {key}.", owner.id)),
    };

    for species in entities {
        for offspring in species.offspring.iter().filter(|o| !known.contains(o)) {
            errors.push(undefined_species(*offspring, species, "Offspring"));
        }
        for evolution in species.forward_evolutions() {
            if !known.contains(&evolution.species) {
                errors.push(undefined_species(evolution.species, species, "Evolution"));
            }
            let Some(parameter) = &evolution.parameter else {
                continue;
            };
            let (kind, name) = match parameter {
                EvolutionParameter::Species(target) => {
                    if !known.contains(&target.species) {
                        errors.push(undefined_species(target.species, species, "Evolution"));
                    }
                    continue;
                }
                EvolutionParameter::Item(n) => (DataKind::Item, *n),
                EvolutionParameter::Move(n) => (DataKind::Move, *n),
                EvolutionParameter::Type(n) => (DataKind::Type, *n),
                EvolutionParameter::Int(_) | EvolutionParameter::Name(_) => continue,
            };
            if data.is_loaded(kind) && !data.contains_name(kind, name) {
                errors.push(PbsError::Validation {
                    message: format!("Undefined {kind} '{name}'."),
                    help: Some(format!(
                        "Parameter of evolution method {} of species {}.",
                        evolution.method, species.id
                    )),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PbsError::aggregate(errors))
    }
}

/// Rebuild the previous-species edges of a species set.
///
/// Each target gets one edge back to the first species, in set order, that
/// evolves into it.
pub(super) fn link_previous_species(entities: &mut [Species]) {
    for species in entities.iter_mut() {
        species.evolutions.retain(|e| !e.is_previous);
    }

    let mut previous: IndexMap<Name, EvolutionInfo> = IndexMap::new();
    for species in entities.iter().filter(|s| s.form() == 0) {
        for evolution in species.forward_evolutions() {
            previous.entry(evolution.species).or_insert_with(|| EvolutionInfo {
                species: species.species_id(),
                method: evolution.method,
                parameter: evolution.parameter.clone(),
                is_previous: true,
            });
        }
    }

    for species in entities.iter_mut() {
        if let Some(edge) = previous.get(&species.species_id()) {
            species.evolutions.push(edge.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesInfo {
    pub id: Name,
    pub fields: SpeciesFields,
}

impl PbsModel for SpeciesInfo {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| species_fields(SchemaBuilder::new("pokemon")).build())
    }

    fn from_record(record: &Record, line: &FileLineData) -> Result<Self> {
        Ok(Self {
            id: require(record.section_name(0), "section", line)?,
            fields: SpeciesFields::from_record(record),
        })
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new(vec![Some(Value::Name(self.id))]);
        self.fields.write_record(&mut record);
        record
    }
}

#[derive(Debug, Default)]
pub struct PokemonCompiler;

impl RecordCompiler for PokemonCompiler {
    type Entity = Species;
    type Model = SpeciesInfo;
    const ORDER: i32 = 8;

    fn data_set(data: &GameData) -> &DataSet<Species> {
        &data.species
    }

    fn data_set_mut(data: &mut GameData) -> &mut DataSet<Species> {
        &mut data.species
    }

    fn convert_to_entity(&self, model: SpeciesInfo, data: &GameData, line: &FileLineData) -> Result<Species> {
        let mut species = Species::new(SpeciesForm::base(model.id));
        model.fields.apply_to(&mut species, data, line)?;
        Ok(species)
    }

    fn convert_to_model(&self, species: &Species, _: &GameData) -> SpeciesInfo {
        SpeciesInfo {
            id: species.species_id(),
            fields: SpeciesFields::from_species(species),
        }
    }

    fn validate_compiled_model(
        &self,
        model: &mut SpeciesInfo,
        _line: &FileLineData,
        _ctx: &mut CompileContext,
    ) -> Result<()> {
        model.fields.dedup_types();
        Ok(())
    }

    fn validate_all_compiled_entities(
        &self,
        entities: &mut Vec<Species>,
        data: &GameData,
        _ctx: &mut CompileContext,
    ) -> Result<()> {
        let known: HashSet<Name> = entities.iter().map(Species::species_id).collect();
        check_species_links(entities, &known, data)?;
        link_previous_species(entities);
        Ok(())
    }

    fn entities<'a>(&self, data: &'a GameData) -> Vec<&'a Species> {
        data.species.iter().filter(|s| s.form() == 0).collect()
    }

    /// Replaces the base forms; forms already compiled are kept.
    fn import(&self, data: &mut GameData, entities: Vec<Species>) {
        let forms: Vec<Species> = data.species.iter().filter(|s| s.form() > 0).cloned().collect();
        data.species.import(entities.into_iter().chain(forms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::test_support::{compile_text, render_text};
    use pretty_assertions::assert_eq;

    const POKEMON: &str = "\
[BULBASAUR]
Name = Bulbasaur
Types = GRASS,POISON
BaseStats = 45,49,49,45,65,65
GenderRatio = FemaleOneEighth
GrowthRate = Parabolic
BaseExp = 64
EVs = SPECIAL_ATTACK,1
CatchRate = 45
Happiness = 50
Abilities = OVERGROW
HiddenAbilities = CHLOROPHYLL
Moves = 1,TACKLE,1,GROWL,3,VINEWHIP
EggMoves = PETALDANCE
EggGroups = Monster,Grass
HatchSteps = 5120
Height = 0.7
Weight = 6.9
Color = Green
Shape = Quadruped
Habitat = Grassland
Category = Seed
Pokedex = Bulbasaur can be seen napping in bright sunlight. There is a seed on its back.
Generation = 1
Evolution = IVYSAUR,Level,16
#-------------------------------
[IVYSAUR]
Name = Ivysaur
Types = GRASS,POISON,GRASS
BaseStats = 60,62,63,60,80,80
GenderRatio = FemaleOneEighth
GrowthRate = Parabolic
BaseExp = 142
EVs = SPECIAL_ATTACK,1,SPECIAL_DEFENSE,1
CatchRate = 45
Happiness = 50
Abilities = OVERGROW
Moves = 1,TACKLE,9,VINEWHIP
EggGroups = Monster,Grass
HatchSteps = 5120
Offspring = BULBASAUR
Height = 1.0
Weight = 13.0
Color = Green
Shape = Quadruped
Category = Seed
Pokedex = When the bulb on its back grows large, it appears to lose the ability to stand on its hind legs.
Generation = 1
";

    #[test]
    fn test_compile_species() {
        let mut data = GameData::new();
        compile_text(PokemonCompiler, POKEMON, &mut data).unwrap();

        let bulbasaur = data.species.try_get(&SpeciesForm::base("BULBASAUR")).unwrap();
        assert_eq!(bulbasaur.name, "Bulbasaur");
        assert_eq!(bulbasaur.height, 7);
        assert_eq!(bulbasaur.weight, 69);
        assert_eq!(bulbasaur.base_stats[&Name::new("SPEED")], 45);
        assert_eq!(bulbasaur.base_stats[&Name::new("SPECIAL_ATTACK")], 65);
        assert_eq!(bulbasaur.evs[&Name::new("SPECIAL_ATTACK")], 1);
        assert_eq!(bulbasaur.level_up_moves.len(), 3);
        assert_eq!(bulbasaur.habitat, Some(Name::new("Grassland")));

        let evolution = bulbasaur.forward_evolutions().next().unwrap();
        assert_eq!(evolution.species, Name::new("IVYSAUR"));
        assert_eq!(evolution.parameter, Some(EvolutionParameter::Int(16)));

        let ivysaur = data.species.try_get(&SpeciesForm::base("IVYSAUR")).unwrap();
        assert_eq!(ivysaur.types, vec![Name::new("GRASS"), Name::new("POISON")]);
        assert_eq!(ivysaur.previous_species(), Name::new("BULBASAUR"));
        assert_eq!(ivysaur.hidden_abilities, Vec::<Name>::new());
        assert_eq!(ivysaur.catch_rate, 45);
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let mut data = GameData::new();
        compile_text(PokemonCompiler, "[MISSINGNO]\n", &mut data).unwrap();
        let species = data.species.try_get(&SpeciesForm::base("MISSINGNO")).unwrap();
        assert_eq!(species.name, "Unnamed");
        assert_eq!(species.types, vec![Name::new("NORMAL")]);
        assert_eq!(species.catch_rate, 255);
        assert_eq!(species.egg_groups, vec![Name::new("Undiscovered")]);
        assert_eq!(species.category, "???");
    }

    #[test]
    fn test_base_stat_out_of_range() {
        let mut data = GameData::new();
        let err = compile_text(PokemonCompiler, "[MISSINGNO]\nBaseStats = 45,49,49,45,65,4294967296\n", &mut data)
            .unwrap_err();
        assert!(err.to_string().contains("Field '4294967296' is out of range."));
        assert!(!data.species.is_loaded());
    }

    #[test]
    fn test_evolution_parameter_required() {
        let text = "[BULBASAUR]\nName = Bulbasaur\nEvolution = IVYSAUR,Level\n[IVYSAUR]\nName = Ivysaur\n";
        let mut data = GameData::new();
        let err = compile_text(PokemonCompiler, text, &mut data).unwrap_err();
        assert!(err
            .to_string()
            .contains("Evolution method Level requires a parameter, but none was given."));
        assert!(!data.species.is_loaded());
    }

    #[test]
    fn test_evolution_parameter_unexpected() {
        let text = "[KADABRA]\nEvolution = ALAKAZAM,Trade,5\n[ALAKAZAM]\n";
        let mut data = GameData::new();
        let err = compile_text(PokemonCompiler, text, &mut data).unwrap_err();
        assert!(err
            .to_string()
            .contains("Evolution method Trade does not take a parameter."));
    }

    #[test]
    fn test_integer_parameter_must_parse() {
        let text = "[BULBASAUR]\nEvolution = IVYSAUR,Level,high\n[IVYSAUR]\n";
        let mut data = GameData::new();
        let err = compile_text(PokemonCompiler, text, &mut data).unwrap_err();
        assert!(err.to_string().contains("Field 'high' is not an integer."));
    }

    #[test]
    fn test_undefined_evolution_target() {
        let text = "[BULBASAUR]\nEvolution = IVYSAUR,Level,16\n";
        let mut data = GameData::new();
        let err = compile_text(PokemonCompiler, text, &mut data).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Species 'IVYSAUR' is not defined.");
    }

    #[test]
    fn test_undefined_offspring_and_species_parameter() {
        let text = "\
[SHELMET]
Offspring = KARRABLAST
Evolution = ACCELGOR,TradeSpecies,KARRABLAST
[ACCELGOR]
";
        let mut data = GameData::new();
        let err = compile_text(PokemonCompiler, text, &mut data).unwrap_err();
        match err {
            PbsError::Aggregate { errors, .. } => assert_eq!(errors.len(), 2),
            other => panic!("expected aggregate, got {other:?}"),
        }
    }

    #[test]
    fn test_item_parameter_checked_when_items_loaded() {
        let text = "[EEVEE]\nEvolution = VAPOREON,Item,WATERSTONE\n[VAPOREON]\n";

        let mut data = GameData::new();
        compile_text(PokemonCompiler, text, &mut data).unwrap();

        let mut data = GameData::new();
        data.items.import(Vec::new());
        let err = compile_text(PokemonCompiler, text, &mut data).unwrap_err();
        assert!(err.to_string().contains("Undefined item 'WATERSTONE'."));
    }

    #[test]
    fn test_first_evolver_becomes_previous() {
        let text = "\
[EEVEE]
Evolution = ESPEON,HappinessDay
[TOGEPI]
Evolution = ESPEON,Level,10
[ESPEON]
";
        let mut data = GameData::new();
        compile_text(PokemonCompiler, text, &mut data).unwrap();
        let espeon = data.species.try_get(&SpeciesForm::base("ESPEON")).unwrap();
        let previous: Vec<&EvolutionInfo> = espeon.evolutions.iter().filter(|e| e.is_previous).collect();
        assert_eq!(previous.len(), 1);
        assert_eq!(previous[0].species, Name::new("EEVEE"));
    }

    #[test]
    fn test_import_keeps_forms() {
        let mut data = GameData::new();
        data.species.import(vec![Species::new(SpeciesForm::new("BULBASAUR", 1))]);
        compile_text(PokemonCompiler, POKEMON, &mut data).unwrap();
        assert!(data.species.exists(&SpeciesForm::new("BULBASAUR", 1)));
        assert_eq!(data.species.len(), 3);
    }

    #[test]
    fn test_write_omits_previous_edges() {
        let mut data = GameData::new();
        compile_text(PokemonCompiler, POKEMON, &mut data).unwrap();
        let written = render_text(PokemonCompiler, &data);
        assert_eq!(written.matches("Evolution = ").count(), 1);
        assert!(written.contains("Evolution = IVYSAUR,Level,16\n"));
        assert!(written.contains("Height = 0.7\nWeight = 6.9\n"));
        assert!(written.contains("Types = GRASS,POISON\n"));
    }

    #[test]
    fn test_written_text_compiles_to_same_species() {
        let mut data = GameData::new();
        compile_text(PokemonCompiler, POKEMON, &mut data).unwrap();
        let written = render_text(PokemonCompiler, &data);

        let mut again = GameData::new();
        compile_text(PokemonCompiler, &written, &mut again).unwrap();
        assert_eq!(
            again.species.iter().cloned().collect::<Vec<_>>(),
            data.species.iter().cloned().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_write_pokemon() {
        let mut data = GameData::new();
        compile_text(PokemonCompiler, POKEMON, &mut data).unwrap();
        insta::assert_snapshot!("pokemon_written", render_text(PokemonCompiler, &data));
    }
}
