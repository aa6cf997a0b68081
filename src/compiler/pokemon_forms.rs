//! `pokemon_forms.txt`: alternate forms layered over their base species.

use std::collections::HashSet;
use std::sync::OnceLock;

use crate::error::{PbsError, Result};
use crate::parser::FileLineData;
use crate::registry::{DataKind, DataSet, GameData};
use crate::schema::{require, Element, PbsModel, Record, Schema, SchemaBuilder, SchemaEntry, Value};
use crate::types::enums::MEGA_MESSAGES;
use crate::types::{MegaMessage, Name, Species, SpeciesForm};

use super::pipeline::RecordCompiler;
use super::pokemon::{check_species_links, species_fields, SpeciesFields};
use super::CompileContext;

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesFormInfo {
    pub id: SpeciesForm,
    pub pokedex_form: Option<u32>,
    pub mega_stone: Option<Name>,
    pub mega_move: Option<Name>,
    pub unmega_form: Option<u32>,
    pub mega_message: Option<MegaMessage>,
    pub fields: SpeciesFields,
}

impl PbsModel for SpeciesFormInfo {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            let builder = SchemaBuilder::new("pokemon_forms")
                .section(vec![Element::reference(DataKind::Species), Element::positive()]);
            species_fields(builder)
                .field("PokedexForm", SchemaEntry::single(Element::uint()))
                .field("MegaStone", SchemaEntry::single(Element::reference(DataKind::Item)))
                .field("MegaMove", SchemaEntry::single(Element::reference(DataKind::Move)))
                .field("UnmegaForm", SchemaEntry::single(Element::uint()))
                .field("MegaMessage", SchemaEntry::single(Element::enum_or_int(&MEGA_MESSAGES)))
                .build()
        })
    }

    fn from_record(record: &Record, line: &FileLineData) -> Result<Self> {
        let species = require(record.section_name(0), "section", line)?;
        let form = require(record.section_uint(1), "section", line)?;
        let mega_message = match record.value("MegaMessage") {
            None => None,
            Some(Value::Int(n)) => Some(
                usize::try_from(*n)
                    .ok()
                    .and_then(|i| MegaMessage::ALL.get(i).copied())
                    .ok_or_else(|| {
                        PbsError::parse_at(format!("Undefined value {n} in MegaMessageType."), line)
                    })?,
            ),
            Some(other) => other.as_str().and_then(MegaMessage::from_name),
        };
        Ok(Self {
            id: SpeciesForm::new(species, form),
            pokedex_form: record.uint("PokedexForm"),
            mega_stone: record.name("MegaStone"),
            mega_move: record.name("MegaMove"),
            unmega_form: record.uint("UnmegaForm"),
            mega_message,
            fields: SpeciesFields::from_record(record),
        })
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new(vec![
            Some(Value::Name(self.id.species)),
            Some(Value::from(self.id.form)),
        ]);
        self.fields.write_record(&mut record);
        record.set_value("PokedexForm", self.pokedex_form);
        record.set_value("MegaStone", self.mega_stone);
        record.set_value("MegaMove", self.mega_move);
        record.set_value("UnmegaForm", self.unmega_form);
        record.set_value("MegaMessage", self.mega_message.map(|m| m.as_str()));
        record
    }
}

#[derive(Debug, Default)]
pub struct PokemonFormCompiler;

impl RecordCompiler for PokemonFormCompiler {
    type Entity = Species;
    type Model = SpeciesFormInfo;
    const ORDER: i32 = 9;

    fn data_set(data: &GameData) -> &DataSet<Species> {
        &data.species
    }

    fn data_set_mut(data: &mut GameData) -> &mut DataSet<Species> {
        &mut data.species
    }

    fn convert_to_entity(
        &self,
        model: SpeciesFormInfo,
        data: &GameData,
        line: &FileLineData,
    ) -> Result<Species> {
        let Some(base) = data.species.get(&SpeciesForm::base(model.id.species)) else {
            return Err(PbsError::parse_at(
                format!("Undefined species '{}'.", model.id.species),
                line,
            ));
        };
        let mut species = base.clone();
        species.id = model.id;
        species.form_name = None;
        species.pokedex_form = model.pokedex_form;
        species.mega_stone = model.mega_stone;
        species.mega_move = model.mega_move;
        species.unmega_form = model.unmega_form.unwrap_or(0);
        species.mega_message = model.mega_message.unwrap_or_default();
        model.fields.apply_to(&mut species, data, line)?;
        Ok(species)
    }

    fn convert_to_model(&self, species: &Species, data: &GameData) -> SpeciesFormInfo {
        let fields = SpeciesFields::from_species(species);
        let fields = match data.species.get(&SpeciesForm::base(species.species_id())) {
            Some(base) => fields.without(&SpeciesFields::from_species(base)),
            None => fields,
        };
        SpeciesFormInfo {
            id: species.id,
            pokedex_form: species.pokedex_form,
            mega_stone: species.mega_stone,
            mega_move: species.mega_move,
            unmega_form: (species.unmega_form > 0).then_some(species.unmega_form),
            mega_message: (species.mega_message != MegaMessage::Normal).then_some(species.mega_message),
            fields,
        }
    }

    fn validate_compiled_model(
        &self,
        model: &mut SpeciesFormInfo,
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
        let known: HashSet<Name> = data.all_species().map(Species::species_id).collect();
        check_species_links(entities, &known, data)
    }

    fn entities<'a>(&self, data: &'a GameData) -> Vec<&'a Species> {
        data.species.iter().filter(|s| s.form() > 0).collect()
    }

    /// Replaces every form; base species are kept.
    fn import(&self, data: &mut GameData, entities: Vec<Species>) {
        let bases: Vec<Species> = data.all_species().cloned().collect();
        data.species.import(bases.into_iter().chain(entities));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::pokemon::PokemonCompiler;
    use crate::compiler::test_support::{compile_text, render_text};
    use pretty_assertions::assert_eq;

    const BASES: &str = "\
[VENUSAUR]
Name = Venusaur
Types = GRASS,POISON
BaseStats = 80,82,83,80,100,100
Abilities = OVERGROW
Height = 2.0
Weight = 100.0
Category = Seed
Pokedex = Its plant blooms when it is absorbing solar energy.
Generation = 1
#-------------------------------
[RATTATA]
Name = Rattata
Types = NORMAL
Height = 0.3
Weight = 3.5
Evolution = RATICATE,Level,20
#-------------------------------
[RATICATE]
Name = Raticate
Types = NORMAL
";

    const FORMS: &str = "\
[VENUSAUR,1]
FormName = Mega Venusaur
MegaStone = VENUSAURITE
BaseStats = 80,100,123,80,122,120
Abilities = THICKFAT
Height = 2.4
Weight = 155.5
#-------------------------------
[RATTATA,1]
FormName = Alolan
Types = DARK,NORMAL,DARK
Weight = 3.8
Flags = InheritFormFromMother
";

    fn compiled() -> GameData {
        let mut data = GameData::new();
        compile_text(PokemonCompiler, BASES, &mut data).unwrap();
        compile_text(PokemonFormCompiler, FORMS, &mut data).unwrap();
        data
    }

    #[test]
    fn test_forms_inherit_base() {
        let data = compiled();

        let mega = data.species.try_get(&SpeciesForm::new("VENUSAUR", 1)).unwrap();
        assert_eq!(mega.name, "Venusaur");
        assert_eq!(mega.form_name.as_deref(), Some("Mega Venusaur"));
        assert_eq!(mega.mega_stone, Some(Name::new("VENUSAURITE")));
        assert_eq!(mega.height, 24);
        assert_eq!(mega.category, "Seed");
        assert_eq!(mega.abilities, vec![Name::new("THICKFAT")]);

        let alolan = data.species.try_get(&SpeciesForm::new("RATTATA", 1)).unwrap();
        assert_eq!(alolan.types, vec![Name::new("DARK"), Name::new("NORMAL")]);
        assert_eq!(alolan.height, 3);
        assert_eq!(alolan.weight, 38);
        assert_eq!(alolan.forward_evolutions().count(), 1);
        assert!(alolan.has_flag("InheritFormFromMother"));
    }

    #[test]
    fn test_recompiling_replaces_forms_only() {
        let mut data = compiled();
        compile_text(PokemonFormCompiler, "[RATTATA,1]\nFormName = Alolan\n", &mut data).unwrap();
        assert!(!data.species.exists(&SpeciesForm::new("VENUSAUR", 1)));
        assert!(data.species.exists(&SpeciesForm::new("RATTATA", 1)));
        assert_eq!(data.all_species().count(), 3);
    }

    #[test]
    fn test_unknown_base_species() {
        let mut data = GameData::new();
        compile_text(PokemonCompiler, BASES, &mut data).unwrap();
        let err = compile_text(PokemonFormCompiler, "[PIKACHU,1]\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Undefined species 'PIKACHU'."));
    }

    #[test]
    fn test_form_number_must_be_positive() {
        let mut data = GameData::new();
        compile_text(PokemonCompiler, BASES, &mut data).unwrap();
        let err = compile_text(PokemonFormCompiler, "[RATTATA,0]\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Field '0' is not a positive integer."));
    }

    #[test]
    fn test_mega_message_by_number() {
        let mut data = GameData::new();
        compile_text(PokemonCompiler, BASES, &mut data).unwrap();
        compile_text(PokemonFormCompiler, "[VENUSAUR,1]\nMegaMessage = 1\n", &mut data).unwrap();
        let mega = data.species.try_get(&SpeciesForm::new("VENUSAUR", 1)).unwrap();
        assert_eq!(mega.mega_message, MegaMessage::Move);
    }

    #[test]
    fn test_write_omits_inherited_fields() {
        let data = compiled();
        let written = render_text(PokemonFormCompiler, &data);
        let alolan: Vec<&str> = written
            .split("#-------------------------------\n")
            .find(|block| block.starts_with("[RATTATA,1]"))
            .unwrap()
            .lines()
            .collect();
        assert_eq!(
            alolan,
            vec![
                "[RATTATA,1]",
                "FormName = Alolan",
                "Types = DARK,NORMAL",
                "Weight = 3.8",
                "Flags = InheritFormFromMother",
            ]
        );
        assert!(written.contains("MegaStone = VENUSAURITE\n"));
        assert!(!written.contains("Category = Seed"));
    }
}
