//! `types.txt`: elemental types and their matchups.

use std::sync::OnceLock;

use crate::error::{PbsError, Result};
use crate::parser::FileLineData;
use crate::registry::{DataKind, DataSet, GameData};
use crate::schema::{require, Element, PbsModel, Record, Schema, SchemaBuilder, SchemaEntry, Value};
use crate::types::{Name, PokemonType};

use super::pipeline::RecordCompiler;
use super::CompileContext;

#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub id: Name,
    pub name: String,
    pub icon_position: u32,
    pub is_special_type: bool,
    pub is_pseudo_type: bool,
    pub weaknesses: Vec<Name>,
    pub resistances: Vec<Name>,
    pub immunities: Vec<Name>,
    pub flags: Vec<String>,
}

impl PbsModel for TypeInfo {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            let types = || SchemaEntry::array(vec![Element::reference(DataKind::Type)]);
            SchemaBuilder::new("types")
                .field("Name", SchemaEntry::single(Element::string()).required())
                .field("IconPosition", SchemaEntry::single(Element::uint()))
                .field("IsSpecialType", SchemaEntry::single(Element::boolean()))
                .field("IsPseudoType", SchemaEntry::single(Element::boolean()))
                .field("Weaknesses", types())
                .field("Resistances", types())
                .field("Immunities", types())
                .field("Flags", SchemaEntry::array(vec![Element::string()]))
                .build()
        })
    }

    fn from_record(record: &Record, line: &FileLineData) -> Result<Self> {
        Ok(Self {
            id: require(record.section_name(0), "section", line)?,
            name: require(record.string("Name"), "Name", line)?,
            icon_position: record.uint("IconPosition").unwrap_or(0),
            is_special_type: record.bool("IsSpecialType").unwrap_or(false),
            is_pseudo_type: record.bool("IsPseudoType").unwrap_or(false),
            weaknesses: record.names("Weaknesses"),
            resistances: record.names("Resistances"),
            immunities: record.names("Immunities"),
            flags: record.strings("Flags"),
        })
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new(vec![Some(Value::Name(self.id))]);
        record.set_value("Name", Some(self.name.as_str()));
        record.set_value("IconPosition", Some(self.icon_position));
        record.set_flag("IsSpecialType", self.is_special_type);
        record.set_flag("IsPseudoType", self.is_pseudo_type);
        record.set_names("Weaknesses", &self.weaknesses);
        record.set_names("Resistances", &self.resistances);
        record.set_names("Immunities", &self.immunities);
        record.set_strings("Flags", &self.flags);
        record
    }
}

impl From<TypeInfo> for PokemonType {
    fn from(info: TypeInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            icon_position: info.icon_position,
            is_special_type: info.is_special_type,
            is_pseudo_type: info.is_pseudo_type,
            weaknesses: info.weaknesses,
            resistances: info.resistances,
            immunities: info.immunities,
            flags: info.flags,
        }
    }
}

impl From<&PokemonType> for TypeInfo {
    fn from(ty: &PokemonType) -> Self {
        Self {
            id: ty.id,
            name: ty.name.clone(),
            icon_position: ty.icon_position,
            is_special_type: ty.is_special_type,
            is_pseudo_type: ty.is_pseudo_type,
            weaknesses: ty.weaknesses.clone(),
            resistances: ty.resistances.clone(),
            immunities: ty.immunities.clone(),
            flags: ty.flags.clone(),
        }
    }
}

fn dedup(names: &mut Vec<Name>) {
    let mut seen = std::collections::HashSet::new();
    names.retain(|n| seen.insert(*n));
}

#[derive(Debug, Default)]
pub struct TypeCompiler;

impl RecordCompiler for TypeCompiler {
    type Entity = PokemonType;
    type Model = TypeInfo;
    const ORDER: i32 = 1;

    fn data_set(data: &GameData) -> &DataSet<PokemonType> {
        &data.types
    }

    fn data_set_mut(data: &mut GameData) -> &mut DataSet<PokemonType> {
        &mut data.types
    }

    fn convert_to_entity(&self, model: TypeInfo, _: &GameData, _: &FileLineData) -> Result<PokemonType> {
        Ok(model.into())
    }

    fn convert_to_model(&self, entity: &PokemonType, _: &GameData) -> TypeInfo {
        entity.into()
    }

    fn validate_compiled_model(
        &self,
        model: &mut TypeInfo,
        _line: &FileLineData,
        _ctx: &mut CompileContext,
    ) -> Result<()> {
        dedup(&mut model.weaknesses);
        dedup(&mut model.resistances);
        dedup(&mut model.immunities);
        Ok(())
    }

    fn validate_all_compiled_entities(
        &self,
        entities: &mut Vec<PokemonType>,
        _data: &GameData,
        _ctx: &mut CompileContext,
    ) -> Result<()> {
        let ids: std::collections::HashSet<Name> = entities.iter().map(|t| t.id).collect();
        let mut errors = Vec::new();
        for ty in entities.iter() {
            for (key, list) in [
                ("Weaknesses", &ty.weaknesses),
                ("Resistances", &ty.resistances),
                ("Immunities", &ty.immunities),
            ] {
                for other in list.iter().filter(|o| !ids.contains(o)) {
                    errors.push(PbsError::validation(format!(
                        "'{other}' is not a defined type (type {}, {key}).",
                        ty.id
                    )));
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(PbsError::aggregate(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::test_support::{compile_text, render_text};
    use pretty_assertions::assert_eq;

    const TYPES: &str = "\
[NORMAL]
Name = Normal
IconPosition = 0
Weaknesses = FIGHTING
Immunities = GHOST
#-------------------------------
[FIGHTING]
Name = Fighting
IconPosition = 1
Weaknesses = FLYING,FLYING
#-------------------------------
[FLYING]
Name = Flying
IconPosition = 2
#-------------------------------
[GHOST]
Name = Ghost
IconPosition = 7
IsSpecialType = true
Immunities = NORMAL,FIGHTING
";

    #[test]
    fn test_compile_types() {
        let mut data = GameData::new();
        compile_text(TypeCompiler, TYPES, &mut data).unwrap();

        assert_eq!(data.types.len(), 4);
        let fighting = data.types.try_get(&Name::new("FIGHTING")).unwrap();
        assert_eq!(fighting.weaknesses, vec![Name::new("FLYING")]);
        let ghost = data.types.get(&Name::new("GHOST")).unwrap();
        assert!(ghost.is_special_type);
        assert_eq!(ghost.immunities.len(), 2);
    }

    #[test]
    fn test_undefined_matchups_are_aggregated() {
        let text = "\
[NORMAL]
Name = Normal
Weaknesses = FIGHTING
Resistances = ROCK
";
        let mut data = GameData::new();
        let err = compile_text(TypeCompiler, text, &mut data).unwrap_err();
        match err {
            PbsError::Aggregate { message, errors } => {
                assert_eq!(message, "One or more validation errors occurred:");
                let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                assert_eq!(
                    messages,
                    vec![
                        "Validation error: 'FIGHTING' is not a defined type (type NORMAL, Weaknesses).",
                        "Validation error: 'ROCK' is not a defined type (type NORMAL, Resistances).",
                    ]
                );
            }
            other => panic!("expected aggregate, got {other:?}"),
        }
        assert!(!data.types.is_loaded());
    }

    #[test]
    fn test_duplicate_section_rejected() {
        let text = "[NORMAL]\nName = Normal\n[NORMAL]\nName = Again\n";
        let mut data = GameData::new();
        let err = compile_text(TypeCompiler, text, &mut data).unwrap_err();
        assert!(err.to_string().contains("Section NORMAL is defined more than once."));
    }

    #[test]
    fn test_write_types() {
        let mut data = GameData::new();
        compile_text(TypeCompiler, TYPES, &mut data).unwrap();
        insta::assert_snapshot!("types_written", render_text(TypeCompiler, &data));
    }
}
