//! `abilities.txt`.

use std::sync::OnceLock;

use crate::error::Result;
use crate::parser::FileLineData;
use crate::registry::{DataSet, GameData};
use crate::schema::{require, Element, PbsModel, Record, Schema, SchemaBuilder, SchemaEntry, Value};
use crate::types::{Ability, Name};

use super::pipeline::RecordCompiler;

#[derive(Debug, Clone, PartialEq)]
pub struct AbilityInfo {
    pub id: Name,
    pub name: String,
    pub description: String,
    pub flags: Vec<String>,
}

impl PbsModel for AbilityInfo {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            SchemaBuilder::new("abilities")
                .field("Name", SchemaEntry::single(Element::string()))
                .field("Description", SchemaEntry::single(Element::text()))
                .field("Flags", SchemaEntry::array(vec![Element::string()]))
                .build()
        })
    }

    fn from_record(record: &Record, line: &FileLineData) -> Result<Self> {
        Ok(Self {
            id: require(record.section_name(0), "section", line)?,
            name: record.string("Name").unwrap_or_else(|| "Unnamed".to_string()),
            description: record.string("Description").unwrap_or_else(|| "???".to_string()),
            flags: record.strings("Flags"),
        })
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new(vec![Some(Value::Name(self.id))]);
        record.set_value("Name", Some(self.name.as_str()));
        record.set_value("Description", Some(self.description.as_str()));
        record.set_strings("Flags", &self.flags);
        record
    }
}

#[derive(Debug, Default)]
pub struct AbilityCompiler;

impl RecordCompiler for AbilityCompiler {
    type Entity = Ability;
    type Model = AbilityInfo;
    const ORDER: i32 = 4;

    fn data_set(data: &GameData) -> &DataSet<Ability> {
        &data.abilities
    }

    fn data_set_mut(data: &mut GameData) -> &mut DataSet<Ability> {
        &mut data.abilities
    }

    fn convert_to_entity(&self, model: AbilityInfo, _: &GameData, _: &FileLineData) -> Result<Ability> {
        Ok(Ability {
            id: model.id,
            name: model.name,
            description: model.description,
            flags: model.flags,
        })
    }

    fn convert_to_model(&self, entity: &Ability, _: &GameData) -> AbilityInfo {
        AbilityInfo {
            id: entity.id,
            name: entity.name.clone(),
            description: entity.description.clone(),
            flags: entity.flags.clone(),
        }
    }
}
