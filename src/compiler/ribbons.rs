//! `ribbons.txt`.

use std::sync::OnceLock;

use crate::error::Result;
use crate::parser::FileLineData;
use crate::registry::{DataSet, GameData};
use crate::schema::{require, Element, PbsModel, Record, Schema, SchemaBuilder, SchemaEntry, Value};
use crate::types::{Name, Ribbon};

use super::pipeline::RecordCompiler;

#[derive(Debug, Clone, PartialEq)]
pub struct RibbonInfo {
    pub id: Name,
    pub name: String,
    pub icon_position: u32,
    pub description: String,
    pub flags: Vec<String>,
}

impl PbsModel for RibbonInfo {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            SchemaBuilder::new("ribbons")
                .field("Name", SchemaEntry::single(Element::string()))
                .field("IconPosition", SchemaEntry::single(Element::uint()))
                .field("Description", SchemaEntry::single(Element::text()))
                .field("Flags", SchemaEntry::array(vec![Element::string()]))
                .build()
        })
    }

    fn from_record(record: &Record, line: &FileLineData) -> Result<Self> {
        Ok(Self {
            id: require(record.section_name(0), "section", line)?,
            name: record.string("Name").unwrap_or_else(|| "Unnamed".to_string()),
            icon_position: record.uint("IconPosition").unwrap_or(0),
            description: record.string("Description").unwrap_or_else(|| "???".to_string()),
            flags: record.strings("Flags"),
        })
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new(vec![Some(Value::Name(self.id))]);
        record.set_value("Name", Some(self.name.as_str()));
        record.set_value("IconPosition", Some(self.icon_position));
        record.set_value("Description", Some(self.description.as_str()));
        record.set_strings("Flags", &self.flags);
        record
    }
}

impl From<RibbonInfo> for Ribbon {
    fn from(info: RibbonInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            icon_position: info.icon_position,
            description: info.description,
            flags: info.flags,
        }
    }
}

#[derive(Debug, Default)]
pub struct RibbonCompiler;

impl RecordCompiler for RibbonCompiler {
    type Entity = Ribbon;
    type Model = RibbonInfo;
    const ORDER: i32 = 12;

    fn data_set(data: &GameData) -> &DataSet<Ribbon> {
        &data.ribbons
    }

    fn data_set_mut(data: &mut GameData) -> &mut DataSet<Ribbon> {
        &mut data.ribbons
    }

    fn convert_to_entity(&self, model: RibbonInfo, _: &GameData, _: &FileLineData) -> Result<Ribbon> {
        Ok(model.into())
    }

    fn convert_to_model(&self, entity: &Ribbon, _: &GameData) -> RibbonInfo {
        RibbonInfo {
            id: entity.id,
            name: entity.name.clone(),
            icon_position: entity.icon_position,
            description: entity.description.clone(),
            flags: entity.flags.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::test_support::compile_text;

    #[test]
    fn test_compile_ribbons() {
        let text = "\
[HOENNCOOL]
Name = Cool Ribbon
IconPosition = 0
Description = Hoenn Cool Contest Normal Rank winner!
[HOENNCOOLSUPER]
Name = Cool Ribbon Super
IconPosition = 1
Description = Hoenn Cool Contest Super Rank winner!
Flags = Contest,Hoenn
";
        let mut data = GameData::new();
        compile_text(RibbonCompiler, text, &mut data).unwrap();

        assert_eq!(data.ribbons.len(), 2);
        let sup = data.ribbons.try_get(&Name::new("HOENNCOOLSUPER")).unwrap();
        assert_eq!(sup.icon_position, 1);
        assert_eq!(sup.flags, vec!["Contest".to_string(), "Hoenn".to_string()]);
    }

    #[test]
    fn test_bad_icon_position() {
        let text = "[HOENNCOOL]\nName = Cool Ribbon\nIconPosition = -1\n";
        let mut data = GameData::new();
        let err = compile_text(RibbonCompiler, text, &mut data).unwrap_err();
        assert!(err.to_string().contains("Field '-1' is not a positive integer or 0."));
        assert!(err.to_string().contains("section HOENNCOOL, key IconPosition"));
    }
}
