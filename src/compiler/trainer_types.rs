//! `trainer_types.txt`.

use std::sync::OnceLock;

use crate::error::Result;
use crate::parser::FileLineData;
use crate::registry::{DataSet, GameData};
use crate::schema::{
    require, Element, FieldValue, PbsModel, Record, Schema, SchemaBuilder, SchemaEntry, Value,
};
use crate::types::enums::TRAINER_GENDERS;
use crate::types::{Name, TrainerGender, TrainerType};

use super::pipeline::RecordCompiler;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainerTypeInfo {
    pub id: Name,
    pub name: String,
    pub gender: TrainerGender,
    pub base_money: u32,
    /// Defaults to the base money.
    pub skill_level: Option<u32>,
    pub flags: Vec<String>,
    pub intro_bgm: Option<String>,
    pub battle_bgm: Option<String>,
    pub victory_bgm: Option<String>,
}

impl PbsModel for TrainerTypeInfo {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            SchemaBuilder::new("trainer_types")
                .field("Name", SchemaEntry::single(Element::string()))
                .field("Gender", SchemaEntry::single(Element::enumeration(&TRAINER_GENDERS)))
                .field("BaseMoney", SchemaEntry::single(Element::uint()))
                .field("SkillLevel", SchemaEntry::single(Element::uint()))
                .field("Flags", SchemaEntry::array(vec![Element::string()]))
                .field("IntroBGM", SchemaEntry::single(Element::string()))
                .field("BattleBGM", SchemaEntry::single(Element::string()))
                .field("VictoryBGM", SchemaEntry::single(Element::string()))
                .build()
        })
    }

    fn from_record(record: &Record, line: &FileLineData) -> Result<Self> {
        Ok(Self {
            id: require(record.section_name(0), "section", line)?,
            name: record.string("Name").unwrap_or_else(|| "Unnamed".to_string()),
            gender: record
                .name("Gender")
                .and_then(|g| TrainerGender::from_name(g.as_str()))
                .unwrap_or(TrainerGender::Unknown),
            base_money: record.uint("BaseMoney").unwrap_or(30),
            skill_level: record.uint("SkillLevel"),
            flags: record.strings("Flags"),
            intro_bgm: record.string("IntroBGM"),
            battle_bgm: record.string("BattleBGM"),
            victory_bgm: record.string("VictoryBGM"),
        })
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new(vec![Some(Value::Name(self.id))]);
        record.set_value("Name", Some(self.name.as_str()));
        record.set_value("Gender", Some(self.gender.as_str()));
        record.set_value("BaseMoney", Some(self.base_money));
        record.set_value("SkillLevel", self.skill_level);
        record.set_strings("Flags", &self.flags);
        record.set_value("IntroBGM", self.intro_bgm.as_deref());
        record.set_value("BattleBGM", self.battle_bgm.as_deref());
        record.set_value("VictoryBGM", self.victory_bgm.as_deref());
        record
    }
}

#[derive(Debug, Default)]
pub struct TrainerTypeCompiler;

impl RecordCompiler for TrainerTypeCompiler {
    type Entity = TrainerType;
    type Model = TrainerTypeInfo;
    const ORDER: i32 = 14;

    fn data_set(data: &GameData) -> &DataSet<TrainerType> {
        &data.trainer_types
    }

    fn data_set_mut(data: &mut GameData) -> &mut DataSet<TrainerType> {
        &mut data.trainer_types
    }

    fn convert_to_entity(&self, m: TrainerTypeInfo, _: &GameData, _: &FileLineData) -> Result<TrainerType> {
        Ok(TrainerType {
            id: m.id,
            name: m.name,
            gender: m.gender,
            base_money: m.base_money,
            skill_level: m.skill_level.unwrap_or(m.base_money),
            flags: m.flags,
            intro_bgm: m.intro_bgm,
            battle_bgm: m.battle_bgm,
            victory_bgm: m.victory_bgm,
        })
    }

    fn convert_to_model(&self, t: &TrainerType, _: &GameData) -> TrainerTypeInfo {
        TrainerTypeInfo {
            id: t.id,
            name: t.name.clone(),
            gender: t.gender,
            base_money: t.base_money,
            skill_level: Some(t.skill_level),
            flags: t.flags.clone(),
            intro_bgm: t.intro_bgm.clone(),
            battle_bgm: t.battle_bgm.clone(),
            victory_bgm: t.victory_bgm.clone(),
        }
    }

    fn get_property_for_pbs(&self, model: &TrainerTypeInfo, key: &str, value: FieldValue) -> Option<FieldValue> {
        let omit = key == "SkillLevel" && model.skill_level == Some(model.base_money);
        (!omit).then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::test_support::{compile_text, render_text};
    use pretty_assertions::assert_eq;

    const TRAINER_TYPES: &str = "\
[YOUNGSTER]
Name = Youngster
Gender = Male
BaseMoney = 16
#-------------------------------
[LEADER_Brock]
Name = Leader
Gender = male
BaseMoney = 100
SkillLevel = 48
Flags = Leader
BattleBGM = Battle gym leader
VictoryBGM = Battle victory leader
";

    #[test]
    fn test_skill_level_defaults_to_base_money() {
        let mut data = GameData::new();
        compile_text(TrainerTypeCompiler, TRAINER_TYPES, &mut data).unwrap();

        let youngster = data.trainer_types.try_get(&Name::new("YOUNGSTER")).unwrap();
        assert_eq!(youngster.skill_level, 16);
        assert!(youngster.is_male());

        let leader = data.trainer_types.try_get(&Name::new("LEADER_Brock")).unwrap();
        assert_eq!(leader.skill_level, 48);
        assert!(leader.has_flag("Leader"));
        assert_eq!(leader.battle_bgm.as_deref(), Some("Battle gym leader"));
    }

    #[test]
    fn test_unknown_gender_is_default() {
        let mut data = GameData::new();
        compile_text(TrainerTypeCompiler, "[POKEMONTRAINER_Red]\nName = Pokémon Trainer\n", &mut data)
            .unwrap();
        let red = data.trainer_types.try_get(&Name::new("POKEMONTRAINER_Red")).unwrap();
        assert_eq!(red.gender, TrainerGender::Unknown);
        assert_eq!(red.base_money, 30);
    }

    #[test]
    fn test_write_omits_default_skill_level() {
        let mut data = GameData::new();
        compile_text(TrainerTypeCompiler, TRAINER_TYPES, &mut data).unwrap();
        let written = render_text(TrainerTypeCompiler, &data);
        assert_eq!(
            written.lines().skip(1).collect::<Vec<_>>(),
            vec![
                "#-------------------------------",
                "[YOUNGSTER]",
                "Name = Youngster",
                "Gender = Male",
                "BaseMoney = 16",
                "#-------------------------------",
                "[LEADER_Brock]",
                "Name = Leader",
                "Gender = Male",
                "BaseMoney = 100",
                "SkillLevel = 48",
                "Flags = Leader",
                "BattleBGM = Battle gym leader",
                "VictoryBGM = Battle victory leader",
            ]
        );
    }
}
