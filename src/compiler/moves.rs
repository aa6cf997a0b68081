//! `moves.txt`.

use std::sync::OnceLock;

use crate::error::{PbsError, Result};
use crate::parser::FileLineData;
use crate::registry::{DataKind, DataSet, GameData};
use crate::schema::{require, Element, PbsModel, Record, Schema, SchemaBuilder, SchemaEntry, Value};
use crate::types::enums::{MOVE_CATEGORIES, TARGETS};
use crate::types::{Move, MoveCategory, Name};

use super::pipeline::RecordCompiler;
use super::CompileContext;

#[derive(Debug, Clone, PartialEq)]
pub struct MoveInfo {
    pub id: Name,
    pub name: String,
    pub move_type: Option<Name>,
    pub category: MoveCategory,
    pub power: u32,
    pub accuracy: u32,
    pub total_pp: u32,
    pub target: Option<Name>,
    pub priority: i32,
    pub function_code: String,
    pub flags: Vec<String>,
    pub effect_chance: u32,
    pub description: String,
}

impl PbsModel for MoveInfo {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            SchemaBuilder::new("moves")
                .field("Name", SchemaEntry::single(Element::string()))
                .field(
                    "Type",
                    SchemaEntry::single(Element::reference(DataKind::Type).allow_none()),
                )
                .field("Category", SchemaEntry::single(Element::enumeration(&MOVE_CATEGORIES)))
                .field("Power", SchemaEntry::single(Element::uint()))
                .field("Accuracy", SchemaEntry::single(Element::uint()))
                .field("TotalPP", SchemaEntry::single(Element::uint()))
                .field("Target", SchemaEntry::single(Element::enumeration(&TARGETS).allow_none()))
                .field("Priority", SchemaEntry::single(Element::int()))
                .field("FunctionCode", SchemaEntry::single(Element::string()))
                .field("Flags", SchemaEntry::array(vec![Element::string()]))
                .field("EffectChance", SchemaEntry::single(Element::uint()))
                .field("Description", SchemaEntry::single(Element::text()))
                .build()
        })
    }

    fn from_record(record: &Record, line: &FileLineData) -> Result<Self> {
        let category = record
            .name("Category")
            .and_then(|c| MoveCategory::from_name(c.as_str()))
            .unwrap_or(MoveCategory::Status);
        Ok(Self {
            id: require(record.section_name(0), "section", line)?,
            name: record.string("Name").unwrap_or_else(|| "Unnamed".to_string()),
            move_type: record.name("Type"),
            category,
            power: record.uint("Power").unwrap_or(0),
            accuracy: record.uint("Accuracy").unwrap_or(100),
            total_pp: record.uint("TotalPP").unwrap_or(5),
            target: record.name("Target"),
            priority: record
                .int("Priority")
                .and_then(|p| i32::try_from(p).ok())
                .unwrap_or(0),
            function_code: record.string("FunctionCode").unwrap_or_default(),
            flags: record.strings("Flags"),
            effect_chance: record.uint("EffectChance").unwrap_or(0),
            description: record.string("Description").unwrap_or_else(|| "???".to_string()),
        })
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new(vec![Some(Value::Name(self.id))]);
        record.set_value("Name", Some(self.name.as_str()));
        record.set_value("Type", self.move_type);
        record.set_value("Category", Some(self.category.as_str()));
        record.set_value("Power", (self.power > 0).then_some(self.power));
        record.set_value("Accuracy", Some(self.accuracy));
        record.set_value("TotalPP", Some(self.total_pp));
        record.set_value("Target", self.target);
        record.set_value("Priority", (self.priority != 0).then_some(self.priority));
        if !self.function_code.is_empty() {
            record.set_value("FunctionCode", Some(self.function_code.as_str()));
        }
        record.set_strings("Flags", &self.flags);
        record.set_value("EffectChance", (self.effect_chance > 0).then_some(self.effect_chance));
        record.set_value("Description", Some(self.description.as_str()));
        record
    }
}

#[derive(Debug, Default)]
pub struct MoveCompiler;

impl RecordCompiler for MoveCompiler {
    type Entity = Move;
    type Model = MoveInfo;
    const ORDER: i32 = 5;

    fn data_set(data: &GameData) -> &DataSet<Move> {
        &data.moves
    }

    fn data_set_mut(data: &mut GameData) -> &mut DataSet<Move> {
        &mut data.moves
    }

    fn convert_to_entity(&self, m: MoveInfo, _: &GameData, _: &FileLineData) -> Result<Move> {
        Ok(Move {
            id: m.id,
            name: m.name,
            move_type: m.move_type,
            category: m.category,
            power: m.power,
            accuracy: m.accuracy,
            total_pp: m.total_pp,
            target: m.target,
            priority: m.priority,
            function_code: m.function_code,
            flags: m.flags,
            effect_chance: m.effect_chance,
            description: m.description,
        })
    }

    fn convert_to_model(&self, m: &Move, _: &GameData) -> MoveInfo {
        MoveInfo {
            id: m.id,
            name: m.name.clone(),
            move_type: m.move_type,
            category: m.category,
            power: m.power,
            accuracy: m.accuracy,
            total_pp: m.total_pp,
            target: m.target,
            priority: m.priority,
            function_code: m.function_code.clone(),
            flags: m.flags.clone(),
            effect_chance: m.effect_chance,
            description: m.description.clone(),
        }
    }

    fn validate_compiled_model(
        &self,
        model: &mut MoveInfo,
        line: &FileLineData,
        ctx: &mut CompileContext,
    ) -> Result<()> {
        if model.category == MoveCategory::Status && model.power != 0 {
            return Err(PbsError::validation_at(
                format!(
                    "Move {} is defined as a Status move with a non-zero base damage.",
                    model.name
                ),
                line,
            ));
        }
        if model.category != MoveCategory::Status && model.power == 0 {
            ctx.warn(
                "pbs::moves::zero-power",
                format!(
                    "Move {} is defined as Physical or Special but has a base damage of 0. Changing it to a Status move.",
                    model.name
                ),
                Some(line),
            );
            model.category = MoveCategory::Status;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::test_support::{compile_text, render_text};
    use crate::types::PokemonType;
    use pretty_assertions::assert_eq;

    fn data_with_types() -> GameData {
        let mut data = GameData::new();
        data.types.import(["NORMAL", "FIRE"].map(|id| PokemonType {
            id: Name::new(id),
            name: id.to_string(),
            icon_position: 0,
            is_special_type: false,
            is_pseudo_type: false,
            weaknesses: vec![],
            resistances: vec![],
            immunities: vec![],
            flags: vec![],
        }));
        data
    }

    const MOVES: &str = "\
[TACKLE]
Name = Tackle
Type = NORMAL
Category = Physical
Power = 40
Accuracy = 100
TotalPP = 35
Target = NearOther
FunctionCode = None
Flags = Contact,CanProtect,CanMirrorMove
Description = A physical attack in which the user charges and slams into the target.
#-------------------------------
[GROWL]
Name = Growl
Type = NORMAL
Category = Status
Accuracy = 100
TotalPP = 40
Target = AllNearFoes
FunctionCode = LowerTargetAttack1
Description = The user growls in an endearing way, making opposing Pokémon less wary.
";

    #[test]
    fn test_compile_moves() {
        let mut data = data_with_types();
        let ctx = compile_text(MoveCompiler, MOVES, &mut data).unwrap();
        assert!(ctx.diagnostics.is_ok());

        let tackle = data.moves.try_get(&Name::new("TACKLE")).unwrap();
        assert_eq!(tackle.power, 40);
        assert_eq!(tackle.category, MoveCategory::Physical);
        assert_eq!(tackle.target, Some(Name::new("NearOther")));
        assert_eq!(tackle.flags.len(), 3);

        let growl = data.moves.try_get(&Name::new("GROWL")).unwrap();
        assert!(!growl.is_damaging());
        assert_eq!(growl.total_pp, 40);
    }

    #[test]
    fn test_status_move_with_power_fails() {
        let text = "[GROWL]\nName = Growl\nCategory = Status\nPower = 10\n";
        let mut data = data_with_types();
        let err = compile_text(MoveCompiler, text, &mut data).unwrap_err();
        assert!(err
            .to_string()
            .contains("Move Growl is defined as a Status move with a non-zero base damage."));
        assert!(!data.moves.is_loaded());
    }

    #[test]
    fn test_zero_power_damaging_move_becomes_status() {
        let text = "[SPLASH]\nName = Splash\nCategory = Physical\n";
        let mut data = data_with_types();
        let ctx = compile_text(MoveCompiler, text, &mut data).unwrap();

        assert_eq!(ctx.diagnostics.warning_count(), 1);
        let warning = ctx.diagnostics.iter().next().unwrap();
        assert_eq!(
            warning.message,
            "Move Splash is defined as Physical or Special but has a base damage of 0. Changing it to a Status move."
        );
        let splash = data.moves.try_get(&Name::new("SPLASH")).unwrap();
        assert_eq!(splash.category, MoveCategory::Status);
    }

    #[test]
    fn test_undefined_type_reference() {
        let text = "[EMBER]\nName = Ember\nType = FLAME\nCategory = Special\nPower = 40\n";
        let mut data = data_with_types();
        let err = compile_text(MoveCompiler, text, &mut data).unwrap_err();
        assert!(err.to_string().contains("Undefined type 'FLAME'."));
    }

    #[test]
    fn test_write_moves() {
        let mut data = data_with_types();
        compile_text(MoveCompiler, MOVES, &mut data).unwrap();
        insta::assert_snapshot!("moves_written", render_text(MoveCompiler, &data));
    }
}
