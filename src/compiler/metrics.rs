//! `pokemon_metrics.txt`: sprite positions per species form.

use std::sync::OnceLock;

use crate::error::Result;
use crate::parser::FileLineData;
use crate::registry::{DataKind, DataSet, GameData};
use crate::schema::{
    require, Element, FieldValue, PbsModel, Record, Row, Schema, SchemaBuilder, SchemaEntry, Value,
};
use crate::types::{Point, SpeciesForm, SpeciesMetrics};

use super::pipeline::RecordCompiler;

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesMetricsInfo {
    pub id: SpeciesForm,
    pub back_sprite: Point,
    pub front_sprite: Point,
    pub front_sprite_altitude: i32,
    pub shadow_x: i32,
    pub shadow_size: u32,
}

fn point(record: &Record, key: &str) -> Point {
    match record.ints32(key).as_slice() {
        [x, y] => Point::new(*x, *y),
        _ => Point::default(),
    }
}

fn point_row(point: Point) -> Row {
    vec![Some(Value::from(point.x)), Some(Value::from(point.y))]
}

impl PbsModel for SpeciesMetricsInfo {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            SchemaBuilder::new("pokemon_metrics")
                .section(vec![
                    Element::reference(DataKind::Species),
                    Element::uint().optional(),
                ])
                .field("BackSprite", SchemaEntry::tuple(vec![Element::int(), Element::int()]))
                .field("FrontSprite", SchemaEntry::tuple(vec![Element::int(), Element::int()]))
                .field("FrontSpriteAltitude", SchemaEntry::single(Element::int()))
                .field("ShadowX", SchemaEntry::single(Element::int()))
                .field("ShadowSize", SchemaEntry::single(Element::uint()))
                .build()
        })
    }

    fn from_record(record: &Record, line: &FileLineData) -> Result<Self> {
        let species = require(record.section_name(0), "section", line)?;
        let form = record.section_uint(1).unwrap_or(0);
        Ok(Self {
            id: SpeciesForm::new(species, form),
            back_sprite: point(record, "BackSprite"),
            front_sprite: point(record, "FrontSprite"),
            front_sprite_altitude: record.int32("FrontSpriteAltitude").unwrap_or(0),
            shadow_x: record.int32("ShadowX").unwrap_or(0),
            shadow_size: record.uint("ShadowSize").unwrap_or(2),
        })
    }

    fn to_record(&self) -> Record {
        let form = (self.id.form > 0).then(|| Value::from(self.id.form));
        let mut record = Record::new(vec![Some(Value::Name(self.id.species)), form]);
        record.set_row("BackSprite", point_row(self.back_sprite));
        record.set_row("FrontSprite", point_row(self.front_sprite));
        record.set_value("FrontSpriteAltitude", Some(self.front_sprite_altitude));
        record.set_value("ShadowX", Some(self.shadow_x));
        record.set_value("ShadowSize", Some(self.shadow_size));
        record
    }
}

#[derive(Debug, Default)]
pub struct PokemonMetricsCompiler;

impl RecordCompiler for PokemonMetricsCompiler {
    type Entity = SpeciesMetrics;
    type Model = SpeciesMetricsInfo;
    const ORDER: i32 = 10;

    fn data_set(data: &GameData) -> &DataSet<SpeciesMetrics> {
        &data.species_metrics
    }

    fn data_set_mut(data: &mut GameData) -> &mut DataSet<SpeciesMetrics> {
        &mut data.species_metrics
    }

    fn convert_to_entity(
        &self,
        m: SpeciesMetricsInfo,
        _: &GameData,
        _: &FileLineData,
    ) -> Result<SpeciesMetrics> {
        Ok(SpeciesMetrics {
            id: m.id,
            back_sprite: m.back_sprite,
            front_sprite: m.front_sprite,
            front_sprite_altitude: m.front_sprite_altitude,
            shadow_x: m.shadow_x,
            shadow_size: m.shadow_size,
        })
    }

    fn convert_to_model(&self, m: &SpeciesMetrics, _: &GameData) -> SpeciesMetricsInfo {
        SpeciesMetricsInfo {
            id: m.id,
            back_sprite: m.back_sprite,
            front_sprite: m.front_sprite,
            front_sprite_altitude: m.front_sprite_altitude,
            shadow_x: m.shadow_x,
            shadow_size: m.shadow_size,
        }
    }

    fn get_property_for_pbs(
        &self,
        model: &SpeciesMetricsInfo,
        key: &str,
        value: FieldValue,
    ) -> Option<FieldValue> {
        (key != "FrontSpriteAltitude" || model.front_sprite_altitude != 0).then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::test_support::{compile_text, render_text};
    use crate::types::{Name, Species};
    use pretty_assertions::assert_eq;

    const METRICS: &str = "\
[BUTTERFREE]
BackSprite = 0,-4
FrontSprite = 0,-9
FrontSpriteAltitude = 12
ShadowX = 0
ShadowSize = 3
#-------------------------------
[RATTATA,1]
BackSprite = 1,2
FrontSprite = 0,14
ShadowSize = 2
";

    #[test]
    fn test_compile_metrics() {
        let mut data = GameData::new();
        compile_text(PokemonMetricsCompiler, METRICS, &mut data).unwrap();

        let butterfree = data
            .species_metrics
            .try_get(&SpeciesForm::base("BUTTERFREE"))
            .unwrap();
        assert_eq!(butterfree.back_sprite, Point::new(0, -4));
        assert_eq!(butterfree.front_sprite_altitude, 12);
        assert_eq!(butterfree.shadow_size, 3);

        let alolan = data
            .species_metrics
            .try_get(&SpeciesForm::new("RATTATA", 1))
            .unwrap();
        assert_eq!(alolan.front_sprite, Point::new(0, 14));
        assert_eq!(alolan.shadow_x, 0);
    }

    #[test]
    fn test_offsets_must_fit() {
        let mut data = GameData::new();
        let err = compile_text(PokemonMetricsCompiler, "[ABRA]\nFrontSpriteAltitude = 2147483648\n", &mut data)
            .unwrap_err();
        assert!(err.to_string().contains("Field '2147483648' is out of range."));

        let err = compile_text(PokemonMetricsCompiler, "[ABRA]\nBackSprite = 0,-2147483649\n", &mut data)
            .unwrap_err();
        assert!(err.to_string().contains("Field '-2147483649' is out of range."));
        assert!(!data.species_metrics.is_loaded());
    }

    #[test]
    fn test_species_must_exist_once_loaded() {
        let mut data = GameData::new();
        data.species.import(vec![Species::new(SpeciesForm::base(Name::new("BUTTERFREE")))]);
        let err = compile_text(PokemonMetricsCompiler, METRICS, &mut data).unwrap_err();
        assert!(err.to_string().contains("Undefined species 'RATTATA'."));
    }

    #[test]
    fn test_write_omits_zero_altitude() {
        let mut data = GameData::new();
        compile_text(PokemonMetricsCompiler, METRICS, &mut data).unwrap();
        let written = render_text(PokemonMetricsCompiler, &data);
        assert_eq!(
            written.lines().skip(1).collect::<Vec<_>>(),
            vec![
                "#-------------------------------",
                "[BUTTERFREE]",
                "BackSprite = 0,-4",
                "FrontSprite = 0,-9",
                "FrontSpriteAltitude = 12",
                "ShadowX = 0",
                "ShadowSize = 3",
                "#-------------------------------",
                "[RATTATA,1]",
                "BackSprite = 1,2",
                "FrontSprite = 0,14",
                "ShadowX = 0",
                "ShadowSize = 2",
            ]
        );
    }
}
