//! `shadow_pokemon.txt`. The file is optional.

use std::sync::OnceLock;

use crate::error::{PbsError, Result};
use crate::parser::csv::check_range;
use crate::parser::FileLineData;
use crate::registry::{DataKind, DataSet, GameData};
use crate::schema::{require, Element, PbsModel, Record, Schema, SchemaBuilder, SchemaEntry, Value};
use crate::types::{Name, ShadowPokemon, SpeciesForm};

use super::pipeline::RecordCompiler;
use super::CompileContext;

#[derive(Debug, Clone, PartialEq)]
pub struct ShadowPokemonInfo {
    pub id: SpeciesForm,
    pub gauge_size: u32,
    pub moves: Vec<Name>,
    pub flags: Vec<String>,
}

impl PbsModel for ShadowPokemonInfo {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            SchemaBuilder::new("shadow_pokemon")
                .section(vec![
                    Element::reference(DataKind::Species),
                    Element::positive().optional(),
                ])
                .field("GaugeSize", SchemaEntry::single(Element::positive()))
                .field("Moves", SchemaEntry::array(vec![Element::reference(DataKind::Move)]))
                .field("Flags", SchemaEntry::array(vec![Element::string()]))
                .build()
        })
    }

    fn from_record(record: &Record, line: &FileLineData) -> Result<Self> {
        let species = require(record.section_name(0), "section", line)?;
        Ok(Self {
            id: SpeciesForm::new(species, record.section_uint(1).unwrap_or(0)),
            gauge_size: record.uint("GaugeSize").unwrap_or(ShadowPokemon::MAX_GAUGE_SIZE),
            moves: record.names("Moves"),
            flags: record.strings("Flags"),
        })
    }

    fn to_record(&self) -> Record {
        let form = (self.id.form > 0).then(|| Value::from(self.id.form));
        let mut record = Record::new(vec![Some(Value::Name(self.id.species)), form]);
        record.set_value("GaugeSize", Some(self.gauge_size));
        record.set_names("Moves", &self.moves);
        record.set_strings("Flags", &self.flags);
        record
    }
}

#[derive(Debug, Default)]
pub struct ShadowPokemonCompiler;

impl RecordCompiler for ShadowPokemonCompiler {
    type Entity = ShadowPokemon;
    type Model = ShadowPokemonInfo;
    const ORDER: i32 = 10;
    const OPTIONAL_FILE: bool = true;

    fn data_set(data: &GameData) -> &DataSet<ShadowPokemon> {
        &data.shadow_pokemon
    }

    fn data_set_mut(data: &mut GameData) -> &mut DataSet<ShadowPokemon> {
        &mut data.shadow_pokemon
    }

    fn convert_to_entity(
        &self,
        model: ShadowPokemonInfo,
        _: &GameData,
        _: &FileLineData,
    ) -> Result<ShadowPokemon> {
        Ok(ShadowPokemon {
            id: model.id,
            gauge_size: model.gauge_size,
            moves: model.moves,
            flags: model.flags,
        })
    }

    fn convert_to_model(&self, entity: &ShadowPokemon, _: &GameData) -> ShadowPokemonInfo {
        ShadowPokemonInfo {
            id: entity.id,
            gauge_size: entity.gauge_size,
            moves: entity.moves.clone(),
            flags: entity.flags.clone(),
        }
    }

    fn validate_compiled_model(
        &self,
        model: &mut ShadowPokemonInfo,
        line: &FileLineData,
        _ctx: &mut CompileContext,
    ) -> Result<()> {
        let max = ShadowPokemon::MAX_GAUGE_SIZE as i64;
        check_range(model.gauge_size as i64, 1, max, "gauge size").map_err(|e| {
            let at = line.with_key("GaugeSize", &model.gauge_size.to_string(), line.line_number);
            PbsError::parse_at(e, &at)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::test_support::{compile_text, render_text};
    use crate::compiler::{PbsCompiler, PbsFileCompiler};
    use crate::settings::{PbsCompilerSettings, SettingsHandle};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compile_shadow_pokemon() {
        let text = "\
[LUGIA]
GaugeSize = 6000
";
        let mut data = GameData::new();
        let err = compile_text(ShadowPokemonCompiler, text, &mut data).unwrap_err();
        assert!(err.to_string().contains("Invalid gauge size: 6000 (must be 1-4000)."));

        let text = "\
[BAYLEEF]
Moves = SHADOWBLITZ,SHADOWRUSH
#-------------------------------
[MAROWAK,1]
GaugeSize = 2500
Flags = Hidden
";
        let mut data = GameData::new();
        compile_text(ShadowPokemonCompiler, text, &mut data).unwrap();
        let bayleef = data.shadow_pokemon.try_get(&SpeciesForm::base("BAYLEEF")).unwrap();
        assert_eq!(bayleef.gauge_size, 4000);
        assert_eq!(bayleef.moves.len(), 2);
        let marowak = data.shadow_pokemon.try_get(&SpeciesForm::new("MAROWAK", 1)).unwrap();
        assert_eq!(marowak.gauge_size, 2500);

        let written = render_text(ShadowPokemonCompiler, &data);
        assert!(written.contains("[MAROWAK,1]\nGaugeSize = 2500\nFlags = Hidden\n"));
    }

    #[test]
    fn test_missing_file_compiles_empty() {
        let dir = tempfile::tempdir().unwrap();
        let settings = PbsCompilerSettings {
            pbs_file_base_path: dir.path().to_path_buf(),
            ..PbsCompilerSettings::default()
        };
        let compiler = PbsFileCompiler::new(ShadowPokemonCompiler, SettingsHandle::new(settings));
        let mut data = GameData::new();
        compiler.compile(&mut data, &mut CompileContext::new()).unwrap();
        assert!(data.shadow_pokemon.is_loaded());
        assert!(data.shadow_pokemon.is_empty());

        compiler.write_to_file(&data, &mut CompileContext::new()).unwrap();
        assert!(!dir.path().join("shadow_pokemon.txt").exists());
    }
}
