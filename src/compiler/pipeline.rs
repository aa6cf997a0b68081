//! Shared compile flow for section-per-entity PBS files.
//!
//! A file is read section by section. Each section is parsed against the
//! model's schema, its entity references are checked, and the model is
//! validated and converted. Once every section converted, the whole set is
//! validated and imported in one step. Any error stops the compile before
//! the import, so a failed file leaves the registry as it was.

use std::collections::HashSet;
use std::io::BufRead;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::{PbsError, Result};
use crate::parser::{open_file, FileLineData, Sections};
use crate::registry::{DataKind, DataSet, Entity, GameData};
use crate::schema::{FieldValue, PbsModel, Record, Schema};
use crate::settings::SettingsHandle;

use super::writer::PbsText;
use super::{CompileContext, PbsCompiler};

/// The per-kind strategy plugged into [`PbsFileCompiler`].
///
/// Only the conversions are required; every validation step defaults to
/// doing nothing.
pub trait RecordCompiler: Send + Sync {
    type Entity: Entity;
    type Model: PbsModel;

    /// Position in the compile sequence.
    const ORDER: i32;

    /// A missing file compiles to an empty set instead of failing.
    const OPTIONAL_FILE: bool = false;

    fn data_set(data: &GameData) -> &DataSet<Self::Entity>;

    fn data_set_mut(data: &mut GameData) -> &mut DataSet<Self::Entity>;

    fn convert_to_entity(
        &self,
        model: Self::Model,
        data: &GameData,
        line: &FileLineData,
    ) -> Result<Self::Entity>;

    fn convert_to_model(&self, entity: &Self::Entity, data: &GameData) -> Self::Model;

    /// Check or fix up one model before conversion.
    fn validate_compiled_model(
        &self,
        _model: &mut Self::Model,
        _line: &FileLineData,
        _ctx: &mut CompileContext,
    ) -> Result<()> {
        Ok(())
    }

    /// Check or fix up the whole converted set before import.
    fn validate_all_compiled_entities(
        &self,
        _entities: &mut Vec<Self::Entity>,
        _data: &GameData,
        _ctx: &mut CompileContext,
    ) -> Result<()> {
        Ok(())
    }

    /// Value written for `key`; `None` leaves the key out.
    fn get_property_for_pbs(
        &self,
        _model: &Self::Model,
        _key: &str,
        value: FieldValue,
    ) -> Option<FieldValue> {
        Some(value)
    }

    /// Entities this compiler writes, in file order.
    fn entities<'a>(&self, data: &'a GameData) -> Vec<&'a Self::Entity> {
        Self::data_set(data).iter().collect()
    }

    /// Store a compiled set.
    fn import(&self, data: &mut GameData, entities: Vec<Self::Entity>) {
        Self::data_set_mut(data).import(entities);
    }
}

/// Runs a [`RecordCompiler`] against its PBS file.
pub struct PbsFileCompiler<C> {
    compiler: C,
    settings: SettingsHandle,
}

impl<C: RecordCompiler> PbsFileCompiler<C> {
    pub fn new(compiler: C, settings: SettingsHandle) -> Self {
        Self { compiler, settings }
    }

    pub fn inner(&self) -> &C {
        &self.compiler
    }

    fn schema() -> &'static Schema {
        C::Model::schema()
    }

    /// Current path of the PBS file.
    pub fn path(&self) -> PathBuf {
        self.settings.read().pbs_file(Self::schema().file_base())
    }

    /// Compile from any reader; `base` names the source in error reports.
    pub fn compile_from<R: BufRead>(
        &self,
        reader: R,
        base: FileLineData,
        data: &mut GameData,
        ctx: &mut CompileContext,
    ) -> Result<()> {
        let schema = Self::schema();
        let mut entities = Vec::new();
        let mut seen = HashSet::new();

        for section in Sections::new(reader, base.clone(), ctx.cancel.clone()) {
            let section = section?;
            ctx.cancel.check()?;
            let line = section.line_data(&base);

            let record = schema.parse_section(&section, &base)?;
            check_references(schema, &record, data, &line, C::Entity::KIND)?;
            let mut model = C::Model::from_record(&record, &line)?;
            self.compiler.validate_compiled_model(&mut model, &line, ctx)?;
            let entity = self.compiler.convert_to_entity(model, data, &line)?;

            if !seen.insert(entity.key()) {
                return Err(PbsError::parse_at(
                    format!("Section {} is defined more than once.", entity.key()),
                    &line,
                ));
            }
            debug!(section = %section.name, "Compiled record");
            entities.push(entity);
        }

        ctx.cancel.check()?;
        self.compiler
            .validate_all_compiled_entities(&mut entities, data, ctx)?;
        debug!(count = entities.len(), kind = %C::Entity::KIND, "Importing");
        self.compiler.import(data, entities);
        Ok(())
    }

    /// The PBS text for the entities in `data`.
    pub fn render(&self, data: &GameData) -> PbsText {
        let schema = Self::schema();
        let mut text = PbsText::new();
        for entity in self.compiler.entities(data) {
            let model = self.compiler.convert_to_model(entity, data);
            let mut record = model.to_record();
            let keys: Vec<String> = record.fields.keys().cloned().collect();
            for key in keys {
                let Some(value) = record.remove(&key) else {
                    continue;
                };
                if let Some(value) = self.compiler.get_property_for_pbs(&model, &key, value) {
                    record.set(key, value);
                }
            }
            text.record(schema.write_record(&record));
        }
        text
    }
}

/// Every schema reference in `record` must name a loaded entity.
///
/// Kinds that are not loaded yet, and the kind being compiled, are skipped;
/// those are checked by the owning compiler once the whole set is known.
pub(super) fn check_references(
    schema: &Schema,
    record: &Record,
    data: &GameData,
    line: &FileLineData,
    own: DataKind,
) -> Result<()> {
    for (kind, name, key) in schema.references(record) {
        if kind == own || !data.is_loaded(kind) {
            continue;
        }
        if !data.contains_name(kind, name) {
            let line = if key == "section" {
                line.clone()
            } else {
                line.with_key(&key, name.as_str(), line.line_number)
            };
            return Err(PbsError::parse_at(format!("Undefined {kind} '{name}'."), &line));
        }
    }
    Ok(())
}

impl<C: RecordCompiler> PbsCompiler for PbsFileCompiler<C> {
    fn order(&self) -> i32 {
        C::ORDER
    }

    fn file_names(&self) -> Vec<PathBuf> {
        vec![self.path()]
    }

    fn compile(&self, data: &mut GameData, ctx: &mut CompileContext) -> Result<()> {
        let path = self.path();
        if C::OPTIONAL_FILE && !path.exists() {
            debug!("Optional PBS file \"{}\" not found", path.display());
            self.compiler.import(data, Vec::new());
            return Ok(());
        }
        info!("Compiling PBS file \"{}\"", path.display());
        let reader = open_file(&path)?;
        self.compile_from(reader, FileLineData::new(&path), data, ctx)
    }

    fn write_to_file(&self, data: &GameData, _ctx: &mut CompileContext) -> Result<()> {
        let path = self.path();
        if C::OPTIONAL_FILE && !path.exists() && self.compiler.entities(data).is_empty() {
            return Ok(());
        }
        info!("Writing PBS file \"{}\"", path.display());
        self.render(data).write_to(&path)
    }
}
