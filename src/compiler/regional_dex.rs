//! `regional_dexes.txt`: numbered species lists.
//!
//! Each `[n]` section is followed by comma-separated species, any number
//! per line. The writer puts each evolutionary family on its own line.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::PathBuf;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::{PbsError, Result};
use crate::evolution::family_species;
use crate::parser::tokenizer::parse_section_header;
use crate::parser::{open_file, FileLineData, Lines};
use crate::registry::GameData;
use crate::settings::SettingsHandle;
use crate::types::{Name, RegionalDex, SpeciesForm};

use super::writer::PbsText;
use super::{CompileContext, PbsCompiler};

const FILE_BASE: &str = "regional_dexes";

pub struct RegionalDexCompiler {
    settings: SettingsHandle,
}

impl RegionalDexCompiler {
    pub fn new(settings: SettingsHandle) -> Self {
        Self { settings }
    }

    pub fn path(&self) -> PathBuf {
        self.settings.read().pbs_file(FILE_BASE)
    }

    pub fn compile_from<R: BufRead>(
        &self,
        reader: R,
        base: FileLineData,
        data: &mut GameData,
        ctx: &mut CompileContext,
    ) -> Result<()> {
        let mut lists: IndexMap<u32, Vec<Name>> = IndexMap::new();
        let mut current = None;

        for line in Lines::new(reader, ctx.cancel.clone()) {
            let line = line?;
            let line_data = base.with_line(&line.text, line.number);

            if let Some(header) = parse_section_header(&line.text) {
                let number: u32 = header.parse().map_err(|_| {
                    PbsError::parse_at(
                        format!("Field '{header}' is not a positive integer or 0."),
                        &line_data,
                    )
                })?;
                if lists.contains_key(&number) {
                    return Err(PbsError::parse_at(
                        format!("Dex list number {number} is defined at least twice."),
                        &line_data,
                    ));
                }
                lists.insert(number, Vec::new());
                current = Some(number);
                continue;
            }

            let Some(list) = current.and_then(|n| lists.get_mut(&n)) else {
                return Err(PbsError::parse_at(
                    "Expected a section at the beginning of the file.",
                    &line_data,
                ));
            };
            for raw in line.text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let species = Name::new(raw);
                if !data.species.exists(&SpeciesForm::base(species)) {
                    return Err(PbsError::Parse {
                        message: format!(
                            "Undefined species constant name: {raw}.\n{}",
                            line_data.line_report()
                        ),
                        help: Some("Make sure the species is defined in PBS/pokemon.txt.".to_string()),
                    });
                }
                list.push(species);
            }
        }

        for (number, list) in &lists {
            let mut seen = HashMap::new();
            for (position, species) in list.iter().enumerate() {
                // dex numbers are 1-based
                if let Some(first) = seen.insert(*species, position + 1) {
                    return Err(PbsError::validation(format!(
                        "Dex list number {number} has species {species} listed twice (at positions {first} and {}).",
                        position + 1
                    )));
                }
            }
        }

        debug!(count = lists.len(), "Importing regional dexes");
        data.regional_dexes.import(
            lists
                .into_iter()
                .map(|(id, species)| RegionalDex { id, species }),
        );
        Ok(())
    }

    pub fn render(&self, data: &GameData) -> PbsText {
        let mut text = PbsText::new();
        for dex in data.regional_dexes.iter() {
            text.separator();
            text.line(format!("[{}]", dex.id));

            let mut family: Vec<Name> = Vec::new();
            let mut row: Vec<String> = Vec::new();
            for species in dex.species.iter().filter(|s| s.is_valid()) {
                if row.is_empty() || !family.contains(species) {
                    if !row.is_empty() {
                        text.line(row.join(","));
                        row.clear();
                    }
                    family = family_species(data, *species);
                }
                row.push(species.to_string());
            }
            if !row.is_empty() {
                text.line(row.join(","));
            }
        }
        text
    }
}

impl PbsCompiler for RegionalDexCompiler {
    fn order(&self) -> i32 {
        11
    }

    fn file_names(&self) -> Vec<PathBuf> {
        vec![self.path()]
    }

    fn compile(&self, data: &mut GameData, ctx: &mut CompileContext) -> Result<()> {
        let path = self.path();
        info!("Compiling PBS file \"{}\"", path.display());
        let reader = open_file(&path)?;
        self.compile_from(reader, FileLineData::new(&path), data, ctx)
    }

    fn write_to_file(&self, data: &GameData, _ctx: &mut CompileContext) -> Result<()> {
        let path = self.path();
        info!("Writing PBS file \"{}\"", path.display());
        self.render(data).write_to(&path)
    }
}
