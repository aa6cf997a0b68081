//! PBS compilers.
//!
//! Each compiler owns one PBS file: it reads the file into typed models,
//! validates and converts them into entities, and imports the result into a
//! [`GameData`] registry. The reverse direction writes a registry back out
//! as PBS text.
//!
//! Most files share one flow, implemented once by [`PbsFileCompiler`] on
//! top of a [`RecordCompiler`] strategy. Files with a layout of their own
//! (encounters, trainers, dexes, connections, metadata) implement
//! [`PbsCompiler`] directly.
//!
//! # Example
//!
//! ```ignore
//! use pbs::compiler::{CompileContext, PbsCompilerService};
//!
//! let service = PbsCompilerService::with_default_compilers(settings);
//! let mut data = GameData::new();
//! service.compile_all(&mut data, &mut CompileContext::new())?;
//! ```

mod abilities;
mod encounters;
mod items;
mod map_connections;
mod metadata;
mod metrics;
mod moves;
mod pipeline;
mod pokemon;
mod pokemon_forms;
mod regional_dex;
mod ribbons;
mod service;
mod shadow;
mod store;
mod trainer_types;
mod trainers;
mod types;
mod writer;

pub use abilities::{AbilityCompiler, AbilityInfo};
pub use encounters::EncounterCompiler;
pub use items::{ItemCompiler, ItemInfo};
pub use map_connections::MapConnectionCompiler;
pub use metadata::MetadataCompiler;
pub use metrics::{PokemonMetricsCompiler, SpeciesMetricsInfo};
pub use moves::{MoveCompiler, MoveInfo};
pub use pipeline::{PbsFileCompiler, RecordCompiler};
pub use pokemon::{PokemonCompiler, SpeciesInfo};
pub use pokemon_forms::{PokemonFormCompiler, SpeciesFormInfo};
pub use regional_dex::RegionalDexCompiler;
pub use ribbons::{RibbonCompiler, RibbonInfo};
pub use service::PbsCompilerService;
pub use shadow::{ShadowPokemonCompiler, ShadowPokemonInfo};
pub use store::{DataFile, DataStore};
pub use trainer_types::{TrainerTypeCompiler, TrainerTypeInfo};
pub use trainers::TrainerCompiler;
pub use types::{TypeCompiler, TypeInfo};
pub use writer::{write_file_with_backup, PbsText, PBS_HEADER, PBS_SEPARATOR};

use std::path::PathBuf;

use tracing::warn;

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::parser::FileLineData;
use crate::registry::GameData;
use crate::validation::{Diagnostic, ValidationResult};

/// One PBS file's compiler.
pub trait PbsCompiler: Send + Sync {
    /// Position in the compile sequence; lower runs first.
    fn order(&self) -> i32;

    /// Files this compiler reads and writes.
    fn file_names(&self) -> Vec<PathBuf>;

    /// Read the PBS file and import the compiled entities into `data`.
    ///
    /// Either the whole file is imported or nothing is.
    fn compile(&self, data: &mut GameData, ctx: &mut CompileContext) -> Result<()>;

    /// Write the entities in `data` back to the PBS file.
    fn write_to_file(&self, data: &GameData, ctx: &mut CompileContext) -> Result<()>;
}

/// State shared by every compiler of one run.
#[derive(Debug, Clone, Default)]
pub struct CompileContext {
    pub cancel: CancellationToken,
    /// Warnings collected while compiling.
    pub diagnostics: ValidationResult,
}

impl CompileContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            diagnostics: ValidationResult::new(),
        }
    }

    /// Record an automatic correction or suspicious value.
    pub fn warn(&mut self, code: &str, message: impl Into<String>, line: Option<&FileLineData>) {
        let message = message.into();
        match line {
            Some(line) => {
                warn!("{}\n{}", message, line.line_report().trim_end());
                self.diagnostics.push(Diagnostic::warning(code, message).at(line));
            }
            None => {
                warn!("{}", message);
                self.diagnostics.push(Diagnostic::warning(code, message));
            }
        }
    }
}
