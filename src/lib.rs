//! pbs - PBS game data compiler
//!
//! A library for compiling the plain-text PBS files of a monster-collecting
//! RPG into typed game data, writing that data back out as PBS text, running
//! the evolution rules against it, and diffing and patching its entities.

pub mod cancel;
pub mod cli;
pub mod compiler;
pub mod editable;
pub mod error;
pub mod evolution;
pub mod output;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod settings;
pub mod types;
pub mod validation;

pub use cancel::CancellationToken;
pub use compiler::{CompileContext, DataStore, PbsCompiler, PbsCompilerService};
pub use editable::{DiffNode, Editable, EditableType, EntityRepository, FieldEdit, FieldPath};
pub use error::{PbsError, Result};
pub use evolution::{Evolution, EvolutionEnvironment, EvolutionService, Pokemon};
pub use parser::FileLineData;
pub use registry::{DataKind, DataSet, Entity, GameData};
pub use schema::{Schema, SchemaEntry};
pub use settings::{PbsCompilerSettings, SettingsHandle};
pub use types::{Name, Species, SpeciesForm};
pub use validation::{validate_game_data, Diagnostic, Severity, ValidationResult};
