pub mod compile;
pub mod completions;
pub mod validate;
pub mod watch;
pub mod write;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::error::Result;
use crate::settings::{PbsCompilerSettings, SettingsHandle};

/// Default settings file, read from the current directory when present.
pub const SETTINGS_FILENAME: &str = "pbs.yaml";

/// pbs - PBS game data compiler
#[derive(Parser, Debug)]
#[command(name = "pbs")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log debug output (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile PBS files into data files when they changed
    Compile(compile::CompileArgs),

    /// Write PBS files back from the data files
    Write(write::WriteArgs),

    /// Compile without saving and report problems
    Validate(validate::ValidateArgs),

    /// Recompile whenever a PBS file or the settings change
    Watch(watch::WatchArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Directory options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Directory holding the PBS files
    #[arg(long, value_name = "DIR")]
    pub pbs: Option<PathBuf>,

    /// Directory holding the compiled data files
    #[arg(long, value_name = "DIR")]
    pub data: Option<PathBuf>,

    /// Settings file (default: pbs.yaml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl PathArgs {
    /// The settings file to read, if any.
    pub fn config_path(&self) -> Option<PathBuf> {
        match &self.config {
            Some(path) => Some(path.clone()),
            None => {
                let default = Path::new(SETTINGS_FILENAME);
                default.exists().then(|| default.to_path_buf())
            }
        }
    }

    /// Settings from the file with command line overrides applied.
    pub fn settings(&self) -> Result<PbsCompilerSettings> {
        let mut settings = match self.config_path() {
            Some(path) => PbsCompilerSettings::load(&path)?,
            None => PbsCompilerSettings::default(),
        };
        self.apply_overrides(&mut settings);
        Ok(settings)
    }

    pub fn apply_overrides(&self, settings: &mut PbsCompilerSettings) {
        if let Some(pbs) = &self.pbs {
            settings.pbs_file_base_path = pbs.clone();
        }
        if let Some(data) = &self.data {
            settings.data_path = data.clone();
        }
    }

    pub fn handle(&self) -> Result<SettingsHandle> {
        Ok(SettingsHandle::new(self.settings()?))
    }
}
