//! Validate command implementation.
//!
//! Compiles every PBS file without touching the data files and reports
//! warnings and errors.

use clap::Args;

use crate::compiler::{CompileContext, PbsCompilerService};
use crate::error::{PbsError, Result};
use crate::output::{display_path, Printer};
use crate::registry::GameData;
use crate::settings::SettingsHandle;
use crate::validation::{error_diagnostics, print_diagnostics, validate_game_data};

use super::PathArgs;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: ValidateArgs, printer: &Printer) -> Result<()> {
    let settings = args.paths.settings()?;
    printer.status("Validating", &display_path(&settings.pbs_file_base_path));

    let service = PbsCompilerService::with_default_compilers(SettingsHandle::new(settings));
    let mut data = GameData::new();
    let mut ctx = CompileContext::new();

    if let Err(e) = service.compile_all(&mut data, &mut ctx) {
        print_diagnostics(&error_diagnostics(&e), printer);
        return Err(e);
    }

    let mut diagnostics = ctx.diagnostics;
    diagnostics.merge(validate_game_data(&data));
    print_diagnostics(&diagnostics, printer);

    if args.strict && diagnostics.has_warnings() {
        return Err(PbsError::validation(format!(
            "{} warning(s) in strict mode",
            diagnostics.warning_count()
        )));
    }
    Ok(())
}
