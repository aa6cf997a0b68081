//! Compile command implementation.
//!
//! Brings the data files up to date with the PBS files, recompiling only
//! when needed unless `--force` is given.

use std::time::Instant;

use clap::Args;

use crate::compiler::{CompileContext, PbsCompilerService};
use crate::error::Result;
use crate::output::{display_path, plural, Printer};
use crate::registry::GameData;
use crate::settings::SettingsHandle;
use crate::validation::{error_diagnostics, print_diagnostics, validate_game_data};

use super::PathArgs;

#[derive(Args, Debug)]
pub struct CompileArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Recompile even when the data files are up to date
    #[arg(long, short)]
    pub force: bool,
}

pub fn run(args: CompileArgs, printer: &Printer) -> Result<()> {
    let mut settings = args.paths.settings()?;
    if args.force {
        settings.always_compile = true;
    }
    let pbs_dir = settings.pbs_file_base_path.clone();
    let data_dir = settings.data_path.clone();

    let service = PbsCompilerService::with_default_compilers(SettingsHandle::new(settings));
    let mut data = GameData::new();
    let mut ctx = CompileContext::new();

    printer.status("Checking", &display_path(&pbs_dir));
    let start = Instant::now();

    let compiled = match service.run_compile_on_start(&mut data, &mut ctx) {
        Ok(compiled) => compiled,
        Err(e) => {
            print_diagnostics(&error_diagnostics(&e), printer);
            return Err(e);
        }
    };

    for (kind, count) in data.summary() {
        if kind.is_builtin() {
            continue;
        }
        printer.info("Loaded", &format!("{} {}", count, printer.dim(kind.name())));
    }

    let mut diagnostics = ctx.diagnostics;
    diagnostics.merge(validate_game_data(&data));
    if !diagnostics.is_empty() {
        print_diagnostics(&diagnostics, printer);
    }

    let elapsed = start.elapsed();
    if compiled {
        printer.success(
            "Finished",
            &format!(
                "compiled {} into {} in {:.2}s",
                plural(service.file_names().len(), "file", "files"),
                display_path(&data_dir),
                elapsed.as_secs_f64()
            ),
        );
    } else {
        printer.success("Fresh", &display_path(&data_dir));
    }

    Ok(())
}
