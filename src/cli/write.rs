//! Write command implementation.
//!
//! Regenerates the PBS files from the compiled data files. Existing PBS
//! files are kept as `.bak` backups.

use clap::Args;

use crate::compiler::{CompileContext, PbsCompilerService};
use crate::error::Result;
use crate::output::{display_path, plural, Printer};
use crate::registry::GameData;

use super::PathArgs;

#[derive(Args, Debug)]
pub struct WriteArgs {
    #[command(flatten)]
    pub paths: PathArgs,
}

pub fn run(args: WriteArgs, printer: &Printer) -> Result<()> {
    let service = PbsCompilerService::with_default_compilers(args.paths.handle()?);
    let store = service.store();

    let mut data = GameData::new();
    printer.status("Loading", &display_path(&store.data_path()));
    store.load(&mut data)?;

    let mut ctx = CompileContext::new();
    service.write_all(&data, &mut ctx)?;

    let written = service.file_names().iter().filter(|p| p.exists()).count();
    printer.success("Finished", &format!("wrote {}", plural(written, "PBS file", "PBS files")));
    Ok(())
}
