//! Watch command implementation.
//!
//! Compiles once, then recompiles and saves whenever a PBS file changes.
//! The settings file is watched too, so path and limit changes apply on the
//! next recompile.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use clap::Args;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::compiler::{CompileContext, PbsCompilerService};
use crate::error::Result;
use crate::output::{display_path, Printer};
use crate::registry::GameData;
use crate::settings::{watch_error, watch_settings};
use crate::validation::{error_diagnostics, print_diagnostics};

use super::PathArgs;

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Quiet period before recompiling, in milliseconds
    #[arg(long, default_value = "300")]
    pub debounce: u64,
}

pub fn run(args: WatchArgs, printer: &Printer) -> Result<()> {
    let handle = args.paths.handle()?;
    let _settings_watcher = match args.paths.config_path() {
        Some(path) => Some(watch_settings(&path, handle.clone())?),
        None => None,
    };

    let service = PbsCompilerService::with_default_compilers(handle.clone());
    let pbs_dir = handle.read().pbs_file_base_path.clone();

    let mut data = GameData::new();
    let mut ctx = CompileContext::new();
    if let Err(e) = service.run_compile_on_start(&mut data, &mut ctx) {
        print_diagnostics(&error_diagnostics(&e), printer);
    }

    let (tx, rx) = mpsc::channel::<PathBuf>();
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| match event {
        Ok(event) if is_pbs_change(&event) => {
            for path in event.paths {
                let _ = tx.send(path);
            }
        }
        Ok(_) => {}
        Err(e) => warn!("PBS watcher error: {}", e),
    })
    .map_err(|e| watch_error(&pbs_dir, e))?;
    watcher
        .watch(&pbs_dir, RecursiveMode::NonRecursive)
        .map_err(|e| watch_error(&pbs_dir, e))?;

    printer.status("Watching", &display_path(&pbs_dir));
    let debounce = Duration::from_millis(args.debounce);

    while let Ok(first) = rx.recv() {
        let mut changed = vec![first];
        // Editors often write several events per save.
        while let Ok(path) = rx.recv_timeout(debounce) {
            changed.push(path);
        }
        changed.sort();
        changed.dedup();
        for path in &changed {
            debug!("Changed: {}", path.display());
        }
        printer.info("Changed", &describe(&changed));
        recompile(&service, printer);
    }

    Ok(())
}

fn recompile(service: &PbsCompilerService, printer: &Printer) {
    let mut data = GameData::new();
    let mut ctx = CompileContext::new();
    let result = service
        .compile_all(&mut data, &mut ctx)
        .and_then(|()| service.store().save(&data));

    match result {
        Ok(()) => {
            if !ctx.diagnostics.is_empty() {
                print_diagnostics(&ctx.diagnostics, printer);
            }
            printer.success("Compiled", &display_path(&service.store().data_path()));
        }
        Err(e) => {
            print_diagnostics(&error_diagnostics(&e), printer);
            printer.error("Failed", "data files left unchanged");
        }
    }
}

fn is_pbs_change(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|p| is_pbs_file(p))
}

fn is_pbs_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "txt")
}

fn describe(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};

    #[test]
    fn test_is_pbs_change() {
        let event = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from("PBS/moves.txt"));
        assert!(is_pbs_change(&event));

        let backup = Event::new(EventKind::Create(CreateKind::File)).add_path(PathBuf::from("PBS/moves.txt.bak"));
        assert!(!is_pbs_change(&backup));

        let access = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("PBS/moves.txt"));
        assert!(!is_pbs_change(&access));
    }

    #[test]
    fn test_describe() {
        let paths = vec![PathBuf::from("PBS/moves.txt"), PathBuf::from("PBS/types.txt")];
        assert_eq!(describe(&paths), "moves.txt, types.txt");
    }
}
