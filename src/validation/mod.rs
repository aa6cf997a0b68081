//! Diagnostics for compiled game data.
//!
//! Compilers record warnings for automatic corrections while they run;
//! [`validate_game_data`] adds cross-set checks over a fully compiled
//! [`GameData`]. Used by `pbs validate` and `pbs compile`.

mod checks;
mod warning;

pub use checks::MAX_PARTY_SIZE;
pub use warning::{Diagnostic, Severity, ValidationResult};

use crate::error::PbsError;
use crate::output::Printer;
use crate::registry::GameData;

/// Run all cross-set checks against the compiled data.
pub fn validate_game_data(data: &GameData) -> ValidationResult {
    let mut result = ValidationResult::new();

    result.merge(checks::check_species_metrics(data));
    result.merge(checks::check_party_sizes(data));
    result.merge(checks::check_dex_coverage(data));

    result
}

/// A failed compile as error diagnostics, one per underlying error.
pub fn error_diagnostics(error: &PbsError) -> ValidationResult {
    let mut result = ValidationResult::new();
    match error {
        PbsError::Aggregate { errors, .. } => {
            for inner in errors {
                result.merge(error_diagnostics(inner));
            }
        }
        PbsError::Parse { help, .. }
        | PbsError::Validation { help, .. }
        | PbsError::Configuration { help, .. } => {
            let mut d = Diagnostic::error(error_code(error), error.to_string());
            d.help = help.clone();
            result.push(d);
        }
        other => result.push(Diagnostic::error(error_code(other), other.to_string())),
    }
    result
}

fn error_code(error: &PbsError) -> &'static str {
    match error {
        PbsError::IoError(_) | PbsError::Io { .. } => "pbs::io",
        PbsError::Parse { .. } => "pbs::parse",
        PbsError::Validation { .. } => "pbs::validate",
        PbsError::Aggregate { .. } => "pbs::aggregate",
        PbsError::Configuration { .. } => "pbs::config",
        PbsError::Edit { .. } => "pbs::edit",
        PbsError::Cancelled => "pbs::cancelled",
    }
}

/// Print diagnostics to stderr.
pub fn print_diagnostics(result: &ValidationResult, printer: &Printer) {
    for d in result.iter() {
        printer.diagnostic(d);
    }

    let errors = result.error_count();
    let warnings = result.warning_count();

    if errors > 0 {
        eprintln!(
            "Validation failed: {} error(s), {} warning(s)",
            errors, warnings
        );
    } else if warnings > 0 {
        eprintln!("Validation passed ({} warning(s))", warnings);
    } else {
        eprintln!("Validation passed.");
    }
}
