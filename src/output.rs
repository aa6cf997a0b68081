//! Terminal output for the pbs CLI.
//!
//! Progress lines and diagnostics go to stderr so stdout stays free for
//! generated completions and other piped output.

use std::io::{self, IsTerminal, Write};
use std::path::Path;

use crate::validation::{Diagnostic, Severity};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

/// Column the compile phase verbs are right-aligned to.
const VERB_WIDTH: usize = 12;

/// Writes compile progress and diagnostics, coloured when stderr is a terminal.
pub struct Printer {
    color: bool,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer {
    pub fn new() -> Self {
        Self {
            color: io::stderr().is_terminal(),
        }
    }

    /// A printer that never emits escape codes.
    pub fn plain() -> Self {
        Self { color: false }
    }

    /// A compile phase starting, e.g. `Checking PBS`.
    pub fn status(&self, verb: &str, message: &str) {
        self.print_line(GREEN, verb, message);
    }

    pub fn success(&self, verb: &str, message: &str) {
        self.print_line(GREEN, verb, message);
    }

    /// Per-file progress while loading or watching.
    pub fn info(&self, verb: &str, message: &str) {
        self.print_line(CYAN, verb, message);
    }

    pub fn error(&self, verb: &str, message: &str) {
        self.print_line(RED, verb, message);
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    /// Print one compile or validation diagnostic.
    pub fn diagnostic(&self, diagnostic: &Diagnostic) {
        let _ = write!(io::stderr().lock(), "{}", self.format_diagnostic(diagnostic));
    }

    /// Render a diagnostic as its header line, the PBS location and any help.
    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let color = match diagnostic.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
        };
        let label = self.paint_bold(color, &diagnostic.severity.to_string());
        let mut out = format!("  {label}[{}]: {}\n", diagnostic.code, diagnostic.message);
        if let Some(location) = &diagnostic.location {
            for line in location.lines() {
                out.push_str(&format!("    {}\n", self.dim(line)));
            }
        }
        if let Some(help) = &diagnostic.help {
            out.push_str(&format!("    help: {help}\n"));
        }
        out
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn paint_bold(&self, color: &str, text: &str) -> String {
        if self.color {
            format!("{BOLD}{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn print_line(&self, color: &str, verb: &str, message: &str) {
        let verb = format!("{verb:>VERB_WIDTH$}");
        let _ = writeln!(io::stderr().lock(), "{} {message}", self.paint_bold(color, &verb));
    }
}

/// `plural(1, "file", "files")` is "1 file".
pub fn plural(n: usize, singular: &str, pluralized: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {pluralized}")
    }
}

/// Path relative to the working directory when it lies below it.
pub fn display_path(path: &Path) -> String {
    let Ok(cwd) = std::env::current_dir() else {
        return path.display().to_string();
    };
    match path.strip_prefix(&cwd) {
        Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
        Ok(relative) => relative.display().to_string(),
        Err(_) => path.display().to_string(),
    }
}
