//! Source position tracking for error messages.

use std::fmt;
use std::path::{Path, PathBuf};

/// Lines longer than this are cut in reports.
const MAX_LINE_LENGTH: usize = 200;

/// Where in a PBS file the parser currently is.
///
/// Immutable: every `with_*` call returns an updated copy, so a value can be
/// captured in an error while parsing moves on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileLineData {
    /// Path of the file being read.
    pub file: PathBuf,
    /// Text of the current line (possibly truncated).
    pub line_text: String,
    /// Line number (1-indexed, 0 when unknown)
    pub line_number: usize,
    /// Current section header, if inside one.
    pub section: Option<String>,
    /// Current key, if a key/value pair is being read.
    pub key: Option<String>,
    /// Value of the current pair.
    pub value: String,
}

impl FileLineData {
    pub fn new(file: impl AsRef<Path>) -> Self {
        Self {
            file: file.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Position on a raw line, outside of any section context.
    pub fn with_line(&self, text: &str, number: usize) -> Self {
        let line_text = if text.chars().count() > MAX_LINE_LENGTH {
            let cut: String = text.chars().take(MAX_LINE_LENGTH).collect();
            format!("{cut}...")
        } else {
            text.to_string()
        };
        Self {
            line_text,
            line_number: number,
            section: None,
            key: None,
            ..self.clone()
        }
    }

    /// Position inside a section, optionally on one key.
    pub fn with_section(&self, section: &str, key: Option<&str>, value: &str) -> Self {
        Self {
            section: Some(section.to_string()),
            key: key.map(str::to_string),
            value: value.to_string(),
            ..self.clone()
        }
    }

    /// Position on a key of the current section.
    pub fn with_key(&self, key: &str, value: &str, number: usize) -> Self {
        Self {
            key: Some(key.to_string()),
            value: value.to_string(),
            line_number: number,
            ..self.clone()
        }
    }

    /// Human-readable report pointing at the current position.
    pub fn line_report(&self) -> String {
        let file = self.file.display();
        match (&self.section, &self.key) {
            (None, _) => format!("File {}, line {}\n{}\n", file, self.line_number, self.line_text),
            (Some(section), None) => format!("File {}, section {}\n{}\n", file, section, self.value),
            (Some(section), Some(key)) => {
                format!("File {}, section {}, key {}\n{}\n", file, section, key, self.value)
            }
        }
    }
}

impl fmt::Display for FileLineData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line_report())
    }
}
