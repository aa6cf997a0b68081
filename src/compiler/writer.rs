//! PBS text output and safe file replacement.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{PbsError, Result};

/// First line of every written PBS file.
pub const PBS_HEADER: &str = "# See the documentation on the wiki to learn how to edit this file.";

/// Line written before every record.
pub const PBS_SEPARATOR: &str = "#-------------------------------";

/// PBS file contents built line by line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbsText {
    lines: Vec<String>,
}

impl Default for PbsText {
    fn default() -> Self {
        Self::new()
    }
}

impl PbsText {
    /// Start a file with the standard header.
    pub fn new() -> Self {
        Self {
            lines: vec![PBS_HEADER.to_string()],
        }
    }

    pub fn separator(&mut self) {
        self.lines.push(PBS_SEPARATOR.to_string());
    }

    pub fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// A separator followed by the record's lines.
    pub fn record<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separator();
        self.lines.extend(lines.into_iter().map(Into::into));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The full text, one trailing newline per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Replace `path` with this text.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        write_file_with_backup(path, |w| w.write_all(self.render().as_bytes()))
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Replace `path` with what `write` produces, never leaving a half-written file.
///
/// An existing file is copied to `{path}.backup` first. The new contents go
/// to a temporary sibling that is renamed over `path`. On success the backup
/// is removed; on failure it is moved back.
pub fn write_file_with_backup<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let io_error = |e: io::Error| PbsError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write PBS file: {}", e),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let backup = sibling(path, ".backup");
    let had_original = path.exists();
    if had_original {
        fs::copy(path, &backup).map_err(io_error)?;
    }

    let temp = sibling(path, ".tmp");
    let result = (|| -> io::Result<()> {
        let mut out = BufWriter::new(fs::File::create(&temp)?);
        write(&mut out)?;
        out.flush()?;
        drop(out);
        fs::rename(&temp, path)
    })();

    match result {
        Ok(()) => {
            if had_original {
                if let Err(e) = fs::remove_file(&backup) {
                    warn!("Could not remove backup \"{}\": {}", backup.display(), e);
                }
            }
            debug!("Wrote \"{}\"", path.display());
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&temp);
            if had_original && fs::rename(&backup, path).is_err() {
                let _ = fs::remove_file(path);
            }
            Err(io_error(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_records() {
        let mut text = PbsText::new();
        text.record(["[NORMAL]", "Name = Normal"]);
        text.record(["[FIRE]", "Name = Fire"]);
        assert_eq!(
            text.render(),
            "# See the documentation on the wiki to learn how to edit this file.\n\
             #-------------------------------\n\
             [NORMAL]\n\
             Name = Normal\n\
             #-------------------------------\n\
             [FIRE]\n\
             Name = Fire\n"
        );
    }

    #[test]
    fn test_write_replaces_and_removes_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("types.txt");
        fs::write(&path, "old").unwrap();

        write_file_with_backup(&path, |w| w.write_all(b"new")).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!sibling(&path, ".backup").exists());
        assert!(!sibling(&path, ".tmp").exists());
    }

    #[test]
    fn test_failed_write_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("types.txt");
        fs::write(&path, "old").unwrap();

        let err = write_file_with_backup(&path, |w| {
            w.write_all(b"partial")?;
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        })
        .unwrap_err();

        assert!(matches!(err, PbsError::Io { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
        assert!(!sibling(&path, ".backup").exists());
    }

    #[test]
    fn test_write_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PBS").join("abilities.txt");
        PbsText::new().write_to(&path).unwrap();
        assert!(path.exists());
    }
}
