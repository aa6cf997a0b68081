//! Compiler settings (pbs.yaml) parsing and hot reload.
//!
//! Settings name the PBS and data directories and the limits the trainer
//! compiler enforces. Compilers hold a [`SettingsHandle`] and read it on
//! every call, so a reload takes effect on the next compile.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PbsError, Result};

/// Settings loaded from pbs.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PbsCompilerSettings {
    /// Directory holding the PBS text files.
    pub pbs_file_base_path: PathBuf,

    /// Directory holding the compiled data files.
    pub data_path: PathBuf,

    /// Compile on start even when the data files are up to date.
    pub always_compile: bool,

    /// Highest level a trainer's Pokémon may have.
    pub max_level: u32,

    /// Longest nickname a trainer's Pokémon may have.
    pub max_nickname_length: usize,
}

impl Default for PbsCompilerSettings {
    fn default() -> Self {
        Self {
            pbs_file_base_path: PathBuf::from("PBS"),
            data_path: PathBuf::from("Data"),
            always_compile: false,
            max_level: 100,
            max_nickname_length: 12,
        }
    }
}

impl PbsCompilerSettings {
    /// Load settings from a pbs.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PbsError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read settings: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse settings from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str::<Option<Self>>(content)
            .map(Option::unwrap_or_default)
            .map_err(|e| PbsError::Parse {
                message: format!("Invalid settings: {}", e),
                help: Some("Check pbs.yaml syntax".to_string()),
            })
    }

    /// Path of a PBS file, e.g. `PBS/types.txt` for `types`.
    pub fn pbs_file(&self, file_base: &str) -> PathBuf {
        self.pbs_file_base_path.join(format!("{file_base}.txt"))
    }
}

/// Shared, reloadable settings.
#[derive(Debug, Clone, Default)]
pub struct SettingsHandle {
    inner: Arc<RwLock<PbsCompilerSettings>>,
}

impl SettingsHandle {
    pub fn new(settings: PbsCompilerSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Read the current settings.
    pub fn read(&self) -> RwLockReadGuard<'_, PbsCompilerSettings> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    /// A copy of the current settings.
    pub fn snapshot(&self) -> PbsCompilerSettings {
        self.read().clone()
    }

    /// Replace the settings.
    pub fn replace(&self, settings: PbsCompilerSettings) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = settings;
    }

    /// Reload from a file, keeping the old settings when it fails to parse.
    pub fn reload(&self, path: &Path) -> Result<()> {
        let settings = PbsCompilerSettings::load(path)?;
        self.replace(settings);
        Ok(())
    }
}

/// Watch a settings file and reload `handle` whenever it changes.
///
/// The returned watcher must be kept alive for reloading to continue.
pub fn watch_settings(path: &Path, handle: SettingsHandle) -> Result<RecommendedWatcher> {
    let file = path.to_path_buf();
    let target = file.clone();
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                warn!("Settings watcher error: {}", e);
                return;
            }
        };
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
            return;
        }
        if !event.paths.iter().any(|p| p.ends_with(target.file_name().unwrap_or_default())) {
            return;
        }
        match handle.reload(&target) {
            Ok(()) => info!("Reloaded settings from \"{}\"", target.display()),
            Err(e) => warn!("Keeping previous settings: {}", e),
        }
    })
    .map_err(|e| watch_error(&file, e))?;

    // Watch the parent so editors that replace the file are still seen.
    let dir = file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|e| watch_error(&file, e))?;
    Ok(watcher)
}

pub(crate) fn watch_error(path: &Path, error: notify::Error) -> PbsError {
    PbsError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to watch: {}", error),
    }
}
