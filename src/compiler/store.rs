//! Compiled data files.
//!
//! Every compiled entity set is saved as `{data_path}/{kind}.json` so a
//! later start can load it instead of recompiling the PBS files.

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{PbsError, Result};
use crate::registry::{DataKind, DataSet, Entity, GameData};
use crate::settings::SettingsHandle;

use super::writer::write_file_with_backup;

/// One data file and whether a start without it must recompile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    pub kind: DataKind,
    pub path: PathBuf,
    pub mandatory: bool,
}

/// Reads and writes the compiled data directory.
#[derive(Debug, Clone)]
pub struct DataStore {
    settings: SettingsHandle,
}

impl DataStore {
    pub fn new(settings: SettingsHandle) -> Self {
        Self { settings }
    }

    pub fn data_path(&self) -> PathBuf {
        self.settings.read().data_path.clone()
    }

    /// Every data file, built-in kinds excluded.
    pub fn data_files(&self) -> Vec<DataFile> {
        let dir = self.data_path();
        DataKind::ALL
            .iter()
            .filter(|kind| !kind.is_builtin())
            .map(|kind| DataFile {
                kind: *kind,
                path: dir.join(format!("{}.json", kind.name())),
                mandatory: !matches!(kind, DataKind::ShadowPokemon),
            })
            .collect()
    }

    /// Save every loaded set.
    pub fn save(&self, data: &GameData) -> Result<()> {
        for file in self.data_files() {
            if !data.is_loaded(file.kind) {
                continue;
            }
            match file.kind {
                DataKind::Type => save_set(&data.types, &file.path)?,
                DataKind::Ability => save_set(&data.abilities, &file.path)?,
                DataKind::Move => save_set(&data.moves, &file.path)?,
                DataKind::Item => save_set(&data.items, &file.path)?,
                DataKind::Species => save_set(&data.species, &file.path)?,
                DataKind::SpeciesMetrics => save_set(&data.species_metrics, &file.path)?,
                DataKind::ShadowPokemon => save_set(&data.shadow_pokemon, &file.path)?,
                DataKind::Ribbon => save_set(&data.ribbons, &file.path)?,
                DataKind::RegionalDex => save_set(&data.regional_dexes, &file.path)?,
                DataKind::MapConnection => save_set(&data.map_connections, &file.path)?,
                DataKind::Encounter => save_set(&data.encounters, &file.path)?,
                DataKind::TrainerType => save_set(&data.trainer_types, &file.path)?,
                DataKind::Trainer => save_set(&data.trainers, &file.path)?,
                DataKind::Metadata => save_set(&data.metadata, &file.path)?,
                DataKind::PlayerMetadata => save_set(&data.player_metadata, &file.path)?,
                DataKind::Evolution | DataKind::EncounterType => {}
            }
        }
        info!("Saved data files to \"{}\"", self.data_path().display());
        Ok(())
    }

    /// Load every data file that exists.
    pub fn load(&self, data: &mut GameData) -> Result<()> {
        for file in self.data_files() {
            if !file.path.exists() {
                if file.mandatory {
                    warn!("Data file \"{}\" is missing", file.path.display());
                }
                continue;
            }
            match file.kind {
                DataKind::Type => load_set(&mut data.types, &file.path)?,
                DataKind::Ability => load_set(&mut data.abilities, &file.path)?,
                DataKind::Move => load_set(&mut data.moves, &file.path)?,
                DataKind::Item => load_set(&mut data.items, &file.path)?,
                DataKind::Species => load_set(&mut data.species, &file.path)?,
                DataKind::SpeciesMetrics => load_set(&mut data.species_metrics, &file.path)?,
                DataKind::ShadowPokemon => load_set(&mut data.shadow_pokemon, &file.path)?,
                DataKind::Ribbon => load_set(&mut data.ribbons, &file.path)?,
                DataKind::RegionalDex => load_set(&mut data.regional_dexes, &file.path)?,
                DataKind::MapConnection => load_set(&mut data.map_connections, &file.path)?,
                DataKind::Encounter => load_set(&mut data.encounters, &file.path)?,
                DataKind::TrainerType => load_set(&mut data.trainer_types, &file.path)?,
                DataKind::Trainer => load_set(&mut data.trainers, &file.path)?,
                DataKind::Metadata => load_set(&mut data.metadata, &file.path)?,
                DataKind::PlayerMetadata => load_set(&mut data.player_metadata, &file.path)?,
                DataKind::Evolution | DataKind::EncounterType => {}
            }
        }
        Ok(())
    }

    /// Remove every data file, ignoring ones that do not exist.
    pub fn delete_all(&self) {
        for file in self.data_files() {
            if file.path.exists() {
                if let Err(e) = fs::remove_file(&file.path) {
                    warn!("Could not delete \"{}\": {}", file.path.display(), e);
                }
            }
        }
    }

    /// Whether any mandatory data file is missing.
    pub fn missing_mandatory(&self) -> bool {
        self.data_files()
            .iter()
            .any(|f| f.mandatory && !f.path.exists())
    }

    /// Modification time of the newest data file.
    pub fn newest_modified(&self) -> Option<SystemTime> {
        self.data_files()
            .iter()
            .filter_map(|f| modified(&f.path))
            .max()
    }
}

pub(crate) fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn save_set<T: Entity + Serialize>(set: &DataSet<T>, path: &Path) -> Result<()> {
    let entities: Vec<&T> = set.iter().collect();
    debug!(count = entities.len(), path = %path.display(), "Saving data file");
    write_file_with_backup(path, |w| {
        serde_json::to_writer_pretty(w, &entities).map_err(std::io::Error::from)
    })
}

fn load_set<T: Entity + DeserializeOwned>(set: &mut DataSet<T>, path: &Path) -> Result<()> {
    let file = fs::File::open(path).map_err(|e| PbsError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to open data file: {}", e),
    })?;
    let entities: Vec<T> =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| PbsError::Parse {
            message: format!("Invalid data file {}: {}", path.display(), e),
            help: Some("Delete the data directory to recompile from the PBS files".to_string()),
        })?;
    debug!(count = entities.len(), path = %path.display(), "Loaded data file");
    set.import(entities);
    Ok(())
}
