//! Runs every PBS compiler in order.

use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use tracing::{error, info, warn};

use crate::error::Result;
use crate::registry::GameData;
use crate::settings::SettingsHandle;

use super::store::{modified, DataStore};
use super::{
    AbilityCompiler, CompileContext, EncounterCompiler, ItemCompiler, MapConnectionCompiler,
    MetadataCompiler, MoveCompiler, PbsCompiler, PbsFileCompiler, PokemonCompiler,
    PokemonFormCompiler, PokemonMetricsCompiler, RegionalDexCompiler, RibbonCompiler,
    ShadowPokemonCompiler, TrainerCompiler, TrainerTypeCompiler, TypeCompiler,
};

/// The ordered set of compilers for one game.
pub struct PbsCompilerService {
    compilers: Vec<Box<dyn PbsCompiler>>,
    settings: SettingsHandle,
}

impl PbsCompilerService {
    /// Compilers run by ascending [`PbsCompiler::order`]; ties keep the
    /// given order.
    pub fn new(mut compilers: Vec<Box<dyn PbsCompiler>>, settings: SettingsHandle) -> Self {
        compilers.sort_by_key(|c| c.order());
        Self {
            compilers,
            settings,
        }
    }

    /// Every compiler for the standard PBS files.
    pub fn with_default_compilers(settings: SettingsHandle) -> Self {
        let s = || settings.clone();
        let compilers: Vec<Box<dyn PbsCompiler>> = vec![
            Box::new(PbsFileCompiler::new(TypeCompiler, s())),
            Box::new(MapConnectionCompiler::new(s())),
            Box::new(PbsFileCompiler::new(AbilityCompiler, s())),
            Box::new(PbsFileCompiler::new(MoveCompiler, s())),
            Box::new(PbsFileCompiler::new(ItemCompiler, s())),
            Box::new(PbsFileCompiler::new(PokemonCompiler, s())),
            Box::new(PbsFileCompiler::new(PokemonFormCompiler, s())),
            Box::new(PbsFileCompiler::new(PokemonMetricsCompiler, s())),
            Box::new(PbsFileCompiler::new(ShadowPokemonCompiler, s())),
            Box::new(RegionalDexCompiler::new(s())),
            Box::new(PbsFileCompiler::new(RibbonCompiler, s())),
            Box::new(EncounterCompiler::new(s())),
            Box::new(PbsFileCompiler::new(TrainerTypeCompiler, s())),
            Box::new(TrainerCompiler::new(s())),
            Box::new(MetadataCompiler::new(s())),
        ];
        Self::new(compilers, settings)
    }

    pub fn compilers(&self) -> impl Iterator<Item = &dyn PbsCompiler> {
        self.compilers.iter().map(|c| c.as_ref())
    }

    /// Every PBS file the compilers read.
    pub fn file_names(&self) -> Vec<PathBuf> {
        self.compilers.iter().flat_map(|c| c.file_names()).collect()
    }

    pub fn store(&self) -> DataStore {
        DataStore::new(self.settings.clone())
    }

    pub fn compile_all(&self, data: &mut GameData, ctx: &mut CompileContext) -> Result<()> {
        for compiler in &self.compilers {
            ctx.cancel.check()?;
            compiler.compile(data, ctx)?;
        }
        Ok(())
    }

    pub fn write_all(&self, data: &GameData, ctx: &mut CompileContext) -> Result<()> {
        for compiler in &self.compilers {
            ctx.cancel.check()?;
            compiler.write_to_file(data, ctx)?;
        }
        Ok(())
    }

    /// Bring `data` up to date at startup.
    ///
    /// Recompiles when forced by settings, when a mandatory data file is
    /// missing, or when a PBS file is newer than every data file; otherwise
    /// the stored data is loaded. A missing PBS directory is created and
    /// filled from the stored data first. Returns whether a compile ran.
    ///
    /// On failure every data file is deleted so the next start recompiles.
    pub fn run_compile_on_start(&self, data: &mut GameData, ctx: &mut CompileContext) -> Result<bool> {
        let store = self.store();
        let result = self.compile_on_start(&store, data, ctx);
        if let Err(e) = &result {
            error!("Compiling on start failed: {}", e);
            store.delete_all();
        }
        result
    }

    fn compile_on_start(
        &self,
        store: &DataStore,
        data: &mut GameData,
        ctx: &mut CompileContext,
    ) -> Result<bool> {
        let settings = self.settings.snapshot();
        let mut must_compile = false;

        let base = &settings.pbs_file_base_path;
        if !base.exists() {
            if let Err(e) = fs::create_dir_all(base) {
                warn!("Could not create PBS directory \"{}\": {}", base.display(), e);
            }
            store.load(data)?;
            self.write_all(data, ctx)?;
            must_compile = true;
        }

        must_compile |= store.missing_mandatory();
        let newest_data = store.newest_modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let newest_pbs = self.file_names().iter().filter_map(|p| modified(p)).max();
        must_compile |= newest_pbs.is_some_and(|pbs| pbs > newest_data);
        must_compile |= settings.always_compile;

        if must_compile {
            store.delete_all();
            info!("PBS files are newer than data files. Recompiling.");
            self.compile_all(data, ctx)?;
            store.save(data)?;
        } else {
            info!("Data files are up to date.");
            store.load(data)?;
        }
        Ok(must_compile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PbsError;
    use crate::registry::{DataSet, Entity};
    use crate::settings::PbsCompilerSettings;
    use crate::types::Name;
    use std::path::Path;

    fn entries<T: Entity>(set: &DataSet<T>) -> Vec<T> {
        set.iter().cloned().collect()
    }

    const CORPUS: &[(&str, &str)] = &[
        ("types.txt", "[NORMAL]\nName = Normal\n[GRASS]\nName = Grass\n"),
        ("abilities.txt", "[OVERGROW]\nName = Overgrow\n"),
        ("moves.txt", "[TACKLE]\nName = Tackle\nType = NORMAL\nCategory = Physical\nPower = 40\n"),
        ("items.txt", "[POKEBALL]\nName = Poké Ball\nPocket = 3\nFlags = PokeBall\n"),
        (
            "pokemon.txt",
            "[BULBASAUR]\nName = Bulbasaur\nTypes = GRASS\nAbilities = OVERGROW\nMoves = 1,TACKLE\nEvolution = IVYSAUR,Level,16\n[IVYSAUR]\nName = Ivysaur\nTypes = GRASS\n",
        ),
        ("pokemon_forms.txt", ""),
        ("pokemon_metrics.txt", "[BULBASAUR]\nBackSprite = 0,0\nFrontSprite = 0,0\n"),
        ("ribbons.txt", ""),
        ("regional_dexes.txt", "[0]\nBULBASAUR,IVYSAUR\n"),
        ("map_connections.txt", "1,N,0,2,S,0\n"),
        ("encounters.txt", "[002]\nLand\n    100,BULBASAUR,3,5\n"),
        ("trainer_types.txt", "[POKEMONTRAINER_Red]\nName = Pokémon Trainer\nGender = Male\n"),
        ("trainers.txt", "[POKEMONTRAINER_Red,Red]\nPokemon = BULBASAUR,5\n    Ball = POKEBALL\n"),
        (
            "metadata.txt",
            "[0]\nHome = 1,5,5,2\n[1]\nTrainerType = POKEMONTRAINER_Red\nWalkCharset = trainer_red\n",
        ),
    ];

    fn write_corpus(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        for (file, text) in CORPUS {
            fs::write(dir.join(file), text).unwrap();
        }
    }

    fn settings_in(root: &Path) -> SettingsHandle {
        SettingsHandle::new(PbsCompilerSettings {
            pbs_file_base_path: root.join("PBS"),
            data_path: root.join("Data"),
            ..Default::default()
        })
    }

    #[test]
    fn test_compilers_sorted_by_order() {
        let service = PbsCompilerService::with_default_compilers(SettingsHandle::default());
        let orders: Vec<i32> = service.compilers().map(|c| c.order()).collect();
        assert_eq!(orders.len(), 15);
        assert!(orders.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(orders.first(), Some(&1));
        assert_eq!(orders.last(), Some(&17));
    }

    #[test]
    fn test_compile_all() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(&dir.path().join("PBS"));
        let service = PbsCompilerService::with_default_compilers(settings_in(dir.path()));

        let mut data = GameData::new();
        service.compile_all(&mut data, &mut CompileContext::new()).unwrap();

        assert_eq!(data.types.len(), 2);
        assert_eq!(data.all_species().count(), 2);
        assert!(data.shadow_pokemon.is_loaded());
        assert!(data.shadow_pokemon.is_empty());
        assert_eq!(data.trainers.len(), 1);
        assert_eq!(data.player_metadata.try_get(&1).unwrap().trainer_type, Name::new("POKEMONTRAINER_Red"));
    }

    #[test]
    fn test_write_all_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(&dir.path().join("PBS"));
        let service = PbsCompilerService::with_default_compilers(settings_in(dir.path()));

        let mut data = GameData::new();
        service.compile_all(&mut data, &mut CompileContext::new()).unwrap();
        service.write_all(&data, &mut CompileContext::new()).unwrap();

        let mut again = GameData::new();
        service.compile_all(&mut again, &mut CompileContext::new()).unwrap();
        assert_eq!(again.summary(), data.summary());
        assert_eq!(entries(&again.types), entries(&data.types));
        assert_eq!(entries(&again.abilities), entries(&data.abilities));
        assert_eq!(entries(&again.moves), entries(&data.moves));
        assert_eq!(entries(&again.items), entries(&data.items));
        assert_eq!(entries(&again.species), entries(&data.species));
        assert_eq!(entries(&again.species_metrics), entries(&data.species_metrics));
        assert_eq!(entries(&again.ribbons), entries(&data.ribbons));
        assert_eq!(entries(&again.regional_dexes), entries(&data.regional_dexes));
        assert_eq!(entries(&again.map_connections), entries(&data.map_connections));
        assert_eq!(entries(&again.encounters), entries(&data.encounters));
        assert_eq!(entries(&again.trainer_types), entries(&data.trainer_types));
        assert_eq!(entries(&again.trainers), entries(&data.trainers));
        assert_eq!(entries(&again.metadata), entries(&data.metadata));
        assert_eq!(entries(&again.player_metadata), entries(&data.player_metadata));
        assert!(!dir.path().join("PBS/shadow_pokemon.txt").exists());
    }

    #[test]
    fn test_compile_on_start_then_load() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(&dir.path().join("PBS"));
        let service = PbsCompilerService::with_default_compilers(settings_in(dir.path()));

        let mut data = GameData::new();
        assert!(service.run_compile_on_start(&mut data, &mut CompileContext::new()).unwrap());
        assert!(dir.path().join("Data/species.json").exists());

        let mut loaded = GameData::new();
        assert!(!service.run_compile_on_start(&mut loaded, &mut CompileContext::new()).unwrap());
        assert_eq!(loaded.summary(), data.summary());
    }

    #[test]
    fn test_always_compile() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(&dir.path().join("PBS"));
        let settings = settings_in(dir.path());
        let service = PbsCompilerService::with_default_compilers(settings.clone());
        service
            .run_compile_on_start(&mut GameData::new(), &mut CompileContext::new())
            .unwrap();

        let mut forced = settings.snapshot();
        forced.always_compile = true;
        settings.replace(forced);
        assert!(service
            .run_compile_on_start(&mut GameData::new(), &mut CompileContext::new())
            .unwrap());
    }

    #[test]
    fn test_missing_pbs_directory_is_written_from_data() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(&dir.path().join("PBS"));
        let service = PbsCompilerService::with_default_compilers(settings_in(dir.path()));
        service
            .run_compile_on_start(&mut GameData::new(), &mut CompileContext::new())
            .unwrap();

        fs::remove_dir_all(dir.path().join("PBS")).unwrap();
        let mut data = GameData::new();
        assert!(service.run_compile_on_start(&mut data, &mut CompileContext::new()).unwrap());
        assert!(dir.path().join("PBS/pokemon.txt").exists());
        assert_eq!(data.all_species().count(), 2);
    }

    #[test]
    fn test_failed_compile_deletes_data_files() {
        let dir = tempfile::tempdir().unwrap();
        let pbs = dir.path().join("PBS");
        write_corpus(&pbs);
        let service = PbsCompilerService::with_default_compilers(settings_in(dir.path()));
        service
            .run_compile_on_start(&mut GameData::new(), &mut CompileContext::new())
            .unwrap();

        fs::write(pbs.join("metadata.txt"), "[1]\nTrainerType = POKEMONTRAINER_Red\nWalkCharset = a\n").unwrap();
        let mut forced = service.settings.snapshot();
        forced.always_compile = true;
        service.settings.replace(forced);

        let err = service
            .run_compile_on_start(&mut GameData::new(), &mut CompileContext::new())
            .unwrap_err();
        assert!(matches!(err, PbsError::Validation { .. }));
        assert!(service.store().newest_modified().is_none());
    }

    #[test]
    fn test_cancelled_compile() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(&dir.path().join("PBS"));
        let service = PbsCompilerService::with_default_compilers(settings_in(dir.path()));

        let mut ctx = CompileContext::new();
        ctx.cancel.cancel();
        let mut data = GameData::new();
        let err = service.compile_all(&mut data, &mut ctx).unwrap_err();
        assert!(matches!(err, PbsError::Cancelled));
        assert!(!data.types.is_loaded());
    }
}
