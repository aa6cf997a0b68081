//! `metadata.txt`: global metadata in section `[0]`, one section per player
//! character after it.

use std::collections::HashSet;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing::{debug, info};

use crate::error::{PbsError, Result};
use crate::parser::{open_file, FileLineData, Sections};
use crate::registry::{DataKind, GameData};
use crate::schema::{require, Element, PbsModel, Record, Schema, SchemaBuilder, SchemaEntry, Value};
use crate::settings::SettingsHandle;
use crate::types::{MapPosition, Metadata, PlayerMetadata};

use super::pipeline::check_references;
use super::writer::PbsText;
use super::{CompileContext, PbsCompiler};

const FILE_BASE: &str = "metadata";
const DEFAULT_START_MONEY: u32 = 3000;

const BGM_KEYS: [&str; 7] = [
    "WildBattleBGM",
    "TrainerBattleBGM",
    "WildVictoryBGM",
    "TrainerVictoryBGM",
    "WildCaptureME",
    "SurfBGM",
    "BicycleBGM",
];

fn home_entry() -> SchemaEntry {
    SchemaEntry::tuple(vec![Element::uint(), Element::uint(), Element::uint(), Element::uint()])
}

fn read_home(record: &Record) -> Option<MapPosition> {
    match record.uints("Home").as_slice() {
        [map, x, y, direction] => Some(MapPosition {
            map: *map,
            x: *x,
            y: *y,
            direction: *direction,
        }),
        _ => None,
    }
}

fn write_home(record: &mut Record, home: Option<MapPosition>) {
    if let Some(home) = home {
        record.set_row(
            "Home",
            [home.map, home.x, home.y, home.direction]
                .into_iter()
                .map(|n| Some(Value::from(n)))
                .collect(),
        );
    }
}

impl PbsModel for Metadata {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            let builder = SchemaBuilder::new(FILE_BASE)
                .section(vec![Element::uint()])
                .field("StartMoney", SchemaEntry::single(Element::uint()))
                .field(
                    "StartItemStorage",
                    SchemaEntry::array(vec![Element::reference(DataKind::Item)]),
                )
                .field("Home", home_entry())
                .field("StorageCreator", SchemaEntry::single(Element::string()));
            BGM_KEYS
                .iter()
                .fold(builder, |b, key| b.field(*key, SchemaEntry::single(Element::string())))
                .build()
        })
    }

    fn from_record(record: &Record, line: &FileLineData) -> Result<Self> {
        let bgm = |key: &str| record.string(key);
        Ok(Self {
            id: require(record.section_uint(0), "section", line)?,
            start_money: record.uint("StartMoney").unwrap_or(DEFAULT_START_MONEY),
            start_item_storage: record.names("StartItemStorage"),
            home: read_home(record),
            storage_creator: record.string("StorageCreator"),
            wild_battle_bgm: bgm("WildBattleBGM"),
            trainer_battle_bgm: bgm("TrainerBattleBGM"),
            wild_victory_bgm: bgm("WildVictoryBGM"),
            trainer_victory_bgm: bgm("TrainerVictoryBGM"),
            wild_capture_me: bgm("WildCaptureME"),
            surf_bgm: bgm("SurfBGM"),
            bicycle_bgm: bgm("BicycleBGM"),
        })
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new(vec![Some(Value::from(self.id))]);
        record.set_value("StartMoney", Some(self.start_money));
        record.set_names("StartItemStorage", &self.start_item_storage);
        write_home(&mut record, self.home);
        record.set_value("StorageCreator", self.storage_creator.as_deref());
        let bgms = [
            &self.wild_battle_bgm,
            &self.trainer_battle_bgm,
            &self.wild_victory_bgm,
            &self.trainer_victory_bgm,
            &self.wild_capture_me,
            &self.surf_bgm,
            &self.bicycle_bgm,
        ];
        for (key, value) in BGM_KEYS.iter().zip(bgms) {
            record.set_value(key, value.as_deref());
        }
        record
    }
}

const CHARSET_KEYS: [&str; 6] = [
    "RunCharset",
    "CycleCharset",
    "SurfCharset",
    "DiveCharset",
    "FishCharset",
    "SurfFishCharset",
];

impl PbsModel for PlayerMetadata {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            let builder = SchemaBuilder::new(FILE_BASE)
                .section(vec![Element::positive()])
                .field(
                    "TrainerType",
                    SchemaEntry::single(Element::reference(DataKind::TrainerType)).required(),
                )
                .field("WalkCharset", SchemaEntry::single(Element::string()).required());
            CHARSET_KEYS
                .iter()
                .fold(builder, |b, key| b.field(*key, SchemaEntry::single(Element::string())))
                .field("Home", home_entry())
                .build()
        })
    }

    fn from_record(record: &Record, line: &FileLineData) -> Result<Self> {
        let walk = require(record.string("WalkCharset"), "WalkCharset", line)?;
        let charset = |key: &str| record.string(key).unwrap_or_else(|| walk.clone());
        Ok(Self {
            id: require(record.section_uint(0), "section", line)?,
            trainer_type: require(record.name("TrainerType"), "TrainerType", line)?,
            run_charset: charset("RunCharset"),
            cycle_charset: charset("CycleCharset"),
            surf_charset: charset("SurfCharset"),
            dive_charset: charset("DiveCharset"),
            fish_charset: charset("FishCharset"),
            surf_fish_charset: charset("SurfFishCharset"),
            home: read_home(record),
            walk_charset: walk,
        })
    }

    /// Charsets equal to the walking charset are left out.
    fn to_record(&self) -> Record {
        let mut record = Record::new(vec![Some(Value::from(self.id))]);
        record.set_value("TrainerType", Some(self.trainer_type));
        record.set_value("WalkCharset", Some(self.walk_charset.as_str()));
        let charsets = [
            &self.run_charset,
            &self.cycle_charset,
            &self.surf_charset,
            &self.dive_charset,
            &self.fish_charset,
            &self.surf_fish_charset,
        ];
        for (key, charset) in CHARSET_KEYS.iter().zip(charsets) {
            let differs = *charset != self.walk_charset;
            record.set_value(key, differs.then_some(charset.as_str()));
        }
        write_home(&mut record, self.home);
        record
    }
}

pub struct MetadataCompiler {
    settings: SettingsHandle,
}

impl MetadataCompiler {
    pub fn new(settings: SettingsHandle) -> Self {
        Self { settings }
    }

    pub fn path(&self) -> PathBuf {
        self.settings.read().pbs_file(FILE_BASE)
    }

    pub fn compile_from<R: BufRead>(
        &self,
        reader: R,
        base: FileLineData,
        data: &mut GameData,
        ctx: &mut CompileContext,
    ) -> Result<()> {
        let mut global: Option<Metadata> = None;
        let mut players: Vec<PlayerMetadata> = Vec::new();
        let mut seen = HashSet::new();

        for section in Sections::new(reader, base.clone(), ctx.cancel.clone()) {
            let section = section?;
            ctx.cancel.check()?;
            let line = section.line_data(&base);
            if !seen.insert(section.name.trim().to_string()) {
                return Err(PbsError::parse_at(
                    format!("Section {} is defined more than once.", section.name),
                    &line,
                ));
            }

            if section.name.trim() == "0" {
                let schema = Metadata::schema();
                let record = schema.parse_section(&section, &base)?;
                check_references(schema, &record, data, &line, DataKind::Metadata)?;
                global = Some(Metadata::from_record(&record, &line)?);
            } else {
                let schema = PlayerMetadata::schema();
                let record = schema.parse_section(&section, &base)?;
                check_references(schema, &record, data, &line, DataKind::PlayerMetadata)?;
                players.push(PlayerMetadata::from_record(&record, &line)?);
            }
            debug!(section = %section.name, "Compiled metadata");
        }

        let path = base.file.display().to_string();
        let Some(global) = global else {
            return Err(PbsError::validation(format!(
                "Global metadata is not defined in {path} but should be."
            )));
        };
        if !players.iter().any(|p| p.id == 1) {
            return Err(PbsError::validation(format!(
                "Player metadata for player character 1 is not defined in {path} but should be."
            )));
        }

        data.metadata.import([global]);
        data.player_metadata.import(players);
        Ok(())
    }

    pub fn render(&self, data: &GameData) -> PbsText {
        let mut text = PbsText::new();
        for metadata in data.metadata.iter() {
            text.record(Metadata::schema().write_record(&metadata.to_record()));
        }
        for player in data.player_metadata.iter() {
            text.record(PlayerMetadata::schema().write_record(&player.to_record()));
        }
        text
    }
}

impl PbsCompiler for MetadataCompiler {
    fn order(&self) -> i32 {
        17
    }

    fn file_names(&self) -> Vec<PathBuf> {
        vec![self.path()]
    }

    fn compile(&self, data: &mut GameData, ctx: &mut CompileContext) -> Result<()> {
        let path = self.path();
        info!("Compiling PBS file \"{}\"", path.display());
        let reader = open_file(&path)?;
        self.compile_from(reader, FileLineData::new(&path), data, ctx)
    }

    fn write_to_file(&self, data: &GameData, _ctx: &mut CompileContext) -> Result<()> {
        let path = self.path();
        info!("Writing PBS file \"{}\"", path.display());
        self.render(data).write_to(&path)
    }
}
