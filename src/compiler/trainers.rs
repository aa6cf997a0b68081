//! `trainers.txt`: enemy trainers and their parties.
//!
//! A section is keyed `[TrainerType,Name]` or `[TrainerType,Name,Version]`.
//! Each `Pokemon = Species,Level` line starts a party member; the keys after
//! it, up to the next `Pokemon` line, describe that member.

use std::collections::HashSet;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing::{debug, info};

use crate::error::{PbsError, Result};
use crate::parser::{open_file, FileLineData, PbsSection, Sections};
use crate::registry::{DataKind, GameData};
use crate::schema::{Element, FieldValue, Record, Row, Schema, SchemaBuilder, SchemaEntry, Value};
use crate::settings::SettingsHandle;
use crate::types::enums::{NATURES, POKEMON_GENDERS};
use crate::types::{Name, PokemonGender, Trainer, TrainerKey, TrainerPokemon};

use super::pipeline::check_references;
use super::writer::PbsText;
use super::{CompileContext, PbsCompiler};

const IV_LIMIT: u32 = 31;
const EV_STAT_LIMIT: u32 = 252;
const EV_LIMIT: u32 = 510;
const MAX_HAPPINESS: u32 = 255;
const STAT_COUNT: usize = 6;

fn trainer_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        SchemaBuilder::new("trainers")
            .section(vec![
                Element::reference(DataKind::TrainerType),
                Element::string(),
                Element::uint().optional(),
            ])
            .field("Items", SchemaEntry::array(vec![Element::reference(DataKind::Item)]))
            .field("LoseText", SchemaEntry::single(Element::text()))
            .build()
    })
}

fn pokemon_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        SchemaBuilder::new("trainers")
            .section(vec![Element::reference(DataKind::Species), Element::positive()])
            .field("Form", SchemaEntry::single(Element::uint()))
            .field("Name", SchemaEntry::single(Element::string()))
            .field("Moves", SchemaEntry::array(vec![Element::reference(DataKind::Move)]))
            .field("Ability", SchemaEntry::single(Element::reference(DataKind::Ability)))
            .field("AbilityIndex", SchemaEntry::single(Element::uint()))
            .field("Item", SchemaEntry::single(Element::reference(DataKind::Item)))
            .field("Gender", SchemaEntry::single(Element::enumeration(&POKEMON_GENDERS)))
            .field("Nature", SchemaEntry::single(Element::enumeration(&NATURES)))
            .field("IV", SchemaEntry::array(vec![Element::uint()]))
            .field("EV", SchemaEntry::array(vec![Element::uint()]))
            .field("Happiness", SchemaEntry::single(Element::uint()))
            .field("Shiny", SchemaEntry::single(Element::boolean()))
            .field("SuperShiny", SchemaEntry::single(Element::boolean()))
            .field("Shadow", SchemaEntry::single(Element::boolean()))
            .field("Ball", SchemaEntry::single(Element::reference(DataKind::Item)))
            .build()
    })
}

const POKEMON_KEY: &str = "Pokemon";

pub struct TrainerCompiler {
    settings: SettingsHandle,
}

/// A party member's record and the line that started it.
struct PartyRecord {
    record: Record,
    line: FileLineData,
}

impl TrainerCompiler {
    pub fn new(settings: SettingsHandle) -> Self {
        Self { settings }
    }

    pub fn path(&self) -> PathBuf {
        self.settings.read().pbs_file(trainer_schema().file_base())
    }

    pub fn compile_from<R: BufRead>(
        &self,
        reader: R,
        base: FileLineData,
        data: &mut GameData,
        ctx: &mut CompileContext,
    ) -> Result<()> {
        let mut trainers = Vec::new();
        let mut seen = HashSet::new();

        for section in Sections::new(reader, base.clone(), ctx.cancel.clone()) {
            let section = section?;
            ctx.cancel.check()?;
            let trainer = self.compile_section(&section, &base, data)?;
            if !seen.insert(trainer.id.clone()) {
                return Err(PbsError::parse_at(
                    format!("Section {} is defined more than once.", trainer.id),
                    &section.line_data(&base),
                ));
            }
            debug!(section = %section.name, "Compiled trainer");
            trainers.push(trainer);
        }

        ctx.cancel.check()?;
        debug!(count = trainers.len(), "Importing trainers");
        data.trainers.import(trainers);
        Ok(())
    }

    fn compile_section(
        &self,
        section: &PbsSection,
        base: &FileLineData,
        data: &GameData,
    ) -> Result<Trainer> {
        let header_line = section.line_data(base);
        let schema = trainer_schema();
        let mut record = Record::new(schema.parse_header(&section.name, &header_line)?);
        let mut party: Vec<PartyRecord> = Vec::new();

        for pair in &section.pairs {
            let line = header_line.with_key(&pair.key, &pair.value, pair.line_number);
            let (entry, target) = if pair.key == POKEMON_KEY {
                let row = pokemon_schema().parse_header(&pair.value, &line)?;
                party.push(PartyRecord {
                    record: Record::new(row),
                    line,
                });
                continue;
            } else if let Some(entry) = schema.entry(&pair.key) {
                (entry, &mut record)
            } else if let Some(entry) = pokemon_schema().entry(&pair.key) {
                let Some(member) = party.last_mut() else {
                    return Err(PbsError::parse_at("Pokémon hasn't been defined yet!", &line));
                };
                (entry, &mut member.record)
            } else {
                return Err(PbsError::parse_at(format!("Unknown property '{}'.", pair.key), &line));
            };

            let value = entry
                .parse_line(&pair.key, &pair.value)
                .map_err(|e| PbsError::parse_at(e, &line))?;
            if target.contains(&pair.key) {
                return Err(PbsError::parse_at(
                    format!("Property '{}' is defined more than once.", pair.key),
                    &line,
                ));
            }
            target.set(pair.key.clone(), value);
        }

        check_references(schema, &record, data, &header_line, DataKind::Trainer)?;
        for member in &party {
            check_references(pokemon_schema(), &member.record, data, &member.line, DataKind::Trainer)?;
        }

        let id = TrainerKey::new(
            record.section_name(0).unwrap_or_default(),
            record.section_str(1).unwrap_or_default(),
            record.section_uint(2).unwrap_or(0),
        );
        let pokemon = party
            .iter()
            .map(|member| pokemon_from_record(&member.record))
            .collect::<Vec<_>>();
        let mut trainer = Trainer {
            id,
            items: record.names("Items"),
            lose_text: record.string("LoseText"),
            pokemon,
        };
        self.validate_trainer(&mut trainer, data, &header_line)?;
        Ok(trainer)
    }

    /// Range checks plus the IV/EV shorthand: a short list is filled up with
    /// its first value.
    fn validate_trainer(&self, trainer: &mut Trainer, data: &GameData, line: &FileLineData) -> Result<()> {
        let fail = |message: String| PbsError::parse_at(message, line);
        if trainer.pokemon.is_empty() {
            return Err(fail(format!("Trainer with ID '{}' has no Pokémon.", trainer.id)));
        }

        let settings = self.settings.read();
        for pokemon in &mut trainer.pokemon {
            if pokemon.level == 0 || pokemon.level > settings.max_level {
                return Err(fail(format!(
                    "Invalid Pokémon level {} (must be 1-{}).",
                    pokemon.level, settings.max_level
                )));
            }

            if let Some(name) = &pokemon.name {
                let length = name.chars().count();
                if length == 0 || length > settings.max_nickname_length {
                    return Err(fail(format!(
                        "Invalid Pokémon nickname: {} (must be 1-{} characters).",
                        name, settings.max_nickname_length
                    )));
                }
            }

            let mut seen = HashSet::new();
            pokemon.moves.retain(|m| seen.insert(*m));

            if !pokemon.iv.is_empty() {
                pokemon.iv = broadcast_stats(&pokemon.iv).map_err(|e| fail(format!("{e} for IV.")))?;
                if let Some(iv) = pokemon.iv.iter().find(|iv| **iv > IV_LIMIT) {
                    return Err(fail(format!("Invalid IV: {iv} (must be 0-{IV_LIMIT}).")));
                }
            }

            if !pokemon.ev.is_empty() {
                pokemon.ev = broadcast_stats(&pokemon.ev).map_err(|e| fail(format!("{e} for EV.")))?;
                if let Some(ev) = pokemon.ev.iter().find(|ev| **ev > EV_STAT_LIMIT) {
                    return Err(fail(format!("Invalid EV: {ev} (must be 0-{EV_STAT_LIMIT}).")));
                }
                if pokemon.ev.iter().sum::<u32>() > EV_LIMIT {
                    return Err(fail(format!("Invalid EV set (must sum to {EV_LIMIT} or less).")));
                }
            }

            if let Some(happiness) = pokemon.happiness.filter(|h| *h > MAX_HAPPINESS) {
                return Err(fail(format!("Bad happiness: {happiness} (must be 0-{MAX_HAPPINESS}).")));
            }

            if let Some(ball) = pokemon.ball {
                let is_ball = data.items.get(&ball).is_some_and(|item| item.is_poke_ball());
                if data.items.is_loaded() && !is_ball {
                    return Err(fail(format!("Value '{ball}' isn't a defined Poké Ball.")));
                }
            }
        }
        Ok(())
    }

    pub fn render(&self, data: &GameData) -> PbsText {
        let mut text = PbsText::new();
        for trainer in data.trainers.iter() {
            let mut record = Record::new(vec![
                Some(Value::Name(trainer.id.trainer_type)),
                Some(Value::Str(trainer.id.name.clone())),
                (trainer.id.version > 0).then(|| Value::from(trainer.id.version)),
            ]);
            record.set_names("Items", &trainer.items);
            record.set_value("LoseText", trainer.lose_text.as_deref());
            let mut lines = trainer_schema().write_record(&record);

            for pokemon in &trainer.pokemon {
                lines.push(format!("{} = {},{}", POKEMON_KEY, pokemon.species, pokemon.level));
                let record = pokemon_to_record(pokemon, data);
                lines.extend(
                    pokemon_schema()
                        .write_record(&record)
                        .into_iter()
                        .skip(1)
                        .map(|line| format!("    {line}")),
                );
            }
            text.record(lines);
        }
        text
    }
}

/// Fill a stat list up to six values with its first value.
fn broadcast_stats(values: &[u32]) -> std::result::Result<Vec<u32>, String> {
    if values.len() > STAT_COUNT {
        return Err(format!("Expected at most {STAT_COUNT} values"));
    }
    let first = values.first().copied().unwrap_or(0);
    Ok((0..STAT_COUNT)
        .map(|i| values.get(i).copied().unwrap_or(first))
        .collect())
}

fn pokemon_from_record(record: &Record) -> TrainerPokemon {
    TrainerPokemon {
        species: record.section_name(0).unwrap_or_default(),
        level: record.section_uint(1).unwrap_or(0),
        form: record.uint("Form"),
        name: record.string("Name"),
        moves: record.names("Moves"),
        ability: record.name("Ability"),
        ability_index: record.uint("AbilityIndex"),
        item: record.name("Item"),
        gender: record
            .name("Gender")
            .and_then(|g| PokemonGender::from_name(g.as_str())),
        nature: record.name("Nature"),
        iv: record.uints("IV"),
        ev: record.uints("EV"),
        happiness: record.uint("Happiness"),
        // super shiny implies shiny; the writer only emits SuperShiny then
        shiny: record.bool("Shiny").or(record.bool("SuperShiny")).unwrap_or(false),
        super_shiny: record.bool("SuperShiny").unwrap_or(false),
        shadow: record.bool("Shadow").unwrap_or(false),
        ball: record.name("Ball"),
    }
}

fn single_gendered(data: &GameData, species: Name) -> bool {
    data.species_form(species, 0).is_some_and(|s| {
        matches!(
            s.gender_ratio.as_str(),
            "AlwaysMale" | "AlwaysFemale" | "Genderless"
        )
    })
}

fn stat_list(values: &[u32]) -> FieldValue {
    FieldValue::List(values.iter().map(|v| vec![Some(Value::from(*v))]).collect::<Vec<Row>>())
}

fn pokemon_to_record(pokemon: &TrainerPokemon, data: &GameData) -> Record {
    let mut record = Record::new(vec![
        Some(Value::Name(pokemon.species)),
        Some(Value::from(pokemon.level)),
    ]);
    record.set_value("Form", pokemon.form);
    record.set_value("Name", pokemon.name.as_deref());
    record.set_names("Moves", &pokemon.moves);
    record.set_value("Ability", pokemon.ability);
    record.set_value("AbilityIndex", pokemon.ability_index);
    record.set_value("Item", pokemon.item);
    if !single_gendered(data, pokemon.species) {
        record.set_value("Gender", pokemon.gender.map(|g| g.as_str()));
    }
    record.set_value("Nature", pokemon.nature);
    if !pokemon.iv.is_empty() {
        record.set("IV", stat_list(&pokemon.iv));
    }
    if !pokemon.ev.is_empty() {
        record.set("EV", stat_list(&pokemon.ev));
    }
    record.set_value("Happiness", pokemon.happiness);
    record.set_flag("Shiny", pokemon.shiny && !pokemon.super_shiny);
    record.set_flag("SuperShiny", pokemon.super_shiny);
    record.set_flag("Shadow", pokemon.shadow);
    record.set_value("Ball", pokemon.ball);
    record
}

impl PbsCompiler for TrainerCompiler {
    fn order(&self) -> i32 {
        15
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PbsCompilerSettings;
    use crate::types::{BattleUse, FieldUse, Item, TrainerGender, TrainerType};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const TRAINERS: &str = "\
[YOUNGSTER,Ben]
LoseText = \"Aww, I lost.\"
Pokemon = RATTATA,11
    Moves = TACKLE,TAILWHIP,TACKLE
    IV = 20
    Gender = male
Pokemon = EKANS,11
    Name = Slinky
    Shiny = true
    SuperShiny = true
#-------------------------------
[LASS,Crissy,1]
Items = POTION,POTION
Pokemon = ODDISH,12
    EV = 10,20,30
    Happiness = 70
";

    fn compile_with(text: &str, data: &mut GameData, settings: SettingsHandle) -> Result<()> {
        TrainerCompiler::new(settings).compile_from(
            Cursor::new(text.to_string()),
            FileLineData::new("PBS/trainers.txt"),
            data,
            &mut CompileContext::new(),
        )
    }

    fn compile(text: &str, data: &mut GameData) -> Result<()> {
        compile_with(text, data, SettingsHandle::default())
    }

    fn ball(id: &str, flags: &[&str]) -> Item {
        Item {
            id: Name::new(id),
            name: id.to_string(),
            name_plural: id.to_string(),
            portion_name: None,
            portion_name_plural: None,
            pocket: 3,
            price: 200,
            sell_price: 100,
            bp_price: 1,
            field_use: FieldUse::NoFieldUse,
            battle_use: BattleUse::NoBattleUse,
            flags: flags.iter().map(|f| f.to_string()).collect(),
            consumable: true,
            show_quantity: true,
            move_id: None,
            description: String::new(),
        }
    }

    #[test]
    fn test_compile_trainers() {
        let mut data = GameData::new();
        compile(TRAINERS, &mut data).unwrap();

        let ben = data
            .trainers
            .try_get(&TrainerKey::new("YOUNGSTER", "Ben", 0))
            .unwrap();
        assert_eq!(ben.lose_text.as_deref(), Some("\"Aww, I lost.\""));
        assert_eq!(ben.pokemon.len(), 2);

        let rattata = &ben.pokemon[0];
        assert_eq!(rattata.level, 11);
        assert_eq!(rattata.moves, vec![Name::new("TACKLE"), Name::new("TAILWHIP")]);
        assert_eq!(rattata.iv, vec![20; 6]);
        assert_eq!(rattata.gender, Some(PokemonGender::Male));

        let crissy = data
            .trainers
            .try_get(&TrainerKey::new("LASS", "Crissy", 1))
            .unwrap();
        assert_eq!(crissy.items, vec![Name::new("POTION"), Name::new("POTION")]);
        assert_eq!(crissy.pokemon[0].ev, vec![10, 20, 30, 10, 10, 10]);
        assert_eq!(crissy.pokemon[0].happiness, Some(70));
    }

    #[test]
    fn test_trainer_without_pokemon() {
        let mut data = GameData::new();
        let err = compile("[YOUNGSTER,Joey]\nLoseText = Bye\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Trainer with ID 'YOUNGSTER,Joey' has no Pokémon."));
        assert!(!data.trainers.is_loaded());
    }

    #[test]
    fn test_level_and_nickname_limits() {
        let mut data = GameData::new();
        let settings = SettingsHandle::new(PbsCompilerSettings {
            max_level: 50,
            max_nickname_length: 5,
            ..Default::default()
        });
        let err = compile_with("[A,B]\nPokemon = PIDGEY,51\n", &mut data, settings.clone()).unwrap_err();
        assert!(err.to_string().contains("Invalid Pokémon level 51 (must be 1-50)."));

        let err = compile_with(
            "[A,B]\nPokemon = PIDGEY,5\n    Name = Pidgeotto\n",
            &mut data,
            settings,
        )
        .unwrap_err();
        assert!(err
            .to_string()
            .contains("Invalid Pokémon nickname: Pidgeotto (must be 1-5 characters)."));
    }

    #[test]
    fn test_stat_limits() {
        let mut data = GameData::new();
        let err = compile("[A,B]\nPokemon = PIDGEY,5\n    IV = 31,32\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Invalid IV: 32 (must be 0-31)."));

        let err = compile("[A,B]\nPokemon = PIDGEY,5\n    EV = 253\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Invalid EV: 253 (must be 0-252)."));

        let err = compile("[A,B]\nPokemon = PIDGEY,5\n    EV = 100\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Invalid EV set (must sum to 510 or less)."));

        let err = compile("[A,B]\nPokemon = PIDGEY,5\n    Happiness = 256\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Bad happiness: 256 (must be 0-255)."));
    }

    #[test]
    fn test_values_beyond_u32_are_rejected() {
        let mut data = GameData::new();
        let err = compile("[A,B]\nPokemon = PIDGEY,4294967301\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Field '4294967301' is out of range."));

        let err = compile("[A,B]\nPokemon = PIDGEY,5\n    IV = 4294967296\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Field '4294967296' is out of range."));

        let err = compile("[A,B]\nPokemon = PIDGEY,5\n    EV = 4294967306\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Field '4294967306' is out of range."));
        assert!(!data.trainers.is_loaded());
    }

    #[test]
    fn test_ball_must_be_poke_ball() {
        let mut data = GameData::new();
        data.items.import(vec![ball("POKEBALL", &["PokeBall"]), ball("POTION", &[])]);

        compile("[A,B]\nPokemon = PIDGEY,5\n    Ball = POKEBALL\n", &mut data).unwrap();
        let err = compile("[A,B]\nPokemon = PIDGEY,5\n    Ball = POTION\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Value 'POTION' isn't a defined Poké Ball."));
    }

    #[test]
    fn test_trainer_type_must_exist_once_loaded() {
        let mut data = GameData::new();
        data.trainer_types.import(vec![TrainerType {
            id: Name::new("YOUNGSTER"),
            name: "Youngster".to_string(),
            gender: TrainerGender::Unknown,
            base_money: 16,
            skill_level: 16,
            flags: Vec::new(),
            intro_bgm: None,
            battle_bgm: None,
            victory_bgm: None,
        }]);
        let err = compile(TRAINERS, &mut data).unwrap_err();
        assert!(err.to_string().contains("Undefined trainer_type 'LASS'."));
    }

    #[test]
    fn test_member_key_before_pokemon() {
        let mut data = GameData::new();
        let err = compile("[A,B]\nMoves = TACKLE\nPokemon = PIDGEY,5\n", &mut data).unwrap_err();
        assert!(err.to_string().contains("Pokémon hasn't been defined yet!"));
    }

    #[test]
    fn test_write_trainers() {
        let mut data = GameData::new();
        compile(TRAINERS, &mut data).unwrap();
        let written = TrainerCompiler::new(SettingsHandle::default())
            .render(&data)
            .render();
        assert_eq!(
            written.lines().skip(1).collect::<Vec<_>>(),
            vec![
                "#-------------------------------",
                "[YOUNGSTER,Ben]",
                "LoseText = \"Aww, I lost.\"",
                "Pokemon = RATTATA,11",
                "    Moves = TACKLE,TAILWHIP",
                "    Gender = Male",
                "    IV = 20,20,20,20,20,20",
                "Pokemon = EKANS,11",
                "    Name = Slinky",
                "    SuperShiny = true",
                "#-------------------------------",
                "[LASS,Crissy,1]",
                "Items = POTION,POTION",
                "Pokemon = ODDISH,12",
                "    EV = 10,20,30,10,10,10",
                "    Happiness = 70",
            ]
        );
    }

    #[test]
    fn test_written_text_compiles_to_same_trainers() {
        let mut data = GameData::new();
        compile(TRAINERS, &mut data).unwrap();
        let written = TrainerCompiler::new(SettingsHandle::default())
            .render(&data)
            .render();

        let mut again = GameData::new();
        compile(&written, &mut again).unwrap();
        assert_eq!(
            again.trainers.iter().cloned().collect::<Vec<_>>(),
            data.trainers.iter().cloned().collect::<Vec<_>>()
        );
    }
}
