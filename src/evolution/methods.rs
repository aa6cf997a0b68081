//! The built-in evolution method evaluators.

use crate::types::{Name, SpeciesForm};

use super::evaluator::MethodEvaluator;
use super::parameter::{ItemId, MoveId, TypeId};
use super::pokemon::{EvolutionEnvironment, OverworldWeather, Pokemon, TimeOfDay, TravelMode};

const MAX_HAPPINESS: u32 = 255;
const READY_TO_EVOLVE: &str = "ReadyToEvolve";
const DAMAGE_TAKEN_CRITICAL_HITS: u32 = 49;

type Check = fn(&Pokemon, &EvolutionEnvironment) -> bool;

fn happiness_threshold(env: &EvolutionEnvironment) -> u32 {
    if env.happiness_soft_cap {
        160
    } else {
        220
    }
}

fn is_happy(pokemon: &Pokemon, env: &EvolutionEnvironment) -> bool {
    pokemon.happiness >= happiness_threshold(env)
}

fn reached(pokemon: &Pokemon, level: i64) -> bool {
    i64::from(pokemon.level) >= level
}

/// Drop the held item once the evolution it caused has happened.
fn remove_held_item(
    pokemon: &mut Pokemon,
    evo_species: Name,
    item: Name,
    new_species: Name,
) -> bool {
    if evo_species != new_species || !pokemon.has_item(item) {
        return false;
    }
    pokemon.item = None;
    true
}

fn level(method: &str, check: Check) -> MethodEvaluator {
    MethodEvaluator::builder::<i64>(method)
        .on_level_up(move |pokemon, env, level| reached(pokemon, level) && check(pokemon, env))
        .build()
}

fn happiness(method: &str, check: Check) -> MethodEvaluator {
    MethodEvaluator::builder::<()>(method)
        .on_level_up(move |pokemon, env, ()| is_happy(pokemon, env) && check(pokemon, env))
        .build()
}

fn hold_item(method: &str, check: Check) -> MethodEvaluator {
    MethodEvaluator::builder::<ItemId>(method)
        .on_level_up(move |pokemon, env, ItemId(item)| {
            pokemon.has_item(item) && check(pokemon, env)
        })
        .after_evolution(|pokemon, _, evo_species, ItemId(item), new_species| {
            remove_held_item(pokemon, evo_species, item, new_species)
        })
        .build()
}

fn use_item(method: &str, check: Check) -> MethodEvaluator {
    MethodEvaluator::builder::<ItemId>(method)
        .on_use_item(move |pokemon, env, ItemId(param), used| used == param && check(pokemon, env))
        .build()
}

fn trade(method: &str, check: Check) -> MethodEvaluator {
    MethodEvaluator::builder::<()>(method)
        .on_trade(move |pokemon, env, (), _| check(pokemon, env))
        .build()
}

fn always(_: &Pokemon, _: &EvolutionEnvironment) -> bool {
    true
}

fn male(pokemon: &Pokemon, _: &EvolutionEnvironment) -> bool {
    pokemon.is_male()
}

fn female(pokemon: &Pokemon, _: &EvolutionEnvironment) -> bool {
    pokemon.is_female()
}

fn day(_: &Pokemon, env: &EvolutionEnvironment) -> bool {
    env.time_of_day.is_day()
}

fn night(_: &Pokemon, env: &EvolutionEnvironment) -> bool {
    env.time_of_day.is_night()
}

/// Upper 16 bits of the personality value, mod 10; splits Wurmple.
fn personality_roll(pokemon: &Pokemon) -> u32 {
    ((pokemon.personality_value >> 16) & 0xFFFF) % 10
}

/// Every built-in evaluator, one per method of [`Evolution::defaults`].
///
/// [`Evolution::defaults`]: super::Evolution::defaults
pub fn default_evaluators() -> Vec<MethodEvaluator> {
    vec![
        level("Level", always),
        level("LevelMale", male),
        level("LevelFemale", female),
        level("LevelDay", day),
        level("LevelNight", night),
        level("LevelMorning", |_, env| env.time_of_day == TimeOfDay::Morning),
        level("LevelAfternoon", |_, env| env.time_of_day == TimeOfDay::Afternoon),
        level("LevelEvening", |_, env| env.time_of_day == TimeOfDay::Evening),
        level("LevelNoWeather", |_, env| env.weather == OverworldWeather::None),
        level("LevelSun", |_, env| env.weather == OverworldWeather::Sun),
        level("LevelRain", |_, env| env.weather == OverworldWeather::Rain),
        level("LevelSnow", |_, env| env.weather == OverworldWeather::Snow),
        level("LevelSandstorm", |_, env| env.weather == OverworldWeather::Sandstorm),
        level("LevelCycling", |_, env| env.travel == TravelMode::Cycling),
        level("LevelSurfing", |_, env| env.travel == TravelMode::Surfing),
        level("LevelDiving", |_, env| env.travel == TravelMode::Diving),
        level("LevelDarkness", |_, env| env.has_map_flag("DarkMap")),
        level("LevelDarkInParty", |_, env| {
            let dark = Name::new("DARK");
            env.party.iter().any(|p| !p.is_egg && p.has_type(dark))
        }),
        level("AttackGreater", |pokemon, _| pokemon.attack > pokemon.defense),
        level("AtkDefEqual", |pokemon, _| pokemon.attack == pokemon.defense),
        level("DefenseGreater", |pokemon, _| pokemon.attack < pokemon.defense),
        level("Silcoon", |pokemon, _| personality_roll(pokemon) < 5),
        level("Cascoon", |pokemon, _| personality_roll(pokemon) >= 5),
        level("Ninjask", always),
        MethodEvaluator::builder::<i64>("Shedinja")
            .after_evolution(|pokemon, env, _, _, new_species| {
                let ball = Name::new("POKEBALL");
                if env.party_full() || !env.bag_has(ball) {
                    return false;
                }
                let mut shell = pokemon.clone();
                shell.species = new_species;
                shell.item = None;
                env.party.push(shell);
                env.take_from_bag(ball)
            })
            .build(),
        happiness("Happiness", always),
        happiness("HappinessMale", male),
        happiness("HappinessFemale", female),
        happiness("HappinessDay", day),
        happiness("HappinessNight", night),
        MethodEvaluator::builder::<MoveId>("HappinessMove")
            .on_level_up(|pokemon, env, MoveId(id)| {
                is_happy(pokemon, env) && pokemon.knows_move(id)
            })
            .build(),
        MethodEvaluator::builder::<TypeId>("HappinessMoveType")
            .on_level_up(|pokemon, env, TypeId(ty)| {
                is_happy(pokemon, env) && pokemon.knows_move_of_type(ty)
            })
            .build(),
        MethodEvaluator::builder::<ItemId>("HappinessHoldItem")
            .on_level_up(|pokemon, env, ItemId(item)| {
                is_happy(pokemon, env) && pokemon.has_item(item)
            })
            .after_evolution(|pokemon, _, evo_species, ItemId(item), new_species| {
                remove_held_item(pokemon, evo_species, item, new_species)
            })
            .build(),
        MethodEvaluator::builder::<()>("MaxHappiness")
            .on_level_up(|pokemon, _, ()| pokemon.happiness >= MAX_HAPPINESS)
            .build(),
        MethodEvaluator::builder::<i64>("Beauty")
            .on_level_up(|pokemon, _, beauty| i64::from(pokemon.beauty) >= beauty)
            .build(),
        hold_item("HoldItem", always),
        hold_item("HoldItemMale", male),
        hold_item("HoldItemFemale", female),
        hold_item("DayHoldItem", day),
        hold_item("NightHoldItem", night),
        hold_item("HoldItemHappiness", is_happy),
        MethodEvaluator::builder::<MoveId>("HasMove")
            .on_level_up(|pokemon, _, MoveId(id)| pokemon.knows_move(id))
            .build(),
        MethodEvaluator::builder::<TypeId>("HasMoveType")
            .on_level_up(|pokemon, _, TypeId(ty)| pokemon.knows_move_of_type(ty))
            .build(),
        MethodEvaluator::builder::<SpeciesForm>("HasInParty")
            .on_level_up(|_, env, species| {
                env.party.iter().any(|p| !p.is_egg && p.species == species.species)
            })
            .build(),
        MethodEvaluator::builder::<i64>("Location")
            .on_level_up(|_, env, map| i64::from(env.map_id) == map)
            .build(),
        MethodEvaluator::builder::<Name>("LocationFlag")
            .on_level_up(|_, env, flag| env.has_map_flag(flag.as_str()))
            .build(),
        MethodEvaluator::builder::<i64>("Region")
            .on_level_up(|_, env, region| i64::from(env.region) == region)
            .build(),
        use_item("Item", always),
        use_item("ItemMale", male),
        use_item("ItemFemale", female),
        use_item("ItemDay", day),
        use_item("ItemNight", night),
        use_item("ItemHappiness", is_happy),
        trade("Trade", always),
        trade("TradeMale", male),
        trade("TradeFemale", female),
        trade("TradeDay", day),
        trade("TradeNight", night),
        MethodEvaluator::builder::<ItemId>("TradeItem")
            .on_trade(|pokemon, _, ItemId(item), _| pokemon.has_item(item))
            .after_evolution(|pokemon, _, evo_species, ItemId(item), new_species| {
                remove_held_item(pokemon, evo_species, item, new_species)
            })
            .build(),
        MethodEvaluator::builder::<SpeciesForm>("TradeSpecies")
            .on_trade(|pokemon, _, species, other| {
                pokemon.species == species.species && !other.has_item(Name::new("EVERSTONE"))
            })
            .build(),
        MethodEvaluator::builder::<i64>("BattleDealCriticalHit")
            .after_battle(|_, env, index, needed| {
                env.critical_hits
                    .get(index)
                    .is_some_and(|hits| i64::from(*hits) >= needed)
            })
            .build(),
        MethodEvaluator::builder::<i64>("Event")
            .on_event(|_, _, param, value| param == value)
            .build(),
        MethodEvaluator::builder::<i64>("EventAfterDamageTaken")
            .after_battle(|pokemon, env, index, _| {
                if env
                    .critical_hits
                    .get(index)
                    .is_some_and(|hits| *hits >= DAMAGE_TAKEN_CRITICAL_HITS)
                {
                    pokemon.tags.insert(READY_TO_EVOLVE.to_string());
                }
                false
            })
            .on_event(|pokemon, _, param, value| {
                param == value && pokemon.has_tag(READY_TO_EVOLVE)
            })
            .build(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::{Evolution, EvolutionParameter, KnownMove};
    use crate::types::enums::PokemonGender;

    fn find(method: &str) -> MethodEvaluator {
        default_evaluators()
            .into_iter()
            .find(|e| e.method() == method)
            .unwrap_or_else(|| panic!("no evaluator for {method}"))
    }

    fn int(n: i64) -> EvolutionParameter {
        EvolutionParameter::Int(n)
    }

    fn item(name: &str) -> EvolutionParameter {
        EvolutionParameter::Item(Name::new(name))
    }

    #[test]
    fn test_every_default_method_has_an_evaluator() {
        let evaluators = default_evaluators();
        for evolution in Evolution::defaults() {
            let evaluator = evaluators
                .iter()
                .find(|e| e.method() == evolution.id)
                .unwrap_or_else(|| panic!("missing {}", evolution.id));
            assert_eq!(evaluator.parameter_kind(), evolution.parameter, "{}", evolution.id);
        }
        assert_eq!(evaluators.len(), Evolution::defaults().len());
    }

    #[test]
    fn test_level_and_gender() {
        let mut env = EvolutionEnvironment::default();
        let mut pokemon = Pokemon::new("KIRLIA", 30);
        pokemon.gender = Some(PokemonGender::Female);

        assert!(find("Level").on_level_up(&mut pokemon, &mut env, Some(&int(30))));
        assert!(!find("Level").on_level_up(&mut pokemon, &mut env, Some(&int(31))));
        assert!(!find("LevelMale").on_level_up(&mut pokemon, &mut env, Some(&int(30))));
        assert!(find("LevelFemale").on_level_up(&mut pokemon, &mut env, Some(&int(30))));
    }

    #[test]
    fn test_level_time_and_weather() {
        let mut pokemon = Pokemon::new("ROCKRUFF", 25);
        let mut env = EvolutionEnvironment {
            time_of_day: TimeOfDay::Evening,
            weather: OverworldWeather::Rain,
            ..EvolutionEnvironment::default()
        };
        assert!(find("LevelEvening").on_level_up(&mut pokemon, &mut env, Some(&int(25))));
        assert!(find("LevelDay").on_level_up(&mut pokemon, &mut env, Some(&int(25))));
        assert!(!find("LevelNight").on_level_up(&mut pokemon, &mut env, Some(&int(25))));
        assert!(find("LevelRain").on_level_up(&mut pokemon, &mut env, Some(&int(25))));
        assert!(!find("LevelNoWeather").on_level_up(&mut pokemon, &mut env, Some(&int(25))));
    }

    #[test]
    fn test_wurmple_split() {
        let mut env = EvolutionEnvironment::default();
        let mut pokemon = Pokemon::new("WURMPLE", 7);
        pokemon.personality_value = 3 << 16;
        assert!(find("Silcoon").on_level_up(&mut pokemon, &mut env, Some(&int(7))));
        assert!(!find("Cascoon").on_level_up(&mut pokemon, &mut env, Some(&int(7))));

        pokemon.personality_value = 17 << 16;
        assert!(!find("Silcoon").on_level_up(&mut pokemon, &mut env, Some(&int(7))));
        assert!(find("Cascoon").on_level_up(&mut pokemon, &mut env, Some(&int(7))));
    }

    #[test]
    fn test_happiness_soft_cap() {
        let mut pokemon = Pokemon::new("PICHU", 5);
        pokemon.happiness = 180;
        let mut env = EvolutionEnvironment::default();
        assert!(!find("Happiness").on_level_up(&mut pokemon, &mut env, None));

        env.happiness_soft_cap = true;
        assert!(find("Happiness").on_level_up(&mut pokemon, &mut env, None));
        // a parameter on a parameterless method never matches
        assert!(!find("Happiness").on_level_up(&mut pokemon, &mut env, Some(&int(1))));
    }

    #[test]
    fn test_hold_item_removed_after_evolution() {
        let mut env = EvolutionEnvironment::default();
        let mut pokemon = Pokemon::new("ONIX", 10);
        pokemon.item = Some(Name::new("METALCOAT"));
        let evaluator = find("HoldItem");
        let param = item("METALCOAT");

        assert!(evaluator.on_level_up(&mut pokemon, &mut env, Some(&param)));
        let steelix = Name::new("STEELIX");
        assert!(!evaluator.after_evolution(
            &mut pokemon,
            &mut env,
            steelix,
            Some(&param),
            Name::new("OTHER")
        ));
        assert!(pokemon.item.is_some());
        assert!(evaluator.after_evolution(&mut pokemon, &mut env, steelix, Some(&param), steelix));
        assert_eq!(pokemon.item, None);
    }

    #[test]
    fn test_shedinja_needs_room_and_ball() {
        let mut pokemon = Pokemon::new("NINJASK", 20);
        let mut env = EvolutionEnvironment::default();
        let evaluator = find("Shedinja");
        let shedinja = Name::new("SHEDINJA");

        assert!(!evaluator.after_evolution(&mut pokemon, &mut env, shedinja, Some(&int(20)), shedinja));

        env.bag.insert(Name::new("POKEBALL"), 2);
        assert!(evaluator.after_evolution(&mut pokemon, &mut env, shedinja, Some(&int(20)), shedinja));
        assert_eq!(env.party.len(), 1);
        assert_eq!(env.party[0].species, shedinja);
        assert_eq!(env.bag.get(&Name::new("POKEBALL")), Some(&1));
        // level-up alone never triggers it
        assert!(!evaluator.on_level_up(&mut pokemon, &mut env, Some(&int(20))));
    }

    #[test]
    fn test_move_checks() {
        let mut env = EvolutionEnvironment::default();
        let mut pokemon = Pokemon::new("EEVEE", 10);
        pokemon.moves.push(KnownMove {
            id: Name::new("BABYDOLLEYES"),
            move_type: Name::new("FAIRY"),
        });
        pokemon.happiness = 220;

        let move_param = EvolutionParameter::Move(Name::new("BABYDOLLEYES"));
        let type_param = EvolutionParameter::Type(Name::new("FAIRY"));
        assert!(find("HasMove").on_level_up(&mut pokemon, &mut env, Some(&move_param)));
        assert!(find("HappinessMoveType").on_level_up(&mut pokemon, &mut env, Some(&type_param)));
        assert!(!find("HasMoveType").on_level_up(
            &mut pokemon,
            &mut env,
            Some(&EvolutionParameter::Type(Name::new("FIRE")))
        ));
    }

    #[test]
    fn test_use_item() {
        let mut env = EvolutionEnvironment::default();
        let mut pokemon = Pokemon::new("PIKACHU", 10);
        let stone = item("THUNDERSTONE");
        assert!(find("Item").on_use_item(&mut pokemon, &mut env, Some(&stone), Name::new("THUNDERSTONE")));
        assert!(!find("Item").on_use_item(&mut pokemon, &mut env, Some(&stone), Name::new("FIRESTONE")));
        assert!(!find("ItemMale").on_use_item(&mut pokemon, &mut env, Some(&stone), Name::new("THUNDERSTONE")));
    }

    #[test]
    fn test_trade_species_blocked_by_everstone() {
        let mut env = EvolutionEnvironment::default();
        let mut pokemon = Pokemon::new("KARRABLAST", 10);
        let mut other = Pokemon::new("SHELMET", 10);
        let param = EvolutionParameter::Species(SpeciesForm::base("KARRABLAST"));
        let evaluator = find("TradeSpecies");

        assert!(evaluator.on_trade(&mut pokemon, &mut env, Some(&param), &other));
        other.item = Some(Name::new("EVERSTONE"));
        assert!(!evaluator.on_trade(&mut pokemon, &mut env, Some(&param), &other));
    }

    #[test]
    fn test_critical_hit_methods() {
        let mut pokemon = Pokemon::new("FARFETCHD", 10);
        let mut env = EvolutionEnvironment {
            critical_hits: vec![0, 3],
            ..EvolutionEnvironment::default()
        };
        let crit = find("BattleDealCriticalHit");
        assert!(crit.after_battle(&mut pokemon, &mut env, 1, Some(&int(3))));
        assert!(!crit.after_battle(&mut pokemon, &mut env, 0, Some(&int(3))));
        assert!(!crit.after_battle(&mut pokemon, &mut env, 5, Some(&int(3))));

        let damage = find("EventAfterDamageTaken");
        assert!(!damage.on_event(&mut pokemon, &mut env, Some(&int(1)), 1));
        env.critical_hits = vec![49];
        assert!(!damage.after_battle(&mut pokemon, &mut env, 0, Some(&int(1))));
        assert!(pokemon.has_tag("ReadyToEvolve"));
        assert!(damage.on_event(&mut pokemon, &mut env, Some(&int(1)), 1));
        assert!(!damage.on_event(&mut pokemon, &mut env, Some(&int(1)), 2));
    }
}
