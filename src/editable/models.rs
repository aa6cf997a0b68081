//! Editable property tables of the game data entities.
//!
//! Keys are not editable; a renamed entity is a new entity.

use std::sync::OnceLock;

use crate::types::{LevelUpMove, Move, PokemonType, Species, Trainer, TrainerPokemon};

use super::editable_type::{object, Editable, EditableType, EditableTypeBuilder};
use super::property::{dictionary, list, optional, scalar};

impl Editable for PokemonType {
    fn editable_type() -> &'static EditableType<Self> {
        static TYPE: OnceLock<EditableType<PokemonType>> = OnceLock::new();
        TYPE.get_or_init(|| {
            EditableTypeBuilder::<PokemonType>::new("PokemonType")
                .scalar("Name", |t| &t.name, |t| &mut t.name)
                .scalar("IconPosition", |t| &t.icon_position, |t| &mut t.icon_position)
                .scalar("IsSpecialType", |t| &t.is_special_type, |t| &mut t.is_special_type)
                .scalar("IsPseudoType", |t| &t.is_pseudo_type, |t| &mut t.is_pseudo_type)
                .property("Weaknesses", |t| &t.weaknesses, |t| &mut t.weaknesses, list(scalar()))
                .property("Resistances", |t| &t.resistances, |t| &mut t.resistances, list(scalar()))
                .property("Immunities", |t| &t.immunities, |t| &mut t.immunities, list(scalar()))
                .property("Flags", |t| &t.flags, |t| &mut t.flags, list(scalar()))
                .build()
        })
    }
}

impl Editable for Move {
    fn editable_type() -> &'static EditableType<Self> {
        static TYPE: OnceLock<EditableType<Move>> = OnceLock::new();
        TYPE.get_or_init(|| {
            EditableTypeBuilder::<Move>::new("Move")
                .scalar("Name", |m| &m.name, |m| &mut m.name)
                .property("Type", |m| &m.move_type, |m| &mut m.move_type, optional(scalar()))
                .scalar("Category", |m| &m.category, |m| &mut m.category)
                .scalar("Power", |m| &m.power, |m| &mut m.power)
                .scalar("Accuracy", |m| &m.accuracy, |m| &mut m.accuracy)
                .scalar("TotalPP", |m| &m.total_pp, |m| &mut m.total_pp)
                .property("Target", |m| &m.target, |m| &mut m.target, optional(scalar()))
                .scalar("Priority", |m| &m.priority, |m| &mut m.priority)
                .scalar("FunctionCode", |m| &m.function_code, |m| &mut m.function_code)
                .property("Flags", |m| &m.flags, |m| &mut m.flags, list(scalar()))
                .scalar("EffectChance", |m| &m.effect_chance, |m| &mut m.effect_chance)
                .scalar("Description", |m| &m.description, |m| &mut m.description)
                .build()
        })
    }
}

fn level_up_move_type() -> EditableType<LevelUpMove> {
    EditableTypeBuilder::<LevelUpMove>::new("LevelUpMove")
        .scalar("Level", |m| &m.level, |m| &mut m.level)
        .scalar("Move", |m| &m.move_id, |m| &mut m.move_id)
        .build()
}

impl Editable for Species {
    fn editable_type() -> &'static EditableType<Self> {
        static TYPE: OnceLock<EditableType<Species>> = OnceLock::new();
        TYPE.get_or_init(|| {
            EditableTypeBuilder::<Species>::new("Species")
                .scalar("Name", |s| &s.name, |s| &mut s.name)
                .property("FormName", |s| &s.form_name, |s| &mut s.form_name, optional(scalar()))
                .scalar("Category", |s| &s.category, |s| &mut s.category)
                .scalar("Pokedex", |s| &s.pokedex_entry, |s| &mut s.pokedex_entry)
                .property("Types", |s| &s.types, |s| &mut s.types, list(scalar()))
                .property("BaseStats", |s| &s.base_stats, |s| &mut s.base_stats, dictionary(scalar()))
                .property("EVs", |s| &s.evs, |s| &mut s.evs, dictionary(scalar()))
                .scalar("BaseExp", |s| &s.base_exp, |s| &mut s.base_exp)
                .scalar("GrowthRate", |s| &s.growth_rate, |s| &mut s.growth_rate)
                .scalar("GenderRatio", |s| &s.gender_ratio, |s| &mut s.gender_ratio)
                .scalar("CatchRate", |s| &s.catch_rate, |s| &mut s.catch_rate)
                .scalar("Happiness", |s| &s.happiness, |s| &mut s.happiness)
                .property(
                    "Moves",
                    |s| &s.level_up_moves,
                    |s| &mut s.level_up_moves,
                    list(object(level_up_move_type())),
                )
                .property("TutorMoves", |s| &s.tutor_moves, |s| &mut s.tutor_moves, list(scalar()))
                .property("EggMoves", |s| &s.egg_moves, |s| &mut s.egg_moves, list(scalar()))
                .property("Abilities", |s| &s.abilities, |s| &mut s.abilities, list(scalar()))
                .property(
                    "HiddenAbilities",
                    |s| &s.hidden_abilities,
                    |s| &mut s.hidden_abilities,
                    list(scalar()),
                )
                .property(
                    "WildItemCommon",
                    |s| &s.wild_item_common,
                    |s| &mut s.wild_item_common,
                    list(scalar()),
                )
                .property(
                    "WildItemUncommon",
                    |s| &s.wild_item_uncommon,
                    |s| &mut s.wild_item_uncommon,
                    list(scalar()),
                )
                .property("WildItemRare", |s| &s.wild_item_rare, |s| &mut s.wild_item_rare, list(scalar()))
                .property("EggGroups", |s| &s.egg_groups, |s| &mut s.egg_groups, list(scalar()))
                .scalar("HatchSteps", |s| &s.hatch_steps, |s| &mut s.hatch_steps)
                .property("Incense", |s| &s.incense, |s| &mut s.incense, optional(scalar()))
                .property("Offspring", |s| &s.offspring, |s| &mut s.offspring, list(scalar()))
                .property("Evolutions", |s| &s.evolutions, |s| &mut s.evolutions, list(scalar()))
                .scalar("Height", |s| &s.height, |s| &mut s.height)
                .scalar("Weight", |s| &s.weight, |s| &mut s.weight)
                .scalar("Color", |s| &s.color, |s| &mut s.color)
                .scalar("Shape", |s| &s.shape, |s| &mut s.shape)
                .property("Habitat", |s| &s.habitat, |s| &mut s.habitat, optional(scalar()))
                .scalar("Generation", |s| &s.generation, |s| &mut s.generation)
                .property("Flags", |s| &s.flags, |s| &mut s.flags, list(scalar()))
                .build()
        })
    }
}

fn trainer_pokemon_type() -> EditableType<TrainerPokemon> {
    EditableTypeBuilder::<TrainerPokemon>::new("TrainerPokemon")
        .scalar("Species", |p| &p.species, |p| &mut p.species)
        .scalar("Level", |p| &p.level, |p| &mut p.level)
        .property("Form", |p| &p.form, |p| &mut p.form, optional(scalar()))
        .property("Name", |p| &p.name, |p| &mut p.name, optional(scalar()))
        .property("Moves", |p| &p.moves, |p| &mut p.moves, list(scalar()))
        .property("Ability", |p| &p.ability, |p| &mut p.ability, optional(scalar()))
        .property("AbilityIndex", |p| &p.ability_index, |p| &mut p.ability_index, optional(scalar()))
        .property("Item", |p| &p.item, |p| &mut p.item, optional(scalar()))
        .property("Gender", |p| &p.gender, |p| &mut p.gender, optional(scalar()))
        .property("Nature", |p| &p.nature, |p| &mut p.nature, optional(scalar()))
        .property("IV", |p| &p.iv, |p| &mut p.iv, list(scalar()))
        .property("EV", |p| &p.ev, |p| &mut p.ev, list(scalar()))
        .property("Happiness", |p| &p.happiness, |p| &mut p.happiness, optional(scalar()))
        .scalar("Shiny", |p| &p.shiny, |p| &mut p.shiny)
        .scalar("SuperShiny", |p| &p.super_shiny, |p| &mut p.super_shiny)
        .scalar("Shadow", |p| &p.shadow, |p| &mut p.shadow)
        .property("Ball", |p| &p.ball, |p| &mut p.ball, optional(scalar()))
        .build()
}

impl Editable for Trainer {
    fn editable_type() -> &'static EditableType<Self> {
        static TYPE: OnceLock<EditableType<Trainer>> = OnceLock::new();
        TYPE.get_or_init(|| {
            EditableTypeBuilder::<Trainer>::new("Trainer")
                .property("Items", |t| &t.items, |t| &mut t.items, list(scalar()))
                .property("LoseText", |t| &t.lose_text, |t| &mut t.lose_text, optional(scalar()))
                .property(
                    "Pokemon",
                    |t| &t.pokemon,
                    |t| &mut t.pokemon,
                    list(object(trainer_pokemon_type())),
                )
                .build()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editable::{DiffNode, EntityRepository, FieldEdit, FieldPath, ListEditNode};
    use crate::error::PbsError;
    use crate::registry::DataSet;
    use crate::types::{MoveCategory, Name, SpeciesForm, TrainerKey};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn pokemon_type(id: &str) -> PokemonType {
        PokemonType {
            id: Name::new(id),
            name: id.to_string(),
            icon_position: 0,
            is_special_type: false,
            is_pseudo_type: false,
            weaknesses: Vec::new(),
            resistances: Vec::new(),
            immunities: Vec::new(),
            flags: Vec::new(),
        }
    }

    fn tackle() -> Move {
        Move {
            id: Name::new("TACKLE"),
            name: "Tackle".to_string(),
            move_type: Some(Name::new("NORMAL")),
            category: MoveCategory::Physical,
            power: 40,
            accuracy: 100,
            total_pp: 35,
            target: None,
            priority: 0,
            function_code: "None".to_string(),
            flags: vec!["Contact".to_string()],
            effect_chance: 0,
            description: "A physical attack.".to_string(),
        }
    }

    fn trainer() -> Trainer {
        Trainer {
            id: TrainerKey::new("YOUNGSTER", "Ben", 0),
            items: Vec::new(),
            lose_text: Some("Aww!".to_string()),
            pokemon: vec![TrainerPokemon {
                species: Name::new("RATTATA"),
                level: 5,
                iv: vec![10; 6],
                ev: vec![0; 6],
                ..Default::default()
            }],
        }
    }

    fn types_set() -> DataSet<PokemonType> {
        let mut set = DataSet::new();
        set.import(vec![pokemon_type("NORMAL"), pokemon_type("FIRE"), pokemon_type("WATER")]);
        set
    }

    #[test]
    fn test_type_weakness_diff() {
        let old = pokemon_type("FIRE");
        let mut new = old.clone();
        new.weaknesses = vec![Name::new("WATER"), Name::new("GROUND")];

        let diff = PokemonType::editable_type().diff(&old, &new).unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&diff).unwrap(),
            json!({
                "$type": "Object",
                "properties": {
                    "Weaknesses": {
                        "$type": "List",
                        "edits": [
                            { "$type": "Add", "newValue": "WATER" },
                            { "$type": "Add", "newValue": "GROUND" }
                        ]
                    }
                }
            })
        );
    }

    #[test]
    fn test_move_optional_type() {
        let ty = Move::editable_type();
        let old = tackle();
        let mut new = old.clone();
        new.move_type = None;
        new.power = 50;

        let diff = ty.diff(&old, &new).unwrap().unwrap();
        let DiffNode::Object { properties } = &diff else {
            panic!("expected an object diff, got {diff:?}");
        };
        assert_eq!(properties.get("Type"), Some(&DiffNode::ValueReset));
        assert_eq!(properties.get("Power"), Some(&DiffNode::value_set(json!(50))));

        let mut patched = old;
        ty.apply(&mut patched, &diff).unwrap();
        assert_eq!(patched, new);
    }

    #[test]
    fn test_species_base_stats_dictionary() {
        let ty = Species::editable_type();
        let old = Species::new(SpeciesForm::base(Name::new("BULBASAUR")));
        let mut new = old.clone();
        new.base_stats.insert(Name::new("SPEED"), 45);

        let diff = ty.diff(&old, &new).unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&diff).unwrap(),
            json!({
                "$type": "Object",
                "properties": {
                    "BaseStats": {
                        "$type": "Dictionary",
                        "edits": [{
                            "$type": "Set",
                            "key": "SPEED",
                            "change": { "$type": "ValueSet", "newValue": 45 }
                        }]
                    }
                }
            })
        );

        let path = FieldPath::root().property("BaseStats").key(json!("HP"));
        let mut edited = old.clone();
        ty.apply_edit(&mut edited, &path.segments, &FieldEdit::SetValue { path: path.clone(), new_value: json!(60) })
            .unwrap();
        assert_eq!(edited.base_stats.get(&Name::new("HP")), Some(&60));
    }

    #[test]
    fn test_trainer_party_nested() {
        let ty = Trainer::editable_type();
        let old = trainer();
        let mut new = old.clone();
        new.pokemon[0].level = 7;
        new.pokemon[0].item = Some(Name::new("ORANBERRY"));
        new.pokemon.push(TrainerPokemon {
            species: Name::new("PIDGEY"),
            level: 6,
            ..Default::default()
        });

        let diff = ty.diff(&old, &new).unwrap().unwrap();
        let DiffNode::Object { properties } = &diff else {
            panic!("expected an object diff, got {diff:?}");
        };
        let Some(DiffNode::List { edits }) = properties.get("Pokemon") else {
            panic!("expected a party diff");
        };
        assert_eq!(edits.len(), 2);
        assert!(matches!(&edits[0], ListEditNode::Set { index: 0, change: DiffNode::Object { .. } }));
        assert!(matches!(&edits[1], ListEditNode::Add { .. }));

        let mut patched = old;
        ty.apply(&mut patched, &diff).unwrap();
        assert_eq!(patched, new);
    }

    #[test]
    fn test_trainer_edit_by_path() {
        let ty = Trainer::editable_type();
        let mut value = trainer();

        let path = FieldPath::root().property("Pokemon").index(0).property("Moves");
        ty.apply_edit(&mut value, &path.segments, &FieldEdit::ListAdd { path: path.clone(), new_item: json!("TACKLE") })
            .unwrap();
        assert_eq!(value.pokemon[0].moves, vec![Name::new("TACKLE")]);

        let path = FieldPath::root().property("LoseText");
        ty.apply_edit(&mut value, &path.segments, &FieldEdit::OptionalReset { path: path.clone(), original_value: None })
            .unwrap();
        assert_eq!(value.lose_text, None);

        let path = FieldPath::root().property("Pokemon").index(3).property("Level");
        let err = ty
            .apply_edit(&mut value, &path.segments, &FieldEdit::SetValue { path: path.clone(), new_value: json!(9) })
            .unwrap_err();
        assert!(matches!(err, PbsError::Edit { .. }));
    }

    #[test]
    fn test_repository_apply_edit() {
        let mut set = types_set();
        let mut repo = EntityRepository::new(&set);
        assert_eq!(repo.len(), 3);

        let mut properties = indexmap::IndexMap::new();
        properties.insert("Name".to_string(), DiffNode::value_set(json!("Fire")));
        let diff = DiffNode::Object { properties };

        let effective = repo.apply_edit(&Name::new("FIRE"), &diff).unwrap();
        assert_eq!(effective, Some(diff.clone()));
        assert!(repo.has_pending_changes());

        // Same diff again changes nothing.
        assert_eq!(repo.apply_edit(&Name::new("FIRE"), &diff).unwrap(), None);
        assert_eq!(set.get(&Name::new("FIRE")).unwrap().name, "FIRE");

        repo.commit(&mut set);
        assert!(!repo.has_pending_changes());
        assert_eq!(set.get(&Name::new("FIRE")).unwrap().name, "Fire");
    }

    #[test]
    fn test_repository_failed_edit_keeps_entry() {
        let set = types_set();
        let mut repo = EntityRepository::new(&set);

        let mut properties = indexmap::IndexMap::new();
        properties.insert("Name".to_string(), DiffNode::value_set(json!("Water")));
        properties.insert("IconPosition".to_string(), DiffNode::value_set(json!("bad")));
        let diff = DiffNode::Object { properties };

        assert!(repo.apply_edit_at(2, &diff).is_err());
        assert_eq!(repo.get_at(2).unwrap().name, "WATER");
        assert!(!repo.has_pending_changes());
        assert!(repo.apply_edit_at(3, &diff).is_err());
    }

    #[test]
    fn test_repository_field_edit_and_swap() {
        let mut set = types_set();
        let mut repo = EntityRepository::new(&set);

        let path = FieldPath::root().property("Weaknesses");
        let edit = FieldEdit::ListAdd {
            path,
            new_item: json!("WATER"),
        };
        let effective = repo.apply_field_edit(&Name::new("FIRE"), &edit).unwrap();
        assert!(effective.is_some());

        repo.swap(0, 2).unwrap();
        assert!(repo.swap(0, 3).is_err());
        let order: Vec<String> = repo.entries().map(|t| t.id.to_string()).collect();
        assert_eq!(order, vec!["WATER", "FIRE", "NORMAL"]);

        repo.remove(&Name::new("NORMAL")).unwrap();
        repo.commit(&mut set);
        assert_eq!(set.len(), 2);
        assert_eq!(set.index_of(&Name::new("WATER")), Some(0));
        assert_eq!(set.get(&Name::new("FIRE")).unwrap().weaknesses, vec![Name::new("WATER")]);
    }

    #[test]
    fn test_repository_sync_discards_changes() {
        let set = types_set();
        let mut repo = EntityRepository::new(&set);
        repo.remove_at(0).unwrap();
        assert_eq!(repo.len(), 2);

        repo.sync_from(&set);
        assert_eq!(repo.len(), 3);
        assert!(!repo.has_pending_changes());
    }
}
