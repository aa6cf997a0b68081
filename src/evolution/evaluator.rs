//! Per-method evaluators and the global can-evolve checks.

use std::fmt;
use std::marker::PhantomData;

use bitflags::bitflags;

use crate::types::Name;

use super::parameter::{EvolutionParameter, ParameterKind, ParameterValue};
use super::pokemon::{EvolutionEnvironment, Pokemon};

bitflags! {
    /// Which hooks an evaluator implements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EvolutionConditions: u8 {
        const LEVEL_UP = 1;
        const USE_ITEM = 2;
        const TRADE = 4;
        const AFTER_BATTLE = 8;
        const EVENT = 16;
        const AFTER_EVOLUTION = 32;
    }
}

type Param<'a> = Option<&'a EvolutionParameter>;

type LevelUpHook =
    Box<dyn Fn(&mut Pokemon, &mut EvolutionEnvironment, Param<'_>) -> bool + Send + Sync>;
type UseItemHook =
    Box<dyn Fn(&mut Pokemon, &mut EvolutionEnvironment, Param<'_>, Name) -> bool + Send + Sync>;
type TradeHook = Box<
    dyn Fn(&mut Pokemon, &mut EvolutionEnvironment, Param<'_>, &Pokemon) -> bool + Send + Sync,
>;
type AfterBattleHook =
    Box<dyn Fn(&mut Pokemon, &mut EvolutionEnvironment, usize, Param<'_>) -> bool + Send + Sync>;
type EventHook =
    Box<dyn Fn(&mut Pokemon, &mut EvolutionEnvironment, Param<'_>, i64) -> bool + Send + Sync>;
type AfterEvolutionHook = Box<
    dyn Fn(&mut Pokemon, &mut EvolutionEnvironment, Name, Param<'_>, Name) -> bool + Send + Sync,
>;

/// The checks for one evolution method, with the parameter type erased.
///
/// Built with [`EvaluatorBuilder`]; each hook re-checks the parameter kind
/// and answers false on a mismatch.
pub struct MethodEvaluator {
    method: Name,
    parameter: Option<ParameterKind>,
    conditions: EvolutionConditions,
    on_level_up: Option<LevelUpHook>,
    on_use_item: Option<UseItemHook>,
    on_trade: Option<TradeHook>,
    after_battle: Option<AfterBattleHook>,
    on_event: Option<EventHook>,
    after_evolution: Option<AfterEvolutionHook>,
}

impl fmt::Debug for MethodEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEvaluator")
            .field("method", &self.method)
            .field("parameter", &self.parameter)
            .field("conditions", &self.conditions)
            .finish()
    }
}

impl MethodEvaluator {
    /// Start a builder for `method`, whose parameter is received as `P`.
    pub fn builder<P: ParameterValue>(method: &str) -> EvaluatorBuilder<P> {
        EvaluatorBuilder::new(method)
    }

    pub fn method(&self) -> Name {
        self.method
    }

    pub fn parameter_kind(&self) -> Option<ParameterKind> {
        self.parameter
    }

    pub fn conditions(&self) -> EvolutionConditions {
        self.conditions
    }

    pub fn on_level_up(
        &self,
        pokemon: &mut Pokemon,
        env: &mut EvolutionEnvironment,
        param: Param<'_>,
    ) -> bool {
        self.on_level_up
            .as_ref()
            .is_some_and(|hook| hook(pokemon, env, param))
    }

    pub fn on_use_item(
        &self,
        pokemon: &mut Pokemon,
        env: &mut EvolutionEnvironment,
        param: Param<'_>,
        item: Name,
    ) -> bool {
        self.on_use_item
            .as_ref()
            .is_some_and(|hook| hook(pokemon, env, param, item))
    }

    pub fn on_trade(
        &self,
        pokemon: &mut Pokemon,
        env: &mut EvolutionEnvironment,
        param: Param<'_>,
        other: &Pokemon,
    ) -> bool {
        self.on_trade
            .as_ref()
            .is_some_and(|hook| hook(pokemon, env, param, other))
    }

    pub fn after_battle(
        &self,
        pokemon: &mut Pokemon,
        env: &mut EvolutionEnvironment,
        party_index: usize,
        param: Param<'_>,
    ) -> bool {
        self.after_battle
            .as_ref()
            .is_some_and(|hook| hook(pokemon, env, party_index, param))
    }

    pub fn on_event(
        &self,
        pokemon: &mut Pokemon,
        env: &mut EvolutionEnvironment,
        param: Param<'_>,
        value: i64,
    ) -> bool {
        self.on_event
            .as_ref()
            .is_some_and(|hook| hook(pokemon, env, param, value))
    }

    pub fn after_evolution(
        &self,
        pokemon: &mut Pokemon,
        env: &mut EvolutionEnvironment,
        evo_species: Name,
        param: Param<'_>,
        new_species: Name,
    ) -> bool {
        self.after_evolution
            .as_ref()
            .is_some_and(|hook| hook(pokemon, env, evo_species, param, new_species))
    }
}

/// Typed construction of a [`MethodEvaluator`].
///
/// Hooks receive the parameter already converted to `P`.
pub struct EvaluatorBuilder<P: ParameterValue> {
    evaluator: MethodEvaluator,
    _param: PhantomData<fn() -> P>,
}

impl<P: ParameterValue> EvaluatorBuilder<P> {
    pub fn new(method: &str) -> Self {
        Self {
            evaluator: MethodEvaluator {
                method: Name::new(method),
                parameter: P::KIND,
                conditions: EvolutionConditions::empty(),
                on_level_up: None,
                on_use_item: None,
                on_trade: None,
                after_battle: None,
                on_event: None,
                after_evolution: None,
            },
            _param: PhantomData,
        }
    }

    pub fn on_level_up<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Pokemon, &mut EvolutionEnvironment, P) -> bool + Send + Sync + 'static,
    {
        self.evaluator.conditions |= EvolutionConditions::LEVEL_UP;
        self.evaluator.on_level_up = Some(Box::new(
            move |pokemon: &mut Pokemon, env: &mut EvolutionEnvironment, param: Param<'_>| {
                P::extract(param).is_some_and(|p| f(pokemon, env, p))
            },
        ));
        self
    }

    pub fn on_use_item<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Pokemon, &mut EvolutionEnvironment, P, Name) -> bool + Send + Sync + 'static,
    {
        self.evaluator.conditions |= EvolutionConditions::USE_ITEM;
        self.evaluator.on_use_item = Some(Box::new(
            move |pokemon: &mut Pokemon,
                  env: &mut EvolutionEnvironment,
                  param: Param<'_>,
                  item: Name| {
                P::extract(param).is_some_and(|p| f(pokemon, env, p, item))
            },
        ));
        self
    }

    pub fn on_trade<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Pokemon, &mut EvolutionEnvironment, P, &Pokemon) -> bool
            + Send
            + Sync
            + 'static,
    {
        self.evaluator.conditions |= EvolutionConditions::TRADE;
        self.evaluator.on_trade = Some(Box::new(
            move |pokemon: &mut Pokemon,
                  env: &mut EvolutionEnvironment,
                  param: Param<'_>,
                  other: &Pokemon| {
                P::extract(param).is_some_and(|p| f(pokemon, env, p, other))
            },
        ));
        self
    }

    pub fn after_battle<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Pokemon, &mut EvolutionEnvironment, usize, P) -> bool + Send + Sync + 'static,
    {
        self.evaluator.conditions |= EvolutionConditions::AFTER_BATTLE;
        self.evaluator.after_battle = Some(Box::new(
            move |pokemon: &mut Pokemon,
                  env: &mut EvolutionEnvironment,
                  index: usize,
                  param: Param<'_>| {
                P::extract(param).is_some_and(|p| f(pokemon, env, index, p))
            },
        ));
        self
    }

    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Pokemon, &mut EvolutionEnvironment, P, i64) -> bool + Send + Sync + 'static,
    {
        self.evaluator.conditions |= EvolutionConditions::EVENT;
        self.evaluator.on_event = Some(Box::new(
            move |pokemon: &mut Pokemon,
                  env: &mut EvolutionEnvironment,
                  param: Param<'_>,
                  value: i64| {
                P::extract(param).is_some_and(|p| f(pokemon, env, p, value))
            },
        ));
        self
    }

    pub fn after_evolution<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Pokemon, &mut EvolutionEnvironment, Name, P, Name) -> bool
            + Send
            + Sync
            + 'static,
    {
        self.evaluator.conditions |= EvolutionConditions::AFTER_EVOLUTION;
        self.evaluator.after_evolution = Some(Box::new(
            move |pokemon: &mut Pokemon,
                  env: &mut EvolutionEnvironment,
                  evo_species: Name,
                  param: Param<'_>,
                  new_species: Name| {
                P::extract(param).is_some_and(|p| f(pokemon, env, evo_species, p, new_species))
            },
        ));
        self
    }

    pub fn build(self) -> MethodEvaluator {
        self.evaluator
    }
}

/// A global check every evolution must pass, run in ascending priority.
pub trait CanEvolveEvaluator: Send + Sync {
    fn priority(&self) -> i32;

    fn can_evolve(&self, pokemon: &Pokemon) -> bool;
}

/// Eggs never evolve.
#[derive(Debug, Default)]
pub struct IsEggCanEvolve;

impl CanEvolveEvaluator for IsEggCanEvolve {
    fn priority(&self) -> i32 {
        0
    }

    fn can_evolve(&self, pokemon: &Pokemon) -> bool {
        !pokemon.is_egg
    }
}

/// A held Everstone blocks evolution.
#[derive(Debug, Default)]
pub struct EverstoneCanEvolve;

impl CanEvolveEvaluator for EverstoneCanEvolve {
    fn priority(&self) -> i32 {
        20
    }

    fn can_evolve(&self, pokemon: &Pokemon) -> bool {
        !pokemon.has_item(Name::new("EVERSTONE"))
    }
}

/// The Battle Bond ability blocks evolution.
#[derive(Debug, Default)]
pub struct BattleBondCanEvolve;

impl CanEvolveEvaluator for BattleBondCanEvolve {
    fn priority(&self) -> i32 {
        30
    }

    fn can_evolve(&self, pokemon: &Pokemon) -> bool {
        !pokemon.has_ability(Name::new("BATTLEBOND"))
    }
}
