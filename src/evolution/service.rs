//! Dispatch of evolution checks by method name.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{PbsError, Result};
use crate::registry::DataSet;
use crate::types::{Name, Species};

use super::evaluator::{
    BattleBondCanEvolve, CanEvolveEvaluator, EverstoneCanEvolve, EvolutionConditions,
    IsEggCanEvolve, MethodEvaluator,
};
use super::methods::default_evaluators;
use super::parameter::EvolutionParameter;
use super::pokemon::{EvolutionEnvironment, Pokemon};
use super::Evolution;

/// Owns the evaluators for every evolution method.
pub struct EvolutionService {
    evaluators: HashMap<Name, MethodEvaluator>,
    can_evolve: Vec<Box<dyn CanEvolveEvaluator>>,
}

impl std::fmt::Debug for EvolutionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvolutionService")
            .field("evaluators", &self.evaluators.len())
            .field("can_evolve", &self.can_evolve.len())
            .finish()
    }
}

fn kind_label(kind: Option<super::ParameterKind>) -> String {
    kind.map_or_else(|| "None".to_string(), |k| k.to_string())
}

impl EvolutionService {
    /// Build a service, checking every evaluator against the method table.
    ///
    /// Fails with a configuration error when an evaluator names a method
    /// that is not registered, or expects a different parameter kind.
    pub fn new(
        methods: &DataSet<Evolution>,
        evaluators: Vec<MethodEvaluator>,
        mut can_evolve: Vec<Box<dyn CanEvolveEvaluator>>,
    ) -> Result<Self> {
        let mut by_method = HashMap::with_capacity(evaluators.len());
        for evaluator in evaluators {
            let method = evaluator.method();
            let evolution = methods.get(&method).ok_or_else(|| {
                PbsError::configuration(format!(
                    "The evaluator for evolution method {method} does not match any registered evolution method."
                ))
            })?;
            if evaluator.parameter_kind() != evolution.parameter {
                return Err(PbsError::configuration(format!(
                    "The evaluator for evolution method {method} is not compatible with the registered parameter type {} for the evolution method.",
                    kind_label(evolution.parameter)
                )));
            }
            by_method.insert(method, evaluator);
        }
        can_evolve.sort_by_key(|c| c.priority());
        debug!(
            evaluators = by_method.len(),
            can_evolve = can_evolve.len(),
            "Evolution service ready"
        );
        Ok(Self {
            evaluators: by_method,
            can_evolve,
        })
    }

    /// Service with the built-in evaluators and can-evolve checks.
    pub fn with_defaults(methods: &DataSet<Evolution>) -> Result<Self> {
        Self::new(
            methods,
            default_evaluators(),
            vec![
                Box::new(IsEggCanEvolve),
                Box::new(EverstoneCanEvolve),
                Box::new(BattleBondCanEvolve),
            ],
        )
    }

    /// Whether every can-evolve check passes.
    pub fn can_evolve(&self, pokemon: &Pokemon) -> bool {
        self.can_evolve.iter().all(|c| c.can_evolve(pokemon))
    }

    pub fn evaluator(&self, method: Name) -> Option<&MethodEvaluator> {
        self.evaluators.get(&method)
    }

    /// Whether the evaluator of `method` implements the hooks in `flag`.
    pub fn method_has_flag(&self, method: Name, flag: EvolutionConditions) -> bool {
        self.evaluator(method)
            .is_some_and(|e| e.conditions().contains(flag))
    }

    pub fn on_level_up(
        &self,
        method: Name,
        pokemon: &mut Pokemon,
        env: &mut EvolutionEnvironment,
        param: Option<&EvolutionParameter>,
    ) -> bool {
        self.evaluator(method)
            .is_some_and(|e| e.on_level_up(pokemon, env, param))
    }

    pub fn on_use_item(
        &self,
        method: Name,
        pokemon: &mut Pokemon,
        env: &mut EvolutionEnvironment,
        param: Option<&EvolutionParameter>,
        item: Name,
    ) -> bool {
        self.evaluator(method)
            .is_some_and(|e| e.on_use_item(pokemon, env, param, item))
    }

    pub fn on_trade(
        &self,
        method: Name,
        pokemon: &mut Pokemon,
        env: &mut EvolutionEnvironment,
        param: Option<&EvolutionParameter>,
        other: &Pokemon,
    ) -> bool {
        self.evaluator(method)
            .is_some_and(|e| e.on_trade(pokemon, env, param, other))
    }

    pub fn after_battle(
        &self,
        method: Name,
        pokemon: &mut Pokemon,
        env: &mut EvolutionEnvironment,
        party_index: usize,
        param: Option<&EvolutionParameter>,
    ) -> bool {
        self.evaluator(method)
            .is_some_and(|e| e.after_battle(pokemon, env, party_index, param))
    }

    pub fn on_event(
        &self,
        method: Name,
        pokemon: &mut Pokemon,
        env: &mut EvolutionEnvironment,
        param: Option<&EvolutionParameter>,
        value: i64,
    ) -> bool {
        self.evaluator(method)
            .is_some_and(|e| e.on_event(pokemon, env, param, value))
    }

    pub fn after_evolution(
        &self,
        method: Name,
        pokemon: &mut Pokemon,
        env: &mut EvolutionEnvironment,
        evo_species: Name,
        param: Option<&EvolutionParameter>,
        new_species: Name,
    ) -> bool {
        self.evaluator(method)
            .is_some_and(|e| e.after_evolution(pokemon, env, evo_species, param, new_species))
    }

    /// First species `pokemon` evolves into on level up, if any.
    pub fn check_level_up(
        &self,
        species: &Species,
        pokemon: &mut Pokemon,
        env: &mut EvolutionEnvironment,
    ) -> Option<Name> {
        if !self.can_evolve(pokemon) {
            return None;
        }
        species
            .forward_evolutions()
            .find(|evo| self.on_level_up(evo.method, pokemon, env, evo.parameter.as_ref()))
            .map(|evo| evo.species)
    }

    /// First species `pokemon` evolves into when `item` is used on it.
    pub fn check_use_item(
        &self,
        species: &Species,
        pokemon: &mut Pokemon,
        env: &mut EvolutionEnvironment,
        item: Name,
    ) -> Option<Name> {
        if !self.can_evolve(pokemon) {
            return None;
        }
        species
            .forward_evolutions()
            .find(|evo| self.on_use_item(evo.method, pokemon, env, evo.parameter.as_ref(), item))
            .map(|evo| evo.species)
    }

    /// Run the after-evolution hook of every edge of the old species.
    ///
    /// Returns how many hooks reported doing something.
    pub fn run_after_evolution(
        &self,
        old_species: &Species,
        pokemon: &mut Pokemon,
        env: &mut EvolutionEnvironment,
        new_species: Name,
    ) -> usize {
        old_species
            .forward_evolutions()
            .filter(|evo| {
                self.after_evolution(
                    evo.method,
                    pokemon,
                    env,
                    evo.species,
                    evo.parameter.as_ref(),
                    new_species,
                )
            })
            .count()
    }
}
