//! Pool, inhabitant, activator and modifier types the engine evaluates.
//!
//! A [`SpawnRules`] value is immutable once constructed and is shared behind
//! an `Arc`; every probability computation reads it without locking.

use std::{collections::HashSet, sync::Arc};

use thiserror::Error;

use crate::{
    context::{Condition, SpawnContext},
    probability::PercentModifier,
    species::{CreatureType, Species},
};

/// Tolerance applied to the static percentage total.
pub const PERCENT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct PoolInhabitant {
    pub species: Species,
    pub weight: f64,
    pub condition: Option<Condition>,
}

impl PoolInhabitant {
    pub fn new(species: Species, weight: f64) -> Self {
        Self {
            species,
            weight,
            condition: None,
        }
    }

    /// Inhabitants without a condition are always eligible.
    pub fn is_eligible(&self, ctx: &SpawnContext) -> bool {
        self.condition
            .as_ref()
            .map_or(true, |condition| condition.evaluate(ctx))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModifierEffect {
    BoostType { kind: CreatureType, multiplier: f64 },
    SuppressType { kind: CreatureType, multiplier: f64 },
    /// Sets the creature's weight, adding it to the table if absent.
    AddCreature { species: Species, weight: f64 },
}

#[derive(Debug, Clone)]
pub struct Modifier {
    pub condition: Condition,
    pub effects: Vec<ModifierEffect>,
}

impl Modifier {
    pub fn is_active(&self, ctx: &SpawnContext) -> bool {
        self.condition.evaluate(ctx)
    }
}

#[derive(Debug, Clone)]
pub struct PoolActivator {
    pub percentage: f64,
    pub condition: Condition,
    pub modifier: Option<PercentModifier>,
}

impl PoolActivator {
    pub fn resolve(&self, ctx: &SpawnContext) -> f64 {
        match &self.modifier {
            Some(modifier) => modifier.apply(self.percentage, ctx),
            None => self.percentage,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpawnPool {
    pub name: String,
    /// Zero for pools that only ever turn on through activators.
    pub base_percentage: f64,
    pub inhabitants: Vec<PoolInhabitant>,
    pub activators: Vec<PoolActivator>,
    pub modifiers: Vec<Modifier>,
    pub base_modifier: Option<PercentModifier>,
    pub special: bool,
    pub conditional: bool,
}

impl SpawnPool {
    pub fn new(name: impl Into<String>, base_percentage: f64) -> Self {
        Self {
            name: name.into(),
            base_percentage,
            inhabitants: Vec::new(),
            activators: Vec::new(),
            modifiers: Vec::new(),
            base_modifier: None,
            special: false,
            conditional: base_percentage <= 0.0,
        }
    }

    pub fn matching_activator(&self, ctx: &SpawnContext) -> Option<&PoolActivator> {
        self.activators
            .iter()
            .find(|activator| activator.condition.evaluate(ctx))
    }

    pub fn is_active(&self, ctx: &SpawnContext) -> bool {
        self.base_percentage > 0.0 || self.matching_activator(ctx).is_some()
    }

    /// First matching activator wins for pools without a base; otherwise the
    /// base, passed through `base_modifier` when one is declared.
    pub fn desired_percentage(&self, ctx: &SpawnContext) -> f64 {
        if self.base_percentage <= 0.0 {
            return self
                .matching_activator(ctx)
                .map_or(0.0, |activator| activator.resolve(ctx));
        }
        match &self.base_modifier {
            Some(modifier) => modifier.apply(self.base_percentage, ctx),
            None => self.base_percentage,
        }
    }

    /// Plain static pools: the only ones allowed to shrink during
    /// redistribution.
    pub fn is_deductible(&self) -> bool {
        self.base_percentage > 0.0 && self.base_modifier.is_none() && self.activators.is_empty()
    }

    pub fn is_reroll_eligible(&self) -> bool {
        !self.special && !self.conditional && self.base_percentage > 0.0
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
    #[error("static pool percentages sum to {total:.2}, expected 100")]
    PercentagesDoNotSumTo100 { total: f64 },
    #[error("pool name '{0}' is declared more than once")]
    DuplicatePool(String),
    #[error("activator #{index} of pool '{pool}' has no condition")]
    ActivatorWithoutCondition { pool: String, index: usize },
    #[error("inhabitant {species} of pool '{pool}' has negative weight {weight}")]
    NegativeWeight {
        pool: String,
        species: String,
        weight: f64,
    },
    #[error("pool '{pool}' declares negative percentage {percentage}")]
    NegativePercentage { pool: String, percentage: f64 },
    #[error("special pool '{pool}' must hold exactly one creature, found {count}")]
    SpecialPoolSize { pool: String, count: usize },
}

/// The complete, validated rule set.
#[derive(Debug)]
pub struct SpawnRules {
    pools: Vec<Arc<SpawnPool>>,
    global_modifiers: Vec<Modifier>,
}

impl SpawnRules {
    pub fn new(pools: Vec<SpawnPool>, global_modifiers: Vec<Modifier>) -> Result<Self, RuleError> {
        let mut names = HashSet::new();
        let mut static_total = 0.0;
        for pool in &pools {
            if !names.insert(pool.name.as_str()) {
                return Err(RuleError::DuplicatePool(pool.name.clone()));
            }
            if pool.base_percentage < 0.0 {
                return Err(RuleError::NegativePercentage {
                    pool: pool.name.clone(),
                    percentage: pool.base_percentage,
                });
            }
            if let Some(activator) = pool.activators.iter().find(|a| a.percentage < 0.0) {
                return Err(RuleError::NegativePercentage {
                    pool: pool.name.clone(),
                    percentage: activator.percentage,
                });
            }
            if let Some(inhabitant) = pool.inhabitants.iter().find(|i| i.weight < 0.0) {
                return Err(RuleError::NegativeWeight {
                    pool: pool.name.clone(),
                    species: inhabitant.species.name.to_string(),
                    weight: inhabitant.weight,
                });
            }
            if pool.special && pool.inhabitants.len() != 1 {
                return Err(RuleError::SpecialPoolSize {
                    pool: pool.name.clone(),
                    count: pool.inhabitants.len(),
                });
            }
            if pool.base_percentage > 0.0 {
                static_total += pool.base_percentage;
            }
        }

        if (static_total - 100.0).abs() > PERCENT_TOLERANCE {
            return Err(RuleError::PercentagesDoNotSumTo100 {
                total: static_total,
            });
        }

        Ok(Self {
            pools: pools.into_iter().map(Arc::new).collect(),
            global_modifiers,
        })
    }

    pub fn pools(&self) -> &[Arc<SpawnPool>] {
        &self.pools
    }

    pub fn pool(&self, name: &str) -> Option<&Arc<SpawnPool>> {
        self.pools.iter().find(|pool| pool.name == name)
    }

    pub fn global_modifiers(&self) -> &[Modifier] {
        &self.global_modifiers
    }
}

/// One successful draw. Immutable apart from the spawn time, which the
/// cadence controller stamps.
#[derive(Debug, Clone)]
pub struct SpawnResult {
    pub species: Species,
    pub pool: Arc<SpawnPool>,
    pub screen_off_minutes: u32,
    pub spawned_at_ms: i64,
}

/// Two results are the same spawn when creature, pool and time agree.
impl PartialEq for SpawnResult {
    fn eq(&self, other: &Self) -> bool {
        self.species == other.species
            && self.pool.name == other.pool.name
            && self.spawned_at_ms == other.spawned_at_ms
    }
}

impl SpawnResult {
    pub fn pool_name(&self) -> &str {
        &self.pool.name
    }

    pub fn is_special(&self) -> bool {
        self.pool.special
    }

    pub fn with_spawned_at(mut self, spawned_at_ms: i64) -> Self {
        self.spawned_at_ms = spawned_at_ms;
        self
    }
}
