use std::{fmt, sync::Arc};

use rand::Rng;
use thiserror::Error;
use tracing::{debug, error, trace};

use crate::{
    context::SpawnContext,
    pool::{ModifierEffect, SpawnPool, SpawnResult, SpawnRules},
    redistribute::{redistribute, PoolRequest},
    species::Species,
};

/// Stable-ordered weight table. Iteration order decides ties at the walk
/// boundary, so entries are never reordered.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution<K> {
    entries: Vec<(K, f64)>,
}

impl<K> Default for Distribution<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("weighted walk fell through: total {total}, remainder {remainder}")]
pub struct WalkExhausted {
    pub total: f64,
    pub remainder: f64,
}

impl<K> Distribution<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<(K, f64)>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, key: K, weight: f64) {
        self.entries.push((key, weight));
    }

    pub fn total(&self) -> f64 {
        self.entries
            .iter()
            .map(|(_, weight)| weight.max(0.0))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> + '_ {
        self.entries.iter().map(|(key, weight)| (key, *weight))
    }

    pub fn into_entries(self) -> Vec<(K, f64)> {
        self.entries
    }

    /// Cumulative-subtraction walk: `r = uniform * total`, subtract each
    /// positive weight in order, return the first entry that brings `r` to
    /// zero or below. `Ok(None)` when nothing carries weight.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Option<&K>, WalkExhausted> {
        let total = self.total();
        if total <= 0.0 {
            return Ok(None);
        }
        let mut remainder = rng.gen::<f64>() * total;
        for (key, weight) in &self.entries {
            if *weight <= 0.0 {
                continue;
            }
            remainder -= weight;
            if remainder <= 0.0 {
                return Ok(Some(key));
            }
        }
        Err(WalkExhausted { total, remainder })
    }

    /// Rescales the weights to percentages; empty when the total is not positive.
    pub fn normalized(self) -> Self {
        let total = self.total();
        if total <= 0.0 {
            return Self::default();
        }
        Self {
            entries: self
                .entries
                .into_iter()
                .map(|(key, weight)| (key, weight.max(0.0) / total * 100.0))
                .collect(),
        }
    }

    fn scale_where(&mut self, mut matches: impl FnMut(&K) -> bool, factor: f64) {
        for (key, weight) in &mut self.entries {
            if matches(key) {
                *weight *= factor;
            }
        }
    }
}

impl<K: PartialEq> Distribution<K> {
    pub fn get(&self, key: &K) -> Option<f64> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, weight)| *weight)
    }

    /// Replaces the weight of `key`, appending it when absent.
    pub fn set(&mut self, key: K, weight: f64) {
        match self.entries.iter_mut().find(|(candidate, _)| *candidate == key) {
            Some(entry) => entry.1 = weight,
            None => self.entries.push((key, weight)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStage {
    Pool,
    Creature,
}

impl fmt::Display for SelectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SelectionStage::Pool => "pool",
            SelectionStage::Creature => "creature",
        })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SpawnError {
    /// Probability bookkeeping is inconsistent; never a valid outcome.
    #[error("{stage} selection exhausted: total weight {total}, remainder {remainder}")]
    SelectionExhausted {
        stage: SelectionStage,
        total: f64,
        remainder: f64,
    },
}

impl SpawnError {
    fn exhausted(stage: SelectionStage, walk: WalkExhausted) -> Self {
        error!(
            target: "glyphdex::engine",
            %stage,
            total = walk.total,
            remainder = walk.remainder,
            "spawn.selection_exhausted"
        );
        SpawnError::SelectionExhausted {
            stage,
            total: walk.total,
            remainder: walk.remainder,
        }
    }
}

/// Two-stage weighted selection over an immutable rule set.
#[derive(Debug, Clone)]
pub struct SpawnEngine {
    rules: Arc<SpawnRules>,
}

impl SpawnEngine {
    pub fn new(rules: Arc<SpawnRules>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &SpawnRules {
        &self.rules
    }

    /// Active pools with their reconciled percentages, in rule-table order.
    pub fn pool_distribution(&self, ctx: &SpawnContext) -> Distribution<Arc<SpawnPool>> {
        let active: Vec<&Arc<SpawnPool>> = self
            .rules
            .pools()
            .iter()
            .filter(|pool| pool.is_active(ctx))
            .collect();
        let requests: Vec<PoolRequest<'_>> = active
            .iter()
            .map(|&pool| PoolRequest::new(pool, pool.desired_percentage(ctx)))
            .collect();
        let reconciled = redistribute(&requests);

        Distribution::from_entries(
            active
                .into_iter()
                .zip(reconciled)
                .map(|(pool, (_, percentage))| (Arc::clone(pool), percentage))
                .collect(),
        )
    }

    pub fn pool_probabilities(&self, ctx: &SpawnContext) -> Distribution<String> {
        Distribution::from_entries(
            self.pool_distribution(ctx)
                .into_entries()
                .into_iter()
                .map(|(pool, percentage)| (pool.name.clone(), percentage))
                .collect(),
        )
    }

    /// Raw weights of the eligible inhabitants after every active modifier
    /// has been applied, pool-scoped first, then global, each in declared order.
    pub fn creature_distribution(&self, pool: &SpawnPool, ctx: &SpawnContext) -> Distribution<Species> {
        let mut weights = Distribution::new();
        for inhabitant in pool.inhabitants.iter().filter(|i| i.is_eligible(ctx)) {
            weights.set(inhabitant.species, inhabitant.weight);
        }
        if weights.is_empty() {
            return weights;
        }

        let active = pool
            .modifiers
            .iter()
            .chain(self.rules.global_modifiers())
            .filter(|modifier| modifier.is_active(ctx));
        for modifier in active {
            for effect in &modifier.effects {
                match *effect {
                    ModifierEffect::BoostType { kind, multiplier }
                    | ModifierEffect::SuppressType { kind, multiplier } => {
                        weights.scale_where(|species| species.has_type(kind), multiplier);
                    }
                    ModifierEffect::AddCreature { species, weight } => {
                        weights.set(species, weight);
                    }
                }
            }
        }
        weights
    }

    /// Per-creature percentages for the named pool, summing to 100, or empty
    /// when the pool is unknown or nothing in it can be drawn right now.
    pub fn creature_probabilities(&self, pool_name: &str, ctx: &SpawnContext) -> Distribution<Species> {
        match self.rules.pool(pool_name) {
            Some(pool) => self.creature_distribution(pool, ctx).normalized(),
            None => Distribution::new(),
        }
    }

    pub fn select_random_pool<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        ctx: &SpawnContext,
    ) -> Result<Option<Arc<SpawnPool>>, SpawnError> {
        let pools = self.pool_distribution(ctx);
        pools
            .pick(rng)
            .map(|picked| picked.cloned())
            .map_err(|walk| SpawnError::exhausted(SelectionStage::Pool, walk))
    }

    pub fn select_random_creature<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        pool: &SpawnPool,
        ctx: &SpawnContext,
    ) -> Result<Option<Species>, SpawnError> {
        let creatures = self.creature_distribution(pool, ctx).normalized();
        creatures
            .pick(rng)
            .map(|picked| picked.copied())
            .map_err(|walk| SpawnError::exhausted(SelectionStage::Creature, walk))
    }

    /// Draws a pool, then a creature within it. `Ok(None)` means nothing is
    /// eligible at this moment.
    pub fn spawn<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        ctx: &SpawnContext,
        screen_off_minutes: u32,
        now_ms: i64,
    ) -> Result<Option<SpawnResult>, SpawnError> {
        let Some(pool) = self.select_random_pool(rng, ctx)? else {
            debug!(target: "glyphdex::engine", "spawn.empty=pools");
            return Ok(None);
        };
        let Some(species) = self.select_random_creature(rng, &pool, ctx)? else {
            debug!(
                target: "glyphdex::engine",
                pool = %pool.name,
                "spawn.empty=creatures"
            );
            return Ok(None);
        };
        trace!(
            target: "glyphdex::engine",
            pool = %pool.name,
            species = species.name,
            "spawn.drawn"
        );
        Ok(Some(SpawnResult {
            species,
            pool,
            screen_off_minutes,
            spawned_at_ms: now_ms,
        }))
    }
}
