//! Fluent builder for declaring a [`SpawnRules`] table.
//!
//! Calls accumulate in declaration order, which is observable: activators
//! resolve first-match-wins and modifier effects apply in the order written.
//!
//! ```
//! use spawn_core::{
//!     context::Condition, environment::Weather, rules::SpawnRulesBuilder,
//!     species::{catalog, CreatureType},
//! };
//!
//! let rules = SpawnRulesBuilder::new()
//!     .pool("common", 100.0, |pool| {
//!         pool.creature(catalog::PIDGEY, 3.0);
//!         pool.creature(catalog::PSYDUCK, 1.0)
//!             .during(Condition::weather(Weather::Rain));
//!     })
//!     .conditional_pool("storm", |pool| {
//!         pool.creature(catalog::PIKACHU, 1.0);
//!         pool.activate(15.0).during(Condition::weather(Weather::Thunderstorm));
//!     })
//!     .modifiers(|m| {
//!         m.during(Condition::weather(Weather::Rain), |e| {
//!             e.boost(CreatureType::Water, 2.0);
//!         });
//!     })
//!     .build()
//!     .expect("valid rule table");
//! assert_eq!(rules.pools().len(), 2);
//! ```

use crate::{
    context::{Condition, SpawnContext},
    pool::{
        Modifier, ModifierEffect, PoolActivator, PoolInhabitant, RuleError, SpawnPool, SpawnRules,
    },
    probability::{PercentModifier, ProbabilityRule},
    species::{CreatureType, Species},
};

fn attach(slot: &mut Option<Condition>, condition: Condition) {
    *slot = Some(match slot.take() {
        Some(existing) => existing.and(condition),
        None => condition,
    });
}

#[derive(Debug, Default)]
pub struct SpawnRulesBuilder {
    pools: Vec<SpawnPool>,
    global_modifiers: Vec<Modifier>,
    error: Option<RuleError>,
}

impl SpawnRulesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Static pool with a fixed share.
    pub fn pool(self, name: &str, percentage: f64, body: impl FnOnce(&mut PoolBuilder)) -> Self {
        self.declare(SpawnPool::new(name, percentage), body)
    }

    /// Pool that only turns on through its activators.
    pub fn conditional_pool(self, name: &str, body: impl FnOnce(&mut PoolBuilder)) -> Self {
        let mut pool = SpawnPool::new(name, 0.0);
        pool.conditional = true;
        self.declare(pool, body)
    }

    /// Pool whose base share is transformed at draw time.
    pub fn dynamic_pool(
        self,
        name: &str,
        rule: ProbabilityRule,
        body: impl FnOnce(&mut PoolBuilder),
    ) -> Self {
        let mut pool = SpawnPool::new(name, rule.percentage);
        pool.base_modifier = rule.modifier;
        self.declare(pool, body)
    }

    /// Single-creature event pool named after the species.
    pub fn special(self, species: Species, body: impl FnOnce(&mut PoolBuilder)) -> Self {
        let mut pool = SpawnPool::new(species.name.to_lowercase(), 0.0);
        pool.special = true;
        pool.conditional = true;
        pool.inhabitants.push(PoolInhabitant::new(species, 1.0));
        self.declare(pool, body)
    }

    /// Modifiers applied to every pool.
    pub fn modifiers(mut self, body: impl FnOnce(&mut ModifierBuilder)) -> Self {
        let mut builder = ModifierBuilder::default();
        body(&mut builder);
        self.global_modifiers.extend(builder.modifiers);
        self
    }

    pub fn build(self) -> Result<SpawnRules, RuleError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        SpawnRules::new(self.pools, self.global_modifiers)
    }

    fn declare(mut self, pool: SpawnPool, body: impl FnOnce(&mut PoolBuilder)) -> Self {
        let mut builder = PoolBuilder {
            pool,
            activators: Vec::new(),
        };
        body(&mut builder);
        match builder.finish() {
            Ok(pool) => self.pools.push(pool),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }
}

#[derive(Debug)]
struct PendingActivator {
    percentage: f64,
    condition: Option<Condition>,
    modifier: Option<PercentModifier>,
}

#[derive(Debug)]
pub struct PoolBuilder {
    pool: SpawnPool,
    activators: Vec<PendingActivator>,
}

impl PoolBuilder {
    pub fn creature(&mut self, species: Species, weight: f64) -> InhabitantHandle<'_> {
        self.pool.inhabitants.push(PoolInhabitant::new(species, weight));
        let index = self.pool.inhabitants.len() - 1;
        InhabitantHandle {
            inhabitant: &mut self.pool.inhabitants[index],
        }
    }

    /// Declares one activator; several are resolved first-match-wins.
    pub fn activate(&mut self, percentage: f64) -> ActivatorHandle<'_> {
        self.activators.push(PendingActivator {
            percentage,
            condition: None,
            modifier: None,
        });
        let index = self.activators.len() - 1;
        ActivatorHandle {
            activator: &mut self.activators[index],
        }
    }

    pub fn modifiers(&mut self, body: impl FnOnce(&mut ModifierBuilder)) {
        let mut builder = ModifierBuilder::default();
        body(&mut builder);
        self.pool.modifiers.extend(builder.modifiers);
    }

    fn finish(mut self) -> Result<SpawnPool, RuleError> {
        for (index, pending) in self.activators.into_iter().enumerate() {
            let Some(condition) = pending.condition else {
                return Err(RuleError::ActivatorWithoutCondition {
                    pool: self.pool.name,
                    index,
                });
            };
            self.pool.activators.push(PoolActivator {
                percentage: pending.percentage,
                condition,
                modifier: pending.modifier,
            });
        }
        Ok(self.pool)
    }
}

/// The most recently declared inhabitant. Conditions chain with AND.
pub struct InhabitantHandle<'a> {
    inhabitant: &'a mut PoolInhabitant,
}

impl InhabitantHandle<'_> {
    pub fn given<F>(self, predicate: F) -> Self
    where
        F: Fn(&SpawnContext) -> bool + Send + Sync + 'static,
    {
        self.during(Condition::from_fn(predicate))
    }

    pub fn during(self, condition: Condition) -> Self {
        attach(&mut self.inhabitant.condition, condition);
        self
    }
}

pub struct ActivatorHandle<'a> {
    activator: &'a mut PendingActivator,
}

impl ActivatorHandle<'_> {
    pub fn given<F>(self, predicate: F) -> Self
    where
        F: Fn(&SpawnContext) -> bool + Send + Sync + 'static,
    {
        self.during(Condition::from_fn(predicate))
    }

    pub fn during(self, condition: Condition) -> Self {
        attach(&mut self.activator.condition, condition);
        self
    }

    pub fn scaled_by(self, modifier: PercentModifier) -> Self {
        self.activator.modifier = Some(modifier);
        self
    }
}

#[derive(Debug, Default)]
pub struct ModifierBuilder {
    modifiers: Vec<Modifier>,
}

impl ModifierBuilder {
    pub fn during(
        &mut self,
        condition: Condition,
        body: impl FnOnce(&mut EffectsBuilder),
    ) -> &mut Self {
        let mut effects = EffectsBuilder::default();
        body(&mut effects);
        self.modifiers.push(Modifier {
            condition,
            effects: effects.effects,
        });
        self
    }

    pub fn given<F>(&mut self, predicate: F, body: impl FnOnce(&mut EffectsBuilder)) -> &mut Self
    where
        F: Fn(&SpawnContext) -> bool + Send + Sync + 'static,
    {
        self.during(Condition::from_fn(predicate), body)
    }
}

#[derive(Debug, Default)]
pub struct EffectsBuilder {
    effects: Vec<ModifierEffect>,
}

impl EffectsBuilder {
    pub fn boost(&mut self, kind: CreatureType, multiplier: f64) -> &mut Self {
        self.effects
            .push(ModifierEffect::BoostType { kind, multiplier });
        self
    }

    pub fn suppress(&mut self, kind: CreatureType, multiplier: f64) -> &mut Self {
        self.effects
            .push(ModifierEffect::SuppressType { kind, multiplier });
        self
    }

    pub fn add(&mut self, species: Species, weight: f64) -> &mut Self {
        self.effects
            .push(ModifierEffect::AddCreature { species, weight });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::SpawnEngine, environment::Weather, species::catalog, test_support::context_at,
    };
    use std::sync::Arc;

    #[test]
    fn chained_conditions_are_conjunctive() {
        let rules = SpawnRulesBuilder::new()
            .pool("common", 100.0, |pool| {
                pool.creature(catalog::PIDGEY, 1.0);
                pool.creature(catalog::PSYDUCK, 1.0)
                    .during(Condition::day())
                    .given(|ctx| ctx.environment.weather == Weather::Rain);
            })
            .build()
            .unwrap();
        let engine = SpawnEngine::new(Arc::new(rules));

        let mut ctx = context_at(0);
        let dry = engine.creature_probabilities("common", &ctx);
        assert_eq!(dry.get(&catalog::PSYDUCK), None);

        ctx.environment.weather = Weather::Rain;
        let wet = engine.creature_probabilities("common", &ctx);
        assert_eq!(wet.get(&catalog::PSYDUCK), Some(50.0));
    }

    #[test]
    fn activators_resolve_in_declared_order() {
        let rules = SpawnRulesBuilder::new()
            .pool("common", 100.0, |pool| {
                pool.creature(catalog::PIDGEY, 1.0);
            })
            .conditional_pool("event", |pool| {
                pool.creature(catalog::EEVEE, 1.0);
                pool.activate(10.0).during(Condition::always());
                pool.activate(30.0).during(Condition::always());
            })
            .build()
            .unwrap();
        let event = rules.pool("event").unwrap();
        assert_eq!(event.desired_percentage(&context_at(0)), 10.0);
        assert!(event.conditional);
    }

    #[test]
    fn activator_needs_a_condition() {
        let err = SpawnRulesBuilder::new()
            .pool("common", 100.0, |pool| {
                pool.creature(catalog::PIDGEY, 1.0);
            })
            .conditional_pool("event", |pool| {
                pool.activate(10.0).during(Condition::always());
                pool.activate(20.0);
            })
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RuleError::ActivatorWithoutCondition {
                pool: "event".to_string(),
                index: 1,
            }
        );
    }

    #[test]
    fn static_shares_must_total_100() {
        let err = SpawnRulesBuilder::new()
            .pool("common", 60.0, |_| {})
            .dynamic_pool("rare", ProbabilityRule::increasing_over_minutes(10.0, 10.0, 60), |_| {})
            .build()
            .unwrap_err();
        assert!(matches!(err, RuleError::PercentagesDoNotSumTo100 { .. }));
        assert_eq!(err.to_string(), "static pool percentages sum to 70.00, expected 100");
    }

    #[test]
    fn special_pool_is_named_after_species() {
        let rules = SpawnRulesBuilder::new()
            .pool("common", 100.0, |pool| {
                pool.creature(catalog::PIDGEY, 1.0);
            })
            .special(catalog::MEW, |pool| {
                pool.activate(0.5).during(Condition::not_found(catalog::MEW));
            })
            .build()
            .unwrap();
        let mew = rules.pool("mew").unwrap();
        assert!(mew.special);
        assert!(!mew.is_reroll_eligible());
        assert_eq!(mew.inhabitants.len(), 1);
    }

    #[test]
    fn pool_modifiers_apply_before_global_ones() {
        let rules = SpawnRulesBuilder::new()
            .pool("common", 100.0, |pool| {
                pool.creature(catalog::PIDGEY, 1.0);
                pool.modifiers(|m| {
                    m.during(Condition::always(), |e| {
                        e.add(catalog::SQUIRTLE, 1.0);
                    });
                });
            })
            .modifiers(|m| {
                m.during(Condition::always(), |e| {
                    e.boost(CreatureType::Water, 3.0);
                });
            })
            .build()
            .unwrap();
        let engine = SpawnEngine::new(Arc::new(rules));
        let odds = engine.creature_probabilities("common", &context_at(0));
        assert_eq!(odds.get(&catalog::SQUIRTLE), Some(75.0));
    }
}
