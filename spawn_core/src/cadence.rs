//! Per-tick spawn decision and the reroll bias toward overdue pools.

use std::{cmp::Ordering, sync::Arc};

use rand::{rngs::SmallRng, Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::{
    config::CadenceConfig,
    context::SpawnContext,
    engine::{SpawnEngine, SpawnError},
    history::{CatchRecord, SpawnHistory},
    pool::SpawnResult,
    queue::SpawnQueue,
};

/// The overdue pool a spawn should be steered toward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerollTarget {
    pub pool: String,
    pub rerolls: u32,
    pub waited_ms: i64,
}

pub struct CadenceController<R: Rng = SmallRng> {
    engine: SpawnEngine,
    config: Arc<CadenceConfig>,
    history: Arc<SpawnHistory>,
    rng: R,
}

impl CadenceController<SmallRng> {
    pub fn from_entropy(
        engine: SpawnEngine,
        config: Arc<CadenceConfig>,
        history: Arc<SpawnHistory>,
    ) -> Self {
        Self::new(engine, config, history, SmallRng::from_entropy())
    }
}

impl<R: Rng> CadenceController<R> {
    pub fn new(
        engine: SpawnEngine,
        config: Arc<CadenceConfig>,
        history: Arc<SpawnHistory>,
        rng: R,
    ) -> Self {
        Self {
            engine,
            config,
            history,
            rng,
        }
    }

    pub fn engine(&self) -> &SpawnEngine {
        &self.engine
    }

    pub fn config(&self) -> &CadenceConfig {
        &self.config
    }

    pub fn history(&self) -> &Arc<SpawnHistory> {
        &self.history
    }

    /// Screen-off time not yet spent by the previous spawn.
    pub fn effective_screen_off_minutes(&self, screen_off_minutes: u32) -> u32 {
        screen_off_minutes.saturating_sub(self.history.last_spawn_screen_off_minutes())
    }

    pub fn chance_for(&self, ctx: &SpawnContext, effective_minutes: u32) -> f64 {
        let progress = &ctx.progress;
        let chance = if progress.dex_count == 0 && progress.queue_is_empty() {
            self.config.first_catch_chance()
        } else {
            self.config.chance_after(effective_minutes)
        };
        if ctx.environment.sleep.in_window {
            chance.min(self.config.sleep_chance_cap())
        } else {
            chance
        }
    }

    /// Among reroll-eligible pools whose wait meets a threshold, the rarest
    /// one, ties going to the longest wait.
    pub fn reroll_target(&self, now_ms: i64) -> Option<RerollTarget> {
        self.engine
            .rules()
            .pools()
            .iter()
            .filter(|pool| pool.is_reroll_eligible())
            .filter_map(|pool| {
                let waited_ms = now_ms - self.history.best_known_spawn_time(&pool.name);
                self.config
                    .rerolls_after(waited_ms)
                    .map(|rerolls| (pool, rerolls, waited_ms))
            })
            .min_by(|a, b| {
                a.0.base_percentage
                    .partial_cmp(&b.0.base_percentage)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| b.2.cmp(&a.2))
            })
            .map(|(pool, rerolls, waited_ms)| RerollTarget {
                pool: pool.name.clone(),
                rerolls,
                waited_ms,
            })
    }

    /// One cadence tick. `Ok(None)` covers every "no spawn this minute"
    /// outcome; an error means the probability tables are inconsistent.
    pub fn maybe_spawn(
        &mut self,
        now_ms: i64,
        ctx: &SpawnContext,
    ) -> Result<Option<SpawnResult>, SpawnError> {
        if ctx.device.interactive {
            if self.history.last_spawn_screen_off_minutes() != 0 {
                self.history.reset_screen_off_baseline();
            }
            debug!(target: "glyphdex::cadence", "spawn.rejected=interactive");
            return Ok(None);
        }

        let screen_off_minutes = ctx.device.screen_off_minutes;
        let effective = self.effective_screen_off_minutes(screen_off_minutes);
        let chance = self.chance_for(ctx, effective);
        let draw = self.rng.gen::<f64>();
        if draw >= chance {
            debug!(
                target: "glyphdex::cadence",
                effective_minutes = effective,
                chance,
                draw,
                "spawn.rejected=chance"
            );
            return Ok(None);
        }

        let ctx = ctx.clone().with_effective_screen_off_minutes(effective);
        let spawned = self
            .engine
            .spawn(&mut self.rng, &ctx, screen_off_minutes, now_ms)?;
        let Some(mut result) = spawned else {
            debug!(target: "glyphdex::cadence", "spawn.rejected=empty");
            return Ok(None);
        };

        // Event, first-partner and special draws are never traded for a reroll.
        let mut rerolls_used = 0;
        let target = if result.pool.is_reroll_eligible() {
            self.reroll_target(now_ms)
        } else {
            None
        };
        if let Some(target) = target {
            while result.pool_name() != target.pool && rerolls_used < target.rerolls {
                rerolls_used += 1;
                match self
                    .engine
                    .spawn(&mut self.rng, &ctx, screen_off_minutes, now_ms)?
                {
                    Some(redraw) => result = redraw,
                    None => warn!(
                        target: "glyphdex::cadence",
                        pool = %target.pool,
                        "spawn.reroll_empty"
                    ),
                }
            }
        }

        let result = result.with_spawned_at(now_ms);
        self.history
            .record_spawn(result.pool_name(), screen_off_minutes, now_ms);
        info!(
            target: "glyphdex::cadence",
            pool = %result.pool_name(),
            species = result.species.name,
            effective_minutes = effective,
            rerolls_used,
            "spawn.created"
        );
        Ok(Some(result))
    }

    /// Removes the entry at `index` and records the catch.
    pub fn catch(
        &self,
        queue: &SpawnQueue,
        index: usize,
        now_ms: i64,
        screen_off_minutes: u32,
    ) -> Option<SpawnResult> {
        let caught = queue.take(index)?;
        self.history.record_catch(
            CatchRecord {
                species: caught.species.id,
                pool: caught.pool_name().to_string(),
                caught_at_ms: now_ms,
            },
            screen_off_minutes,
        );
        info!(
            target: "glyphdex::cadence",
            pool = %caught.pool_name(),
            species = caught.species.name,
            "spawn.caught"
        );
        Some(caught)
    }
}
