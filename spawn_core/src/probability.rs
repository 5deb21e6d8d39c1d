use std::{fmt, sync::Arc};

use crate::context::SpawnContext;

type CustomModifier = dyn Fn(f64, &SpawnContext) -> f64 + Send + Sync;

/// Monotonic transform applied to a pool percentage at draw time.
#[derive(Clone)]
pub enum PercentModifier {
    /// Adds up to `max_increase` points, linearly over `over_minutes` of
    /// effective screen-off time, then holds.
    IncreaseOverMinutes { max_increase: f64, over_minutes: u32 },
    /// Adds `per_entry` points per registered Pokédex entry, up to `cap`.
    IncreasePerDexEntry { per_entry: f64, cap: f64 },
    Custom(Arc<CustomModifier>),
}

impl fmt::Debug for PercentModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PercentModifier::IncreaseOverMinutes {
                max_increase,
                over_minutes,
            } => f
                .debug_struct("IncreaseOverMinutes")
                .field("max_increase", max_increase)
                .field("over_minutes", over_minutes)
                .finish(),
            PercentModifier::IncreasePerDexEntry { per_entry, cap } => f
                .debug_struct("IncreasePerDexEntry")
                .field("per_entry", per_entry)
                .field("cap", cap)
                .finish(),
            PercentModifier::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PercentModifier {
    pub fn custom<F>(transform: F) -> Self
    where
        F: Fn(f64, &SpawnContext) -> f64 + Send + Sync + 'static,
    {
        PercentModifier::Custom(Arc::new(transform))
    }

    pub fn apply(&self, percentage: f64, ctx: &SpawnContext) -> f64 {
        let value = match self {
            PercentModifier::IncreaseOverMinutes {
                max_increase,
                over_minutes,
            } => {
                if *over_minutes == 0 {
                    percentage + max_increase
                } else {
                    let progress = (f64::from(ctx.effective_screen_off_minutes)
                        / f64::from(*over_minutes))
                    .min(1.0);
                    percentage + max_increase * progress
                }
            }
            PercentModifier::IncreasePerDexEntry { per_entry, cap } => {
                percentage + (per_entry * f64::from(ctx.progress.dex_count)).min(*cap)
            }
            PercentModifier::Custom(transform) => transform(percentage, ctx),
        };
        value.max(0.0)
    }
}

/// A base percentage with an optional modifier.
#[derive(Debug, Clone)]
pub struct ProbabilityRule {
    pub percentage: f64,
    pub modifier: Option<PercentModifier>,
}

impl ProbabilityRule {
    pub fn fixed(percentage: f64) -> Self {
        Self {
            percentage,
            modifier: None,
        }
    }

    pub fn increasing_over_minutes(percentage: f64, max_increase: f64, over_minutes: u32) -> Self {
        Self::fixed(percentage).with_modifier(PercentModifier::IncreaseOverMinutes {
            max_increase,
            over_minutes,
        })
    }

    pub fn with_modifier(mut self, modifier: PercentModifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    pub fn resolve(&self, ctx: &SpawnContext) -> f64 {
        match &self.modifier {
            Some(modifier) => modifier.apply(self.percentage, ctx),
            None => self.percentage.max(0.0),
        }
    }
}
