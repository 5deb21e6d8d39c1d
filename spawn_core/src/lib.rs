//! Spawn rules engine for the Glyphdex glyph-matrix overlay.
//!
//! Decides, once per screen-off minute, whether a creature appears and which
//! one: [`CadenceController::maybe_spawn`] gates the attempt, the
//! [`SpawnEngine`] draws a pool and then a creature from an immutable
//! [`SpawnRules`] table, and [`SpawnHistory`] persists what it needs to bias
//! later draws toward overdue pools.

pub mod cadence;
pub mod config;
pub mod context;
pub mod engine;
pub mod environment;
mod hashing;
pub mod history;
pub mod pool;
pub mod probability;
pub mod queue;
pub mod redistribute;
pub mod rule_table;
pub mod rules;
pub mod species;

#[cfg(test)]
mod test_support;

pub use cadence::{CadenceController, RerollTarget};
pub use config::{load_cadence_config_from_env, CadenceConfig, CadenceConfigError};
pub use context::{Condition, DeviceState, Item, PlayerProgress, SpawnContext};
pub use engine::{Distribution, SpawnEngine, SpawnError};
pub use environment::{
    DailySeedWeather, Environment, SleepTracker, SleepWindow, Weather, WeatherProvider,
    WeatherService,
};
pub use history::{
    CatchRecord, CatchRecordStore, JsonFilePreferences, MemoryCatchLog, MemoryPreferences,
    PreferenceStore, SpawnHistory, StoreError,
};
pub use pool::{RuleError, SpawnPool, SpawnResult, SpawnRules};
pub use queue::{PushOutcome, SpawnQueue};
pub use rule_table::default_rules;
pub use rules::SpawnRulesBuilder;
pub use species::{CreatureId, CreatureType, Species};
