use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::NaiveTime;
use serde::Deserialize;
use thiserror::Error;

use crate::environment::SleepWindow;

pub const BUILTIN_CADENCE_CONFIG: &str = include_str!("data/cadence_config.json");
pub const CADENCE_CONFIG_ENV: &str = "GLYPH_CADENCE_CONFIG_PATH";

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ChanceRule {
    pub min_minutes_off: u32,
    pub chance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RerollRule {
    pub min_wait_hours: u32,
    pub rerolls: u32,
}

impl RerollRule {
    pub fn min_wait_ms(&self) -> i64 {
        i64::from(self.min_wait_hours) * MILLIS_PER_HOUR
    }
}

/// Tuning for the per-tick spawn decision and reroll bias.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    first_catch_chance: f64,
    sleep_chance_cap: f64,
    chance_rules: Vec<ChanceRule>,
    reroll_rules: Vec<RerollRule>,
    queue_capacity: usize,
    weather_ttl_minutes: u32,
    default_bedtime: NaiveTime,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            first_catch_chance: 0.2,
            sleep_chance_cap: 0.005,
            chance_rules: vec![
                ChanceRule {
                    min_minutes_off: 15,
                    chance: 0.01,
                },
                ChanceRule {
                    min_minutes_off: 30,
                    chance: 0.02,
                },
                ChanceRule {
                    min_minutes_off: 60,
                    chance: 0.03,
                },
            ],
            reroll_rules: vec![
                RerollRule {
                    min_wait_hours: 16,
                    rerolls: 1,
                },
                RerollRule {
                    min_wait_hours: 32,
                    rerolls: 2,
                },
                RerollRule {
                    min_wait_hours: 48,
                    rerolls: 50,
                },
            ],
            queue_capacity: 10,
            weather_ttl_minutes: 60,
            default_bedtime: SleepWindow::default().bedtime,
        }
    }
}

impl CadenceConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            Self::from_json_str(BUILTIN_CADENCE_CONFIG)
                .expect("builtin cadence config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, CadenceConfigError> {
        let config: CadenceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, CadenceConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|source| CadenceConfigError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json_str(&contents)
    }

    fn validate(&self) -> Result<(), CadenceConfigError> {
        let chances = self
            .chance_rules
            .iter()
            .map(|rule| rule.chance)
            .chain([self.first_catch_chance, self.sleep_chance_cap]);
        for chance in chances {
            if !(0.0..=1.0).contains(&chance) {
                return Err(CadenceConfigError::ChanceOutOfRange(chance));
            }
        }
        if self
            .chance_rules
            .windows(2)
            .any(|pair| pair[0].min_minutes_off >= pair[1].min_minutes_off)
        {
            return Err(CadenceConfigError::Unsorted("chance_rules"));
        }
        if self
            .reroll_rules
            .windows(2)
            .any(|pair| pair[0].min_wait_hours >= pair[1].min_wait_hours)
        {
            return Err(CadenceConfigError::Unsorted("reroll_rules"));
        }
        if self.queue_capacity == 0 {
            return Err(CadenceConfigError::EmptyQueue);
        }
        Ok(())
    }

    pub fn first_catch_chance(&self) -> f64 {
        self.first_catch_chance
    }

    pub fn sleep_chance_cap(&self) -> f64 {
        self.sleep_chance_cap
    }

    pub fn chance_rules(&self) -> &[ChanceRule] {
        &self.chance_rules
    }

    pub fn reroll_rules(&self) -> &[RerollRule] {
        &self.reroll_rules
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn weather_ttl_minutes(&self) -> u32 {
        self.weather_ttl_minutes
    }

    pub fn default_sleep_window(&self) -> SleepWindow {
        SleepWindow::new(self.default_bedtime)
    }

    /// Chance of the highest threshold not exceeding `minutes_off`, or zero.
    pub fn chance_after(&self, minutes_off: u32) -> f64 {
        self.chance_rules
            .iter()
            .rev()
            .find(|rule| rule.min_minutes_off <= minutes_off)
            .map_or(0.0, |rule| rule.chance)
    }

    /// Reroll budget of the highest wait threshold met, if any.
    pub fn rerolls_after(&self, waited_ms: i64) -> Option<u32> {
        self.reroll_rules
            .iter()
            .rev()
            .find(|rule| rule.min_wait_ms() <= waited_ms)
            .map(|rule| rule.rerolls)
    }
}

#[derive(Debug, Error)]
pub enum CadenceConfigError {
    #[error("failed to parse cadence config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read cadence config from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("chance {0} is outside [0, 1]")]
    ChanceOutOfRange(f64),
    #[error("{0} thresholds must be strictly ascending")]
    Unsorted(&'static str),
    #[error("queue capacity must be positive")]
    EmptyQueue,
}

#[derive(Debug, Clone, Default)]
pub struct CadenceConfigMetadata {
    path: Option<PathBuf>,
}

impl CadenceConfigMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

/// Loads the file named by `GLYPH_CADENCE_CONFIG_PATH`, falling back to the
/// builtin copy when the variable is unset or the file is unusable.
pub fn load_cadence_config_from_env() -> (Arc<CadenceConfig>, CadenceConfigMetadata) {
    if let Some(path) = env::var(CADENCE_CONFIG_ENV).ok().map(PathBuf::from) {
        match CadenceConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "glyphdex::config",
                    path = %path.display(),
                    "cadence_config.loaded=file"
                );
                return (Arc::new(config), CadenceConfigMetadata::new(Some(path)));
            }
            Err(err) => {
                tracing::warn!(
                    target: "glyphdex::config",
                    path = %path.display(),
                    error = %err,
                    "cadence_config.load_failed"
                );
            }
        }
    }

    let config = CadenceConfig::builtin();
    tracing::info!(
        target: "glyphdex::config",
        "cadence_config.loaded=builtin"
    );
    (config, CadenceConfigMetadata::new(None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_matches_defaults() {
        let builtin = CadenceConfig::builtin();
        let defaults = CadenceConfig::default();
        assert_eq!(builtin.chance_rules(), defaults.chance_rules());
        assert_eq!(builtin.reroll_rules(), defaults.reroll_rules());
        assert_eq!(builtin.first_catch_chance(), 0.2);
        assert_eq!(builtin.sleep_chance_cap(), 0.005);
        assert_eq!(builtin.queue_capacity(), 10);
        assert_eq!(builtin.default_sleep_window(), SleepWindow::default());
    }

    #[test]
    fn chance_picks_highest_met_threshold() {
        let config = CadenceConfig::default();
        assert_eq!(config.chance_after(14), 0.0);
        assert_eq!(config.chance_after(15), 0.01);
        assert_eq!(config.chance_after(59), 0.02);
        assert_eq!(config.chance_after(600), 0.03);
    }

    #[test]
    fn rerolls_pick_highest_met_threshold() {
        let config = CadenceConfig::default();
        let hour = MILLIS_PER_HOUR;
        assert_eq!(config.rerolls_after(15 * hour), None);
        assert_eq!(config.rerolls_after(16 * hour), Some(1));
        assert_eq!(config.rerolls_after(40 * hour), Some(2));
        assert_eq!(config.rerolls_after(48 * hour), Some(50));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = CadenceConfig::from_json_str(r#"{ "queue_capacity": 3 }"#).unwrap();
        assert_eq!(config.queue_capacity(), 3);
        assert_eq!(config.chance_rules().len(), 3);
    }

    #[test]
    fn rejects_malformed_tables() {
        let unsorted = r#"{ "chance_rules": [
            { "min_minutes_off": 30, "chance": 0.02 },
            { "min_minutes_off": 15, "chance": 0.01 }
        ] }"#;
        assert!(matches!(
            CadenceConfig::from_json_str(unsorted),
            Err(CadenceConfigError::Unsorted("chance_rules"))
        ));
        assert!(matches!(
            CadenceConfig::from_json_str(r#"{ "first_catch_chance": 1.5 }"#),
            Err(CadenceConfigError::ChanceOutOfRange(_))
        ));
        assert!(matches!(
            CadenceConfig::from_json_str(r#"{ "queue_capacity": 0 }"#),
            Err(CadenceConfigError::EmptyQueue)
        ));
        assert!(matches!(
            CadenceConfig::from_json_str("{"),
            Err(CadenceConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = CadenceConfig::from_file(Path::new("/nonexistent/cadence.json")).unwrap_err();
        assert!(matches!(err, CadenceConfigError::ReadFailed { .. }));
    }
}
