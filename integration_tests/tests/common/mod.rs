#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use chrono::{NaiveDate, NaiveDateTime};
use spawn_core::{
    config::CADENCE_CONFIG_ENV, environment::SleepState, DeviceState, Distribution, Environment,
    PlayerProgress, SpawnContext, Weather,
};

static INIT: Once = Once::new();

pub const HOUR_MS: i64 = 60 * 60 * 1_000;

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("test_cadence_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test cadence config at {}",
            config_path.display()
        );

        std::env::set_var(CADENCE_CONFIG_ENV, &config_path);
    });
}

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("valid test date")
}

/// Builder over a clear Tuesday noon in May 2026, with ten species registered
/// and half an hour of screen-off time.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    local: NaiveDateTime,
    weather: Weather,
    sleep: SleepState,
    device: DeviceState,
    progress: PlayerProgress,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self {
            local: at(2026, 5, 12, 12, 0),
            weather: Weather::Clear,
            sleep: SleepState::default(),
            device: DeviceState {
                interactive: false,
                screen_off_minutes: 30,
                battery_percent: 80,
            },
            progress: PlayerProgress {
                dex_count: 10,
                ..Default::default()
            },
        }
    }
}

impl ContextBuilder {
    pub fn at(mut self, local: NaiveDateTime) -> Self {
        self.local = local;
        self
    }

    pub fn weather(mut self, weather: Weather) -> Self {
        self.weather = weather;
        self
    }

    pub fn screen_off(mut self, minutes: u32) -> Self {
        self.device.screen_off_minutes = minutes;
        self
    }

    pub fn battery(mut self, percent: u8) -> Self {
        self.device.battery_percent = percent;
        self
    }

    pub fn dex(mut self, count: u32) -> Self {
        self.progress.dex_count = count;
        self
    }

    pub fn in_sleep_window(mut self) -> Self {
        self.sleep.in_window = true;
        self
    }

    pub fn sleep_bonus(mut self) -> Self {
        self.sleep.bonus_active = true;
        self
    }

    pub fn progress(mut self, edit: impl FnOnce(&mut PlayerProgress)) -> Self {
        edit(&mut self.progress);
        self
    }

    pub fn build(self) -> SpawnContext {
        SpawnContext::new(
            self.device,
            self.progress,
            Environment::new(self.local, self.weather, self.sleep),
        )
    }
}

pub fn context() -> ContextBuilder {
    ContextBuilder::default()
}

/// One `name  percentage` row per entry, in table order.
pub fn render<K: std::fmt::Display>(table: &Distribution<K>) -> String {
    table
        .iter()
        .map(|(name, percentage)| format!("{:<12}{percentage:>7.2}", name.to_string()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("entry present");
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {expected:.2}, got {actual:.4}"
    );
}
