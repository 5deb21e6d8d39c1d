use std::{fmt, str::FromStr, sync::Arc};

use bitflags::bitflags;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use parking_lot::Mutex;
use rand::{rngs::SmallRng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    engine::Distribution,
    hashing::stable_seed,
    history::{PreferenceStore, BEDTIME_KEY, SLEEP_BONUS_EXPIRY_KEY},
};

pub const SYNODIC_MONTH_DAYS: f64 = 29.530588853;
/// 2000-01-06 18:14 UTC.
const REFERENCE_NEW_MOON_UNIX: i64 = 947_182_440;
/// Days either side of mid-cycle that still count as a full moon.
const FULL_MOON_HALF_WIDTH_DAYS: f64 = 1.0;
const NEW_MOON_HALF_WIDTH_DAYS: f64 = 1.0;

pub const SLEEP_WINDOW_HOURS: i64 = 8;
pub const SLEEP_BONUS_MIN_OFF_MINUTES: u32 = 360;
pub const SLEEP_BONUS_CLAIM_MINUTES: i64 = 90;
pub const SLEEP_BONUS_DURATION_HOURS: i64 = 12;

const NIGHT_STARTS_HOUR: u32 = 20;
const NIGHT_ENDS_HOUR: u32 = 6;
const MILLIS_PER_MINUTE: i64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    Thunderstorm,
    Snow,
}

impl Weather {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weather::Clear => "clear",
            Weather::Rain => "rain",
            Weather::Thunderstorm => "thunderstorm",
            Weather::Snow => "snow",
        }
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weather {
    type Err = WeatherError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "clear" | "sunny" => Ok(Weather::Clear),
            "rain" | "rainy" => Ok(Weather::Rain),
            "thunderstorm" | "storm" => Ok(Weather::Thunderstorm),
            "snow" | "snowy" => Ok(Weather::Snow),
            other => Err(WeatherError::Unrecognized(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather provider {provider} unavailable: {reason}")]
    Unavailable {
        provider: &'static str,
        reason: String,
    },
    #[error("unrecognized weather condition '{0}'")]
    Unrecognized(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// Meteorological seasons, northern hemisphere.
    pub fn of_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Holiday {
    NewYear,
    Valentines,
    Halloween,
    Christmas,
}

impl Holiday {
    pub fn on(date: NaiveDate) -> Option<Self> {
        match (date.month(), date.day()) {
            (1, 1) => Some(Holiday::NewYear),
            (2, 14) => Some(Holiday::Valentines),
            (10, 24..=31) => Some(Holiday::Halloween),
            (12, 24..=26) => Some(Holiday::Christmas),
            _ => None,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CalendarFlags: u8 {
        const NIGHT = 1 << 0;
        const FULL_MOON = 1 << 1;
        const NEW_MOON = 1 << 2;
        const WEEKEND = 1 << 3;
    }
}

/// Calendar-derived facts for one local instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calendar {
    pub season: Season,
    pub holiday: Option<Holiday>,
    pub flags: CalendarFlags,
    pub moon_age_days: f64,
}

impl Calendar {
    pub fn at(local: NaiveDateTime) -> Self {
        let hour = local.hour();
        let moon_age_days = moon_age_days(local);
        let mut flags = CalendarFlags::empty();
        if !(NIGHT_ENDS_HOUR..NIGHT_STARTS_HOUR).contains(&hour) {
            flags |= CalendarFlags::NIGHT;
        }
        if (moon_age_days - SYNODIC_MONTH_DAYS / 2.0).abs() <= FULL_MOON_HALF_WIDTH_DAYS {
            flags |= CalendarFlags::FULL_MOON;
        }
        if moon_age_days <= NEW_MOON_HALF_WIDTH_DAYS
            || moon_age_days >= SYNODIC_MONTH_DAYS - NEW_MOON_HALF_WIDTH_DAYS
        {
            flags |= CalendarFlags::NEW_MOON;
        }
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            flags |= CalendarFlags::WEEKEND;
        }

        Self {
            season: Season::of_month(local.month()),
            holiday: Holiday::on(local.date()),
            flags,
            moon_age_days,
        }
    }

    pub fn is_night(&self) -> bool {
        self.flags.contains(CalendarFlags::NIGHT)
    }

    pub fn is_full_moon(&self) -> bool {
        self.flags.contains(CalendarFlags::FULL_MOON)
    }

    pub fn is_new_moon(&self) -> bool {
        self.flags.contains(CalendarFlags::NEW_MOON)
    }

    pub fn is_weekend(&self) -> bool {
        self.flags.contains(CalendarFlags::WEEKEND)
    }
}

/// Days since the most recent new moon, in `[0, SYNODIC_MONTH_DAYS)`.
///
/// Anchored on the new moon of 2000-01-06 18:14 UTC; local time is treated as
/// UTC, which shifts the phase by at most half a day.
pub fn moon_age_days(local: NaiveDateTime) -> f64 {
    let elapsed_days = (local.and_utc().timestamp() - REFERENCE_NEW_MOON_UNIX) as f64 / 86_400.0;
    elapsed_days.rem_euclid(SYNODIC_MONTH_DAYS)
}

/// Nightly sleep window: `bedtime` plus a fixed eight hours, wrapping midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepWindow {
    pub bedtime: NaiveTime,
}

impl Default for SleepWindow {
    fn default() -> Self {
        Self {
            bedtime: NaiveTime::from_hms_opt(23, 0, 0).expect("23:00 is a valid time"),
        }
    }
}

impl SleepWindow {
    pub fn new(bedtime: NaiveTime) -> Self {
        Self { bedtime }
    }

    /// Bedtime stored as minutes after midnight; absent or unreadable values
    /// fall back to `fallback`.
    pub fn load(prefs: &dyn PreferenceStore, fallback: SleepWindow) -> Self {
        match prefs.get_i64(BEDTIME_KEY) {
            Ok(Some(minutes)) => {
                let minutes = minutes.rem_euclid(24 * 60) as u32;
                NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
                    .map(Self::new)
                    .unwrap_or(fallback)
            }
            Ok(None) => fallback,
            Err(err) => {
                warn!(
                    target: "glyphdex::environment",
                    error = %err,
                    "sleep_window.load_failed"
                );
                fallback
            }
        }
    }

    pub fn store(&self, prefs: &dyn PreferenceStore) {
        let minutes = i64::from(self.bedtime.hour() * 60 + self.bedtime.minute());
        if let Err(err) = prefs.set_i64(BEDTIME_KEY, minutes) {
            warn!(
                target: "glyphdex::environment",
                error = %err,
                "sleep_window.store_failed"
            );
        }
    }

    pub fn wake_time(&self) -> NaiveTime {
        self.bedtime
            .overflowing_add_signed(Duration::hours(SLEEP_WINDOW_HOURS))
            .0
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        let start = self.bedtime;
        let end = self.wake_time();
        if start < end {
            time >= start && time < end
        } else {
            time >= start || time < end
        }
    }

    /// The most recent wake-up instant at or before `local`.
    pub fn last_wake_before(&self, local: NaiveDateTime) -> NaiveDateTime {
        let candidate = local.date().and_time(self.wake_time());
        if candidate > local {
            candidate - Duration::days(1)
        } else {
            candidate
        }
    }

    /// A bonus is earned shortly after waking if the screen stayed off for
    /// most of the window.
    pub fn earns_bonus(&self, local: NaiveDateTime, screen_off_minutes: u32) -> bool {
        if self.contains(local.time()) {
            return false;
        }
        let since_wake = (local - self.last_wake_before(local)).num_minutes();
        since_wake <= SLEEP_BONUS_CLAIM_MINUTES && screen_off_minutes >= SLEEP_BONUS_MIN_OFF_MINUTES
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SleepState {
    pub in_window: bool,
    pub bonus_active: bool,
}

/// Tracks the sleep window and the persisted sleep-bonus expiry.
pub struct SleepTracker {
    window: SleepWindow,
    prefs: Arc<dyn PreferenceStore>,
}

impl SleepTracker {
    pub fn new(window: SleepWindow, prefs: Arc<dyn PreferenceStore>) -> Self {
        Self { window, prefs }
    }

    pub fn window(&self) -> SleepWindow {
        self.window
    }

    pub fn set_window(&mut self, window: SleepWindow) {
        window.store(self.prefs.as_ref());
        self.window = window;
    }

    pub fn observe(&self, local: NaiveDateTime, now_ms: i64, screen_off_minutes: u32) -> SleepState {
        let mut expiry = match self.prefs.get_i64(SLEEP_BONUS_EXPIRY_KEY) {
            Ok(value) => value.unwrap_or(0),
            Err(err) => {
                warn!(
                    target: "glyphdex::environment",
                    error = %err,
                    "sleep_bonus.read_failed"
                );
                0
            }
        };

        if expiry <= now_ms && self.window.earns_bonus(local, screen_off_minutes) {
            expiry = now_ms + SLEEP_BONUS_DURATION_HOURS * 60 * MILLIS_PER_MINUTE;
            match self.prefs.set_i64(SLEEP_BONUS_EXPIRY_KEY, expiry) {
                Ok(()) => debug!(
                    target: "glyphdex::environment",
                    expiry,
                    "sleep_bonus.granted"
                ),
                Err(err) => warn!(
                    target: "glyphdex::environment",
                    error = %err,
                    "sleep_bonus.write_failed"
                ),
            }
        }

        SleepState {
            in_window: self.window.contains(local.time()),
            bonus_active: expiry > now_ms,
        }
    }
}

/// Source of the current weather. Implementations may hit the network; the
/// [`WeatherService`] in front of them caches and absorbs failures.
pub trait WeatherProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn fetch(&self, date: NaiveDate) -> Result<Weather, WeatherError>;
}

/// Offline provider: one deterministic roll per calendar day, weighted by season.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailySeedWeather {
    pub salt: u64,
}

impl DailySeedWeather {
    pub fn new(salt: u64) -> Self {
        Self { salt }
    }

    fn weights(season: Season) -> Distribution<Weather> {
        let (clear, rain, storm, snow) = match season {
            Season::Spring => (50.0, 35.0, 15.0, 0.0),
            Season::Summer => (60.0, 20.0, 20.0, 0.0),
            Season::Autumn => (50.0, 40.0, 10.0, 0.0),
            Season::Winter => (45.0, 15.0, 5.0, 35.0),
        };
        Distribution::from_entries(vec![
            (Weather::Clear, clear),
            (Weather::Rain, rain),
            (Weather::Thunderstorm, storm),
            (Weather::Snow, snow),
        ])
    }
}

impl WeatherProvider for DailySeedWeather {
    fn name(&self) -> &'static str {
        "daily_seed"
    }

    fn fetch(&self, date: NaiveDate) -> Result<Weather, WeatherError> {
        let seed = stable_seed(&date.format("%Y-%m-%d").to_string(), self.salt);
        let mut rng = SmallRng::seed_from_u64(seed);
        let weights = Self::weights(Season::of_month(date.month()));
        match weights.pick(&mut rng) {
            Ok(Some(weather)) => Ok(*weather),
            Ok(None) | Err(_) => Err(WeatherError::Unavailable {
                provider: self.name(),
                reason: "empty seasonal weight table".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CachedWeather {
    weather: Weather,
    date: NaiveDate,
    fetched_at_ms: i64,
}

/// Process-wide weather component: one provider plus its own cache and TTL.
pub struct WeatherService {
    provider: Box<dyn WeatherProvider>,
    ttl_ms: i64,
    cache: Mutex<Option<CachedWeather>>,
}

impl WeatherService {
    pub fn new(provider: Box<dyn WeatherProvider>, ttl_minutes: u32) -> Self {
        Self {
            provider,
            ttl_ms: i64::from(ttl_minutes) * MILLIS_PER_MINUTE,
            cache: Mutex::new(None),
        }
    }

    /// Current weather. Refreshes when the cache is stale or from another day;
    /// a failed refresh keeps the cached value, and with nothing cached the
    /// weather is [`Weather::Clear`]. The cache is not locked during the fetch.
    pub fn current(&self, date: NaiveDate, now_ms: i64) -> Weather {
        let cached = *self.cache.lock();
        if let Some(cached) = cached {
            if cached.date == date && now_ms - cached.fetched_at_ms < self.ttl_ms {
                return cached.weather;
            }
        }

        match self.provider.fetch(date) {
            Ok(weather) => {
                debug!(
                    target: "glyphdex::environment",
                    provider = self.provider.name(),
                    %weather,
                    "weather.refreshed"
                );
                let mut cache = self.cache.lock();
                // An override or a newer refresh landed while fetching.
                if *cache == cached {
                    *cache = Some(CachedWeather {
                        weather,
                        date,
                        fetched_at_ms: now_ms,
                    });
                }
                weather
            }
            Err(err) => {
                warn!(
                    target: "glyphdex::environment",
                    provider = self.provider.name(),
                    error = %err,
                    "weather.refresh_failed"
                );
                self.cache
                    .lock()
                    .map(|cached| cached.weather)
                    .unwrap_or_default()
            }
        }
    }

    /// Pins the weather until the TTL lapses.
    pub fn override_weather(&self, weather: Weather, date: NaiveDate, now_ms: i64) {
        *self.cache.lock() = Some(CachedWeather {
            weather,
            date,
            fetched_at_ms: now_ms,
        });
    }
}

/// Everything time- and weather-related a condition may look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    pub local_time: NaiveDateTime,
    pub calendar: Calendar,
    pub weather: Weather,
    pub sleep: SleepState,
}

impl Environment {
    pub fn new(local_time: NaiveDateTime, weather: Weather, sleep: SleepState) -> Self {
        Self {
            local_time,
            calendar: Calendar::at(local_time),
            weather,
            sleep,
        }
    }

    pub fn observe(
        local_time: NaiveDateTime,
        now_ms: i64,
        screen_off_minutes: u32,
        weather: &WeatherService,
        sleep: &SleepTracker,
    ) -> Self {
        Self::new(
            local_time,
            weather.current(local_time.date(), now_ms),
            sleep.observe(local_time, now_ms, screen_off_minutes),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryPreferences;
    use crossbeam_channel::{bounded, Receiver, Sender};
    use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
    use std::thread;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, 0))
            .expect("valid test date")
    }

    struct FailingProvider;

    impl WeatherProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn fetch(&self, _date: NaiveDate) -> Result<Weather, WeatherError> {
            Err(WeatherError::Unavailable {
                provider: "failing",
                reason: "offline".to_string(),
            })
        }
    }

    #[test]
    fn night_spans_evening_and_early_morning() {
        assert!(Calendar::at(at(2026, 3, 10, 22, 0)).is_night());
        assert!(Calendar::at(at(2026, 3, 10, 5, 59)).is_night());
        assert!(!Calendar::at(at(2026, 3, 10, 6, 0)).is_night());
        assert!(!Calendar::at(at(2026, 3, 10, 19, 59)).is_night());
    }

    #[test]
    fn known_full_moon_is_detected() {
        // Full moon of 2024-01-25 17:54 UTC.
        let calendar = Calendar::at(at(2024, 1, 25, 18, 0));
        assert!(calendar.is_full_moon(), "age {}", calendar.moon_age_days);
        assert!(!calendar.is_new_moon());
        // New moon of 2024-01-11 11:57 UTC.
        assert!(Calendar::at(at(2024, 1, 11, 12, 0)).is_new_moon());
    }

    #[test]
    fn holidays_and_seasons() {
        let halloween = Calendar::at(at(2026, 10, 31, 12, 0));
        assert_eq!(halloween.holiday, Some(Holiday::Halloween));
        assert_eq!(halloween.season, Season::Autumn);
        assert_eq!(Calendar::at(at(2026, 7, 4, 12, 0)).holiday, None);
        assert_eq!(Season::of_month(12), Season::Winter);
    }

    #[test]
    fn sleep_window_wraps_midnight() {
        let window = SleepWindow::default();
        assert!(window.contains(NaiveTime::from_hms_opt(23, 30, 0).unwrap()));
        assert!(window.contains(NaiveTime::from_hms_opt(6, 59, 0).unwrap()));
        assert!(!window.contains(NaiveTime::from_hms_opt(7, 0, 0).unwrap()));
        assert!(!window.contains(NaiveTime::from_hms_opt(22, 59, 0).unwrap()));

        let early = SleepWindow::new(NaiveTime::from_hms_opt(1, 0, 0).unwrap());
        assert!(early.contains(NaiveTime::from_hms_opt(8, 59, 0).unwrap()));
        assert!(!early.contains(NaiveTime::from_hms_opt(0, 30, 0).unwrap()));
    }

    #[test]
    fn sleep_bonus_granted_after_quiet_night() {
        let prefs: Arc<dyn PreferenceStore> = Arc::new(MemoryPreferences::default());
        let tracker = SleepTracker::new(SleepWindow::default(), prefs.clone());
        let now_ms = 1_000_000;

        let restless = tracker.observe(at(2026, 5, 2, 7, 30), now_ms, 120);
        assert!(!restless.bonus_active);

        let rested = tracker.observe(at(2026, 5, 2, 7, 30), now_ms, 480);
        assert!(rested.bonus_active);
        assert!(!rested.in_window);

        let later = tracker.observe(at(2026, 5, 2, 12, 0), now_ms + 60_000, 0);
        assert!(later.bonus_active, "bonus persists until expiry");
    }

    #[test]
    fn bedtime_round_trips_through_preferences() {
        let prefs = MemoryPreferences::default();
        let window = SleepWindow::new(NaiveTime::from_hms_opt(0, 45, 0).unwrap());
        window.store(&prefs);
        assert_eq!(SleepWindow::load(&prefs, SleepWindow::default()), window);
    }

    #[test]
    fn daily_seed_weather_is_stable_and_seasonal() {
        let provider = DailySeedWeather::new(42);
        let date = NaiveDate::from_ymd_opt(2026, 7, 14).unwrap();
        let first = provider.fetch(date).unwrap();
        assert_eq!(first, provider.fetch(date).unwrap());
        for day in 1..=31 {
            let summer = NaiveDate::from_ymd_opt(2026, 7, day).unwrap();
            assert_ne!(provider.fetch(summer).unwrap(), Weather::Snow);
        }
    }

    #[test]
    fn weather_service_falls_back_when_provider_fails() {
        let service = WeatherService::new(Box::new(FailingProvider), 60);
        let date = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        assert_eq!(service.current(date, 0), Weather::Clear);

        service.override_weather(Weather::Snow, date, 0);
        assert_eq!(service.current(date, 10 * MILLIS_PER_MINUTE), Weather::Snow);
        // Stale cache: the refresh fails and the last known value survives.
        assert_eq!(service.current(date, 120 * MILLIS_PER_MINUTE), Weather::Snow);
    }

    struct GatedProvider {
        started: Sender<()>,
        release: Receiver<()>,
    }

    impl WeatherProvider for GatedProvider {
        fn name(&self) -> &'static str {
            "gated"
        }

        fn fetch(&self, _date: NaiveDate) -> Result<Weather, WeatherError> {
            let _ = self.started.send(());
            let _ = self.release.recv_timeout(std::time::Duration::from_secs(5));
            Ok(Weather::Rain)
        }
    }

    #[test]
    fn slow_fetch_does_not_block_overrides() {
        let (started_tx, started_rx) = bounded(1);
        let (release_tx, release_rx) = bounded(1);
        let service = WeatherService::new(
            Box::new(GatedProvider {
                started: started_tx,
                release: release_rx,
            }),
            60,
        );
        let date = NaiveDate::from_ymd_opt(2026, 4, 2).unwrap();
        let fetch_done = AtomicBool::new(false);

        thread::scope(|scope| {
            let fetching = scope.spawn(|| {
                let weather = service.current(date, 0);
                fetch_done.store(true, AtomicOrdering::SeqCst);
                weather
            });
            started_rx.recv().unwrap();
            service.override_weather(Weather::Snow, date, 0);
            assert!(!fetch_done.load(AtomicOrdering::SeqCst));
            release_tx.send(()).unwrap();
            assert_eq!(fetching.join().unwrap(), Weather::Rain);
        });

        // The override made during the fetch is kept.
        assert_eq!(service.current(date, MILLIS_PER_MINUTE), Weather::Snow);
    }

    #[test]
    fn weekend_flag_follows_the_weekday() {
        assert!(Calendar::at(at(2026, 5, 16, 12, 0)).is_weekend());
        assert!(Calendar::at(at(2026, 5, 17, 12, 0)).is_weekend());
        assert!(!Calendar::at(at(2026, 5, 18, 12, 0)).is_weekend());
    }

    #[test]
    fn weather_parses_aliases() {
        assert_eq!("Storm".parse::<Weather>().unwrap(), Weather::Thunderstorm);
        assert!("hail".parse::<Weather>().is_err());
    }
}
