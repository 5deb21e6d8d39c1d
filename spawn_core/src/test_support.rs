use chrono::NaiveDate;

use crate::{
    context::{DeviceState, PlayerProgress, SpawnContext},
    environment::{Environment, SleepState, Weather},
};

/// A clear Tuesday noon in May: no holiday, no moon event, daytime.
pub(crate) fn context_at(screen_off_minutes: u32) -> SpawnContext {
    let local = NaiveDate::from_ymd_opt(2026, 5, 12)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .expect("valid fixture date");
    SpawnContext::new(
        DeviceState {
            interactive: false,
            screen_off_minutes,
            battery_percent: 80,
        },
        PlayerProgress {
            dex_count: 5,
            ..Default::default()
        },
        Environment::new(local, Weather::Clear, SleepState::default()),
    )
}
