use std::sync::Arc;

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use spawn_core::{
    default_rules, environment::SleepState, DeviceState, Environment, PlayerProgress,
    SpawnContext, SpawnEngine, Weather,
};

fn context(weather: Weather, hour: u32) -> SpawnContext {
    let local = NaiveDate::from_ymd_opt(2026, 10, 31)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .expect("valid bench date");
    SpawnContext::new(
        DeviceState {
            interactive: false,
            screen_off_minutes: 90,
            battery_percent: 10,
        },
        PlayerProgress {
            dex_count: 60,
            ..Default::default()
        },
        Environment::new(local, weather, SleepState::default()),
    )
}

fn bench_spawn(c: &mut Criterion) {
    let engine = SpawnEngine::new(Arc::new(default_rules().expect("shipped table")));
    let mut group = c.benchmark_group("spawn");

    let scenarios = [
        ("clear_noon", context(Weather::Clear, 12)),
        ("storm_night", context(Weather::Thunderstorm, 23)),
        ("snow_night", context(Weather::Snow, 2)),
    ];
    for (label, ctx) in &scenarios {
        group.bench_with_input(BenchmarkId::new("draw", label), ctx, |b, ctx| {
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            b.iter(|| engine.spawn(&mut rng, black_box(ctx), 90, 0))
        });
        group.bench_with_input(BenchmarkId::new("pool_probabilities", label), ctx, |b, ctx| {
            b.iter(|| engine.pool_probabilities(black_box(ctx)))
        });
    }

    group.finish();
}

criterion_group!(spawn_benches, bench_spawn);
criterion_main!(spawn_benches);
