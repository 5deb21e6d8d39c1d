use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime, NaiveTime};
use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use rand::{rngs::SmallRng, SeedableRng};
use tracing::info;

use spawn_core::{
    default_rules,
    environment::{SleepState, SleepWindow},
    species::species_by_name,
    DeviceState, Environment, Item, PlayerProgress, SpawnContext, SpawnEngine, Weather,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect Glyphdex spawn odds for a described device state", long_about = None)]
struct Cli {
    /// Local time to evaluate, e.g. 2026-10-31T22:30:00. Defaults to now.
    #[arg(long)]
    at: Option<NaiveDateTime>,
    #[arg(long, default_value = "clear")]
    weather: Weather,
    #[arg(long, default_value_t = 100)]
    battery: u8,
    /// Unique Pokédex entries registered.
    #[arg(long, default_value_t = 10)]
    dex: u32,
    /// Screen-off minutes since the last spawn.
    #[arg(long, default_value_t = 30)]
    screen_off: u32,
    #[arg(long = "item")]
    items: Vec<Item>,
    /// Species already caught or queued, by name.
    #[arg(long = "found")]
    found: Vec<String>,
    #[arg(long, default_value_t = 0)]
    streak: u32,
    /// Bedtime that opens the eight-hour sleep window.
    #[arg(long, default_value = "23:00:00")]
    bedtime: NaiveTime,
    #[arg(long)]
    sleep_bonus: bool,
    /// Only list creatures of this pool.
    #[arg(long)]
    pool: Option<String>,
    /// Number of seeded spawns to tally.
    #[arg(long, default_value_t = 0)]
    draws: u32,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .init();

    let cli = Cli::parse();
    let ctx = build_context(&cli)?;
    let engine = SpawnEngine::new(Arc::new(default_rules()?));
    info!(
        local_time = %ctx.environment.local_time,
        weather = %ctx.environment.weather,
        "inspector.context_ready"
    );

    println!("pools");
    let pools = engine.pool_probabilities(&ctx);
    for (name, percentage) in pools.iter() {
        println!("  {name:<14} {percentage:>6.2}%");
    }

    for (name, _) in pools.iter() {
        if cli.pool.as_deref().is_some_and(|only| only != name.as_str()) {
            continue;
        }
        println!("{name}");
        let creatures = engine.creature_probabilities(name, &ctx);
        if creatures.is_empty() {
            println!("  (nothing eligible)");
        }
        for (species, percentage) in creatures.iter() {
            println!("  {:<12} {percentage:>6.2}%", species.name);
        }
    }

    if cli.draws > 0 {
        let mut rng = SmallRng::seed_from_u64(cli.seed);
        let mut tally: BTreeMap<(String, &'static str), u32> = BTreeMap::new();
        for _ in 0..cli.draws {
            if let Some(spawn) = engine.spawn(&mut rng, &ctx, cli.screen_off, 0)? {
                *tally
                    .entry((spawn.pool_name().to_string(), spawn.species.name))
                    .or_default() += 1;
            }
        }
        println!("draws (seed {})", cli.seed);
        for ((pool, species), count) in &tally {
            let share = f64::from(*count) / f64::from(cli.draws) * 100.0;
            println!("  {pool:<14} {species:<12} {count:>6} {share:>6.2}%");
        }
    }

    Ok(())
}

fn build_context(cli: &Cli) -> Result<SpawnContext> {
    let local = cli.at.unwrap_or_else(|| Local::now().naive_local());
    let mut progress = PlayerProgress {
        dex_count: cli.dex,
        active_items: cli.items.iter().copied().collect(),
        training_streak_days: cli.streak,
        ..Default::default()
    };
    for name in &cli.found {
        let species = species_by_name(name).ok_or_else(|| eyre!("unknown species '{name}'"))?;
        progress.caught.insert(species.id);
    }

    let window = SleepWindow::new(cli.bedtime);
    let sleep = SleepState {
        in_window: window.contains(local.time()),
        bonus_active: cli.sleep_bonus,
    };
    let device = DeviceState {
        interactive: false,
        screen_off_minutes: cli.screen_off,
        battery_percent: cli.battery.min(100),
    };
    Ok(SpawnContext::new(
        device,
        progress,
        Environment::new(local, cli.weather, sleep),
    ))
}
