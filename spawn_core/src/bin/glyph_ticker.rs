use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use chrono::{Duration, Local, NaiveDateTime, Utc};
use crossbeam_channel::{unbounded, Receiver};
use tracing::{error, info, warn};

use spawn_core::{
    default_rules, load_cadence_config_from_env, CadenceController, DailySeedWeather, DeviceState,
    Environment, JsonFilePreferences, MemoryCatchLog, MemoryPreferences, PlayerProgress,
    PreferenceStore, PushOutcome, SleepTracker, SleepWindow, SpawnContext, SpawnEngine,
    SpawnHistory, SpawnQueue, Weather, WeatherService,
};

const PREFS_PATH_ENV: &str = "GLYPH_PREFS_PATH";
const DEFAULT_PREFS_PATH: &str = "glyphdex_prefs.json";
const MILLIS_PER_MINUTE: i64 = 60_000;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (config, metadata) = load_cadence_config_from_env();
    let rules = match default_rules() {
        Ok(rules) => Arc::new(rules),
        Err(err) => {
            error!(target: "glyphdex::ticker", error = %err, "rules.invalid");
            return;
        }
    };

    let prefs = open_preferences();
    let history = Arc::new(SpawnHistory::new(
        Arc::clone(&prefs),
        Arc::new(MemoryCatchLog::default()),
    ));
    let sleep = SleepTracker::new(
        SleepWindow::load(prefs.as_ref(), config.default_sleep_window()),
        prefs,
    );
    let weather = WeatherService::new(
        Box::new(DailySeedWeather::new(0x6c79_7068)),
        config.weather_ttl_minutes(),
    );
    let queue = SpawnQueue::new(config.queue_capacity());
    let controller = CadenceController::from_entropy(SpawnEngine::new(rules), config, history);

    let mut ticker = Ticker {
        controller,
        queue,
        weather,
        sleep,
        device: DeviceState::default(),
        progress: PlayerProgress::default(),
        clock: Local::now().naive_local(),
        now_ms: Utc::now().timestamp_millis(),
    };

    let command_rx = spawn_command_listener();
    info!(
        target: "glyphdex::ticker",
        config = ?metadata.path(),
        "glyph ticker ready"
    );

    while let Ok(command) = command_rx.recv() {
        match command {
            Command::Tick(minutes) => {
                for _ in 0..minutes {
                    ticker.tick();
                }
            }
            Command::Screen { on } => {
                ticker.device.interactive = on;
                if on {
                    ticker.device.screen_off_minutes = 0;
                }
                info!(target: "glyphdex::ticker", on, "command.applied=screen");
            }
            Command::Weather(kind) => {
                ticker
                    .weather
                    .override_weather(kind, ticker.clock.date(), ticker.now_ms);
                info!(target: "glyphdex::ticker", weather = %kind, "command.applied=weather");
            }
            Command::Battery(percent) => {
                ticker.device.battery_percent = percent.min(100);
                info!(target: "glyphdex::ticker", percent, "command.applied=battery");
            }
            Command::Catch(index) => ticker.catch(index),
            Command::Queue => ticker.print_queue(),
            Command::Probabilities => ticker.print_probabilities(),
        }
    }
}

fn open_preferences() -> Arc<dyn PreferenceStore> {
    let path = env::var(PREFS_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_PREFS_PATH));
    match JsonFilePreferences::open(&path) {
        Ok(prefs) => Arc::new(prefs),
        Err(err) => {
            warn!(
                target: "glyphdex::ticker",
                path = %path.display(),
                error = %err,
                "preferences.open_failed=memory_fallback"
            );
            Arc::new(MemoryPreferences::default())
        }
    }
}

struct Ticker {
    controller: CadenceController,
    queue: SpawnQueue,
    weather: WeatherService,
    sleep: SleepTracker,
    device: DeviceState,
    progress: PlayerProgress,
    clock: NaiveDateTime,
    now_ms: i64,
}

impl Ticker {
    fn context(&mut self) -> SpawnContext {
        self.progress.queued = self.queue.queued_species();
        let environment = Environment::observe(
            self.clock,
            self.now_ms,
            self.device.screen_off_minutes,
            &self.weather,
            &self.sleep,
        );
        SpawnContext::new(self.device, self.progress.clone(), environment)
    }

    fn tick(&mut self) {
        self.clock += Duration::minutes(1);
        self.now_ms += MILLIS_PER_MINUTE;
        if !self.device.interactive {
            self.device.screen_off_minutes += 1;
        }

        let ctx = self.context();
        match self.controller.maybe_spawn(self.now_ms, &ctx) {
            Ok(Some(spawn)) => {
                let species = spawn.species.name;
                let pool = spawn.pool_name().to_string();
                match self.queue.push(spawn) {
                    PushOutcome::Queued => {
                        info!(target: "glyphdex::ticker", species, %pool, "queue.pushed")
                    }
                    PushOutcome::Evicted(evicted) => info!(
                        target: "glyphdex::ticker",
                        species,
                        %pool,
                        evicted = evicted.species.name,
                        "queue.pushed=evicted"
                    ),
                    PushOutcome::Rejected => {
                        warn!(target: "glyphdex::ticker", species, %pool, "queue.rejected=full")
                    }
                }
            }
            Ok(None) => {}
            Err(err) => error!(target: "glyphdex::ticker", error = %err, "tick.failed"),
        }
    }

    fn catch(&mut self, index: usize) {
        match self.controller.catch(
            &self.queue,
            index,
            self.now_ms,
            self.device.screen_off_minutes,
        ) {
            Some(caught) => {
                self.progress.caught.insert(caught.species.id);
                self.progress.dex_count = self.progress.caught.len() as u32;
                info!(
                    target: "glyphdex::ticker",
                    species = caught.species.name,
                    dex = self.progress.dex_count,
                    "command.applied=catch"
                );
            }
            None => warn!(target: "glyphdex::ticker", index, "catch.rejected=no_entry"),
        }
    }

    fn print_queue(&self) {
        for (index, entry) in self.queue.snapshot().iter().enumerate() {
            println!(
                "{index:>2} {:<12} {:<14} {}",
                entry.species.name,
                entry.pool_name(),
                entry.species.id
            );
        }
    }

    fn print_probabilities(&mut self) {
        let ctx = self.context();
        let effective = self
            .controller
            .effective_screen_off_minutes(ctx.device.screen_off_minutes);
        let ctx = ctx.with_effective_screen_off_minutes(effective);
        let engine = self.controller.engine();
        for (pool, percentage) in engine.pool_probabilities(&ctx).iter() {
            println!("{pool:<14} {percentage:>6.2}");
        }
    }
}

#[derive(Debug)]
enum Command {
    Tick(u32),
    Screen { on: bool },
    Weather(Weather),
    Battery(u8),
    Catch(usize),
    Queue,
    Probabilities,
}

fn spawn_command_listener() -> Receiver<Command> {
    let (sender, receiver) = unbounded::<Command>();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(target: "glyphdex::ticker", error = %err, "command.read_failed");
                    break;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match parse_command(trimmed) {
                Some(cmd) => {
                    if sender.send(cmd).is_err() {
                        break;
                    }
                }
                None => warn!(target: "glyphdex::ticker", input = trimmed, "command.invalid"),
            }
        }
    });
    receiver
}

fn parse_command(input: &str) -> Option<Command> {
    let mut parts = input.split_whitespace();
    match parts.next()? {
        "tick" => {
            let amount = parts.next().unwrap_or("1").parse().ok()?;
            Some(Command::Tick(amount))
        }
        "screen" => match parts.next()? {
            "on" => Some(Command::Screen { on: true }),
            "off" => Some(Command::Screen { on: false }),
            _ => None,
        },
        "weather" => {
            let kind = parts.next()?.parse().ok()?;
            Some(Command::Weather(kind))
        }
        "battery" => {
            let percent = parts.next()?.parse().ok()?;
            Some(Command::Battery(percent))
        }
        "catch" => {
            let index = parts.next().unwrap_or("0").parse().ok()?;
            Some(Command::Catch(index))
        }
        "queue" => Some(Command::Queue),
        "probs" => Some(Command::Probabilities),
        _ => None,
    }
}
