//! Read-only snapshot of device, player and environment state, plus the
//! predicate vocabulary rule authors use to gate pools, creatures and
//! modifiers on it.

use std::{collections::BTreeSet, fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    environment::{Environment, Holiday, Season, Weather},
    species::{CreatureId, Species},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    Incense,
    MoonStone,
    ThunderStone,
    WaterStone,
    FireStone,
    LeafStone,
}

impl Item {
    pub fn as_str(&self) -> &'static str {
        match self {
            Item::Incense => "incense",
            Item::MoonStone => "moon_stone",
            Item::ThunderStone => "thunder_stone",
            Item::WaterStone => "water_stone",
            Item::FireStone => "fire_stone",
            Item::LeafStone => "leaf_stone",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown item '{0}'")]
pub struct UnknownItem(pub String);

impl FromStr for Item {
    type Err = UnknownItem;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "incense" => Ok(Item::Incense),
            "moon_stone" => Ok(Item::MoonStone),
            "thunder_stone" => Ok(Item::ThunderStone),
            "water_stone" => Ok(Item::WaterStone),
            "fire_stone" => Ok(Item::FireStone),
            "leaf_stone" => Ok(Item::LeafStone),
            other => Err(UnknownItem(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    pub interactive: bool,
    /// Grows while the screen is off; zero once the user interacts.
    pub screen_off_minutes: u32,
    pub battery_percent: u8,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            interactive: false,
            screen_off_minutes: 0,
            battery_percent: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerProgress {
    /// Unique species registered in the Pokédex.
    pub dex_count: u32,
    pub caught: BTreeSet<CreatureId>,
    /// Species currently waiting in the spawn queue.
    pub queued: BTreeSet<CreatureId>,
    pub active_items: BTreeSet<Item>,
    pub training_streak_days: u32,
}

impl PlayerProgress {
    pub fn has_found(&self, species: CreatureId) -> bool {
        self.caught.contains(&species) || self.queued.contains(&species)
    }

    pub fn has_item(&self, item: Item) -> bool {
        self.active_items.contains(&item)
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnContext {
    pub device: DeviceState,
    pub progress: PlayerProgress,
    pub environment: Environment,
    /// Screen-off minutes since the last spawn; see `CadenceController`.
    pub effective_screen_off_minutes: u32,
}

impl SpawnContext {
    pub fn new(device: DeviceState, progress: PlayerProgress, environment: Environment) -> Self {
        Self {
            effective_screen_off_minutes: device.screen_off_minutes,
            device,
            progress,
            environment,
        }
    }

    pub fn with_effective_screen_off_minutes(mut self, minutes: u32) -> Self {
        self.effective_screen_off_minutes = minutes;
        self
    }
}

type Predicate = dyn Fn(&SpawnContext) -> bool + Send + Sync;

/// A named, shareable predicate over a [`SpawnContext`].
#[derive(Clone)]
pub struct Condition {
    label: Arc<str>,
    predicate: Arc<Predicate>,
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Condition").field(&self.label).finish()
    }
}

impl Condition {
    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&SpawnContext) -> bool + Send + Sync + 'static,
    {
        Self {
            label: Arc::from(label.into()),
            predicate: Arc::new(predicate),
        }
    }

    pub fn from_fn<F>(predicate: F) -> Self
    where
        F: Fn(&SpawnContext) -> bool + Send + Sync + 'static,
    {
        Self::new("given", predicate)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn evaluate(&self, ctx: &SpawnContext) -> bool {
        (self.predicate)(ctx)
    }

    /// Logical AND; `other` is only evaluated when `self` holds.
    pub fn and(self, other: Condition) -> Condition {
        let label = format!("{} & {}", self.label, other.label);
        let first = self.predicate;
        let second = other.predicate;
        Condition::new(label, move |ctx| first(ctx) && second(ctx))
    }

    pub fn not(condition: Condition) -> Condition {
        let label = format!("!{}", condition.label);
        let inner = condition.predicate;
        Condition::new(label, move |ctx| !inner(ctx))
    }

    pub fn always() -> Self {
        Self::new("always", |_| true)
    }

    pub fn weather(weather: Weather) -> Self {
        Self::new(format!("weather={weather}"), move |ctx| {
            ctx.environment.weather == weather
        })
    }

    pub fn night() -> Self {
        Self::new("night", |ctx| ctx.environment.calendar.is_night())
    }

    pub fn day() -> Self {
        Self::new("day", |ctx| !ctx.environment.calendar.is_night())
    }

    pub fn season(season: Season) -> Self {
        Self::new(format!("season={season:?}"), move |ctx| {
            ctx.environment.calendar.season == season
        })
    }

    pub fn holiday(holiday: Holiday) -> Self {
        Self::new(format!("holiday={holiday:?}"), move |ctx| {
            ctx.environment.calendar.holiday == Some(holiday)
        })
    }

    pub fn full_moon() -> Self {
        Self::new("full_moon", |ctx| ctx.environment.calendar.is_full_moon())
    }

    pub fn new_moon() -> Self {
        Self::new("new_moon", |ctx| ctx.environment.calendar.is_new_moon())
    }

    pub fn weekend() -> Self {
        Self::new("weekend", |ctx| ctx.environment.calendar.is_weekend())
    }

    pub fn has_item(item: Item) -> Self {
        Self::new(format!("item={}", item.as_str()), move |ctx| {
            ctx.progress.has_item(item)
        })
    }

    pub fn not_found(species: Species) -> Self {
        Self::new(format!("not_found={}", species.name), move |ctx| {
            !ctx.progress.has_found(species.id)
        })
    }

    pub fn battery_at_most(percent: u8) -> Self {
        Self::new(format!("battery<={percent}"), move |ctx| {
            ctx.device.battery_percent <= percent
        })
    }

    pub fn dex_at_least(count: u32) -> Self {
        Self::new(format!("dex>={count}"), move |ctx| {
            ctx.progress.dex_count >= count
        })
    }

    pub fn dex_below(count: u32) -> Self {
        Self::new(format!("dex<{count}"), move |ctx| ctx.progress.dex_count < count)
    }

    pub fn streak_at_least(days: u32) -> Self {
        Self::new(format!("streak>={days}"), move |ctx| {
            ctx.progress.training_streak_days >= days
        })
    }

    pub fn in_sleep_window() -> Self {
        Self::new("in_sleep_window", |ctx| ctx.environment.sleep.in_window)
    }

    pub fn sleep_bonus() -> Self {
        Self::new("sleep_bonus", |ctx| ctx.environment.sleep.bonus_active)
    }
}
