//! Persisted spawn history: preference-backed scalars and per-pool timestamps,
//! plus the durable catch log used to recover them.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::species::CreatureId;

pub const BEDTIME_KEY: &str = "sleep.bedtime_minutes";
pub const SLEEP_BONUS_EXPIRY_KEY: &str = "sleep.bonus_expiry_ms";
pub const LAST_SPAWN_SCREEN_OFF_KEY: &str = "spawn.last_screen_off_minutes";
const LAST_SPAWN_TIME_PREFIX: &str = "spawn.last_time.";

pub fn last_spawn_time_key(pool: &str) -> String {
    format!("{LAST_SPAWN_TIME_PREFIX}{pool}")
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write store at {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse store contents: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable key-value preferences. Values are plain integers.
pub trait PreferenceStore: Send + Sync {
    fn get_i64(&self, key: &str) -> Result<Option<i64>, StoreError>;

    fn set_i64(&self, key: &str, value: i64) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<BTreeMap<String, i64>>,
}

impl PreferenceStore for MemoryPreferences {
    fn get_i64(&self, key: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.values.lock().get(key).copied())
    }

    fn set_i64(&self, key: &str, value: i64) -> Result<(), StoreError> {
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }
}

/// Preferences kept in a JSON object on disk. Every write rewrites the file
/// through a sibling temp file and a rename.
#[derive(Debug)]
pub struct JsonFilePreferences {
    path: PathBuf,
    values: Mutex<BTreeMap<String, i64>>,
}

impl JsonFilePreferences {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, i64>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn get_i64(&self, key: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.values.lock().get(key).copied())
    }

    fn set_i64(&self, key: &str, value: i64) -> Result<(), StoreError> {
        let mut values = self.values.lock();
        values.insert(key.to_string(), value);
        self.persist(&values)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatchRecord {
    pub species: CreatureId,
    pub pool: String,
    pub caught_at_ms: i64,
}

/// Durable catch history.
pub trait CatchRecordStore: Send + Sync {
    fn catch_count(&self, species: CreatureId) -> Result<u32, StoreError>;

    fn last_caught_at(&self, pool: &str) -> Result<Option<i64>, StoreError>;

    fn record(&self, record: CatchRecord) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryCatchLog {
    records: Mutex<Vec<CatchRecord>>,
}

impl MemoryCatchLog {
    pub fn records(&self) -> Vec<CatchRecord> {
        self.records.lock().clone()
    }
}

impl CatchRecordStore for MemoryCatchLog {
    fn catch_count(&self, species: CreatureId) -> Result<u32, StoreError> {
        let count = self
            .records
            .lock()
            .iter()
            .filter(|record| record.species == species)
            .count();
        Ok(count as u32)
    }

    fn last_caught_at(&self, pool: &str) -> Result<Option<i64>, StoreError> {
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|record| record.pool == pool)
            .map(|record| record.caught_at_ms)
            .max())
    }

    fn record(&self, record: CatchRecord) -> Result<(), StoreError> {
        self.records.lock().push(record);
        Ok(())
    }
}

/// Spawn-history tracker over the two durable stores.
///
/// Read-modify-write sequences run under `writer`, so two near-simultaneous
/// spawns cannot both pass the monotonic check with stale reads. Store
/// failures are logged and read back as zero.
pub struct SpawnHistory {
    prefs: Arc<dyn PreferenceStore>,
    catches: Arc<dyn CatchRecordStore>,
    writer: Mutex<()>,
}

impl SpawnHistory {
    pub fn new(prefs: Arc<dyn PreferenceStore>, catches: Arc<dyn CatchRecordStore>) -> Self {
        Self {
            prefs,
            catches,
            writer: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryPreferences::default()),
            Arc::new(MemoryCatchLog::default()),
        )
    }

    pub fn preferences(&self) -> &Arc<dyn PreferenceStore> {
        &self.prefs
    }

    pub fn catches(&self) -> &Arc<dyn CatchRecordStore> {
        &self.catches
    }

    fn read_pref(&self, key: &str) -> Option<i64> {
        match self.prefs.get_i64(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    target: "glyphdex::history",
                    key,
                    error = %err,
                    "history.read_failed"
                );
                None
            }
        }
    }

    fn write_pref(&self, key: &str, value: i64) {
        if let Err(err) = self.prefs.set_i64(key, value) {
            warn!(
                target: "glyphdex::history",
                key,
                value,
                error = %err,
                "history.write_failed"
            );
        }
    }

    pub fn last_spawn_screen_off_minutes(&self) -> u32 {
        self.read_pref(LAST_SPAWN_SCREEN_OFF_KEY)
            .map_or(0, |minutes| minutes.clamp(0, i64::from(u32::MAX)) as u32)
    }

    pub fn set_last_spawn_screen_off_minutes(&self, minutes: i64) {
        let _guard = self.writer.lock();
        self.write_pref(LAST_SPAWN_SCREEN_OFF_KEY, minutes.max(0));
    }

    /// Called when the screen turns on: the next screen-off period starts
    /// its own count from zero.
    pub fn reset_screen_off_baseline(&self) {
        self.set_last_spawn_screen_off_minutes(0);
    }

    pub fn last_spawn_time(&self, pool: &str) -> Option<i64> {
        self.read_pref(&last_spawn_time_key(pool))
    }

    /// Latest of the stored spawn time and the last catch from that pool;
    /// zero when neither is known.
    pub fn best_known_spawn_time(&self, pool: &str) -> i64 {
        let caught = match self.catches.last_caught_at(pool) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    target: "glyphdex::history",
                    pool,
                    error = %err,
                    "history.catch_lookup_failed"
                );
                None
            }
        };
        self.last_spawn_time(pool)
            .into_iter()
            .chain(caught)
            .max()
            .unwrap_or(0)
    }

    /// Stores `timestamp_ms` only when it is newer than what is stored.
    /// Returns whether the stored value changed.
    pub fn record_spawn_time(&self, pool: &str, timestamp_ms: i64) -> bool {
        let _guard = self.writer.lock();
        let key = last_spawn_time_key(pool);
        match self.read_pref(&key) {
            Some(stored) if stored >= timestamp_ms => false,
            _ => {
                self.write_pref(&key, timestamp_ms);
                true
            }
        }
    }

    pub fn record_spawn(&self, pool: &str, screen_off_minutes: u32, spawned_at_ms: i64) {
        self.set_last_spawn_screen_off_minutes(i64::from(screen_off_minutes));
        self.record_spawn_time(pool, spawned_at_ms);
        debug!(
            target: "glyphdex::history",
            pool,
            screen_off_minutes,
            spawned_at_ms,
            "history.spawn_recorded"
        );
    }

    pub fn record_catch(&self, record: CatchRecord, screen_off_minutes: u32) {
        self.set_last_spawn_screen_off_minutes(i64::from(screen_off_minutes));
        self.record_spawn_time(&record.pool, record.caught_at_ms);
        if let Err(err) = self.catches.record(record) {
            warn!(
                target: "glyphdex::history",
                error = %err,
                "history.catch_write_failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct BrokenPreferences;

    impl PreferenceStore for BrokenPreferences {
        fn get_i64(&self, _key: &str) -> Result<Option<i64>, StoreError> {
            Err(StoreError::Unavailable("disk detached".to_string()))
        }

        fn set_i64(&self, _key: &str, _value: i64) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk detached".to_string()))
        }
    }

    fn scratch_path(label: &str) -> PathBuf {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "glyphdex-{label}-{}-{n}.json",
            std::process::id()
        ))
    }

    #[test]
    fn spawn_times_only_move_forward() {
        let history = SpawnHistory::in_memory();
        assert!(history.record_spawn_time("rare", 2_000));
        assert!(!history.record_spawn_time("rare", 1_000));
        assert!(!history.record_spawn_time("rare", 2_000));
        assert_eq!(history.last_spawn_time("rare"), Some(2_000));
        assert!(history.record_spawn_time("rare", 3_000));
        assert_eq!(history.last_spawn_time("rare"), Some(3_000));
    }

    #[test]
    fn best_known_time_prefers_newer_catch() {
        let history = SpawnHistory::in_memory();
        assert_eq!(history.best_known_spawn_time("rare"), 0);
        history.record_spawn_time("rare", 5_000);
        history
            .catches()
            .record(CatchRecord {
                species: CreatureId(147),
                pool: "rare".to_string(),
                caught_at_ms: 9_000,
            })
            .unwrap();
        assert_eq!(history.best_known_spawn_time("rare"), 9_000);
        assert_eq!(history.best_known_spawn_time("common"), 0);
    }

    #[test]
    fn screen_off_baseline_is_clamped() {
        let history = SpawnHistory::in_memory();
        history.set_last_spawn_screen_off_minutes(-30);
        assert_eq!(history.last_spawn_screen_off_minutes(), 0);
        history.record_spawn("common", 45, 10);
        assert_eq!(history.last_spawn_screen_off_minutes(), 45);
        history.reset_screen_off_baseline();
        assert_eq!(history.last_spawn_screen_off_minutes(), 0);
    }

    #[test]
    fn broken_store_reads_as_zero() {
        let history = SpawnHistory::new(
            Arc::new(BrokenPreferences),
            Arc::new(MemoryCatchLog::default()),
        );
        history.record_spawn("rare", 30, 1_000);
        assert_eq!(history.last_spawn_screen_off_minutes(), 0);
        assert_eq!(history.best_known_spawn_time("rare"), 0);
    }

    #[test]
    fn record_catch_updates_log_and_time() {
        let history = SpawnHistory::in_memory();
        history.record_catch(
            CatchRecord {
                species: CreatureId(25),
                pool: "uncommon".to_string(),
                caught_at_ms: 7_000,
            },
            12,
        );
        assert_eq!(history.catches().catch_count(CreatureId(25)).unwrap(), 1);
        assert_eq!(history.last_spawn_time("uncommon"), Some(7_000));
        assert_eq!(history.last_spawn_screen_off_minutes(), 12);
    }

    #[test]
    fn json_preferences_persist_across_reopen() {
        let path = scratch_path("prefs");
        {
            let prefs = JsonFilePreferences::open(&path).unwrap();
            assert_eq!(prefs.get_i64(BEDTIME_KEY).unwrap(), None);
            prefs.set_i64(BEDTIME_KEY, 1_380).unwrap();
        }
        let reopened = JsonFilePreferences::open(&path).unwrap();
        assert_eq!(reopened.get_i64(BEDTIME_KEY).unwrap(), Some(1_380));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn json_preferences_reject_garbage() {
        let path = scratch_path("garbage");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonFilePreferences::open(&path),
            Err(StoreError::Parse(_))
        ));
        let _ = fs::remove_file(&path);
    }
}
