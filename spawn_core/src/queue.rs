use std::{
    cmp::Ordering,
    collections::{BTreeSet, VecDeque},
};

use parking_lot::Mutex;
use tracing::debug;

use crate::{pool::SpawnResult, species::CreatureId};

#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    Queued,
    /// The queue was full; the returned entry made room.
    Evicted(SpawnResult),
    /// The queue was full of special spawns and the newcomer was not special.
    Rejected,
}

/// Bounded spawn queue shared by the tick handler and the catch action.
/// Every mutation happens under one lock.
#[derive(Debug)]
pub struct SpawnQueue {
    capacity: usize,
    entries: Mutex<VecDeque<SpawnResult>>,
}

/// Specials first, then rarer pools, then older spawns.
fn rarity_order(a: &SpawnResult, b: &SpawnResult) -> Ordering {
    b.is_special()
        .cmp(&a.is_special())
        .then_with(|| {
            a.pool
                .base_percentage
                .partial_cmp(&b.pool.base_percentage)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.spawned_at_ms.cmp(&b.spawned_at_ms))
}

impl SpawnQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn push(&self, spawn: SpawnResult) -> PushOutcome {
        let mut entries = self.entries.lock();
        let mut outcome = PushOutcome::Queued;
        if entries.len() >= self.capacity {
            let oldest_regular = entries
                .iter()
                .enumerate()
                .filter(|(_, entry)| !entry.is_special())
                .min_by_key(|(_, entry)| entry.spawned_at_ms)
                .map(|(index, _)| index);
            match oldest_regular {
                Some(index) => {
                    if let Some(evicted) = entries.remove(index) {
                        debug!(
                            target: "glyphdex::queue",
                            species = evicted.species.name,
                            pool = %evicted.pool.name,
                            "queue.evicted"
                        );
                        outcome = PushOutcome::Evicted(evicted);
                    }
                }
                None if spawn.is_special() => {
                    // Every slot is special: drop the oldest of them.
                    let oldest = entries
                        .iter()
                        .enumerate()
                        .min_by_key(|(_, entry)| entry.spawned_at_ms)
                        .map(|(index, _)| index);
                    if let Some(evicted) = oldest.and_then(|index| entries.remove(index)) {
                        outcome = PushOutcome::Evicted(evicted);
                    }
                }
                None => return PushOutcome::Rejected,
            }
        }
        entries.push_back(spawn);
        entries.make_contiguous().sort_by(rarity_order);
        outcome
    }

    /// Ordered copy for display.
    pub fn snapshot(&self) -> Vec<SpawnResult> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn take(&self, index: usize) -> Option<SpawnResult> {
        self.entries.lock().remove(index)
    }

    pub fn queued_species(&self) -> BTreeSet<CreatureId> {
        self.entries
            .lock()
            .iter()
            .map(|entry| entry.species.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pool::{PoolInhabitant, SpawnPool},
        species::{catalog, Species},
    };
    use std::sync::Arc;

    fn spawn(species: Species, base: f64, special: bool, at: i64) -> SpawnResult {
        let mut pool = SpawnPool::new(if special { "special" } else { "pool" }, base);
        pool.special = special;
        pool.inhabitants.push(PoolInhabitant::new(species, 1.0));
        SpawnResult {
            species,
            pool: Arc::new(pool),
            screen_off_minutes: 0,
            spawned_at_ms: at,
        }
    }

    #[test]
    fn sorted_by_rarity() {
        let queue = SpawnQueue::new(5);
        queue.push(spawn(catalog::PIDGEY, 60.0, false, 1));
        queue.push(spawn(catalog::DRATINI, 10.0, false, 2));
        queue.push(spawn(catalog::MEW, 0.0, true, 3));
        queue.push(spawn(catalog::RATTATA, 60.0, false, 0));
        let order: Vec<_> = queue.snapshot().iter().map(|s| s.species.name).collect();
        assert_eq!(order, vec!["Mew", "Dratini", "Rattata", "Pidgey"]);
    }

    #[test]
    fn overflow_evicts_oldest_regular_entry() {
        let queue = SpawnQueue::new(2);
        queue.push(spawn(catalog::MEW, 0.0, true, 0));
        queue.push(spawn(catalog::PIDGEY, 60.0, false, 1));
        let outcome = queue.push(spawn(catalog::RATTATA, 60.0, false, 2));
        assert!(matches!(outcome, PushOutcome::Evicted(ref evicted) if evicted.species == catalog::PIDGEY));
        assert!(queue.queued_species().contains(&catalog::MEW.id));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn full_special_queue_rejects_regular_spawn() {
        let queue = SpawnQueue::new(1);
        queue.push(spawn(catalog::MEW, 0.0, true, 0));
        assert_eq!(queue.push(spawn(catalog::PIDGEY, 60.0, false, 1)), PushOutcome::Rejected);
        assert_eq!(queue.snapshot()[0].species, catalog::MEW);
    }

    #[test]
    fn take_removes_by_index() {
        let queue = SpawnQueue::new(3);
        queue.push(spawn(catalog::PIDGEY, 60.0, false, 1));
        queue.push(spawn(catalog::DRATINI, 10.0, false, 2));
        assert_eq!(queue.take(0).map(|s| s.species), Some(catalog::DRATINI));
        assert!(queue.take(5).is_none());
        assert_eq!(queue.len(), 1);
    }
}
