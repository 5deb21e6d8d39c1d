use std::sync::Arc;
use std::thread;

use spawn_core::{default_rules, species::catalog, PushOutcome, SpawnQueue, SpawnResult, SpawnRules};

fn spawn_from(rules: &SpawnRules, pool: &str, at_ms: i64) -> SpawnResult {
    let pool = Arc::clone(rules.pool(pool).expect("pool in shipped table"));
    let species = pool.inhabitants[0].species;
    SpawnResult {
        species,
        pool,
        screen_off_minutes: 30,
        spawned_at_ms: at_ms,
    }
}

#[test]
fn concurrent_producers_never_evict_specials() {
    let rules = Arc::new(default_rules().expect("shipped table"));
    let queue = Arc::new(SpawnQueue::new(6));
    let specials = ["mew", "mewtwo", "zapdos", "moltres"];

    thread::scope(|scope| {
        for (worker, special) in specials.iter().enumerate() {
            let queue = Arc::clone(&queue);
            let rules = Arc::clone(&rules);
            scope.spawn(move || {
                let base = worker as i64 * 1_000;
                for step in 0..50 {
                    let pool = if step % 2 == 0 { "common" } else { "rare" };
                    queue.push(spawn_from(&rules, pool, base + step));
                    if step == 25 {
                        assert_ne!(
                            queue.push(spawn_from(&rules, special, base + step)),
                            PushOutcome::Rejected
                        );
                    }
                }
            });
        }
    });

    let entries = queue.snapshot();
    assert_eq!(entries.len(), 6);
    let kept_specials = entries.iter().filter(|entry| entry.is_special()).count();
    assert_eq!(kept_specials, specials.len());
    assert!(entries[..4].iter().all(SpawnResult::is_special));
    assert!(entries[4..].iter().all(|entry| !entry.is_special()));
}

#[test]
fn snapshot_lists_rarer_spawns_first() {
    let rules = default_rules().expect("shipped table");
    let queue = SpawnQueue::new(10);
    queue.push(spawn_from(&rules, "common", 1));
    queue.push(spawn_from(&rules, "rare", 2));
    queue.push(spawn_from(&rules, "uncommon", 3));
    queue.push(spawn_from(&rules, "articuno", 4));
    queue.push(spawn_from(&rules, "common", 0));

    let order: Vec<(String, i64)> = queue
        .snapshot()
        .iter()
        .map(|entry| (entry.pool_name().to_string(), entry.spawned_at_ms))
        .collect();
    assert_eq!(
        order,
        vec![
            ("articuno".to_string(), 4),
            ("rare".to_string(), 2),
            ("uncommon".to_string(), 3),
            ("common".to_string(), 0),
            ("common".to_string(), 1),
        ]
    );
}

#[test]
fn full_queue_of_specials_rejects_regular_spawns() {
    let rules = default_rules().expect("shipped table");
    let queue = SpawnQueue::new(2);
    assert_eq!(queue.push(spawn_from(&rules, "mew", 1)), PushOutcome::Queued);
    assert_eq!(queue.push(spawn_from(&rules, "zapdos", 2)), PushOutcome::Queued);
    assert_eq!(
        queue.push(spawn_from(&rules, "common", 3)),
        PushOutcome::Rejected
    );

    match queue.push(spawn_from(&rules, "moltres", 4)) {
        PushOutcome::Evicted(evicted) => assert_eq!(evicted.species, catalog::MEW),
        other => panic!("expected the oldest special to make room, got {other:?}"),
    }
    assert!(queue.queued_species().contains(&catalog::MOLTRES.id));
}

#[test]
fn taking_an_entry_frees_its_species() {
    let rules = default_rules().expect("shipped table");
    let queue = SpawnQueue::new(3);
    queue.push(spawn_from(&rules, "first_partner", 5));
    assert!(queue.queued_species().contains(&catalog::BULBASAUR.id));

    let taken = queue.take(0).expect("one entry");
    assert_eq!(taken.species, catalog::BULBASAUR);
    assert!(queue.queued_species().is_empty());
    assert_eq!(queue.take(0), None);
}
