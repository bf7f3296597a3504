//! End-to-end scenarios exercising the cache store through its public
//! API, independent of any specific eviction policy's internal details.

use prefix_cache::config::{CacheConfig, EvictionPolicy};
use prefix_cache::key::Token;
use prefix_cache::store::CacheStore;

fn seq(tokens: &[i32]) -> Vec<Token> {
    tokens.to_vec()
}

#[test]
fn shared_conversation_prefix_is_served_from_cache() {
    let mut store: CacheStore<Vec<u8>> = CacheStore::new(CacheConfig::default());

    let system_prompt = seq(&(0..64).collect::<Vec<_>>());
    let mut turn_one = system_prompt.clone();
    turn_one.extend_from_slice(&[1000, 1001, 1002]);

    store.store(&turn_one, vec![0u8; 4096], None).unwrap();

    let mut turn_two = system_prompt.clone();
    turn_two.extend_from_slice(&[2000, 2001]);

    let result = store.lookup(&turn_two);
    assert!(result.hit);
    assert_eq!(result.matched_length, 64);
    assert_eq!(result.remaining_tokens, vec![2000, 2001]);
}

#[test]
fn unrelated_sequences_never_collide() {
    let mut store: CacheStore<()> = CacheStore::new(CacheConfig::default());
    store.store(&seq(&[10, 20, 30, 40, 50]), (), None).unwrap();

    let result = store.lookup(&seq(&[99, 98, 97, 96, 95]));
    assert!(!result.hit);
    assert_eq!(result.matched_length, 0);
}

#[test]
fn byte_budget_is_enforced_across_many_inserts() {
    let config = CacheConfig::new(10_000, 1.0, 0.0, EvictionPolicy::Recency, 1).unwrap();
    let mut store: CacheStore<()> = CacheStore::new(config.clone());

    for i in 0..2_000 {
        store.store(&seq(&[i, i + 1, i + 2]), (), Some(2048)).unwrap();
        assert!(store.stats().memory_used_mb <= config.max_memory_mb + 0.01);
    }
}

#[test]
fn entry_count_is_enforced_independently_of_byte_budget() {
    let config = CacheConfig::new(5, 1024.0, 0.0, EvictionPolicy::Recency, 1).unwrap();
    let mut store: CacheStore<()> = CacheStore::new(config);

    for i in 0..50 {
        store.store(&seq(&[i, i + 1]), (), Some(1)).unwrap();
    }

    assert!(store.stats().entries_count <= 5);
}

#[test]
fn get_entry_does_not_disturb_recency_ordering() {
    let config = CacheConfig::new(2, 1024.0, 0.0, EvictionPolicy::Recency, 1).unwrap();
    let mut store: CacheStore<()> = CacheStore::new(config);

    let k1 = store.store(&seq(&[1, 2]), (), None).unwrap();
    store.store(&seq(&[3, 4]), (), None).unwrap();

    // Read-only access must not count as a use for eviction purposes.
    assert!(store.get_entry(&k1).is_some());

    store.store(&seq(&[5, 6]), (), None).unwrap();

    // k1 is still the least-recently-used entry and should be the one
    // evicted, despite the intervening get_entry call.
    assert!(!store.lookup(&seq(&[1, 2])).hit);
}

#[test]
fn frequency_policy_favors_repeatedly_hit_entries_under_pressure() {
    let config = CacheConfig::new(2, 1024.0, 0.0, EvictionPolicy::Frequency, 1).unwrap();
    let mut store: CacheStore<()> = CacheStore::new(config);

    store.store(&seq(&[1, 2]), (), None).unwrap();
    store.store(&seq(&[3, 4]), (), None).unwrap();

    for _ in 0..5 {
        store.lookup(&seq(&[1, 2]));
    }

    store.store(&seq(&[5, 6]), (), None).unwrap();

    assert!(store.lookup(&seq(&[1, 2])).hit);
    assert!(!store.lookup(&seq(&[3, 4])).hit);
}

#[test]
fn ttl_zero_means_entries_never_expire() {
    let config = CacheConfig::new(10, 1024.0, 0.0, EvictionPolicy::Recency, 1).unwrap();
    let mut store: CacheStore<()> = CacheStore::new(config);
    store.store(&seq(&[1, 2, 3]), (), None).unwrap();
    assert!(store.lookup(&seq(&[1, 2, 3])).hit);
}

#[test]
fn clear_resets_hit_eligibility_but_not_lifetime_counters() {
    let mut store: CacheStore<()> = CacheStore::new(CacheConfig::default());
    store.store(&seq(&[1, 2, 3, 4, 5]), (), None).unwrap();
    store.lookup(&seq(&[1, 2, 3, 4, 5]));

    store.clear();

    assert_eq!(store.stats().entries_count, 0);
    assert!(!store.lookup(&seq(&[1, 2, 3, 4, 5])).hit);
    // total_lookups accumulates across the clear, since it is a lifetime
    // counter rather than a point-in-time occupancy figure.
    assert!(store.stats().total_lookups >= 2);
}

#[test]
fn batch_analysis_reflects_inserted_sequences_without_mutating_store() {
    let store: CacheStore<()> = CacheStore::new(CacheConfig::default());
    let batch = vec![seq(&[1, 2, 3, 4]), seq(&[1, 2, 3, 4]), seq(&[9, 8, 7])];

    let analysis = store.analyze_batch(&batch);
    assert_eq!(analysis.groups.len(), 1);
    assert_eq!(store.stats().entries_count, 0);
}
