//! Eviction-bounded, content-addressed cache store layered on the
//! [`crate::index::PrefixIndex`].
//!
//! Owns the entry metadata map, the running byte accounting, the
//! configuration, and the statistics counters. All mutating operations
//! assume single-writer access (see `§5` of the design spec); `get_entry`
//! and `stats` are safe to call without external synchronization once a
//! consistent snapshot is available.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::batch::{BatchAnalysis, BatchAnalyzer};
use crate::config::{CacheConfig, EvictionPolicy, BYTES_PER_TOKEN};
use crate::entry::{now_seconds, CacheEntry};
use crate::error::StoreError;
use crate::index::PrefixIndex;
use crate::key::{content_address, Token};

/// Result of a [`CacheStore::lookup`] call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefixMatch {
    pub matched_tokens: Vec<Token>,
    pub matched_length: usize,
    pub total_length: usize,
    pub cache_key: String,
    pub remaining_tokens: Vec<Token>,
    pub hit: bool,
}

impl PrefixMatch {
    fn miss(total_length: usize) -> Self {
        Self {
            matched_tokens: Vec::new(),
            matched_length: 0,
            total_length,
            cache_key: String::new(),
            remaining_tokens: Vec::new(),
            hit: false,
        }
    }

    /// Fraction of the query covered by the cached prefix; zero when the
    /// query is empty.
    pub fn savings_ratio(&self) -> f64 {
        if self.total_length == 0 {
            0.0
        } else {
            self.matched_length as f64 / self.total_length as f64
        }
    }
}

/// Aggregated statistics for a [`CacheStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_lookups: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_tokens_served: u64,
    pub total_tokens_requested: u64,
    pub entries_count: usize,
    pub memory_used_mb: f64,
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit; zero when there have been no lookups.
    pub fn hit_rate(&self) -> f64 {
        if self.total_lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_lookups as f64
        }
    }

    /// Fraction of requested tokens served from cache; zero when nothing
    /// has been requested.
    pub fn token_savings_rate(&self) -> f64 {
        if self.total_tokens_requested == 0 {
            0.0
        } else {
            self.total_tokens_served as f64 / self.total_tokens_requested as f64
        }
    }
}

/// Eviction-bounded prefix cache store.
///
/// Generic over the opaque artifact type `A` the caller stores alongside
/// each cached prefix (a KV state handle, a serialized buffer, anything
/// the core never interprets).
pub struct CacheStore<A> {
    config: CacheConfig,
    index: PrefixIndex,
    entries: HashMap<String, CacheEntry<A>>,
    total_bytes: usize,
    recency_counter: u64,
    stats: CacheStats,
}

impl<A> CacheStore<A> {
    /// Construct a store with an already-validated configuration.
    pub fn new(config: CacheConfig) -> Self {
        info!(
            max_entries = config.max_entries,
            max_memory_mb = config.max_memory_mb,
            policy = ?config.eviction_policy,
            "cache store initialized"
        );
        Self {
            config,
            index: PrefixIndex::new(),
            entries: HashMap::new(),
            total_bytes: 0,
            recency_counter: 0,
            stats: CacheStats::default(),
        }
    }

    /// The store's configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn next_recency(&mut self) -> u64 {
        self.recency_counter += 1;
        self.recency_counter
    }

    /// Look up the longest cached prefix of `tokens`.
    pub fn lookup(&mut self, tokens: &[Token]) -> PrefixMatch {
        self.stats.total_lookups += 1;
        self.stats.total_tokens_requested += tokens.len() as u64;

        let (matched_len, key) = self.index.find_longest(tokens);

        let Some(key) = key else {
            self.stats.cache_misses += 1;
            return PrefixMatch::miss(tokens.len());
        };
        if matched_len < self.config.min_prefix_length {
            self.stats.cache_misses += 1;
            return PrefixMatch::miss(tokens.len());
        }

        // Map/index desynchrony guard: unreachable under the synchrony
        // invariant, but tolerated as a miss rather than a panic.
        if !self.entries.contains_key(&key) {
            self.stats.cache_misses += 1;
            return PrefixMatch::miss(tokens.len());
        }

        let now = now_seconds();
        if self.entries.get(&key).unwrap().is_expired(self.config.default_ttl_seconds, now) {
            self.evict_entry(&key);
            self.stats.cache_misses += 1;
            return PrefixMatch::miss(tokens.len());
        }

        let recency = self.next_recency();
        let entry = self.entries.get_mut(&key).unwrap();
        entry.touch(recency);

        self.stats.cache_hits += 1;
        self.stats.total_tokens_served += matched_len as u64;

        debug!(cache_key = %key, matched_len, total_len = tokens.len(), "cache hit");

        PrefixMatch {
            matched_tokens: tokens[..matched_len].to_vec(),
            matched_length: matched_len,
            total_length: tokens.len(),
            cache_key: key,
            remaining_tokens: tokens[matched_len..].to_vec(),
            hit: true,
        }
    }

    /// Store an entry covering `tokens`, returning its content-address
    /// key. Returns an empty key (admission refusal) without any side
    /// effect when `tokens` is shorter than `min_prefix_length`.
    pub fn store(
        &mut self,
        tokens: &[Token],
        artifact: A,
        byte_footprint: Option<usize>,
    ) -> Result<String, StoreError> {
        if tokens.len() < self.config.min_prefix_length {
            debug!(
                len = tokens.len(),
                min = self.config.min_prefix_length,
                "store refused: below min_prefix_length"
            );
            return Ok(String::new());
        }

        let key = content_address(tokens);

        if self.entries.contains_key(&key) {
            let recency = self.next_recency();
            self.entries.get_mut(&key).unwrap().touch(recency);
            return Ok(key);
        }

        let footprint = match byte_footprint {
            Some(b) if b > 0 => b,
            _ => tokens.len() * BYTES_PER_TOKEN,
        };

        self.ensure_capacity(footprint)?;

        let recency = self.next_recency();
        let entry = CacheEntry::new(key.clone(), tokens.to_vec(), artifact, footprint, recency);

        self.index.insert(tokens, &key);
        self.total_bytes += footprint;
        self.entries.insert(key.clone(), entry);

        debug!(cache_key = %key, tokens = tokens.len(), bytes = footprint, "entry stored");

        Ok(key)
    }

    /// Ensure there is room for `needed_bytes`, evicting entries per the
    /// configured policy until both the entry-count and byte-budget
    /// constraints are satisfied (or the map is empty).
    fn ensure_capacity(&mut self, needed_bytes: usize) -> Result<(), StoreError> {
        let max_bytes = self.config.max_memory_bytes();
        let max_attempts = self.entries.len() + 1;
        let mut attempts = 0;

        while !self.entries.is_empty()
            && (self.entries.len() >= self.config.max_entries
                || self.total_bytes + needed_bytes > max_bytes)
        {
            attempts += 1;
            if attempts > max_attempts {
                return Err(StoreError::CapacityExhausted { attempts, needed_bytes });
            }
            self.evict_one();
        }

        Ok(())
    }

    fn evict_one(&mut self) {
        let victim = match self.config.eviction_policy {
            EvictionPolicy::Recency => {
                self.entries.values().min_by_key(|e| e.recency()).map(|e| e.key().to_string())
            }
            EvictionPolicy::Frequency => self
                .entries
                .values()
                .min_by_key(|e| (e.access_count(), e.recency()))
                .map(|e| e.key().to_string()),
        };

        if let Some(key) = victim {
            self.evict_entry(&key);
        }
    }

    fn evict_entry(&mut self, key: &str) -> bool {
        let Some(entry) = self.entries.remove(key) else {
            return false;
        };
        self.index.remove(entry.tokens());
        self.total_bytes = self.total_bytes.saturating_sub(entry.byte_footprint());
        self.stats.evictions += 1;
        debug!(cache_key = %key, "entry evicted");
        true
    }

    /// Manually evict a specific key. Returns whether it was present.
    pub fn evict(&mut self, key: &str) -> bool {
        self.evict_entry(key)
    }

    /// Drop all entries and reset byte accounting. Historical counters
    /// (lookups, hits, misses, evictions) are preserved.
    pub fn clear(&mut self) {
        let count = self.entries.len();
        self.entries.clear();
        self.index = PrefixIndex::new();
        self.total_bytes = 0;
        info!(count, "cache cleared");
    }

    /// Read a cache entry's metadata without updating its access
    /// tracking.
    pub fn get_entry(&self, key: &str) -> Option<&CacheEntry<A>> {
        self.entries.get(key)
    }

    /// Snapshot the store's statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.entries_count = self.entries.len();
        stats.memory_used_mb = self.total_bytes as f64 / (1024.0 * 1024.0);
        stats
    }

    /// Analyze prefix-sharing potential within a batch of token
    /// sequences. A pure function of `sequences` and this store's
    /// `min_prefix_length`; does not consult the index.
    pub fn analyze_batch(&self, sequences: &[Vec<Token>]) -> BatchAnalysis {
        BatchAnalyzer::analyze(sequences, self.config.min_prefix_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvictionPolicy;

    fn cfg(max_entries: usize, min_prefix_length: usize) -> CacheConfig {
        CacheConfig::new(max_entries, 1024.0, 0.0, EvictionPolicy::Recency, min_prefix_length).unwrap()
    }

    #[test]
    fn basic_hit() {
        let mut store: CacheStore<()> = CacheStore::new(cfg(10, 2));
        let key = store.store(&[1, 2, 3, 4, 5], (), None).unwrap();
        assert!(!key.is_empty());

        let result = store.lookup(&[1, 2, 3, 4, 5]);
        assert!(result.hit);
        assert_eq!(result.matched_length, 5);
        assert_eq!(result.cache_key, key);
        assert!(result.remaining_tokens.is_empty());
    }

    #[test]
    fn prefix_hit_with_remaining_tokens() {
        let mut store: CacheStore<()> = CacheStore::new(cfg(10, 2));
        store.store(&[1, 2, 3, 4], (), None).unwrap();

        let result = store.lookup(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(result.hit);
        assert_eq!(result.matched_length, 4);
        assert_eq!(result.remaining_tokens, vec![5, 6, 7, 8]);
    }

    #[test]
    fn store_below_min_prefix_length_is_refused() {
        let mut store: CacheStore<()> = CacheStore::new(cfg(10, 4));
        let key = store.store(&[1, 2], (), None).unwrap();
        assert!(key.is_empty());
        assert_eq!(store.stats().entries_count, 0);
    }

    #[test]
    fn match_below_min_prefix_length_is_a_miss() {
        let mut store: CacheStore<()> = CacheStore::new(cfg(10, 10));
        // min_prefix_length of 10 prevents admission of a 3-token
        // sequence through `store`, so force an index entry directly to
        // exercise the gating path in lookup.
        store.index.insert(&[1, 2, 3], "forced");
        store.entries.insert(
            "forced".to_string(),
            CacheEntry::new("forced".to_string(), vec![1, 2, 3], (), 10, 0),
        );
        let result = store.lookup(&[1, 2, 3]);
        assert!(!result.hit);
        assert_eq!(store.stats().cache_misses, 1);
    }

    #[test]
    fn restoring_same_tokens_returns_same_key_without_reindexing() {
        let mut store: CacheStore<()> = CacheStore::new(cfg(10, 2));
        let k1 = store.store(&[1, 2, 3], (), None).unwrap();
        let before = store.stats().entries_count;
        let k2 = store.store(&[1, 2, 3], (), None).unwrap();
        assert_eq!(k1, k2);
        assert_eq!(store.stats().entries_count, before);
    }

    #[test]
    fn recency_eviction_evicts_lru_entry() {
        let mut store: CacheStore<()> = CacheStore::new(cfg(2, 2));
        store.store(&[1, 2, 3], (), None).unwrap();
        store.store(&[4, 5, 6], (), None).unwrap();
        store.store(&[7, 8, 9], (), None).unwrap();

        assert!(!store.lookup(&[1, 2, 3]).hit);
        assert!(store.lookup(&[7, 8, 9]).hit);
        assert!(store.stats().evictions >= 1);
    }

    #[test]
    fn frequency_eviction_keeps_accessed_entry() {
        let cfg = CacheConfig::new(2, 1024.0, 0.0, EvictionPolicy::Frequency, 2).unwrap();
        let mut store: CacheStore<()> = CacheStore::new(cfg);
        store.store(&[1, 2, 3], (), None).unwrap();
        store.store(&[4, 5, 6], (), None).unwrap();
        assert!(store.lookup(&[1, 2, 3]).hit);

        store.store(&[7, 8, 9], (), None).unwrap();

        assert!(store.lookup(&[1, 2, 3]).hit);
        assert!(!store.lookup(&[4, 5, 6]).hit);
    }

    #[test]
    fn ttl_expires_and_counts_as_eviction() {
        let cfg = CacheConfig::new(10, 1024.0, 0.0, EvictionPolicy::Recency, 2).unwrap();
        let mut store: CacheStore<()> = CacheStore::new(cfg);
        let key = store.store(&[1, 2, 3, 4, 5], (), None).unwrap();

        // Force the entry's creation time into the past to simulate TTL
        // expiry without sleeping in a unit test.
        store.entries.get_mut(&key).unwrap().force_created_at_for_test(0.0);
        store.config.default_ttl_seconds = 1.0;

        let result = store.lookup(&[1, 2, 3, 4, 5]);
        assert!(!result.hit);
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn capacity_bounds_hold_after_store() {
        let mut store: CacheStore<()> = CacheStore::new(cfg(3, 1));
        for i in 0..10 {
            store.store(&[i, i + 1], (), None).unwrap();
            assert!(store.entries.len() <= store.config.max_entries);
            assert!(store.total_bytes <= store.config.max_memory_bytes());
        }
    }

    #[test]
    fn byte_accounting_matches_sum_of_footprints() {
        let mut store: CacheStore<()> = CacheStore::new(cfg(10, 1));
        store.store(&[1, 2], (), Some(100)).unwrap();
        store.store(&[3, 4], (), Some(200)).unwrap();
        let stats = store.stats();
        assert_eq!((stats.memory_used_mb * (1024.0 * 1024.0)).round() as usize, 300);
    }

    #[test]
    fn clear_removes_all_entries_and_resets_bytes() {
        let mut store: CacheStore<()> = CacheStore::new(cfg(10, 1));
        store.store(&[1, 2], (), None).unwrap();
        store.store(&[3, 4], (), None).unwrap();
        store.clear();
        assert_eq!(store.stats().entries_count, 0);
        assert_eq!(store.stats().memory_used_mb, 0.0);
        assert!(!store.lookup(&[1, 2]).hit);
    }

    #[test]
    fn savings_ratio_is_matched_over_total() {
        let mut store: CacheStore<()> = CacheStore::new(cfg(10, 2));
        store.store(&[1, 2, 3], (), None).unwrap();
        let result = store.lookup(&[1, 2, 3, 4, 5]);
        assert_eq!(result.savings_ratio(), 3.0 / 5.0);
    }

    #[test]
    fn hit_rate_and_token_savings_rate_are_zero_with_no_activity() {
        let store: CacheStore<()> = CacheStore::new(cfg(10, 2));
        let stats = store.stats();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.token_savings_rate(), 0.0);
    }

    #[test]
    fn evict_specific_key() {
        let mut store: CacheStore<()> = CacheStore::new(cfg(10, 1));
        let key = store.store(&[1, 2], (), None).unwrap();
        assert!(store.evict(&key));
        assert!(!store.evict(&key));
        assert!(!store.lookup(&[1, 2]).hit);
    }
}
