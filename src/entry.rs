//! Cache entry metadata.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::key::Token;

/// Current wall-clock time in fractional seconds since the Unix epoch.
/// Sub-second resolution so that short TTLs (fractions of a second) are
/// representable and enforceable.
pub(crate) fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// A single cached prefix entry.
///
/// `tokens`, `key`, `byte_footprint`, and `created_at` are immutable after
/// construction. `last_accessed` and `access_count` mutate on every hit or
/// touch.
#[derive(Debug, Clone)]
pub struct CacheEntry<A> {
    key: String,
    tokens: Vec<Token>,
    artifact: A,
    byte_footprint: usize,
    created_at: f64,
    last_accessed: f64,
    access_count: u64,
    /// Monotonic recency stamp assigned by the owning store. Distinct from
    /// `last_accessed` (wall-clock seconds, coarse) so that recency
    /// ordering stays exact even when several accesses land within the
    /// same clock tick.
    recency: u64,
}

impl<A> CacheEntry<A> {
    pub(crate) fn new(
        key: String,
        tokens: Vec<Token>,
        artifact: A,
        byte_footprint: usize,
        recency: u64,
    ) -> Self {
        let now = now_seconds();
        Self {
            key,
            tokens,
            artifact,
            byte_footprint,
            created_at: now,
            last_accessed: now,
            access_count: 0,
            recency,
        }
    }

    /// The entry's content-address key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The exact token sequence this entry covers.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The opaque artifact supplied by the caller at `store` time.
    pub fn artifact(&self) -> &A {
        &self.artifact
    }

    /// Number of tokens covered by this entry.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Estimated or caller-supplied byte footprint of the artifact.
    pub fn byte_footprint(&self) -> usize {
        self.byte_footprint
    }

    /// Wall-clock creation time, fractional seconds since the Unix epoch.
    pub fn created_at(&self) -> f64 {
        self.created_at
    }

    /// Wall-clock time of the most recent access, fractional seconds
    /// since the Unix epoch.
    pub fn last_accessed(&self) -> f64 {
        self.last_accessed
    }

    /// Number of times this entry has been touched (hit or re-stored).
    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    /// Recency stamp used to order entries for recency-policy eviction;
    /// higher is more recently used.
    pub(crate) fn recency(&self) -> u64 {
        self.recency
    }

    /// Record an access: bump `last_accessed` to now, increment
    /// `access_count`, and adopt the given recency stamp (moving this
    /// entry to the most-recently-used position).
    pub(crate) fn touch(&mut self, recency: u64) {
        self.last_accessed = now_seconds();
        self.access_count += 1;
        self.recency = recency;
    }

    /// Whether this entry is TTL-expired at `now`, given `ttl_seconds`
    /// (`<= 0` means TTL is disabled). Age is measured from `created_at`,
    /// not `last_accessed`.
    pub(crate) fn is_expired(&self, ttl_seconds: f64, now: f64) -> bool {
        ttl_seconds > 0.0 && (now - self.created_at) > ttl_seconds
    }

    /// Backdate `created_at` to simulate TTL expiry in tests without
    /// sleeping.
    #[cfg(test)]
    pub(crate) fn force_created_at_for_test(&mut self, created_at: f64) {
        self.created_at = created_at;
    }
}
