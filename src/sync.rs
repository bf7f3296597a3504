//! Thread-safe wrapper for hosts that need to share one [`CacheStore`]
//! across worker threads.
//!
//! The store itself assumes single-writer access; this wrapper serializes
//! access behind a single [`parking_lot::Mutex`] rather than attempting
//! fine-grained locking. Adequate for a request-serving host where cache
//! operations are cheap relative to generation; not intended for
//! high-contention multi-writer workloads.

use parking_lot::Mutex;

use crate::batch::BatchAnalysis;
use crate::config::CacheConfig;
use crate::error::StoreError;
use crate::key::Token;
use crate::store::{CacheStats, CacheStore, PrefixMatch};

/// `Send + Sync` wrapper around a [`CacheStore`], guarded by a single
/// mutex.
pub struct SharedCacheStore<A> {
    inner: Mutex<CacheStore<A>>,
}

impl<A> SharedCacheStore<A> {
    /// Wrap a freshly constructed store for shared access.
    pub fn new(config: CacheConfig) -> Self {
        Self { inner: Mutex::new(CacheStore::new(config)) }
    }

    /// The store's configuration. Config is immutable after
    /// construction, so this takes the lock only briefly.
    pub fn config(&self) -> CacheConfig {
        self.inner.lock().config().clone()
    }

    /// See [`CacheStore::lookup`].
    pub fn lookup(&self, tokens: &[Token]) -> PrefixMatch {
        self.inner.lock().lookup(tokens)
    }

    /// See [`CacheStore::store`].
    pub fn store(
        &self,
        tokens: &[Token],
        artifact: A,
        byte_footprint: Option<usize>,
    ) -> Result<String, StoreError> {
        self.inner.lock().store(tokens, artifact, byte_footprint)
    }

    /// See [`CacheStore::evict`].
    pub fn evict(&self, key: &str) -> bool {
        self.inner.lock().evict(key)
    }

    /// See [`CacheStore::clear`].
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// See [`CacheStore::stats`].
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    /// See [`CacheStore::analyze_batch`].
    pub fn analyze_batch(&self, sequences: &[Vec<Token>]) -> BatchAnalysis {
        self.inner.lock().analyze_batch(sequences)
    }

    /// Run an arbitrary read against the entry map under the lock. Useful
    /// for callers that need [`CacheStore::get_entry`] without copying
    /// the artifact out.
    pub fn with_entry<R>(&self, key: &str, f: impl FnOnce(Option<&crate::entry::CacheEntry<A>>) -> R) -> R {
        let guard = self.inner.lock();
        f(guard.get_entry(key))
    }
}
