//! Error taxonomy for the prefix cache.
//!
//! All errors are fail-closed: a misconfigured store is never constructed,
//! and a capacity enforcer that cannot make room surfaces an error rather
//! than silently over-admitting. Admission refusal and cache misses are
//! ordinary return values, not errors — see [`crate::store::PrefixMatch`] and
//! [`crate::store::CacheStore::store`].

use thiserror::Error;

/// Errors raised while validating a [`crate::config::CacheConfig`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("max_entries must be >= 1, got {0}")]
    MaxEntriesTooSmall(usize),

    #[error("max_memory_mb must be > 0, got {0}")]
    MaxMemoryNotPositive(f64),

    #[error("min_prefix_length must be >= 1, got {0}")]
    MinPrefixLengthTooSmall(usize),

    #[error("unknown eviction policy: {0}")]
    UnknownEvictionPolicy(String),
}

/// Errors raised by [`crate::store::CacheStore::store`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The capacity enforcer attempted more evictions than the store held
    /// entries at the start of admission and still could not make room.
    /// Indicates a logic bug, or an entry whose footprint alone exceeds the
    /// configured memory budget.
    #[error("capacity exhausted after {attempts} eviction attempts (entry needs {needed_bytes} bytes)")]
    CapacityExhausted { attempts: usize, needed_bytes: usize },
}
