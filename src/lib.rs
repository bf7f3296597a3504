//! prefix-cache: an in-process prefix-sharing cache for token sequences.
//!
//! Indexes token sequences in a compressed prefix tree so that a new
//! sequence sharing a long prefix with something already cached can reuse
//! the cached artifact for that prefix instead of recomputing it. Built
//! for LLM-serving style workloads where the artifact is an opaque KV
//! cache handle, but the core is agnostic to what `A` actually holds.
//!
//! # Example
//!
//! ```
//! use prefix_cache::config::CacheConfig;
//! use prefix_cache::store::CacheStore;
//!
//! let mut store: CacheStore<Vec<u8>> = CacheStore::new(CacheConfig::default());
//! store.store(&[1, 2, 3, 4, 5], vec![0u8; 64], None).unwrap();
//!
//! let result = store.lookup(&[1, 2, 3, 4, 5, 6, 7]);
//! assert!(result.hit);
//! assert_eq!(result.matched_length, 5);
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod index;
pub mod key;
pub mod store;
pub mod sync;
pub mod telemetry;

pub use batch::{BatchAnalysis, BatchAnalyzer, SharedPrefixGroup};
pub use config::{CacheConfig, EvictionPolicy};
pub use entry::CacheEntry;
pub use error::{ConfigError, StoreError};
pub use key::Token;
pub use store::{CacheStats, CacheStore, PrefixMatch};
pub use sync::SharedCacheStore;
