//! Cache store configuration.
//!
//! All fields are validated exclusively at construction (`CacheConfig::new`
//! or `CacheConfig::from_env`); an invalid configuration never produces a
//! `CacheStore`.

use crate::error::ConfigError;

/// Bytes attributed to a token's KV state when the caller supplies no
/// explicit footprint.
pub const BYTES_PER_TOKEN: usize = 2048;

/// Which entry a full store evicts to make room for a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Evict the least-recently-accessed entry.
    #[default]
    Recency,
    /// Evict the entry with the lowest `access_count`, ties broken by
    /// recency order (earliest-accessed first).
    Frequency,
}

impl EvictionPolicy {
    fn parse(s: &str) -> Result<Self, ConfigError> {
        match s {
            "recency" | "lru" => Ok(Self::Recency),
            "frequency" | "lfu" => Ok(Self::Frequency),
            other => Err(ConfigError::UnknownEvictionPolicy(other.to_string())),
        }
    }
}

/// Validated configuration for a [`crate::store::CacheStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Hard cap on live entries.
    pub max_entries: usize,
    /// Hard cap on aggregate byte footprint, in mebibytes.
    pub max_memory_mb: f64,
    /// Age in fractional seconds after which an entry is invalidated on
    /// access. Zero (or negative) disables TTL. Sub-second values are
    /// meaningful and enforced.
    pub default_ttl_seconds: f64,
    /// Eviction policy used when capacity must be reclaimed.
    pub eviction_policy: EvictionPolicy,
    /// Minimum token count to admit a `store` call or report in
    /// `analyze_batch`.
    pub min_prefix_length: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            max_memory_mb: 1024.0,
            default_ttl_seconds: 0.0,
            eviction_policy: EvictionPolicy::Recency,
            min_prefix_length: 4,
        }
    }
}

impl CacheConfig {
    /// Construct and validate a configuration, returning `Err` on the
    /// first violated constraint.
    pub fn new(
        max_entries: usize,
        max_memory_mb: f64,
        default_ttl_seconds: f64,
        eviction_policy: EvictionPolicy,
        min_prefix_length: usize,
    ) -> Result<Self, ConfigError> {
        let cfg = Self {
            max_entries,
            max_memory_mb,
            default_ttl_seconds,
            eviction_policy,
            min_prefix_length,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate an already-built configuration (used by `new` and by
    /// `from_env`, which builds the struct directly from parsed fields).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries < 1 {
            return Err(ConfigError::MaxEntriesTooSmall(self.max_entries));
        }
        if !(self.max_memory_mb > 0.0) {
            return Err(ConfigError::MaxMemoryNotPositive(self.max_memory_mb));
        }
        if self.min_prefix_length < 1 {
            return Err(ConfigError::MinPrefixLengthTooSmall(self.min_prefix_length));
        }
        Ok(())
    }

    /// Byte budget in bytes (`max_memory_mb × 2²⁰`).
    pub fn max_memory_bytes(&self) -> usize {
        (self.max_memory_mb * (1024.0 * 1024.0)) as usize
    }

    /// Load configuration overrides from `PREFIX_CACHE_*` environment
    /// variables, falling back to [`CacheConfig::default`] values for any
    /// variable that is missing or fails to parse.
    ///
    /// Mirrors this codebase's convention elsewhere of tolerant env-var
    /// configuration loading rather than hard failure on a bad override.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let max_entries = parse_env_var("PREFIX_CACHE_MAX_ENTRIES", defaults.max_entries);
        let max_memory_mb = parse_env_var("PREFIX_CACHE_MAX_MEMORY_MB", defaults.max_memory_mb);
        let default_ttl_seconds =
            parse_env_var("PREFIX_CACHE_DEFAULT_TTL_SECONDS", defaults.default_ttl_seconds);
        let min_prefix_length =
            parse_env_var("PREFIX_CACHE_MIN_PREFIX_LENGTH", defaults.min_prefix_length);
        let eviction_policy = std::env::var("PREFIX_CACHE_EVICTION_POLICY")
            .ok()
            .and_then(|s| EvictionPolicy::parse(&s).ok())
            .unwrap_or(defaults.eviction_policy);

        Self::new(
            max_entries,
            max_memory_mb,
            default_ttl_seconds,
            eviction_policy,
            min_prefix_length,
        )
    }
}

/// Parse an environment variable into `T`, returning `default` on missing
/// or invalid values.
fn parse_env_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
