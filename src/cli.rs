//! Command-line interface.
//!
//! Two subcommands: `analyze` runs batch prefix-sharing analysis over a
//! list of prompts with no cache side effects, `demo` runs a sequence of
//! prompts through a live [`crate::store::CacheStore`] and reports hit
//! statistics. Both use a whitespace-hash tokenizer that stands in for a
//! real tokenizer — good enough to exercise prefix sharing, not a
//! tokenization model.

use clap::{Parser, Subcommand};

use crate::batch::BatchAnalysis;
use crate::config::{CacheConfig, EvictionPolicy};
use crate::key::Token;
use crate::store::{CacheStats, CacheStore};
use crate::telemetry::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "prefix-cache", about = "Prefix-sharing cache engine for token sequences")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log output format.
    #[arg(long, global = true, default_value = "json")]
    pub log_format: LogFormat,

    /// Log level filter.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze prefix-sharing potential across prompts, without storing
    /// anything.
    Analyze {
        /// Prompts to analyze.
        #[arg(required = true)]
        prompts: Vec<String>,

        /// Minimum prefix length in tokens.
        #[arg(long, default_value_t = 4)]
        min_prefix: usize,
    },
    /// Run prompts through a live cache and report hit statistics.
    Demo {
        /// Prompts to process, in order.
        #[arg(required = true)]
        prompts: Vec<String>,

        /// Maximum cache entries.
        #[arg(long, default_value_t = 1000)]
        max_entries: usize,

        /// Minimum prefix length in tokens.
        #[arg(long, default_value_t = 4)]
        min_prefix: usize,
    },
}

impl clap::ValueEnum for LogFormat {
    fn value_variants<'a>() -> &'a [Self] {
        &[LogFormat::Json, LogFormat::Pretty]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            LogFormat::Json => clap::builder::PossibleValue::new("json"),
            LogFormat::Pretty => clap::builder::PossibleValue::new("pretty"),
        })
    }
}

/// Whitespace-split, hash-based demonstration tokenizer. Not a real
/// tokenizer: two different words can collide into the same token, and
/// the mapping has no relationship to any real model's vocabulary.
pub fn tokenize_simple(text: &str) -> Vec<Token> {
    text.split_whitespace().map(|word| (fnv1a(word) % 100_000) as Token).collect()
}

fn fnv1a(s: &str) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    s.bytes().fold(OFFSET_BASIS, |hash, byte| (hash ^ byte as u64).wrapping_mul(PRIME))
}

/// Run the `analyze` subcommand, returning the formatted report.
pub fn run_analyze(prompts: &[String], min_prefix: usize) -> String {
    let config = CacheConfig { min_prefix_length: min_prefix, ..CacheConfig::default() };
    let store: CacheStore<()> = CacheStore::new(config);
    let sequences: Vec<Vec<Token>> = prompts.iter().map(|p| tokenize_simple(p)).collect();
    let analysis = store.analyze_batch(&sequences);
    format_batch_analysis(&analysis)
}

/// Run the `demo` subcommand, returning the per-prompt trace lines
/// followed by the final stats report.
pub fn run_demo(prompts: &[String], max_entries: usize, min_prefix: usize) -> String {
    let config = CacheConfig {
        max_entries,
        min_prefix_length: min_prefix,
        eviction_policy: EvictionPolicy::Recency,
        ..CacheConfig::default()
    };
    let mut store: CacheStore<()> = CacheStore::new(config);
    let mut lines = vec![format!("Processing {} prompts...\n", prompts.len())];

    for prompt in prompts {
        let tokens = tokenize_simple(prompt);
        let preview: String = prompt.chars().take(50).collect();
        let result = store.lookup(&tokens);

        if result.hit {
            lines.push(format!(
                "HIT:  '{preview}...' ({}/{} tokens cached)",
                result.matched_length, result.total_length
            ));
        } else {
            let len = tokens.len();
            store.store(&tokens, (), None).expect("demo store never exceeds capacity by a single entry's footprint alone");
            lines.push(format!("MISS: '{preview}...' ({len} tokens stored)"));
        }
    }

    lines.push(String::new());
    lines.push(format_stats_report(&store.stats()));
    lines.join("\n")
}

/// Format cache statistics as a human-readable report.
pub fn format_stats_report(stats: &CacheStats) -> String {
    let lines = [
        "=== Prefix Cache Statistics ===".to_string(),
        format!("Entries:          {}", stats.entries_count),
        format!("Memory Used:      {:.2} MB", stats.memory_used_mb),
        format!("Total Lookups:    {}", stats.total_lookups),
        format!("Cache Hits:       {}", stats.cache_hits),
        format!("Cache Misses:     {}", stats.cache_misses),
        format!("Hit Rate:         {:.1}%", stats.hit_rate() * 100.0),
        format!("Tokens Served:    {}", stats.total_tokens_served),
        format!("Tokens Requested: {}", stats.total_tokens_requested),
        format!("Token Savings:    {:.1}%", stats.token_savings_rate() * 100.0),
        format!("Evictions:        {}", stats.evictions),
        "===============================".to_string(),
    ];
    lines.join("\n")
}

/// Format a batch analysis as a human-readable report.
pub fn format_batch_analysis(analysis: &BatchAnalysis) -> String {
    let mut lines = vec![
        "=== Batch Prefix Analysis ===".to_string(),
        format!("Batch Size:       {}", analysis.batch_size),
        format!("Unique Prefixes:  {}", analysis.unique_prefixes),
        format!("Total Tokens:     {}", analysis.total_tokens),
        format!("Saveable Tokens:  {}", analysis.potential_savings_tokens),
        format!("Dedup Ratio:      {:.1}%", analysis.dedup_ratio() * 100.0),
        format!("Unassigned:       {}", analysis.unassigned_count),
    ];

    if !analysis.groups.is_empty() {
        lines.push("Groups:".to_string());
        for group in &analysis.groups {
            lines.push(format!(
                "  {}: {} prompts, prefix length {}",
                group.group_id,
                group.member_indices.len(),
                group.prefix_length
            ));
        }
    }

    lines.push("==============================".to_string());
    lines.join("\n")
}
