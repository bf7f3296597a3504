//! Batch prefix-sharing analysis.
//!
//! Given a batch of token sequences about to be processed together (e.g.
//! a scheduler's next micro-batch), finds sequences that share a common
//! prefix long enough to be worth serving from a single cached entry, and
//! estimates the token-processing savings from doing so.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::key::{content_address_short, Token};

/// One group of batch indices that share a common prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedPrefixGroup {
    /// Short content-address of the shared prefix.
    pub group_id: String,
    /// Length of the shared prefix, in tokens.
    pub prefix_length: usize,
    /// Indices into the original batch that share this prefix.
    pub member_indices: Vec<usize>,
}

/// Result of analyzing a batch for prefix-sharing potential.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchAnalysis {
    /// Number of sequences in the batch.
    pub batch_size: usize,
    /// Sum of the lengths of every sequence in the batch.
    pub total_tokens: usize,
    /// Number of shared-prefix groups found.
    pub unique_prefixes: usize,
    /// Tokens saved by processing each group's shared prefix once instead
    /// of once per member.
    pub potential_savings_tokens: u64,
    pub groups: Vec<SharedPrefixGroup>,
    /// Number of sequences in the batch that were not assigned to any
    /// group.
    pub unassigned_count: usize,
}

impl BatchAnalysis {
    /// Fraction of the batch's tokens reclaimable via prefix sharing;
    /// zero when the batch has no tokens.
    pub fn dedup_ratio(&self) -> f64 {
        if self.total_tokens == 0 {
            0.0
        } else {
            self.potential_savings_tokens as f64 / self.total_tokens as f64
        }
    }
}

/// Stateless analyzer over a batch of token sequences.
pub struct BatchAnalyzer;

impl BatchAnalyzer {
    /// Analyze `sequences` for prefix-sharing opportunities, considering
    /// only prefixes of at least `min_prefix_length` tokens.
    ///
    /// Sequences are grouped by every prefix length from longest to
    /// shortest; a group forms only when at least two still-unassigned
    /// sequences share a prefix, and once a sequence is assigned to a
    /// group it is not reconsidered for a shorter one. Savings for a
    /// group are the sum of its members' shared-prefix lengths minus the
    /// single longest one (the one copy that must still be computed),
    /// summed across all groups and floored at zero.
    pub fn analyze(sequences: &[Vec<Token>], min_prefix_length: usize) -> BatchAnalysis {
        let n = sequences.len();
        let total_tokens: usize = sequences.iter().map(|s| s.len()).sum();

        if n < 2 {
            return BatchAnalysis { batch_size: n, total_tokens, unassigned_count: n, ..Default::default() };
        }

        let max_len = sequences.iter().map(|s| s.len()).max().unwrap_or(0);
        let mut assigned = vec![false; n];
        let mut groups = Vec::new();
        let mut total_savings: i64 = 0;

        let mut prefix_len = max_len;
        while prefix_len >= min_prefix_length && prefix_len > 0 {
            let mut buckets: HashMap<&[Token], Vec<usize>> = HashMap::new();

            for (idx, seq) in sequences.iter().enumerate() {
                if assigned[idx] || seq.len() < prefix_len {
                    continue;
                }
                buckets.entry(&seq[..prefix_len]).or_default().push(idx);
            }

            let mut bucket_list: Vec<(&[Token], Vec<usize>)> = buckets.into_iter().collect();
            // Deterministic ordering: by first member index.
            bucket_list.sort_by_key(|(_, members)| members[0]);

            for (prefix, members) in bucket_list {
                if members.len() < 2 {
                    continue;
                }
                for &idx in &members {
                    assigned[idx] = true;
                }

                let member_lengths_sum: usize = members.len() * prefix_len;
                let savings = member_lengths_sum.saturating_sub(prefix_len);
                total_savings += savings as i64;

                groups.push(SharedPrefixGroup {
                    group_id: content_address_short(prefix),
                    prefix_length: prefix_len,
                    member_indices: members,
                });
            }

            prefix_len -= 1;
        }

        let unassigned_count = assigned.iter().filter(|&&a| !a).count();

        BatchAnalysis {
            batch_size: n,
            total_tokens,
            unique_prefixes: groups.len(),
            potential_savings_tokens: total_savings.max(0) as u64,
            groups,
            unassigned_count,
        }
    }
}
