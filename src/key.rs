//! Content-address key derivation for token sequences.
//!
//! A key is a deterministic 16-hex-character identifier derived from the
//! big-endian two's-complement encoding of a token sequence under SHA-256.
//! This is for identification and indexing, not for security: the digest is
//! truncated to 64 bits, which is acceptable for caching but not for
//! adversarial collision resistance.

use sha2::{Digest, Sha256};

/// A signed 32-bit token identifier.
pub type Token = i32;

/// Number of hex characters kept from the SHA-256 digest (64 bits).
const KEY_HEX_LEN: usize = 16;

/// Compute the content-address key for a token sequence.
///
/// Two calls with the same `tokens` always return the same key. Distinct
/// token sequences are assumed to produce distinct keys (collision
/// probability 2⁻⁶⁴).
pub fn content_address(tokens: &[Token]) -> String {
    let mut hasher = Sha256::new();
    for &t in tokens {
        hasher.update(t.to_be_bytes());
    }
    let digest = hasher.finalize();
    hex::encode(digest)[..KEY_HEX_LEN].to_string()
}

/// Compute the short (8 hex character) group identifier used by the batch
/// analyzer to label a shared-prefix group.
pub fn content_address_short(tokens: &[Token]) -> String {
    content_address(tokens)[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = content_address(&[1, 2, 3, 4, 5]);
        let b = content_address(&[1, 2, 3, 4, 5]);
        assert_eq!(a, b);
    }

    #[test]
    fn key_length_is_sixteen() {
        assert_eq!(content_address(&[1, 2, 3]).len(), 16);
        assert_eq!(content_address(&[]).len(), 16);
    }

    #[test]
    fn distinct_sequences_differ() {
        let a = content_address(&[1, 2, 3]);
        let b = content_address(&[1, 2, 4]);
        let c = content_address(&[1, 2, 3, 4]);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn negative_tokens_encode_distinctly() {
        let a = content_address(&[-1, 2]);
        let b = content_address(&[1, -2]);
        assert_ne!(a, b);
    }

    #[test]
    fn short_key_is_prefix_of_full_key() {
        let full = content_address(&[7, 8, 9]);
        let short = content_address_short(&[7, 8, 9]);
        assert_eq!(short.len(), 8);
        assert_eq!(&full[..8], short);
    }
}
