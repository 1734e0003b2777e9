//! Synthetic vocabularies shared by the integration tests.

#![allow(dead_code)]

use rankbpe::{Rank, Tokenizer, GPT2_PATTERN};
use rustc_hash::FxHashMap;

pub const EOT: Rank = 100_000;

/// The 256 single bytes, ranked by byte value.
pub fn byte_ranks() -> FxHashMap<Vec<u8>, Rank> {
    (0u8..=255).map(|b| (vec![b], b as Rank)).collect()
}

/// A rank table in which every word is reachable by growing it one byte at
/// a time from the left: "Air" adds "Ai" then "Air".
pub fn prefix_chain_ranks(words: &[&str]) -> FxHashMap<Vec<u8>, Rank> {
    let mut ranks = byte_ranks();
    let mut next: Rank = 256;
    for word in words {
        let bytes = word.as_bytes();
        for end in 2..=bytes.len() {
            ranks.entry(bytes[..end].to_vec()).or_insert_with(|| {
                next += 1;
                next - 1
            });
        }
    }
    ranks
}

/// GPT-2 style tokenizer over `prefix_chain_ranks(words)` with `<|endoftext|>`.
pub fn tokenizer_for_words(words: &[&str]) -> Tokenizer {
    let mut special = FxHashMap::default();
    special.insert("<|endoftext|>".to_string(), EOT);
    Tokenizer::new(prefix_chain_ranks(words), special, GPT2_PATTERN).unwrap()
}

/// Vocabulary used by the dropout scenarios.
pub fn scenario_tokenizer() -> Tokenizer {
    tokenizer_for_words(&["SwissAir", "Vincenzo", " Timmel", " the", "the"])
}

/// A denser vocabulary over a small alphabet, for property tests.
pub fn dense_tokenizer() -> Tokenizer {
    let letters = ["a", "b", "c", " "];
    let mut merges: Vec<String> = Vec::new();
    for x in letters {
        for y in letters {
            merges.push(format!("{}{}", x, y));
        }
    }
    for word in ["abc", "cab", "bca", " ab", " abc", "aaaa", "abab", "cccc"] {
        merges.push(word.to_string());
    }
    let words: Vec<&str> = merges.iter().map(String::as_str).collect();
    tokenizer_for_words(&words)
}
