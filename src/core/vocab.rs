//! Vocabulary loading for rank tables.
//!
//! Two on-disk formats are understood.
//!
//! # Tiktoken Format
//!
//! One entry per line: a base64-encoded byte sequence, a space, and the
//! integer rank of that sequence.
//!
//! ```text
//! IQ== 0
//! Ig== 1
//! aGVsbG8= 9906
//! ```
//!
//! Lower ranks are merged first. The file is usually fetched once and kept in
//! a cache directory, so [`load_tiktoken_bpe_verified`] checks its SHA-256
//! digest before trusting it.
//!
//! # Data-gym Format
//!
//! The format GPT-2 was published in: a `vocab.bpe` list of merges (one
//! `left right` pair per line after a version header) and an optional
//! `encoder.json` token -> id map. Both spell bytes in the byte-level
//! alphabet of [`super::byte_level`].

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::byte_level::{byte_level_decode, byte_level_rank_order};
use super::ranks::Rank;

/// Errors that can occur when loading or validating vocabularies.
#[derive(Error, Debug)]
pub enum VocabError {
    #[error("Invalid base64 encoding: {0}")]
    Base64Error(#[from] base64::DecodeError),
    #[error("Invalid line format: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
    #[error("Invalid vocabulary: {0}")]
    InvalidVocabulary(String),
}

/// Load a tiktoken BPE vocabulary from raw bytes.
///
/// Blank lines (and a trailing `\r`) are ignored. A byte sequence listed
/// twice is rejected.
pub fn load_tiktoken_bpe(data: &[u8]) -> Result<FxHashMap<Vec<u8>, Rank>, VocabError> {
    let mut encoder = FxHashMap::default();

    for (line_no, line) in data.split(|&b| b == b'\n').enumerate() {
        let line = line.trim_ascii();
        if line.is_empty() {
            continue;
        }

        let space_pos = line.iter().rposition(|&b| b == b' ').ok_or_else(|| {
            VocabError::ParseError(format!("line {}: missing space separator", line_no + 1))
        })?;

        let token = STANDARD.decode(&line[..space_pos])?;

        let rank_str = std::str::from_utf8(&line[space_pos + 1..]).map_err(|_| {
            VocabError::ParseError(format!("line {}: invalid UTF-8 in rank", line_no + 1))
        })?;
        let rank: Rank = rank_str.parse().map_err(|_| {
            VocabError::ParseError(format!("line {}: invalid rank {:?}", line_no + 1, rank_str))
        })?;

        if let Some(previous) = encoder.insert(token, rank) {
            return Err(VocabError::InvalidVocabulary(format!(
                "line {}: byte sequence already has rank {}",
                line_no + 1,
                previous
            )));
        }
    }

    Ok(encoder)
}

/// Load a tiktoken BPE vocabulary from a file path.
pub fn load_tiktoken_bpe_file(
    path: impl AsRef<Path>,
) -> Result<FxHashMap<Vec<u8>, Rank>, VocabError> {
    let data = std::fs::read(path)?;
    load_tiktoken_bpe(&data)
}

/// Load a tiktoken BPE vocabulary after checking its SHA-256 digest.
///
/// `expected_hash` is compared case-insensitively against the lowercase hex
/// digest of `data`.
pub fn load_tiktoken_bpe_verified(
    data: &[u8],
    expected_hash: &str,
) -> Result<FxHashMap<Vec<u8>, Rank>, VocabError> {
    let actual = sha256_hex(data);
    if !actual.eq_ignore_ascii_case(expected_hash) {
        return Err(VocabError::HashMismatch {
            expected: expected_hash.to_string(),
            actual,
        });
    }
    log::debug!("vocabulary hash verified: {}", actual);
    load_tiktoken_bpe(data)
}

/// Lowercase hex SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Serialize a rank map in tiktoken format, ordered by rank.
pub fn dump_tiktoken_bpe(ranks: &FxHashMap<Vec<u8>, Rank>) -> String {
    let mut entries: Vec<(&Vec<u8>, &Rank)> = ranks.iter().collect();
    entries.sort_unstable_by_key(|(_, &rank)| rank);

    let mut out = String::new();
    for (bytes, rank) in entries {
        out.push_str(&STANDARD.encode(bytes));
        out.push(' ');
        out.push_str(&rank.to_string());
        out.push('\n');
    }
    out
}

/// Write a rank map to `path` in tiktoken format.
pub fn dump_tiktoken_bpe_file(
    ranks: &FxHashMap<Vec<u8>, Rank>,
    path: impl AsRef<Path>,
) -> Result<(), VocabError> {
    std::fs::write(path, dump_tiktoken_bpe(ranks))?;
    Ok(())
}

/// Build a rank map from GPT-2's data-gym files.
///
/// The 256 single bytes take ranks 0..=255 in byte-level alphabet order; each
/// merge line of `vocab_bpe` (after the version header) then takes the next
/// rank. If `encoder_json` is given, the result must agree with it exactly
/// once its `<|endoftext|>` and `<|startoftext|>` entries are removed.
pub fn data_gym_to_mergeable_bpe_ranks(
    vocab_bpe: &str,
    encoder_json: Option<&str>,
) -> Result<FxHashMap<Vec<u8>, Rank>, VocabError> {
    let mut bpe_ranks: FxHashMap<Vec<u8>, Rank> = FxHashMap::default();
    for (rank, b) in byte_level_rank_order().into_iter().enumerate() {
        bpe_ranks.insert(vec![b], rank as Rank);
    }

    // First line is the version header; the last element is what follows the
    // final newline.
    let lines: Vec<&str> = vocab_bpe.split('\n').collect();
    let merges = lines.get(1..lines.len().saturating_sub(1)).unwrap_or(&[]);

    let mut next_rank = bpe_ranks.len() as Rank;
    for (i, line) in merges.iter().enumerate() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let [left, right] = parts.as_slice() else {
            return Err(VocabError::ParseError(format!(
                "vocab.bpe line {}: expected two symbols, got {:?}",
                i + 2,
                line
            )));
        };
        let mut merged = decode_data_gym(left)?;
        merged.extend(decode_data_gym(right)?);
        bpe_ranks.insert(merged, next_rank);
        next_rank += 1;
    }

    if let Some(json) = encoder_json {
        let mut encoder: FxHashMap<String, Rank> = serde_json::from_str(json)?;
        encoder.remove("<|endoftext|>");
        encoder.remove("<|startoftext|>");

        let loaded = encoder
            .into_iter()
            .map(|(symbol, rank)| Ok((decode_data_gym(&symbol)?, rank)))
            .collect::<Result<FxHashMap<Vec<u8>, Rank>, VocabError>>()?;

        if loaded != bpe_ranks {
            return Err(VocabError::InvalidVocabulary(format!(
                "encoder.json ({} entries) disagrees with vocab.bpe ({} entries)",
                loaded.len(),
                bpe_ranks.len()
            )));
        }
    }

    log::debug!("data-gym vocabulary: {} ranks", bpe_ranks.len());
    Ok(bpe_ranks)
}

fn decode_data_gym(symbol: &str) -> Result<Vec<u8>, VocabError> {
    byte_level_decode(symbol).ok_or_else(|| {
        VocabError::ParseError(format!("symbol {:?} is outside the byte-level alphabet", symbol))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_tiktoken_bpe() {
        // "Hello" base64 = "SGVsbG8="
        // "World" base64 = "V29ybGQ="
        let data = b"SGVsbG8= 0\nV29ybGQ= 1\n";
        let encoder = load_tiktoken_bpe(data).unwrap();

        assert_eq!(encoder.get(b"Hello".as_slice()), Some(&0));
        assert_eq!(encoder.get(b"World".as_slice()), Some(&1));
        assert_eq!(encoder.len(), 2);
    }

    #[test]
    fn test_load_tolerates_crlf_and_blank_lines() {
        let data = b"SGVsbG8= 0\r\n\r\n\nV29ybGQ= 1";
        let encoder = load_tiktoken_bpe(data).unwrap();
        assert_eq!(encoder.len(), 2);
        assert_eq!(encoder.get(b"World".as_slice()), Some(&1));
    }

    #[test]
    fn test_load_rejects_malformed_lines() {
        assert!(matches!(
            load_tiktoken_bpe(b"SGVsbG8=\n"),
            Err(VocabError::ParseError(_))
        ));
        assert!(matches!(
            load_tiktoken_bpe(b"SGVsbG8= x\n"),
            Err(VocabError::ParseError(_))
        ));
        assert!(matches!(
            load_tiktoken_bpe(b"!!!! 0\n"),
            Err(VocabError::Base64Error(_))
        ));
    }

    #[test]
    fn test_load_rejects_duplicate_sequence() {
        let err = load_tiktoken_bpe(b"SGVsbG8= 0\nSGVsbG8= 1\n").unwrap_err();
        assert!(matches!(err, VocabError::InvalidVocabulary(_)));
    }

    #[test]
    fn test_dump_then_load() {
        let mut ranks = FxHashMap::default();
        ranks.insert(b"b".to_vec(), 1);
        ranks.insert(b"a".to_vec(), 0);
        ranks.insert(b"ab".to_vec(), 2);

        let dumped = dump_tiktoken_bpe(&ranks);
        assert_eq!(dumped, "YQ== 0\nYg== 1\nYWI= 2\n");
        assert_eq!(load_tiktoken_bpe(dumped.as_bytes()).unwrap(), ranks);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.tiktoken");
        let mut ranks = FxHashMap::default();
        ranks.insert(b"x".to_vec(), 7);
        dump_tiktoken_bpe_file(&ranks, &path).unwrap();
        assert_eq!(load_tiktoken_bpe_file(&path).unwrap(), ranks);

        assert!(matches!(
            load_tiktoken_bpe_file(dir.path().join("missing.tiktoken")),
            Err(VocabError::IoError(_))
        ));
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_verified_load() {
        let data = b"YQ== 0\n";
        let hash = sha256_hex(data);
        assert_eq!(load_tiktoken_bpe_verified(data, &hash).unwrap().len(), 1);
        assert_eq!(
            load_tiktoken_bpe_verified(data, &hash.to_uppercase())
                .unwrap()
                .len(),
            1
        );

        match load_tiktoken_bpe_verified(data, "00") {
            Err(VocabError::HashMismatch { expected, actual }) => {
                assert_eq!(expected, "00");
                assert_eq!(actual, hash);
            }
            other => panic!("expected hash mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_data_gym_merges() {
        // \u{0120} is the byte-level spelling of a space.
        let vocab_bpe = "#version: 0.2\n\u{0120} t\nh e\n\u{0120}t he\n";
        let ranks = data_gym_to_mergeable_bpe_ranks(vocab_bpe, None).unwrap();

        assert_eq!(ranks.len(), 259);
        assert_eq!(ranks.get(b"!".as_slice()), Some(&0));
        assert_eq!(ranks.get(b" ".as_slice()), Some(&220));
        assert_eq!(ranks.get(b" t".as_slice()), Some(&256));
        assert_eq!(ranks.get(b"he".as_slice()), Some(&257));
        assert_eq!(ranks.get(b" the".as_slice()), Some(&258));
    }

    #[test]
    fn test_data_gym_rejects_bad_merge_line() {
        let vocab_bpe = "#version: 0.2\na b c\n";
        assert!(matches!(
            data_gym_to_mergeable_bpe_ranks(vocab_bpe, None),
            Err(VocabError::ParseError(_))
        ));
    }

    #[test]
    fn test_data_gym_encoder_json_cross_check() {
        let vocab_bpe = "#version: 0.2\na b\n";
        let ranks = data_gym_to_mergeable_bpe_ranks(vocab_bpe, None).unwrap();

        let mut json: serde_json::Map<String, serde_json::Value> = ranks
            .iter()
            .map(|(bytes, rank)| {
                (
                    crate::core::byte_level::byte_level_encode(bytes),
                    serde_json::Value::from(*rank),
                )
            })
            .collect();
        json.insert("<|endoftext|>".to_string(), serde_json::Value::from(257));
        let text = serde_json::Value::Object(json.clone()).to_string();
        assert_eq!(
            data_gym_to_mergeable_bpe_ranks(vocab_bpe, Some(&text)).unwrap(),
            ranks
        );

        json.insert("ba".to_string(), serde_json::Value::from(300));
        let text = serde_json::Value::Object(json).to_string();
        assert!(matches!(
            data_gym_to_mergeable_bpe_ranks(vocab_bpe, Some(&text)),
            Err(VocabError::InvalidVocabulary(_))
        ));
    }
}
