//! Immutable lookup tables consumed by the merge engine.
//!
//! A [`RankTable`] maps mergeable byte sequences to their merge priority
//! (lower rank = merged earlier) and back. A [`SpecialTokens`] table maps
//! reserved literal strings to ids that never collide with a rank.
//!
//! Both tables are validated once at construction and expose no mutation
//! API afterwards, so a single instance can be shared behind an `Arc` by any
//! number of concurrent encode/decode calls.

use rustc_hash::{FxHashMap, FxHashSet};

use super::vocab::VocabError;

/// Merge priority of a byte sequence; doubles as its token id.
pub type Rank = u32;

/// Mergeable byte sequences and their ranks, with the inverse mapping.
#[derive(Debug, Clone)]
pub struct RankTable {
    encoder: FxHashMap<Vec<u8>, Rank>,
    decoder: FxHashMap<Rank, Vec<u8>>,
    max_rank: Rank,
}

impl RankTable {
    /// Build a table from a byte-sequence -> rank map.
    ///
    /// Fails with [`VocabError::InvalidVocabulary`] if a rank is used twice,
    /// a key is empty, or any of the 256 single bytes is missing.
    pub fn new(encoder: FxHashMap<Vec<u8>, Rank>) -> Result<Self, VocabError> {
        let mut decoder: FxHashMap<Rank, Vec<u8>> = FxHashMap::default();
        decoder.reserve(encoder.len());

        for (bytes, &rank) in &encoder {
            if bytes.is_empty() {
                return Err(VocabError::InvalidVocabulary(format!(
                    "empty byte sequence assigned rank {}",
                    rank
                )));
            }
            if let Some(existing) = decoder.insert(rank, bytes.clone()) {
                return Err(VocabError::InvalidVocabulary(format!(
                    "rank {} assigned to both {:?} and {:?}",
                    rank, existing, bytes
                )));
            }
        }

        if let Some(missing) = (0u8..=255).find(|b| !encoder.contains_key([*b].as_slice())) {
            return Err(VocabError::InvalidVocabulary(format!(
                "base byte 0x{:02x} has no rank",
                missing
            )));
        }

        let max_rank = decoder.keys().copied().max().unwrap_or(0);
        log::debug!(
            "rank table ready: {} entries, max rank {}",
            encoder.len(),
            max_rank
        );

        Ok(Self {
            encoder,
            decoder,
            max_rank,
        })
    }

    /// Build a table from `(bytes, rank)` pairs, rejecting repeated keys.
    pub fn from_entries<I>(entries: I) -> Result<Self, VocabError>
    where
        I: IntoIterator<Item = (Vec<u8>, Rank)>,
    {
        let mut encoder = FxHashMap::default();
        for (bytes, rank) in entries {
            if let Some(previous) = encoder.insert(bytes, rank) {
                return Err(VocabError::InvalidVocabulary(format!(
                    "byte sequence listed twice (ranks {} and {})",
                    previous, rank
                )));
            }
        }
        Self::new(encoder)
    }

    #[cfg(test)]
    pub(crate) fn unchecked(encoder: FxHashMap<Vec<u8>, Rank>) -> Self {
        let decoder: FxHashMap<Rank, Vec<u8>> =
            encoder.iter().map(|(k, v)| (*v, k.clone())).collect();
        let max_rank = decoder.keys().copied().max().unwrap_or(0);
        Self {
            encoder,
            decoder,
            max_rank,
        }
    }

    /// Rank of `bytes`, if it is a mergeable sequence.
    #[inline]
    pub fn get(&self, bytes: &[u8]) -> Option<Rank> {
        self.encoder.get(bytes).copied()
    }

    /// Byte sequence that was assigned `rank`.
    #[inline]
    pub fn get_bytes(&self, rank: Rank) -> Option<&[u8]> {
        self.decoder.get(&rank).map(Vec::as_slice)
    }

    #[inline]
    pub fn contains_rank(&self, rank: Rank) -> bool {
        self.decoder.contains_key(&rank)
    }

    pub fn len(&self) -> usize {
        self.encoder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoder.is_empty()
    }

    pub fn max_rank(&self) -> Rank {
        self.max_rank
    }

    /// The byte sequence -> rank map.
    pub fn encoder(&self) -> &FxHashMap<Vec<u8>, Rank> {
        &self.encoder
    }

    /// Every mergeable byte sequence, sorted bytewise.
    pub fn token_byte_values(&self) -> Vec<Vec<u8>> {
        let mut values: Vec<Vec<u8>> = self.encoder.keys().cloned().collect();
        values.sort_unstable();
        values
    }
}

/// Reserved literal strings and the ids they encode to.
#[derive(Debug, Clone, Default)]
pub struct SpecialTokens {
    encoder: FxHashMap<String, Rank>,
    decoder: FxHashMap<Rank, String>,
}

impl SpecialTokens {
    /// Build the table, checking it against the ranks it will be used with.
    ///
    /// Ids must be unique and must not be ranks of `ranks`; literals must be
    /// non-empty.
    pub fn new(encoder: FxHashMap<String, Rank>, ranks: &RankTable) -> Result<Self, VocabError> {
        let mut decoder: FxHashMap<Rank, String> = FxHashMap::default();
        decoder.reserve(encoder.len());

        for (literal, &id) in &encoder {
            if literal.is_empty() {
                return Err(VocabError::InvalidVocabulary(format!(
                    "empty special token literal for id {}",
                    id
                )));
            }
            if ranks.contains_rank(id) {
                return Err(VocabError::InvalidVocabulary(format!(
                    "special token {:?} reuses rank {}",
                    literal, id
                )));
            }
            if let Some(existing) = decoder.insert(id, literal.clone()) {
                return Err(VocabError::InvalidVocabulary(format!(
                    "special tokens {:?} and {:?} share id {}",
                    existing, literal, id
                )));
            }
        }

        Ok(Self { encoder, decoder })
    }

    #[inline]
    pub fn get(&self, literal: &str) -> Option<Rank> {
        self.encoder.get(literal).copied()
    }

    #[inline]
    pub fn get_literal(&self, id: Rank) -> Option<&str> {
        self.decoder.get(&id).map(String::as_str)
    }

    #[inline]
    pub fn contains_id(&self, id: Rank) -> bool {
        self.decoder.contains_key(&id)
    }

    pub fn literals(&self) -> impl Iterator<Item = &str> + '_ {
        self.encoder.keys().map(String::as_str)
    }

    pub fn literal_set(&self) -> FxHashSet<&str> {
        self.literals().collect()
    }

    pub fn max_id(&self) -> Option<Rank> {
        self.decoder.keys().copied().max()
    }

    pub fn len(&self) -> usize {
        self.encoder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoder.is_empty()
    }

    pub fn encoder(&self) -> &FxHashMap<String, Rank> {
        &self.encoder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn byte_ranks() -> FxHashMap<Vec<u8>, Rank> {
        (0u8..=255).map(|b| (vec![b], b as Rank)).collect()
    }

    #[test]
    fn test_rank_lookup_both_ways() {
        let mut encoder = byte_ranks();
        encoder.insert(b"ab".to_vec(), 256);
        let table = RankTable::new(encoder).unwrap();

        assert_eq!(table.get(b"ab"), Some(256));
        assert_eq!(table.get(b"a"), Some(b'a' as Rank));
        assert_eq!(table.get(b"abc"), None);
        assert_eq!(table.get_bytes(256), Some(b"ab".as_slice()));
        assert_eq!(table.get_bytes(9999), None);
        assert_eq!(table.max_rank(), 256);
        assert_eq!(table.len(), 257);
    }

    #[test]
    fn test_missing_base_byte_rejected() {
        let mut encoder = byte_ranks();
        encoder.remove([0x7fu8].as_slice());
        let err = RankTable::new(encoder).unwrap_err();
        assert!(matches!(err, VocabError::InvalidVocabulary(_)));
        assert!(err.to_string().contains("0x7f"));
    }

    #[test]
    fn test_duplicate_rank_rejected() {
        let mut encoder = byte_ranks();
        encoder.insert(b"ab".to_vec(), 3);
        assert!(matches!(
            RankTable::new(encoder),
            Err(VocabError::InvalidVocabulary(_))
        ));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut entries: Vec<(Vec<u8>, Rank)> = byte_ranks().into_iter().collect();
        entries.push((b"ab".to_vec(), 256));
        entries.push((b"ab".to_vec(), 257));
        assert!(matches!(
            RankTable::from_entries(entries),
            Err(VocabError::InvalidVocabulary(_))
        ));
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut encoder = byte_ranks();
        encoder.insert(Vec::new(), 300);
        assert!(RankTable::new(encoder).is_err());
    }

    #[test]
    fn test_token_byte_values_sorted() {
        let mut encoder = byte_ranks();
        encoder.insert(b"zz".to_vec(), 256);
        encoder.insert(b"ab".to_vec(), 257);
        let values = RankTable::new(encoder).unwrap().token_byte_values();
        assert_eq!(values.len(), 258);
        assert!(values.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_special_tokens_disjoint_from_ranks() {
        let table = RankTable::new(byte_ranks()).unwrap();

        let mut ok = FxHashMap::default();
        ok.insert("<|endoftext|>".to_string(), 1000);
        let special = SpecialTokens::new(ok, &table).unwrap();
        assert_eq!(special.get("<|endoftext|>"), Some(1000));
        assert_eq!(special.get_literal(1000), Some("<|endoftext|>"));
        assert_eq!(special.max_id(), Some(1000));

        let mut clash = FxHashMap::default();
        clash.insert("<|endoftext|>".to_string(), 65);
        assert!(SpecialTokens::new(clash, &table).is_err());
    }

    #[test]
    fn test_special_tokens_shared_id_rejected() {
        let table = RankTable::new(byte_ranks()).unwrap();
        let mut shared = FxHashMap::default();
        shared.insert("<|a|>".to_string(), 500);
        shared.insert("<|b|>".to_string(), 500);
        assert!(SpecialTokens::new(shared, &table).is_err());
    }
}
