//! rankbpe - byte-pair encoding over ranked vocabularies, with merge dropout.
//!
//! Encodes text the way tiktoken does: regex pre-segmentation, special-token
//! literals split out with Aho-Corasick, and each piece reduced by repeatedly
//! merging its lowest-ranked adjacent pair. Passing a dropout probability
//! `p` skips each eligible merge with probability `p` (BPE-dropout), which
//! yields alternative segmentations for training-time augmentation.
//!
//! ```no_run
//! use rankbpe::get_encoding;
//!
//! let enc = get_encoding("cl100k_base").unwrap();
//! let plain = enc.encode("Vincenzo Timmel").unwrap();
//! let bytes = enc.encode_with_dropout("Vincenzo Timmel", 1.0).unwrap();
//! assert_eq!(bytes.len(), "Vincenzo Timmel".len());
//! assert_ne!(plain, bytes);
//! ```

pub mod core;

pub use crate::core::{
    bpe, byte_level, ranks, registry, vocab, BpeError, DrawSource, DropoutProb, EncodeOptions,
    Rank, RankTable, Segment, SpecialSet, SpecialTokens, Tokenizer, TokenizerError, VocabError,
    CL100K_BASE_PATTERN, GPT2_PATTERN, LARGE_PIECE_LEN,
};
pub use crate::core::{
    encoding_for_model, encoding_name_for_model, get_encoding, list_encoding_names,
};
