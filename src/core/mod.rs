//! Core tokenization engine for rankbpe.
//!
//! # Architecture
//!
//! - [`ranks`]: immutable rank table and special-token table
//! - [`bpe`]: the byte-pair merge engine, with optional merge dropout
//! - [`Tokenizer`]: regex pre-segmentation, special-token handling, encode
//!   and decode over shared tables
//! - [`vocab`]: rank-table loaders for the tiktoken and data-gym formats
//! - [`registry`]: the published encodings and model-name lookup
//!
//! # Performance Notes
//!
//! - **FxHashMap**: faster hashing than the standard `HashMap` for byte keys
//! - **Aho-Corasick**: one pass over the input for all special literals
//! - **Heap merge**: pieces of [`LARGE_PIECE_LEN`] bytes or more avoid the
//!   quadratic rescan
//! - **Rayon parallelism**: batch methods encode inputs on all cores

pub mod bpe;
pub mod byte_level;
pub mod ranks;
pub mod registry;
mod tokenizer;
pub mod vocab;

pub use bpe::{
    byte_pair_encode, byte_pair_encode_with_dropout, byte_pair_split, BpeError, DrawSource,
    DropoutProb, LARGE_PIECE_LEN,
};
pub use ranks::{Rank, RankTable, SpecialTokens};
pub use registry::{
    encoding_for_model, encoding_name_for_model, get_encoding, get_encoding_in,
    list_encoding_names, EncodingDefinition, PretrainedEncoding, VocabDir, VocabSource,
};
pub use tokenizer::{
    EncodeOptions, Segment, SpecialSet, Tokenizer, TokenizerError, CL100K_BASE_PATTERN,
    GPT2_PATTERN,
};
pub use vocab::{
    data_gym_to_mergeable_bpe_ranks, dump_tiktoken_bpe, load_tiktoken_bpe,
    load_tiktoken_bpe_file, load_tiktoken_bpe_verified, VocabError,
};
