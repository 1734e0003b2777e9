//! Named encodings and model lookup.
//!
//! This module knows the published OpenAI encodings:
//! - `gpt2` - GPT-2 (data-gym `vocab.bpe` + `encoder.json`)
//! - `r50k_base` - GPT-3 (`davinci`, `curie`, ...)
//! - `p50k_base` - Codex, `text-davinci-002/003`
//! - `p50k_edit` - edit models, `p50k_base` plus FIM tokens
//! - `cl100k_base` - GPT-4, GPT-3.5-turbo, embeddings
//!
//! Nothing is downloaded. Vocabulary files are read from a [`VocabDir`],
//! by default the same cache directory tiktoken uses, and tiktoken files are
//! checked against their published SHA-256 digest before use.
//!
//! # Example
//!
//! ```no_run
//! use rankbpe::registry::get_encoding;
//!
//! let enc = get_encoding("cl100k_base").unwrap();
//! let tokens = enc.encode_with_dropout("SwissAir", 0.1).unwrap();
//! ```

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use super::ranks::Rank;
use super::tokenizer::{Tokenizer, TokenizerError, CL100K_BASE_PATTERN, GPT2_PATTERN};
use super::vocab::{
    data_gym_to_mergeable_bpe_ranks, load_tiktoken_bpe, load_tiktoken_bpe_verified, VocabError,
};

pub const ENDOFTEXT: &str = "<|endoftext|>";
pub const FIM_PREFIX: &str = "<|fim_prefix|>";
pub const FIM_MIDDLE: &str = "<|fim_middle|>";
pub const FIM_SUFFIX: &str = "<|fim_suffix|>";
pub const ENDOFPROMPT: &str = "<|endofprompt|>";

const R50K_BASE_HASH: &str = "306cd27f03c1a714eca7108e03d66b7dc042abe8c258b44c199a7ed9838dd930";
const P50K_BASE_HASH: &str = "94b5ca7dff4d00767bc256fdd1b27e5b17361d7b8a5f968547f9f23eb70d2069";
const CL100K_BASE_HASH: &str = "223921b76ee99bde995b7ff738513eef100fb51d18c93597a113bcffe865b2a7";

/// Published encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PretrainedEncoding {
    Gpt2,
    R50kBase,
    P50kBase,
    P50kEdit,
    Cl100kBase,
}

impl PretrainedEncoding {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "gpt2" => Some(Self::Gpt2),
            "r50k_base" => Some(Self::R50kBase),
            "p50k_base" => Some(Self::P50kBase),
            "p50k_edit" => Some(Self::P50kEdit),
            "cl100k_base" => Some(Self::Cl100kBase),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Gpt2 => "gpt2",
            Self::R50kBase => "r50k_base",
            Self::P50kBase => "p50k_base",
            Self::P50kEdit => "p50k_edit",
            Self::Cl100kBase => "cl100k_base",
        }
    }

    /// Everything needed to build this encoding, apart from the files.
    pub fn definition(self) -> EncodingDefinition {
        let specials = |entries: &[(&str, Rank)]| -> FxHashMap<String, Rank> {
            entries
                .iter()
                .map(|(literal, id)| (literal.to_string(), *id))
                .collect()
        };
        let tiktoken = |file_name: &str, hash: &str| VocabSource::Tiktoken {
            file_name: file_name.to_string(),
            expected_hash: Some(hash.to_string()),
        };

        let (pat_str, special_tokens, explicit_n_vocab, source) = match self {
            Self::Gpt2 => (
                GPT2_PATTERN,
                specials(&[(ENDOFTEXT, 50256)]),
                Some(50257),
                VocabSource::DataGym {
                    vocab_bpe: "vocab.bpe".to_string(),
                    encoder_json: Some("encoder.json".to_string()),
                },
            ),
            Self::R50kBase => (
                GPT2_PATTERN,
                specials(&[(ENDOFTEXT, 50256)]),
                Some(50257),
                tiktoken("r50k_base.tiktoken", R50K_BASE_HASH),
            ),
            Self::P50kBase => (
                GPT2_PATTERN,
                specials(&[(ENDOFTEXT, 50256)]),
                Some(50281),
                tiktoken("p50k_base.tiktoken", P50K_BASE_HASH),
            ),
            Self::P50kEdit => (
                GPT2_PATTERN,
                specials(&[
                    (ENDOFTEXT, 50256),
                    (FIM_PREFIX, 50281),
                    (FIM_MIDDLE, 50282),
                    (FIM_SUFFIX, 50283),
                ]),
                None,
                tiktoken("p50k_base.tiktoken", P50K_BASE_HASH),
            ),
            Self::Cl100kBase => (
                CL100K_BASE_PATTERN,
                specials(&[
                    (ENDOFTEXT, 100257),
                    (FIM_PREFIX, 100258),
                    (FIM_MIDDLE, 100259),
                    (FIM_SUFFIX, 100260),
                    (ENDOFPROMPT, 100276),
                ]),
                None,
                tiktoken("cl100k_base.tiktoken", CL100K_BASE_HASH),
            ),
        };

        EncodingDefinition {
            name: self.name().to_string(),
            pat_str: pat_str.to_string(),
            special_tokens,
            explicit_n_vocab,
            source,
        }
    }
}

/// Where an encoding's rank table comes from, relative to a [`VocabDir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VocabSource {
    Tiktoken {
        file_name: String,
        /// Lowercase hex SHA-256 of the file, checked before parsing.
        expected_hash: Option<String>,
    },
    DataGym {
        vocab_bpe: String,
        encoder_json: Option<String>,
    },
}

/// A named encoding: pattern, special tokens, and vocabulary source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingDefinition {
    pub name: String,
    pub pat_str: String,
    pub special_tokens: FxHashMap<String, Rank>,
    /// If set, the rank count plus special-token count must equal this, and
    /// so must the largest token id plus one.
    pub explicit_n_vocab: Option<usize>,
    pub source: VocabSource,
}

/// Directory vocabulary files are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabDir(PathBuf);

impl VocabDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// `TIKTOKEN_CACHE_DIR`, else `DATA_GYM_CACHE_DIR`, else
    /// `<tmp>/data-gym-cache`. Empty variables count as unset.
    pub fn from_env() -> Self {
        let from_var = |name: &str| std::env::var_os(name).filter(|value| !value.is_empty());
        let path = from_var("TIKTOKEN_CACHE_DIR")
            .or_else(|| from_var("DATA_GYM_CACHE_DIR"))
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("data-gym-cache"));
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    fn read(&self, file_name: &str) -> Result<Vec<u8>, VocabError> {
        let path = self.0.join(file_name);
        log::debug!("reading vocabulary file {}", path.display());
        Ok(std::fs::read(path)?)
    }

    fn read_string(&self, file_name: &str) -> Result<String, VocabError> {
        let data = self.read(file_name)?;
        String::from_utf8(data)
            .map_err(|_| VocabError::ParseError(format!("{} is not valid UTF-8", file_name)))
    }
}

impl Default for VocabDir {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Names accepted by [`get_encoding`].
pub fn list_encoding_names() -> &'static [&'static str] {
    &["gpt2", "r50k_base", "p50k_base", "p50k_edit", "cl100k_base"]
}

/// Build a published encoding from the default vocabulary directory.
pub fn get_encoding(name: &str) -> Result<Tokenizer, TokenizerError> {
    get_encoding_in(name, &VocabDir::from_env())
}

pub fn get_encoding_in(name: &str, dir: &VocabDir) -> Result<Tokenizer, TokenizerError> {
    let encoding = PretrainedEncoding::from_name(name).ok_or_else(|| {
        TokenizerError::UnknownEncoding(format!(
            "{}. Supported: {}",
            name,
            list_encoding_names().join(", ")
        ))
    })?;
    load_definition(&encoding.definition(), dir)
}

/// Build a tokenizer from a definition, reading its files from `dir`.
pub fn load_definition(def: &EncodingDefinition, dir: &VocabDir) -> Result<Tokenizer, TokenizerError> {
    let ranks = match &def.source {
        VocabSource::Tiktoken {
            file_name,
            expected_hash,
        } => {
            let data = dir.read(file_name)?;
            match expected_hash {
                Some(hash) => load_tiktoken_bpe_verified(&data, hash)?,
                None => load_tiktoken_bpe(&data)?,
            }
        }
        VocabSource::DataGym {
            vocab_bpe,
            encoder_json,
        } => {
            let vocab_bpe = dir.read_string(vocab_bpe)?;
            let encoder_json = encoder_json
                .as_deref()
                .map(|file_name| dir.read_string(file_name))
                .transpose()?;
            data_gym_to_mergeable_bpe_ranks(&vocab_bpe, encoder_json.as_deref())?
        }
    };

    if let Some(n_vocab) = def.explicit_n_vocab {
        let total = ranks.len() + def.special_tokens.len();
        if total != n_vocab {
            return Err(VocabError::InvalidVocabulary(format!(
                "{}: {} ranks + {} special tokens != {}",
                def.name,
                ranks.len(),
                def.special_tokens.len(),
                n_vocab
            ))
            .into());
        }
    }

    let tokenizer = Tokenizer::new(ranks, def.special_tokens.clone(), &def.pat_str)?;

    if let Some(n_vocab) = def.explicit_n_vocab {
        if tokenizer.n_vocab() != n_vocab {
            return Err(VocabError::InvalidVocabulary(format!(
                "{}: max token id {} does not match n_vocab {}",
                def.name,
                tokenizer.max_token_value(),
                n_vocab
            ))
            .into());
        }
    }

    log::debug!("loaded encoding {} (n_vocab {})", def.name, tokenizer.n_vocab());
    Ok(tokenizer)
}

const MODEL_TO_ENCODING: &[(&str, &str)] = &[
    // chat
    ("gpt-4", "cl100k_base"),
    ("gpt-3.5-turbo", "cl100k_base"),
    ("gpt-3.5", "cl100k_base"),
    ("gpt-35-turbo", "cl100k_base"),
    // base
    ("davinci-002", "cl100k_base"),
    ("babbage-002", "cl100k_base"),
    // embeddings
    ("text-embedding-ada-002", "cl100k_base"),
    ("text-embedding-3-small", "cl100k_base"),
    ("text-embedding-3-large", "cl100k_base"),
    // text (DEPRECATED)
    ("text-davinci-003", "p50k_base"),
    ("text-davinci-002", "p50k_base"),
    ("text-davinci-001", "r50k_base"),
    ("text-curie-001", "r50k_base"),
    ("text-babbage-001", "r50k_base"),
    ("text-ada-001", "r50k_base"),
    ("davinci", "r50k_base"),
    ("curie", "r50k_base"),
    ("babbage", "r50k_base"),
    ("ada", "r50k_base"),
    // code (DEPRECATED)
    ("code-davinci-002", "p50k_base"),
    ("code-davinci-001", "p50k_base"),
    ("code-cushman-002", "p50k_base"),
    ("code-cushman-001", "p50k_base"),
    ("davinci-codex", "p50k_base"),
    ("cushman-codex", "p50k_base"),
    // edit (DEPRECATED)
    ("text-davinci-edit-001", "p50k_edit"),
    ("code-davinci-edit-001", "p50k_edit"),
    // old embeddings (DEPRECATED)
    ("text-similarity-davinci-001", "r50k_base"),
    ("text-similarity-curie-001", "r50k_base"),
    ("text-similarity-babbage-001", "r50k_base"),
    ("text-similarity-ada-001", "r50k_base"),
    ("text-search-davinci-doc-001", "r50k_base"),
    ("text-search-curie-doc-001", "r50k_base"),
    ("text-search-babbage-doc-001", "r50k_base"),
    ("text-search-ada-doc-001", "r50k_base"),
    ("code-search-babbage-code-001", "r50k_base"),
    ("code-search-ada-code-001", "r50k_base"),
    // open source
    ("gpt2", "gpt2"),
    ("gpt-2", "gpt2"),
];

const MODEL_PREFIX_TO_ENCODING: &[(&str, &str)] = &[
    ("gpt-4-", "cl100k_base"),
    ("gpt-3.5-turbo-", "cl100k_base"),
    ("gpt-35-turbo-", "cl100k_base"),
    ("ft:gpt-4", "cl100k_base"),
    ("ft:gpt-3.5-turbo", "cl100k_base"),
    ("ft:davinci-002", "cl100k_base"),
    ("ft:babbage-002", "cl100k_base"),
];

/// Encoding name used by `model`: an exact model name, else a known prefix.
pub fn encoding_name_for_model(model: &str) -> Result<&'static str, TokenizerError> {
    MODEL_TO_ENCODING
        .iter()
        .find(|(name, _)| *name == model)
        .or_else(|| {
            MODEL_PREFIX_TO_ENCODING
                .iter()
                .find(|(prefix, _)| model.starts_with(prefix))
        })
        .map(|(_, encoding)| *encoding)
        .ok_or_else(|| {
            TokenizerError::UnknownEncoding(format!(
                "could not map model {:?} to an encoding",
                model
            ))
        })
}

pub fn encoding_for_model(model: &str) -> Result<Tokenizer, TokenizerError> {
    get_encoding(encoding_name_for_model(model)?)
}
