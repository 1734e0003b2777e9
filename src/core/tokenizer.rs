use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use aho_corasick::{AhoCorasick, MatchKind};
use fancy_regex::Regex;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use super::bpe::{byte_pair_encode_with_dropout, BpeError, DrawSource, DropoutProb};
use super::ranks::{Rank, RankTable, SpecialTokens};
use super::vocab::{load_tiktoken_bpe, load_tiktoken_bpe_file, VocabError};

#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("Regex error: {0}")]
    RegexError(#[from] fancy_regex::Error),
    #[error("Vocabulary error: {0}")]
    VocabError(#[from] VocabError),
    #[error("Encoding error: {0}")]
    BpeError(#[from] BpeError),
    #[error("Decoding error: invalid UTF-8")]
    Utf8Error,
    #[error("Aho-Corasick build error: {0}")]
    AhoCorasickError(#[from] aho_corasick::BuildError),
    #[error("Unknown special token: {0}")]
    UnknownSpecialToken(String),
    #[error("Unknown token id: {0}")]
    UnknownTokenId(Rank),
    #[error("Encountered text corresponding to disallowed special token {0:?}")]
    DisallowedSpecial(String),
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),
}

/// Pre-segmentation pattern for cl100k_base (GPT-4, GPT-3.5-turbo)
pub const CL100K_BASE_PATTERN: &str = r"(?i:'s|'t|'re|'ve|'m|'ll|'d)|[^\r\n\p{L}\p{N}]?\p{L}+|\p{N}{1,3}| ?[^\s\p{L}\p{N}]+[\r\n]*|\s*[\r\n]+|\s+(?!\S)|\s+";

/// Pre-segmentation pattern shared by gpt2, r50k_base, p50k_base and p50k_edit
pub const GPT2_PATTERN: &str =
    r"'s|'t|'re|'ve|'m|'ll|'d| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

/// One unit of pre-segmented input.
///
/// A `Piece` is handed to the merge engine; a `Special` literal is looked up
/// in the special-token table and bypasses merging entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Piece(&'a [u8]),
    Special(&'a str),
}

impl<'a> Segment<'a> {
    /// Build a segment from raw bytes and a special-literal flag.
    pub fn new(bytes: &'a [u8], is_special: bool) -> Result<Self, TokenizerError> {
        if !is_special {
            return Ok(Segment::Piece(bytes));
        }
        std::str::from_utf8(bytes).map(Segment::Special).map_err(|_| {
            TokenizerError::UnknownSpecialToken(String::from_utf8_lossy(bytes).into_owned())
        })
    }
}

/// A selection of special-token literals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SpecialSet {
    All,
    #[default]
    None,
    Only(FxHashSet<String>),
}

impl SpecialSet {
    pub fn only<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SpecialSet::Only(literals.into_iter().map(Into::into).collect())
    }

    fn contains(&self, literal: &str) -> bool {
        match self {
            SpecialSet::All => true,
            SpecialSet::None => false,
            SpecialSet::Only(set) => set.contains(literal),
        }
    }
}

/// How special-token literals and dropout are treated by one encode call.
///
/// By default no literal is encoded as a special token, finding any of them
/// in the input is an error, and merges are never dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    pub allowed_special: SpecialSet,
    /// [`SpecialSet::All`] means every special token that is not allowed.
    pub disallowed_special: SpecialSet,
    pub dropout: DropoutProb,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            allowed_special: SpecialSet::None,
            disallowed_special: SpecialSet::All,
            dropout: DropoutProb::NONE,
        }
    }
}

impl EncodeOptions {
    pub fn allowed_special(mut self, allowed: SpecialSet) -> Self {
        self.allowed_special = allowed;
        self
    }

    pub fn disallowed_special(mut self, disallowed: SpecialSet) -> Self {
        self.disallowed_special = disallowed;
        self
    }

    pub fn dropout(mut self, dropout: DropoutProb) -> Self {
        self.dropout = dropout;
        self
    }

    /// Like [`EncodeOptions::dropout`], validating a raw probability.
    pub fn dropout_prob(self, prob: f64) -> Result<Self, BpeError> {
        Ok(self.dropout(DropoutProb::new(prob)?))
    }
}

/// BPE tokenizer over a rank table, with regex pre-segmentation and
/// special-token handling.
///
/// # Encoding pipeline
///
/// 1. Optionally reject input containing disallowed special literals.
/// 2. Split out allowed special literals (Aho-Corasick, leftmost-longest).
/// 3. Split the text between them with the encoding's regex into pieces.
/// 4. Merge each piece with [`byte_pair_encode_with_dropout`]. Without
///    dropout, a piece that is itself a rank-table key is emitted directly.
///
/// The rank and special-token tables are shared behind `Arc`, so clones are
/// cheap and a tokenizer can be used from many threads at once. Batch methods
/// parallelize across inputs with Rayon.
///
/// # Dropout
///
/// Methods without an explicit draw source use the calling thread's
/// `rand::thread_rng()`, so encodings with `0 < p < 1` are not reproducible.
/// The `*_with_rng` variants accept any [`DrawSource`], including a seeded
/// `rand::rngs::StdRng`.
#[derive(Clone)]
pub struct Tokenizer {
    ranks: Arc<RankTable>,
    special_tokens: Arc<SpecialTokens>,
    regex: Regex,
    pattern: String,
    special_matcher: Option<AhoCorasick>,
}

impl Tokenizer {
    /// Create a new tokenizer from a rank map, special tokens, and regex pattern.
    ///
    /// Both maps are validated; see [`RankTable::new`] and [`SpecialTokens::new`].
    pub fn new(
        encoder: FxHashMap<Vec<u8>, Rank>,
        special_tokens: FxHashMap<String, Rank>,
        pattern: &str,
    ) -> Result<Self, TokenizerError> {
        let ranks = RankTable::new(encoder)?;
        let special_tokens = SpecialTokens::new(special_tokens, &ranks)?;
        Self::from_table(Arc::new(ranks), Arc::new(special_tokens), pattern)
    }

    /// Create a tokenizer over tables that may already be shared elsewhere.
    pub fn from_table(
        ranks: Arc<RankTable>,
        special_tokens: Arc<SpecialTokens>,
        pattern: &str,
    ) -> Result<Self, TokenizerError> {
        if let Some(collision) = special_tokens.encoder().values().find(|id| ranks.contains_rank(**id)) {
            return Err(VocabError::InvalidVocabulary(format!(
                "special token id {} is also a rank",
                collision
            ))
            .into());
        }

        let regex = Regex::new(pattern)?;
        let special_matcher = build_matcher(special_tokens.literals())?;

        log::debug!(
            "tokenizer ready: {} ranks, {} special tokens",
            ranks.len(),
            special_tokens.len()
        );

        Ok(Self {
            ranks,
            special_tokens,
            regex,
            pattern: pattern.to_string(),
            special_matcher,
        })
    }

    /// Create a tokenizer from a tiktoken vocabulary file.
    pub fn from_file(
        path: impl AsRef<Path>,
        special_tokens: FxHashMap<String, Rank>,
        pattern: &str,
    ) -> Result<Self, TokenizerError> {
        let encoder = load_tiktoken_bpe_file(path)?;
        Self::new(encoder, special_tokens, pattern)
    }

    /// Create a tokenizer from tiktoken vocabulary bytes.
    pub fn from_bytes(
        data: &[u8],
        special_tokens: FxHashMap<String, Rank>,
        pattern: &str,
    ) -> Result<Self, TokenizerError> {
        let encoder = load_tiktoken_bpe(data)?;
        Self::new(encoder, special_tokens, pattern)
    }

    // ---------------------------------------------------------------------
    // Segmentation
    // ---------------------------------------------------------------------

    /// Split `text` into the segments the encoder consumes.
    ///
    /// Literals in `allowed_special` become [`Segment::Special`]; everything
    /// else is cut into pieces by the regex. Empty regex matches are skipped.
    pub fn segment<'t>(
        &self,
        text: &'t str,
        allowed_special: &SpecialSet,
    ) -> Result<Vec<Segment<'t>>, TokenizerError> {
        let allowed = self.allowed_matcher(allowed_special)?;
        let mut segments = Vec::new();
        self.for_each_segment(text, allowed.as_deref(), |segment| {
            segments.push(segment);
            Ok(())
        })?;
        Ok(segments)
    }

    fn for_each_segment<'t, F>(
        &self,
        text: &'t str,
        specials: Option<&AhoCorasick>,
        mut f: F,
    ) -> Result<(), TokenizerError>
    where
        F: FnMut(Segment<'t>) -> Result<(), TokenizerError>,
    {
        let mut start = 0;
        if let Some(matcher) = specials {
            for m in matcher.find_iter(text) {
                self.for_each_piece(&text[start..m.start()], &mut f)?;
                f(Segment::Special(&text[m.start()..m.end()]))?;
                start = m.end();
            }
        }
        self.for_each_piece(&text[start..], &mut f)
    }

    fn for_each_piece<'t, F>(&self, text: &'t str, f: &mut F) -> Result<(), TokenizerError>
    where
        F: FnMut(Segment<'t>) -> Result<(), TokenizerError>,
    {
        for mat in self.regex.find_iter(text) {
            let piece = mat?.as_str();
            if !piece.is_empty() {
                f(Segment::Piece(piece.as_bytes()))?;
            }
        }
        Ok(())
    }

    fn allowed_matcher(&self, allowed: &SpecialSet) -> Result<Option<Cow<'_, AhoCorasick>>, TokenizerError> {
        match allowed {
            SpecialSet::None => Ok(None),
            SpecialSet::All => Ok(self.special_matcher.as_ref().map(Cow::Borrowed)),
            SpecialSet::Only(set) => {
                let literals = self.special_tokens.literals().filter(|lit| set.contains(*lit));
                Ok(build_matcher(literals)?.map(Cow::Owned))
            }
        }
    }

    fn disallowed_matcher(
        &self,
        options: &EncodeOptions,
    ) -> Result<Option<Cow<'_, AhoCorasick>>, TokenizerError> {
        let allowed = &options.allowed_special;
        match (&options.disallowed_special, allowed) {
            (SpecialSet::None, _) | (SpecialSet::All, SpecialSet::All) => Ok(None),
            (SpecialSet::All, SpecialSet::None) => {
                Ok(self.special_matcher.as_ref().map(Cow::Borrowed))
            }
            (SpecialSet::All, SpecialSet::Only(_)) => {
                let literals = self.special_tokens.literals().filter(|lit| !allowed.contains(lit));
                Ok(build_matcher(literals)?.map(Cow::Owned))
            }
            (SpecialSet::Only(set), _) => {
                let literals = set
                    .iter()
                    .map(String::as_str)
                    .filter(|lit| !lit.is_empty() && !allowed.contains(lit));
                Ok(build_matcher(literals)?.map(Cow::Owned))
            }
        }
    }

    fn check_disallowed(&self, text: &str, options: &EncodeOptions) -> Result<(), TokenizerError> {
        if let Some(matcher) = self.disallowed_matcher(options)? {
            if let Some(m) = matcher.find(text) {
                return Err(TokenizerError::DisallowedSpecial(
                    text[m.start()..m.end()].to_string(),
                ));
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Encoding
    // ---------------------------------------------------------------------

    /// Append the tokens of one segment to `out`, returning how many were added.
    fn encode_segment_into<D>(
        &self,
        segment: Segment<'_>,
        dropout: DropoutProb,
        draws: &mut D,
        out: &mut Vec<Rank>,
    ) -> Result<usize, TokenizerError>
    where
        D: DrawSource + ?Sized,
    {
        match segment {
            Segment::Special(literal) => {
                let id = self
                    .special_tokens
                    .get(literal)
                    .ok_or_else(|| TokenizerError::UnknownSpecialToken(literal.to_string()))?;
                out.push(id);
                Ok(1)
            }
            Segment::Piece(piece) => {
                if !dropout.is_active() {
                    if let Some(rank) = self.ranks.get(piece) {
                        out.push(rank);
                        return Ok(1);
                    }
                }
                let tokens = byte_pair_encode_with_dropout(piece, &self.ranks, dropout, draws)?;
                let n = tokens.len();
                out.extend(tokens);
                Ok(n)
            }
        }
    }

    /// Encode `text`, returning the tokens and how many of them came from the
    /// last regex piece (zero if the text ended with a special token).
    fn encode_native<D>(
        &self,
        text: &str,
        allowed: Option<&AhoCorasick>,
        dropout: DropoutProb,
        draws: &mut D,
    ) -> Result<(Vec<Rank>, usize), TokenizerError>
    where
        D: DrawSource + ?Sized,
    {
        let mut tokens = Vec::new();
        let mut last_piece_token_len = 0;
        self.for_each_segment(text, allowed, |segment| {
            let added = self.encode_segment_into(segment, dropout, draws, &mut tokens)?;
            last_piece_token_len = match segment {
                Segment::Piece(_) => added,
                Segment::Special(_) => 0,
            };
            Ok(())
        })?;
        Ok((tokens, last_piece_token_len))
    }

    /// Encode text with the default options: no special tokens allowed, all
    /// of them disallowed, no dropout.
    pub fn encode(&self, text: &str) -> Result<Vec<Rank>, TokenizerError> {
        self.encode_with(text, &EncodeOptions::default())
    }

    /// Encode text with the default special-token handling and merge dropout.
    ///
    /// Fails with `InvalidParameter` if `dropout_prob` is outside `[0, 1]`.
    pub fn encode_with_dropout(&self, text: &str, dropout_prob: f64) -> Result<Vec<Rank>, TokenizerError> {
        let options = EncodeOptions::default().dropout_prob(dropout_prob)?;
        self.encode_with(text, &options)
    }

    pub fn encode_with(&self, text: &str, options: &EncodeOptions) -> Result<Vec<Rank>, TokenizerError> {
        self.encode_with_rng(text, options, &mut rand::thread_rng())
    }

    /// Encode text, drawing dropout decisions from `draws`.
    pub fn encode_with_rng<D>(
        &self,
        text: &str,
        options: &EncodeOptions,
        draws: &mut D,
    ) -> Result<Vec<Rank>, TokenizerError>
    where
        D: DrawSource + ?Sized,
    {
        self.check_disallowed(text, options)?;
        let allowed = self.allowed_matcher(&options.allowed_special)?;
        let (tokens, _) = self.encode_native(text, allowed.as_deref(), options.dropout, draws)?;
        Ok(tokens)
    }

    /// Encode text, treating every special literal as plain text.
    pub fn encode_ordinary(&self, text: &str) -> Result<Vec<Rank>, TokenizerError> {
        self.encode_ordinary_with_rng(text, DropoutProb::NONE, &mut rand::thread_rng())
    }

    pub fn encode_ordinary_with_dropout(
        &self,
        text: &str,
        dropout_prob: f64,
    ) -> Result<Vec<Rank>, TokenizerError> {
        let dropout = DropoutProb::new(dropout_prob)?;
        self.encode_ordinary_with_rng(text, dropout, &mut rand::thread_rng())
    }

    pub fn encode_ordinary_with_rng<D>(
        &self,
        text: &str,
        dropout: DropoutProb,
        draws: &mut D,
    ) -> Result<Vec<Rank>, TokenizerError>
    where
        D: DrawSource + ?Sized,
    {
        Ok(self.encode_native(text, None, dropout, draws)?.0)
    }

    /// Encode text with every special literal encoded as its special token.
    pub fn encode_with_special(&self, text: &str) -> Result<Vec<Rank>, TokenizerError> {
        let options = EncodeOptions::default().allowed_special(SpecialSet::All);
        self.encode_with(text, &options)
    }

    /// Encode segments produced by an external splitter.
    ///
    /// Pieces must be non-empty; special segments must name a known literal.
    pub fn encode_segments(&self, segments: &[Segment<'_>], dropout_prob: f64) -> Result<Vec<Rank>, TokenizerError> {
        let dropout = DropoutProb::new(dropout_prob)?;
        self.encode_segments_with_rng(segments, dropout, &mut rand::thread_rng())
    }

    pub fn encode_segments_with_rng<D>(
        &self,
        segments: &[Segment<'_>],
        dropout: DropoutProb,
        draws: &mut D,
    ) -> Result<Vec<Rank>, TokenizerError>
    where
        D: DrawSource + ?Sized,
    {
        let mut tokens = Vec::with_capacity(segments.len());
        for &segment in segments {
            self.encode_segment_into(segment, dropout, draws, &mut tokens)?;
        }
        Ok(tokens)
    }

    /// Encode raw bytes that may not be valid UTF-8.
    ///
    /// Valid UTF-8 is encoded like [`Tokenizer::encode_ordinary`]. Otherwise
    /// the valid prefix is encoded, and the bytes of its last piece (widened
    /// over trailing whitespace tokens) are merged again together with the
    /// invalid tail as a single chunk.
    pub fn encode_bytes(&self, bytes: &[u8], dropout_prob: f64) -> Result<Vec<Rank>, TokenizerError> {
        let dropout = DropoutProb::new(dropout_prob)?;
        self.encode_bytes_with_rng(bytes, dropout, &mut rand::thread_rng())
    }

    pub fn encode_bytes_with_rng<D>(
        &self,
        bytes: &[u8],
        dropout: DropoutProb,
        draws: &mut D,
    ) -> Result<Vec<Rank>, TokenizerError>
    where
        D: DrawSource + ?Sized,
    {
        let valid_up_to = match std::str::from_utf8(bytes) {
            Ok(text) => return Ok(self.encode_native(text, None, dropout, draws)?.0),
            Err(e) => e.valid_up_to(),
        };

        let text = std::str::from_utf8(&bytes[..valid_up_to]).map_err(|_| TokenizerError::Utf8Error)?;
        let (mut tokens, last_piece_token_len) = self.encode_native(text, None, dropout, draws)?;
        let last_piece_token_len = self.widen_over_whitespace(&tokens, last_piece_token_len);

        let tail_start = tokens.len() - last_piece_token_len;
        let mut unstable = self.decode_bytes(&tokens[tail_start..])?;
        unstable.extend_from_slice(&bytes[valid_up_to..]);
        tokens.truncate(tail_start);

        self.encode_segment_into(Segment::Piece(&unstable), dropout, draws, &mut tokens)?;
        Ok(tokens)
    }

    /// Extend the last piece backwards over tokens made only of whitespace.
    ///
    /// `\s+(?!\S)` splits trailing whitespace differently once more text
    /// follows, so those tokens are not stable either.
    fn widen_over_whitespace(&self, tokens: &[Rank], mut last_piece_token_len: usize) -> usize {
        let is_all_space = |token: Rank| {
            self.ranks
                .get_bytes(token)
                .is_some_and(|bytes| bytes.iter().all(|b| matches!(b, b' ' | b'\n' | b'\t')))
        };

        if last_piece_token_len > 0 && is_all_space(tokens[tokens.len() - last_piece_token_len]) {
            while last_piece_token_len < tokens.len()
                && is_all_space(tokens[tokens.len() - last_piece_token_len - 1])
            {
                last_piece_token_len += 1;
            }
        }
        last_piece_token_len
    }

    /// The single token for `bytes`: a rank, or a special token's id.
    pub fn encode_single_token(&self, bytes: &[u8]) -> Result<Rank, TokenizerError> {
        if let Some(rank) = self.ranks.get(bytes) {
            return Ok(rank);
        }
        std::str::from_utf8(bytes)
            .ok()
            .and_then(|literal| self.special_tokens.get(literal))
            .ok_or_else(|| BpeError::UnknownByteSequence(bytes.to_vec()).into())
    }

    /// Encode `bytes` as one piece, without regex segmentation.
    pub fn encode_single_piece(&self, bytes: &[u8]) -> Result<Vec<Rank>, TokenizerError> {
        let mut tokens = Vec::new();
        self.encode_segment_into(Segment::Piece(bytes), DropoutProb::NONE, &mut NoDraws, &mut tokens)?;
        Ok(tokens)
    }

    /// Batch encode multiple texts in parallel.
    pub fn encode_batch<S>(&self, texts: &[S], options: &EncodeOptions) -> Result<Vec<Vec<Rank>>, TokenizerError>
    where
        S: AsRef<str> + Sync,
    {
        texts
            .par_iter()
            .map(|text| self.encode_with(text.as_ref(), options))
            .collect()
    }

    /// Batch encode multiple texts in parallel, ignoring special tokens.
    pub fn encode_ordinary_batch<S>(&self, texts: &[S]) -> Result<Vec<Vec<Rank>>, TokenizerError>
    where
        S: AsRef<str> + Sync,
    {
        texts
            .par_iter()
            .map(|text| self.encode_ordinary(text.as_ref()))
            .collect()
    }

    // ---------------------------------------------------------------------
    // Decoding
    // ---------------------------------------------------------------------

    /// Decode token IDs back to bytes.
    pub fn decode_bytes(&self, tokens: &[Rank]) -> Result<Vec<u8>, TokenizerError> {
        let mut result = Vec::with_capacity(tokens.len() * 4);
        for &token in tokens {
            result.extend_from_slice(self.token_bytes(token)?);
        }
        Ok(result)
    }

    /// Decode token IDs to a string.
    pub fn decode(&self, tokens: &[Rank]) -> Result<String, TokenizerError> {
        let bytes = self.decode_bytes(tokens)?;
        String::from_utf8(bytes).map_err(|_| TokenizerError::Utf8Error)
    }

    /// Decode token IDs to a string, replacing invalid UTF-8 with U+FFFD.
    pub fn decode_lossy(&self, tokens: &[Rank]) -> Result<String, TokenizerError> {
        let bytes = self.decode_bytes(tokens)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn decode_single_token_bytes(&self, token: Rank) -> Result<Vec<u8>, TokenizerError> {
        self.token_bytes(token).map(<[u8]>::to_vec)
    }

    pub fn decode_tokens_bytes(&self, tokens: &[Rank]) -> Result<Vec<Vec<u8>>, TokenizerError> {
        tokens
            .iter()
            .map(|&token| self.decode_single_token_bytes(token))
            .collect()
    }

    /// Decode to a string along with the character offset at which each
    /// token starts.
    ///
    /// A token that begins inside a multi-byte character is attributed to
    /// that character.
    pub fn decode_with_offsets(&self, tokens: &[Rank]) -> Result<(String, Vec<usize>), TokenizerError> {
        let is_continuation = |b: u8| (0x80..0xC0).contains(&b);

        let mut text = Vec::new();
        let mut offsets = Vec::with_capacity(tokens.len());
        let mut text_len = 0usize;
        for &token in tokens {
            let bytes = self.token_bytes(token)?;
            let starts_mid_char = bytes.first().copied().is_some_and(is_continuation);
            offsets.push(text_len.saturating_sub(usize::from(starts_mid_char)));
            text_len += bytes.iter().filter(|&&b| !is_continuation(b)).count();
            text.extend_from_slice(bytes);
        }

        let text = String::from_utf8(text).map_err(|_| TokenizerError::Utf8Error)?;
        Ok((text, offsets))
    }

    /// Batch decode multiple token lists in parallel.
    pub fn decode_batch(&self, token_lists: &[Vec<Rank>]) -> Result<Vec<String>, TokenizerError> {
        token_lists
            .par_iter()
            .map(|tokens| self.decode(tokens))
            .collect()
    }

    fn token_bytes(&self, token: Rank) -> Result<&[u8], TokenizerError> {
        self.ranks
            .get_bytes(token)
            .or_else(|| self.special_tokens.get_literal(token).map(str::as_bytes))
            .ok_or(TokenizerError::UnknownTokenId(token))
    }

    // ---------------------------------------------------------------------
    // Vocabulary info
    // ---------------------------------------------------------------------

    /// Largest token id, over ranks and special tokens.
    pub fn max_token_value(&self) -> Rank {
        self.special_tokens
            .max_id()
            .map_or(self.ranks.max_rank(), |id| id.max(self.ranks.max_rank()))
    }

    /// Size of the id space: `max_token_value() + 1`.
    pub fn n_vocab(&self) -> usize {
        self.max_token_value() as usize + 1
    }

    /// Id of `<|endoftext|>`, if this tokenizer has one.
    pub fn eot_token(&self) -> Option<Rank> {
        self.special_tokens.get("<|endoftext|>")
    }

    pub fn special_tokens_set(&self) -> FxHashSet<&str> {
        self.special_tokens.literal_set()
    }

    pub fn is_special_token(&self, token: Rank) -> bool {
        self.special_tokens.contains_id(token)
    }

    /// Every mergeable byte sequence, sorted bytewise.
    pub fn token_byte_values(&self) -> Vec<Vec<u8>> {
        self.ranks.token_byte_values()
    }

    pub fn rank_table(&self) -> &RankTable {
        &self.ranks
    }

    pub fn special_tokens(&self) -> &SpecialTokens {
        &self.special_tokens
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Draw source for paths that never consult it.
struct NoDraws;

impl DrawSource for NoDraws {
    fn draw(&mut self) -> f64 {
        1.0
    }
}

fn build_matcher<I, S>(literals: I) -> Result<Option<AhoCorasick>, TokenizerError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let literals: Vec<S> = literals.into_iter().collect();
    if literals.is_empty() {
        return Ok(None);
    }
    let matcher = AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(&literals)?;
    Ok(Some(matcher))
}
