//! Byte-pair merge engine.
//!
//! Reduces one pre-segmented chunk of bytes to a sequence of ranks by
//! repeatedly merging the adjacent pair whose concatenation has the lowest
//! rank. When two adjacent pairs concatenate to the same bytes (and so the
//! same rank), the leftmost one is merged first.
//!
//! # Strategies
//!
//! - Short pieces without dropout: a flat `(start, pair_rank)` vector that is
//!   rescanned after every merge. Pieces are usually a handful of bytes, so
//!   cache locality beats asymptotics here.
//! - Pieces of [`LARGE_PIECE_LEN`] bytes or more: a min-heap keyed by
//!   `(rank, start)` over a linked list of fragments, with stale entries
//!   skipped by generation counters. Output is identical to the flat path.
//! - Dropout: every pass scans all adjacent pairs, draws once per merge
//!   candidate and drops it if the draw falls below the probability. The
//!   lowest-ranked survivor is merged; the piece is final once a pass leaves
//!   no survivor.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rand::{Rng, RngCore};
use thiserror::Error;

use super::ranks::{Rank, RankTable};

/// Pieces at least this long are merged with the heap strategy.
pub const LARGE_PIECE_LEN: usize = 500;

const NO_RANK: Rank = Rank::MAX;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BpeError {
    #[error("Cannot encode an empty chunk")]
    EmptyChunk,
    #[error("Byte sequence has no rank: {0:?}")]
    UnknownByteSequence(Vec<u8>),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// A source of uniform draws in `[0, 1)` used to decide merge dropout.
///
/// Every `rand` generator is a draw source, so callers can pass
/// `rand::thread_rng()` or a seeded `StdRng`. Tests can implement this
/// directly to script exact drop patterns.
pub trait DrawSource {
    fn draw(&mut self) -> f64;
}

impl<R: RngCore> DrawSource for R {
    #[inline]
    fn draw(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Probability of dropping each eligible merge, validated into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct DropoutProb(f64);

impl DropoutProb {
    /// Plain BPE.
    pub const NONE: Self = Self(0.0);
    /// Every merge is dropped; one token per byte.
    pub const ALL: Self = Self(1.0);

    pub fn new(prob: f64) -> Result<Self, BpeError> {
        if (0.0..=1.0).contains(&prob) {
            Ok(Self(prob))
        } else {
            Err(BpeError::InvalidParameter(format!(
                "dropout probability must be within [0, 1], got {}",
                prob
            )))
        }
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_active(self) -> bool {
        self.0 > 0.0
    }
}

impl TryFrom<f64> for DropoutProb {
    type Error = BpeError;

    fn try_from(prob: f64) -> Result<Self, Self::Error> {
        Self::new(prob)
    }
}

/// Encode one chunk with plain BPE.
pub fn byte_pair_encode(piece: &[u8], ranks: &RankTable) -> Result<Vec<Rank>, BpeError> {
    if piece.is_empty() {
        return Err(BpeError::EmptyChunk);
    }
    if piece.len() == 1 {
        return single_byte(piece, ranks);
    }
    fragments_to_ranks(piece, &merge_boundaries(piece, ranks), ranks)
}

/// Encode one chunk, dropping each eligible merge with probability `dropout`.
///
/// With `DropoutProb::NONE` no draws are taken and the result equals
/// [`byte_pair_encode`].
pub fn byte_pair_encode_with_dropout<D>(
    piece: &[u8],
    ranks: &RankTable,
    dropout: DropoutProb,
    draws: &mut D,
) -> Result<Vec<Rank>, BpeError>
where
    D: DrawSource + ?Sized,
{
    if !dropout.is_active() {
        return byte_pair_encode(piece, ranks);
    }
    if piece.is_empty() {
        return Err(BpeError::EmptyChunk);
    }
    if piece.len() == 1 {
        return single_byte(piece, ranks);
    }
    let bounds = byte_pair_merge_dropout(ranks, piece, dropout, draws);
    fragments_to_ranks(piece, &bounds, ranks)
}

/// Split one chunk into the byte fragments plain BPE settles on.
pub fn byte_pair_split<'a>(piece: &'a [u8], ranks: &RankTable) -> Result<Vec<&'a [u8]>, BpeError> {
    if piece.is_empty() {
        return Err(BpeError::EmptyChunk);
    }
    if piece.len() == 1 {
        return Ok(vec![piece]);
    }
    Ok(merge_boundaries(piece, ranks)
        .windows(2)
        .map(|w| &piece[w[0]..w[1]])
        .collect())
}

fn single_byte(piece: &[u8], ranks: &RankTable) -> Result<Vec<Rank>, BpeError> {
    ranks
        .get(piece)
        .map(|rank| vec![rank])
        .ok_or_else(|| BpeError::UnknownByteSequence(piece.to_vec()))
}

fn merge_boundaries(piece: &[u8], ranks: &RankTable) -> Vec<usize> {
    if piece.len() >= LARGE_PIECE_LEN {
        log::debug!("heap merge for {}-byte piece", piece.len());
        byte_pair_merge_large(ranks, piece)
    } else {
        byte_pair_merge(ranks, piece)
    }
}

/// Map fragment boundaries (`n + 1` offsets for `n` fragments) to ranks.
fn fragments_to_ranks(piece: &[u8], bounds: &[usize], ranks: &RankTable) -> Result<Vec<Rank>, BpeError> {
    bounds
        .windows(2)
        .map(|w| {
            let fragment = &piece[w[0]..w[1]];
            ranks
                .get(fragment)
                .ok_or_else(|| BpeError::UnknownByteSequence(fragment.to_vec()))
        })
        .collect()
}

/// Flat-vector merge. Returns fragment boundaries.
///
/// `parts[i] = (start, rank of fragment i concatenated with fragment i + 1)`.
/// The last two entries are sentinels so `parts[i + 2]` is always the end
/// of the pair starting at `i`.
fn byte_pair_merge(ranks: &RankTable, piece: &[u8]) -> Vec<usize> {
    let mut parts: Vec<(usize, Rank)> = Vec::with_capacity(piece.len() + 1);

    let mut min_rank: (Rank, usize) = (NO_RANK, usize::MAX);
    for i in 0..piece.len() - 1 {
        let rank = ranks.get(&piece[i..i + 2]).unwrap_or(NO_RANK);
        if rank < min_rank.0 {
            min_rank = (rank, i);
        }
        parts.push((i, rank));
    }
    parts.push((piece.len() - 1, NO_RANK));
    parts.push((piece.len(), NO_RANK));

    // Called before parts[i + 1] is removed, hence the +3.
    let get_rank = |parts: &[(usize, Rank)], i: usize| -> Rank {
        if i + 3 < parts.len() {
            ranks
                .get(&piece[parts[i].0..parts[i + 3].0])
                .unwrap_or(NO_RANK)
        } else {
            NO_RANK
        }
    };

    while min_rank.0 != NO_RANK {
        let i = min_rank.1;
        if i > 0 {
            parts[i - 1].1 = get_rank(&parts, i - 1);
        }
        parts[i].1 = get_rank(&parts, i);
        parts.remove(i + 1);

        min_rank = (NO_RANK, usize::MAX);
        for (i, &(_, rank)) in parts[..parts.len() - 1].iter().enumerate() {
            if rank < min_rank.0 {
                min_rank = (rank, i);
            }
        }
    }

    parts.into_iter().map(|(start, _)| start).collect()
}

/// Heap merge for long pieces. Returns fragment boundaries.
///
/// Fragments are named by their start offset, so `next[i]` is both the
/// following fragment and the end of fragment `i`. `piece.len()` marks the
/// end of the list.
fn byte_pair_merge_large(ranks: &RankTable, piece: &[u8]) -> Vec<usize> {
    let n = piece.len();
    let none = usize::MAX;

    let mut next: Vec<usize> = (1..=n).collect();
    let mut prev: Vec<usize> = (0..n).map(|i| if i == 0 { none } else { i - 1 }).collect();
    let mut generation: Vec<u32> = vec![0; n];
    let mut heap: BinaryHeap<Reverse<(Rank, usize, u32)>> = BinaryHeap::with_capacity(n);

    let pair_rank = |next: &[usize], i: usize| -> Option<Rank> {
        let j = next[i];
        if j >= n {
            return None;
        }
        ranks.get(&piece[i..next[j]])
    };

    for i in 0..n - 1 {
        if let Some(rank) = pair_rank(&next, i) {
            heap.push(Reverse((rank, i, 0)));
        }
    }

    while let Some(Reverse((_, i, entry_gen))) = heap.pop() {
        if entry_gen != generation[i] {
            continue;
        }
        let j = next[i];
        if j >= n {
            continue;
        }

        let k = next[j];
        next[i] = k;
        if k < n {
            prev[k] = i;
        }
        generation[i] = generation[i].wrapping_add(1);
        generation[j] = generation[j].wrapping_add(1);

        let p = prev[i];
        if p != none {
            generation[p] = generation[p].wrapping_add(1);
            if let Some(rank) = pair_rank(&next, p) {
                heap.push(Reverse((rank, p, generation[p])));
            }
        }
        if let Some(rank) = pair_rank(&next, i) {
            heap.push(Reverse((rank, i, generation[i])));
        }
    }

    let mut bounds = Vec::new();
    let mut i = 0;
    while i < n {
        bounds.push(i);
        i = next[i];
    }
    bounds.push(n);
    bounds
}

/// Rescan merge with per-candidate dropout. Returns fragment boundaries.
fn byte_pair_merge_dropout<D>(
    ranks: &RankTable,
    piece: &[u8],
    dropout: DropoutProb,
    draws: &mut D,
) -> Vec<usize>
where
    D: DrawSource + ?Sized,
{
    let prob = dropout.get();
    let mut bounds: Vec<usize> = (0..=piece.len()).collect();

    loop {
        let mut best: Option<(Rank, usize)> = None;
        let mut candidates = 0usize;

        for i in 0..bounds.len() - 2 {
            let Some(rank) = ranks.get(&piece[bounds[i]..bounds[i + 2]]) else {
                continue;
            };
            candidates += 1;
            if draws.draw() < prob {
                continue;
            }
            if best.map_or(true, |(best_rank, _)| rank < best_rank) {
                best = Some((rank, i));
            }
        }

        match best {
            Some((_, i)) => {
                bounds.remove(i + 1);
            }
            None => {
                log::trace!(
                    "dropout pass stopped with {} fragments ({} candidates dropped)",
                    bounds.len() - 1,
                    candidates
                );
                return bounds;
            }
        }
    }
}
