//! The word-aligned hybrid codec.
//!
//! A compressed stream is a little-endian concatenation of 32-bit [`Word`]s
//! with no header or footer. Raw bits are consumed in 31-bit groups: mixed
//! groups become literal words and runs of homogeneous groups collapse into
//! fill words.

use std::iter;

use bitvec::{field::BitField, order::Lsb0, slice::BitSlice, vec::BitVec};
use bytes::BufMut;
use either::Either;
use thiserror::Error;
use zerocopy::{FromBytes, LittleEndian, U32};

use crate::{
    Bounds,
    word::{GROUP_BITS, MAX_GROUPS, Word},
};

pub mod encoder;

pub use encoder::Encoder;

/// A word as it is laid out in a serialized buffer.
pub type EncodedWord = U32<LittleEndian>;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    #[error("buffer length is not a multiple of the word size")]
    Length,

    #[error("fill word {index} has an empty run")]
    EmptyRun { index: usize },

    #[error("bitmap extends past the largest addressable offset")]
    Overflow,
}

/// Views `data` as a word stream, rejecting buffers that are not a whole
/// number of words or that contain empty fills.
pub fn decode_words(data: &[u8]) -> Result<&[EncodedWord], FormatError> {
    let words = <[EncodedWord]>::ref_from_bytes(data).map_err(|_| FormatError::Length)?;
    for (index, raw) in words.iter().enumerate() {
        if let Word::Fill { run: 0, .. } = Word::from_raw(raw.get()) {
            return Err(FormatError::EmptyRun { index });
        }
    }
    Ok(words)
}

/// Compresses `raw` into `encoder`, returning the number of words written.
///
/// The trailing group is zero padded. Any run still pending in the encoder
/// when this returns has been flushed.
pub fn compress_to<B: BufMut>(raw: &BitSlice<u8, Lsb0>, encoder: &mut Encoder<B>) -> usize {
    let before = encoder.words_written();
    for group in raw.chunks(GROUP_BITS as usize) {
        encoder.put_group(group.load_le::<u32>());
    }
    encoder.flush();
    encoder.words_written() - before
}

/// Lazily expands a word stream into its logical bits, 31 per group.
pub fn decompress<I>(words: I) -> impl Iterator<Item = bool> + Clone
where
    I: IntoIterator<Item = Word>,
    I::IntoIter: Clone,
{
    words.into_iter().flat_map(|word| match word {
        Word::Literal(bits) => Either::Left((0..GROUP_BITS).map(move |bit| bits & (1 << bit) != 0)),
        Word::Fill { value, run } => {
            Either::Right(iter::repeat_n(value, run as usize * GROUP_BITS as usize))
        }
    })
}

/// Expands a word stream into raw bits; the inverse of [`compress_to`] up to
/// padding of the final group.
pub fn decompress_to<I>(words: I) -> BitVec<u8, Lsb0>
where
    I: IntoIterator<Item = Word>,
    I::IntoIter: Clone,
{
    decompress(words).collect()
}

/// Iterates the offsets of every set bit in a word stream, in ascending order.
pub(crate) fn ones(words: impl IntoIterator<Item = Word>) -> impl Iterator<Item = u32> {
    words
        .into_iter()
        .scan(0u64, |groups, word| {
            let base = *groups * GROUP_BITS as u64;
            *groups += word.groups();
            Some((base, word))
        })
        .flat_map(|(base, word)| match word {
            Word::Literal(bits) => Either::Left(
                (0..GROUP_BITS)
                    .filter(move |bit| bits & (1 << bit) != 0)
                    .map(move |bit| base + bit as u64),
            ),
            Word::Fill { value: true, run } => {
                Either::Right(base..base + run as u64 * GROUP_BITS as u64)
            }
            Word::Fill { value: false, .. } => Either::Right(base..base),
        })
        .map(|offset| offset as u32)
}

/// A summary of a word stream: how many groups it spans and where its first
/// and last set bits lie.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Extent {
    pub groups: u64,
    pub first_one: Option<u64>,
    pub last_one: Option<u64>,
}

impl Extent {
    pub fn survey(words: impl IntoIterator<Item = Word>) -> Self {
        let mut extent = Self::default();
        for word in words {
            let base = extent.groups * GROUP_BITS as u64;
            let ones = match word {
                Word::Literal(0) | Word::Fill { value: false, .. } => None,
                Word::Literal(bits) => Some((
                    base + bits.trailing_zeros() as u64,
                    base + (31 - bits.leading_zeros()) as u64,
                )),
                Word::Fill { value: true, run } => {
                    Some((base, base + run as u64 * GROUP_BITS as u64 - 1))
                }
            };
            if let Some((first, last)) = ones {
                extent.first_one.get_or_insert(first);
                extent.last_one = Some(last);
            }
            extent.groups += word.groups();
        }
        extent
    }

    /// Checks that every group and set bit is addressable by a `u32` offset.
    pub fn check(self) -> Result<Self, FormatError> {
        let addressable = self.groups <= MAX_GROUPS
            && self.last_one.is_none_or(|last| last <= u32::MAX as u64);
        if addressable {
            Ok(self)
        } else {
            Err(FormatError::Overflow)
        }
    }

    /// The tight bounds of the set bits. Only meaningful on a checked extent.
    pub fn bounds(self) -> Bounds {
        match (self.first_one, self.last_one) {
            (Some(first), Some(last)) => Bounds::new(first as u32, last as u32),
            _ => Bounds::EMPTY,
        }
    }
}
