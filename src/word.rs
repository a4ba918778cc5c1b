use std::fmt;

use num::Integer;
use smallvec::{SmallVec, smallvec};

/// Number of logical bits carried by one literal word, and by each group of a
/// fill word's run.
pub const GROUP_BITS: u32 = 31;

/// Size in bytes of one encoded word.
pub const WORD_SIZE: usize = 4;

/// The longest run of groups a single fill word can describe.
pub const MAX_RUN: u32 = (1 << 30) - 1;

/// The number of groups needed to address every `u32` offset.
pub const MAX_GROUPS: u64 = u32::MAX as u64 / GROUP_BITS as u64 + 1;

const FILL_FLAG: u32 = 1 << 31;
const FILL_VALUE: u32 = 1 << 30;
pub(crate) const LITERAL_MASK: u32 = (1 << GROUP_BITS) - 1;

static_assertions::const_assert_eq!(WORD_SIZE * 8, GROUP_BITS as usize + 1);
static_assertions::const_assert_eq!(LITERAL_MASK & FILL_FLAG, 0);
static_assertions::const_assert_eq!(MAX_RUN & (FILL_FLAG | FILL_VALUE), 0);
static_assertions::const_assert!(MAX_GROUPS < MAX_RUN as u64);

/// A single word of the compressed stream.
///
/// The wire layout of a word is:
///
/// ```text
/// literal: 0 | b30 .. b0              (31 literal bits, bit 0 = lowest offset)
/// fill:    1 | value | run (30 bits)  (run counts 31-bit groups, 1..=MAX_RUN)
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Word {
    Literal(u32),
    Fill { value: bool, run: u32 },
}

impl Word {
    /// Decodes a raw word. Any 32-bit value maps to a word; a fill with a zero
    /// run is representable here and rejected by
    /// [`decode_words`](crate::codec::decode_words).
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        if raw & FILL_FLAG == 0 {
            Word::Literal(raw)
        } else {
            Word::Fill {
                value: raw & FILL_VALUE != 0,
                run: raw & MAX_RUN,
            }
        }
    }

    #[inline]
    pub const fn to_raw(self) -> u32 {
        match self {
            Word::Literal(bits) => bits & LITERAL_MASK,
            Word::Fill { value, run } => {
                debug_assert!(run > 0 && run <= MAX_RUN, "fill run out of range");
                FILL_FLAG | if value { FILL_VALUE } else { 0 } | (run & MAX_RUN)
            }
        }
    }

    /// Builds a literal from the low 31 bits of `bits`.
    #[inline]
    pub const fn literal(bits: u32) -> Self {
        Word::Literal(bits & LITERAL_MASK)
    }

    /// The number of 31-bit groups this word covers.
    #[inline]
    pub const fn groups(self) -> u64 {
        match self {
            Word::Literal(_) => 1,
            Word::Fill { run, .. } => run as u64,
        }
    }

    #[inline]
    pub const fn count_ones(self) -> usize {
        match self {
            Word::Literal(bits) => bits.count_ones() as usize,
            Word::Fill { value: true, run } => run as usize * GROUP_BITS as usize,
            Word::Fill { value: false, .. } => 0,
        }
    }

    /// Returns the value of `bit` within any of the groups this word covers.
    #[inline]
    pub const fn get(self, bit: u32) -> bool {
        debug_assert!(bit < GROUP_BITS);
        match self {
            Word::Literal(bits) => bits & (1 << bit) != 0,
            Word::Fill { value, .. } => value,
        }
    }

    /// Returns the repeated bit value if every bit this word covers is equal.
    #[inline]
    pub const fn homogeneous(self) -> Option<bool> {
        match self {
            Word::Literal(0) => Some(false),
            Word::Literal(LITERAL_MASK) => Some(true),
            Word::Literal(_) => None,
            Word::Fill { value, .. } => Some(value),
        }
    }

    /// Rewrites `bit` of the `group`-th group covered by this word to `value`,
    /// returning the one to three words that replace it.
    ///
    /// A literal is patched in place. A fill of the other value is split into
    /// an optional prefix fill, a literal holding the patched group, and an
    /// optional suffix fill; the two fills keep the original value and their
    /// runs sum to `run - 1`. A fill that already holds `value` is returned
    /// unchanged.
    pub fn patch(self, group: u32, bit: u32, value: bool) -> SmallVec<[Word; 3]> {
        debug_assert!(bit < GROUP_BITS);
        match self {
            Word::Literal(bits) => smallvec![Word::Literal(with_bit(bits, bit, value))],
            Word::Fill { value: fill, .. } if fill == value => smallvec![self],
            Word::Fill { value: fill, run } => {
                debug_assert!(group < run, "group {group} outside run of {run}");
                let mut out = SmallVec::new();
                if group > 0 {
                    out.push(Word::Fill { value: fill, run: group });
                }
                let base = if fill { LITERAL_MASK } else { 0 };
                out.push(Word::Literal(with_bit(base, bit, value)));
                let suffix = run - group - 1;
                if suffix > 0 {
                    out.push(Word::Fill { value: fill, run: suffix });
                }
                out
            }
        }
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Word::Literal(bits) => write!(f, "literal {bits:031b}"),
            Word::Fill { value, run } => write!(f, "fill    {} x {run}", u8::from(*value)),
        }
    }
}

#[inline]
const fn with_bit(bits: u32, bit: u32, value: bool) -> u32 {
    if value {
        bits | (1 << bit)
    } else {
        bits & !(1 << bit)
    }
}

/// Maps an offset to its group index and the bit position within that group.
#[inline]
pub(crate) fn split_offset(offset: u32) -> (u64, u32) {
    let (group, bit) = offset.div_rem(&GROUP_BITS);
    (group as u64, bit)
}

/// Finds the word covering `group`, returning it with the index of its first
/// group.
pub(crate) fn locate(words: impl IntoIterator<Item = Word>, group: u64) -> Option<(Word, u64)> {
    let mut start = 0;
    for word in words {
        let end = start + word.groups();
        if group < end {
            return Some((word, start));
        }
        start = end;
    }
    None
}
