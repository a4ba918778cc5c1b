use itertools::{Itertools, assert_equal};
use proptest::{
    collection::{SizeRange, vec},
    prop_oneof,
    strategy::Strategy,
};
use rand::{SeedableRng, seq::index};

use crate::{BitmapRead, BitmapWrite, Bounds};

/// A plain one-bool-per-bit bitmap used as the reference model for the
/// compressed types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UncompressedBitmap {
    bits: Vec<bool>,
}

impl UncompressedBitmap {
    /// The number of bits held, one past the highest offset ever set.
    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }
}

impl BitmapRead for UncompressedBitmap {
    fn test(&self, offset: u32) -> bool {
        self.bits.get(offset as usize).copied().unwrap_or(false)
    }

    fn count_bits(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::EMPTY;
        for offset in self.iter() {
            bounds.include(offset);
        }
        bounds
    }

    fn is_empty(&self) -> bool {
        !self.bits.contains(&true)
    }

    fn iter(&self) -> impl Iterator<Item = u32> {
        self.bits.iter().positions(|&b| b).map(|i| i as u32)
    }

    fn to_bool_vec(&self) -> Vec<bool> {
        self.bits.clone()
    }
}

impl BitmapWrite for UncompressedBitmap {
    fn set(&mut self, offset: u32) -> bool {
        let offset = offset as usize;
        if offset >= self.bits.len() {
            self.bits.resize(offset + 1, false);
        }
        !std::mem::replace(&mut self.bits[offset], true)
    }

    fn clear(&mut self, offset: u32) -> bool {
        match self.bits.get_mut(offset as usize) {
            Some(bit) => std::mem::replace(bit, false),
            None => false,
        }
    }
}

/// Asserts that `actual` holds exactly the bits of `witness`.
///
/// Bounds are only required to cover the set bits, since a builder's bounds
/// are allowed to be wider than its contents.
#[track_caller]
pub fn check_against_witness(actual: &impl BitmapRead, witness: &UncompressedBitmap) {
    assert_eq!(actual.count_bits(), witness.count_bits(), "count_bits");
    assert_eq!(actual.is_empty(), witness.is_empty(), "is_empty");
    assert_equal(actual.iter(), witness.iter());

    let margin = 2 * 31;
    for offset in 0..(witness.bit_len() + margin) as u32 {
        assert_eq!(actual.test(offset), witness.test(offset), "test({offset})");
    }

    let (bounds, expected) = (actual.bounds(), witness.bounds());
    if let Some(range) = expected.range() {
        assert!(
            bounds.contains(*range.start()) && bounds.contains(*range.end()),
            "bounds {bounds} do not cover {expected}"
        );
    }
}

/// A single edit applied to a bitmap under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Set(u32),
    Clear(u32),
}

impl Edit {
    pub fn apply(self, bitmap: &mut impl BitmapWrite) -> bool {
        match self {
            Edit::Set(offset) => bitmap.set(offset),
            Edit::Clear(offset) => bitmap.clear(offset),
        }
    }
}

/// Generates sequences of edits over `0..max_offset`, biased toward sets so
/// that clears usually hit set bits.
pub fn edits(max_offset: u32, len: impl Into<SizeRange>) -> impl Strategy<Value = Vec<Edit>> {
    let edit = prop_oneof![
        3 => (0..max_offset).prop_map(Edit::Set),
        1 => (0..max_offset).prop_map(Edit::Clear),
    ];
    vec(edit, len)
}

pub struct OffsetGen {
    rng: rand::rngs::StdRng,
}

impl OffsetGen {
    pub fn new(seed: u64) -> Self {
        let rng = rand::rngs::StdRng::seed_from_u64(seed);
        Self { rng }
    }

    /// `count` increasing offsets spaced `stride` apart, starting at zero.
    #[track_caller]
    pub fn linear(count: usize, stride: u32) -> Vec<u32> {
        let out = (0..count as u32).map(|i| i * stride).collect_vec();
        assert_eq!(out.len(), count);
        out
    }

    /// `count` distinct offsets below `max` in no particular order.
    pub fn random(&mut self, count: usize, max: u32) -> Vec<u32> {
        index::sample(&mut self.rng, max as usize, count)
            .into_iter()
            .map(|i| i as u32)
            .collect()
    }

    /// `clusters` runs of `len` consecutive offsets, placed at distinct
    /// multiples of `len` below `max`.
    pub fn clustered(&mut self, clusters: usize, max: u32, len: u32) -> Vec<u32> {
        let slots = (max / len) as usize;
        index::sample(&mut self.rng, slots, clusters)
            .into_iter()
            .flat_map(|slot| {
                let start = slot as u32 * len;
                start..start + len
            })
            .collect()
    }
}
