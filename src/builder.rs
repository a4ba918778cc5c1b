use std::fmt::Debug;

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::{
    BitmapRead, BitmapWrite, Bounds, CompressedBitmap,
    codec::{self, Encoder, Extent, decompress},
    util::IteratorExt,
    word::{MAX_RUN, WORD_SIZE, Word, split_offset},
};

/// A mutable compressed bitmap supporting incremental edits.
///
/// The builder keeps the same word layout as [`CompressedBitmap`] in a plain
/// `Vec`, patching literals in place and splitting fill runs around an edited
/// group. Edits at or past the last word are O(1), which makes building a
/// bitmap from increasing offsets cheap; other edits scan for the covering
/// word, starting from the word touched by the previous edit when possible.
///
/// Call [`CompressedBitmapBuilder::to_bitmap`] to normalize the words into an
/// immutable bitmap.
///
/// # Examples
///
/// ```
/// use wah_bitmap::{BitmapRead, BitmapWrite, CompressedBitmapBuilder};
///
/// let mut builder = CompressedBitmapBuilder::new();
/// assert!(builder.set(42));
/// assert!(!builder.set(42));
/// assert!(builder.set(1_000_000));
/// assert!(builder.clear(1_000_000));
///
/// let bitmap = builder.to_bitmap();
/// assert_eq!(bitmap.count_bits(), 1);
/// assert_eq!(bitmap.bounds().highest(), 42);
/// ```
#[derive(Clone, Default)]
pub struct CompressedBitmapBuilder {
    words: Vec<Word>,
    /// total number of groups covered by `words`
    groups: u64,
    bounds: Bounds,
    cursor: Cursor,
}

/// The position of a word: its index and the index of its first group.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
struct Cursor {
    index: usize,
    start: u64,
}

impl CompressedBitmapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_words(words: Vec<Word>, bounds: Bounds) -> Self {
        let groups = words.iter().map(|w| w.groups()).sum();
        Self {
            words,
            groups,
            bounds,
            cursor: Cursor::default(),
        }
    }

    /// The number of words currently held by the builder.
    #[inline]
    pub fn count(&self) -> usize {
        self.words.len()
    }

    /// Iterates the builder's words as they are, without normalization.
    pub fn words(&self) -> impl Iterator<Item = Word> + Clone + '_ {
        self.words.iter().copied()
    }

    /// Normalizes the words into an immutable bitmap.
    ///
    /// Homogeneous literals become fills, adjacent fills of the same value
    /// merge, and trailing zero groups are dropped so the bitmap's bounds are
    /// exactly the range of set bits. The builder is left untouched and can
    /// continue to be edited.
    pub fn to_bitmap(&self) -> CompressedBitmap {
        let mut encoder = Encoder::new(BytesMut::with_capacity(self.words.len() * WORD_SIZE));
        for &word in &self.words {
            encoder.put_word(word);
        }
        let data = encoder.into_trimmed().freeze();
        let bounds = Extent::survey(self.words()).bounds();

        debug!(
            target: "wah_bitmap::builder",
            event = "normalize",
            words_in = self.words.len(),
            words_out = data.len() / WORD_SIZE,
            %bounds
        );
        CompressedBitmap::from_parts(data, bounds)
    }

    /// Finds the word covering `group` without moving the cursor.
    fn find(&self, group: u64) -> Option<Cursor> {
        if group >= self.groups {
            return None;
        }

        // sequential edits land in the last word
        let index = self.words.len() - 1;
        let start = self.groups - self.words[index].groups();
        if group >= start {
            return Some(Cursor { index, start });
        }

        let mut at = if self.cursor.start <= group && self.cursor.index < self.words.len() {
            self.cursor
        } else {
            Cursor::default()
        };
        while at.start + self.words[at.index].groups() <= group {
            at.start += self.words[at.index].groups();
            at.index += 1;
        }
        Some(at)
    }

    fn locate(&mut self, group: u64) -> Option<Cursor> {
        let at = self.find(group)?;
        self.cursor = at;
        Some(at)
    }

    /// Rewrites a bit inside the word at `at`, splitting it if it is a fill of
    /// the other value. Returns true if the bit changed.
    fn patch(&mut self, at: Cursor, group: u64, bit: u32, value: bool) -> bool {
        let word = self.words[at.index];
        if word.get(bit) == value {
            return false;
        }

        let within = (group - at.start) as u32;
        let parts = word.patch(within, bit, value);
        if let [single] = parts[..] {
            self.words[at.index] = single;
        } else {
            trace!(
                target: "wah_bitmap::builder",
                event = "split_fill",
                index = at.index,
                run = word.groups(),
                within,
                parts = parts.len()
            );
            self.words.splice(at.index..=at.index, parts);
        }
        true
    }

    /// Extends the builder so that `group` is its last group, with `bit` set.
    fn grow(&mut self, group: u64, bit: u32) {
        let mut gap = group - self.groups;
        trace!(
            target: "wah_bitmap::builder",
            event = "grow",
            from = self.groups,
            gap
        );

        if gap > 0 {
            if let Some(Word::Fill { value: false, run }) = self.words.last_mut() {
                let extend = gap.min((MAX_RUN - *run) as u64);
                *run += extend as u32;
                gap -= extend;
            }
        }
        while gap > 0 {
            let run = gap.min(MAX_RUN as u64) as u32;
            self.words.push(Word::Fill { value: false, run });
            gap -= run as u64;
        }

        self.words.push(Word::Literal(1 << bit));
        self.groups = group + 1;
    }
}

impl Debug for CompressedBitmapBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressedBitmapBuilder")
            .field("words", &self.words.len())
            .field("groups", &self.groups)
            .field("bounds", &self.bounds)
            .finish()
    }
}

impl BitmapRead for CompressedBitmapBuilder {
    fn test(&self, offset: u32) -> bool {
        let (group, bit) = split_offset(offset);
        self.find(group)
            .is_some_and(|at| self.words[at.index].get(bit))
    }

    fn count_bits(&self) -> usize {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// The builder's bounds grow with every `set` but are not tightened by
    /// `clear`; [`CompressedBitmapBuilder::to_bitmap`] recomputes them.
    #[inline]
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn is_empty(&self) -> bool {
        self.words.iter().all(|w| w.count_ones() == 0)
    }

    fn iter(&self) -> impl Iterator<Item = u32> {
        codec::ones(self.words()).with_exact_len(self.count_bits())
    }

    fn to_bool_vec(&self) -> Vec<bool> {
        decompress(self.words()).collect()
    }
}

impl BitmapWrite for CompressedBitmapBuilder {
    fn set(&mut self, offset: u32) -> bool {
        let (group, bit) = split_offset(offset);
        let changed = match self.locate(group) {
            Some(at) => self.patch(at, group, bit, true),
            None => {
                self.grow(group, bit);
                true
            }
        };
        if changed {
            self.bounds.include(offset);
        }
        changed
    }

    fn clear(&mut self, offset: u32) -> bool {
        let (group, bit) = split_offset(offset);
        self.locate(group)
            .is_some_and(|at| self.patch(at, group, bit, false))
    }
}

impl Extend<u32> for CompressedBitmapBuilder {
    fn extend<T: IntoIterator<Item = u32>>(&mut self, iter: T) {
        for offset in iter {
            self.set(offset);
        }
    }
}

impl FromIterator<u32> for CompressedBitmapBuilder {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut builder = Self::new();
        builder.extend(iter);
        builder
    }
}

impl From<&CompressedBitmap> for CompressedBitmapBuilder {
    fn from(bitmap: &CompressedBitmap) -> Self {
        bitmap.to_builder()
    }
}
