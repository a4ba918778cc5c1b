use std::{fmt::Debug, iter};

use bitvec::{order::Lsb0, slice::BitSlice};
use bytes::{Bytes, BytesMut};
use itertools::Itertools;
use tracing::debug;
use zerocopy::FromBytes;

use crate::{
    BitmapRead, Bounds, CompressedBitmapBuilder,
    codec::{self, EncodedWord, Encoder, Extent, FormatError, decode_words, decompress},
    util::IteratorExt,
    word::{Word, WORD_SIZE, locate, split_offset},
};

/// An immutable WAH compressed bitmap.
///
/// `CompressedBitmap` owns a validated, serialized word stream and can be
/// queried without decoding it. Cloning is cheap and the bitmap can be shared
/// freely between threads. To edit a bitmap, convert it into a
/// [`CompressedBitmapBuilder`] with [`CompressedBitmap::to_builder`].
///
/// # Examples
///
/// ```
/// use wah_bitmap::{BitmapRead, CompressedBitmap};
///
/// let bitmap = CompressedBitmap::from_iter([3, 1024, 70000]);
/// assert!(bitmap.test(1024));
/// assert!(!bitmap.test(1025));
/// assert_eq!(bitmap.count_bits(), 3);
///
/// // the serialized form is just the word stream
/// let bytes = bitmap.to_bytes();
/// assert_eq!(bytes.len(), bitmap.count() * 4);
/// assert_eq!(CompressedBitmap::from_bytes(bytes).unwrap(), bitmap);
/// ```
#[derive(Clone)]
pub struct CompressedBitmap {
    data: Bytes,
    bounds: Bounds,
}

static_assertions::assert_impl_all!(CompressedBitmap: Send, Sync);

impl CompressedBitmap {
    /// An empty bitmap with no words, suitable for usage in a const context.
    pub const EMPTY: Self = Self { data: Bytes::new(), bounds: Bounds::EMPTY };

    /// Decodes a serialized word stream.
    ///
    /// The buffer must hold a whole number of little-endian words, every fill
    /// must have a non-empty run and every set bit must be addressable by a
    /// `u32` offset.
    pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self, FormatError> {
        let data = data.into();
        let bounds = decode_words(&data)
            .and_then(|words| Extent::survey(words.iter().map(|w| Word::from_raw(w.get()))).check())
            .map(Extent::bounds)
            .inspect_err(|err| {
                debug!(
                    target: "wah_bitmap::bitmap",
                    event = "decode_rejected",
                    len = data.len(),
                    %err
                )
            })?;
        Ok(Self { data, bounds })
    }

    /// Compresses raw bits, where bit `i` of `raw` is offset `i`.
    ///
    /// The word stream is exactly what the codec produces, so trailing zero
    /// groups are kept as a fill.
    pub fn from_bits(raw: &BitSlice<u8, Lsb0>) -> Result<Self, FormatError> {
        let mut encoder = Encoder::new(BytesMut::new());
        codec::compress_to(raw, &mut encoder);
        Self::from_bytes(encoder.into_inner().freeze())
    }

    /// Wraps a word stream produced by this crate's encoder.
    pub(crate) fn from_parts(data: Bytes, bounds: Bounds) -> Self {
        debug_assert_eq!(data.len() % WORD_SIZE, 0);
        Self { data, bounds }
    }

    /// Returns the serialized word stream. The empty bitmap serializes to an
    /// empty buffer.
    #[inline]
    pub fn to_bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// The number of words in the compressed stream.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.len() / WORD_SIZE
    }

    /// Iterates the decoded words of the compressed stream.
    pub fn words(&self) -> impl Iterator<Item = Word> + Clone + '_ {
        self.encoded().iter().map(|w| Word::from_raw(w.get()))
    }

    /// Copies the words into a new builder; edits to the builder never affect
    /// this bitmap.
    pub fn to_builder(&self) -> CompressedBitmapBuilder {
        CompressedBitmapBuilder::from_words(self.words().collect(), self.bounds)
    }

    /// Renders the word stream, one word per line.
    pub fn dump(&self) -> String {
        let header = format!(
            "CompressedBitmap: {} words, bounds {}",
            self.count(),
            self.bounds
        );
        iter::once(header)
            .chain(
                self.words()
                    .enumerate()
                    .map(|(i, word)| format!("[{i:>4}] {word}")),
            )
            .join("\n")
    }

    fn encoded(&self) -> &[EncodedWord] {
        <[EncodedWord]>::ref_from_bytes(&self.data)
            .expect("BUG: word stream is validated on construction")
    }
}

impl Default for CompressedBitmap {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Debug for CompressedBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressedBitmap")
            .field("words", &self.count())
            .field("bounds", &self.bounds)
            .field("bits", &self.count_bits())
            .finish()
    }
}

impl BitmapRead for CompressedBitmap {
    fn test(&self, offset: u32) -> bool {
        if !self.bounds.contains(offset) {
            return false;
        }
        let (group, bit) = split_offset(offset);
        locate(self.words(), group).is_some_and(|(word, _)| word.get(bit))
    }

    fn count_bits(&self) -> usize {
        self.words().map(Word::count_ones).sum()
    }

    #[inline]
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = u32> {
        codec::ones(self.words()).with_exact_len(self.count_bits())
    }

    fn to_bool_vec(&self) -> Vec<bool> {
        decompress(self.words()).collect()
    }
}

/// Bitmaps are equal when they have the same set bits, however their runs are
/// partitioned into words.
impl PartialEq for CompressedBitmap {
    fn eq(&self, other: &Self) -> bool {
        self.bounds == other.bounds && itertools::equal(self.iter(), other.iter())
    }
}

impl Eq for CompressedBitmap {}

impl TryFrom<Bytes> for CompressedBitmap {
    type Error = FormatError;

    fn try_from(data: Bytes) -> Result<Self, Self::Error> {
        Self::from_bytes(data)
    }
}

impl FromIterator<u32> for CompressedBitmap {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        CompressedBitmapBuilder::from_iter(iter).to_bitmap()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use bitvec::{bitvec, vec::BitVec};
    use itertools::assert_equal;
    use proptest::{collection::hash_set, proptest};

    use super::*;
    use crate::{
        BitmapWrite,
        testutil::{UncompressedBitmap, check_against_witness},
        word::MAX_RUN,
    };

    fn bytes_of(words: &[u32]) -> Bytes {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn test_empty() {
        let empty = CompressedBitmap::EMPTY;
        assert_eq!(empty.count(), 0);
        assert_eq!(empty.bounds(), Bounds::EMPTY);
        assert_eq!((empty.bounds().lowest(), empty.bounds().highest()), (0, -1));
        assert!(empty.is_empty());
        assert_eq!(empty.count_bits(), 0);
        assert_eq!(empty.to_bytes().len(), 0);
        assert_eq!(empty.iter().next(), None);
        assert!(empty.to_bool_vec().is_empty());
        for offset in [0, 1, 30, 31, 1234, u32::MAX] {
            assert!(!empty.test(offset), "offset {offset}");
        }
        assert_eq!(CompressedBitmap::default(), empty);
        assert_eq!(CompressedBitmap::from_bytes(Bytes::new()).unwrap(), empty);
    }

    #[test]
    fn test_scenario() {
        let mut builder = CompressedBitmap::EMPTY.to_builder();
        assert!(builder.set(0));
        assert!(builder.set(17));
        assert!(!builder.set(17));
        assert!(builder.set(31));
        assert!(builder.set(1234));

        let bitmap = builder.to_bitmap();
        for offset in 0..=1234 {
            let expected = matches!(offset, 0 | 17 | 31 | 1234);
            assert_eq!(bitmap.test(offset), expected, "offset {offset}");
        }
        assert_eq!(bitmap.count_bits(), 4);
        assert_eq!(bitmap.bounds(), Bounds::new(0, 1234));
        assert_equal(bitmap.iter(), [0, 17, 31, 1234]);
        assert_eq!(
            bitmap.words().collect::<Vec<_>>(),
            [
                Word::Literal(1 | 1 << 17),
                Word::Literal(1),
                Word::Fill { value: false, run: 37 },
                Word::Literal(1 << 25),
            ]
        );
    }

    #[test]
    fn test_from_bytes_errors() {
        assert_matches!(
            CompressedBitmap::from_bytes(vec![0u8; 6]),
            Err(FormatError::Length)
        );
        assert_matches!(
            CompressedBitmap::from_bytes(bytes_of(&[0x0000_0001, 0xC000_0000])),
            Err(FormatError::EmptyRun { index: 1 })
        );
        assert_matches!(
            CompressedBitmap::from_bytes(bytes_of(&[0x8000_0000 | MAX_RUN, 0x0000_0001])),
            Err(FormatError::Overflow)
        );
    }

    #[test]
    fn test_from_bytes_unnormalized() {
        // a valid stream doesn't have to be minimal
        let bitmap = CompressedBitmap::from_bytes(bytes_of(&[
            0x0000_0000, // empty literal
            0x8000_0001, // fill 0 x 1
            0x8000_0001, // fill 0 x 1
            0x0000_0004, // literal
            0x8000_0009, // trailing fill 0 x 9
        ]))
        .unwrap();

        assert_eq!(bitmap.count(), 5);
        assert_eq!(bitmap.bounds(), Bounds::single(95));
        assert!(bitmap.test(95));
        assert!(!bitmap.test(96));
        assert_eq!(bitmap.count_bits(), 1);
        assert_eq!(bitmap.to_bool_vec().len(), 31 * 13);

        let normalized = bitmap.to_builder().to_bitmap();
        assert_eq!(normalized.count(), 2);
        assert_eq!(normalized, bitmap);
    }

    #[test]
    fn test_from_bits() {
        let mut raw = bitvec![u8, Lsb0; 0; 31 * 64];
        raw[31 * 3..31 * 40].fill(true);
        raw.set(5, true);
        raw.set(31 * 50 + 7, true);

        let bitmap = CompressedBitmap::from_bits(&raw).unwrap();
        assert_eq!(bitmap.count(), 6);
        assert_eq!(bitmap.count_bits(), raw.count_ones());
        assert_eq!(bitmap.bounds(), Bounds::new(5, 31 * 50 + 7));
        assert_equal(bitmap.iter(), raw.iter_ones().map(|i| i as u32));

        let expanded: BitVec<u8, Lsb0> = bitmap.to_bool_vec().into_iter().collect();
        assert_eq!(expanded, raw);

        // all zero input compresses to a single fill but holds no bits
        let zeros = CompressedBitmap::from_bits(&bitvec![u8, Lsb0; 0; 31 * 1024]).unwrap();
        assert_eq!(zeros.count(), 1);
        assert!(zeros.is_empty());
        assert_eq!(zeros, CompressedBitmap::EMPTY);
    }

    #[test]
    fn test_max_offset() {
        let bitmap = CompressedBitmap::from_iter([0, u32::MAX]);
        assert!(bitmap.test(u32::MAX));
        assert!(!bitmap.test(u32::MAX - 1));
        assert_eq!(bitmap.bounds(), Bounds::new(0, u32::MAX));
        assert_eq!(bitmap.count(), 3);
        assert_equal(bitmap.iter(), [0, u32::MAX]);

        let decoded = CompressedBitmap::from_bytes(bitmap.to_bytes()).unwrap();
        assert_eq!(decoded, bitmap);
    }

    #[test]
    fn test_to_builder_is_independent() {
        let bitmap = CompressedBitmap::from_iter([1, 2, 3]);
        let mut builder = bitmap.to_builder();
        assert!(builder.clear(2));
        assert!(builder.set(100));
        assert!(bitmap.test(2));
        assert!(!bitmap.test(100));
        assert_equal(builder.to_bitmap().iter(), [1, 3, 100]);
        assert_equal(bitmap.iter(), [1, 2, 3]);
    }

    #[test]
    fn test_dump() {
        let bitmap = CompressedBitmap::from_iter([0, 1, 1000]);
        let dump = bitmap.dump();
        let lines = dump.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "CompressedBitmap: 3 words, bounds (0, 1000)");
        assert!(lines[2].ends_with("fill    0 x 31"), "{}", lines[2]);
    }

    #[test]
    fn test_eq_ignores_partitioning() {
        let a = CompressedBitmap::from_bytes(bytes_of(&[0xC000_0002])).unwrap();
        let b = CompressedBitmap::from_bytes(bytes_of(&[0x7FFF_FFFF, 0xC000_0001])).unwrap();
        assert_ne!(a.to_bytes(), b.to_bytes());
        assert_eq!(a, b);
        assert_ne!(a, CompressedBitmap::from_iter(0..61));
    }

    proptest! {
        #[test]
        fn test_round_trip_proptest(set in hash_set(0u32..65536, 0..512)) {
            let bitmap = CompressedBitmap::from_iter(set.iter().copied());
            let decoded = CompressedBitmap::try_from(bitmap.to_bytes()).unwrap();

            assert_eq!(decoded.to_bytes(), bitmap.to_bytes());
            assert_eq!(decoded.bounds(), bitmap.bounds());
            assert_eq!(decoded.count_bits(), set.len());

            let mut witness = UncompressedBitmap::default();
            for &offset in &set {
                witness.set(offset);
            }
            check_against_witness(&decoded, &witness);
        }
    }
}
