use bytes::BufMut;
use zerocopy::IntoBytes;

use crate::{
    codec::EncodedWord,
    word::{MAX_RUN, Word},
};

/// Streams words into a buffer, merging homogeneous groups into fill runs.
///
/// Runs are held back until a word of a different kind arrives, so a fill is
/// extended in place rather than rewritten. Call [`Encoder::flush`],
/// [`Encoder::into_inner`] or [`Encoder::into_trimmed`] to emit the final run.
pub struct Encoder<B: BufMut> {
    buf: B,
    words_written: usize,
    pending: Option<(bool, u64)>,
}

impl<B: BufMut> Encoder<B> {
    pub fn new(buf: B) -> Self {
        Self { buf, words_written: 0, pending: None }
    }

    /// Flush any pending run and retrieve the wrapped buffer.
    pub fn into_inner(mut self) -> B {
        self.flush();
        self.buf
    }

    /// Like [`Encoder::into_inner`], but a pending run of zeros is discarded
    /// instead of written.
    pub fn into_trimmed(mut self) -> B {
        if let Some((false, _)) = self.pending {
            self.pending = None;
        }
        self.flush();
        self.buf
    }

    /// The number of words written to the buffer so far, not counting the
    /// pending run.
    pub fn words_written(&self) -> usize {
        self.words_written
    }

    /// Encode one raw 31-bit group. Bits above the group width are ignored.
    #[inline]
    pub fn put_group(&mut self, bits: u32) {
        self.put_word(Word::literal(bits));
    }

    /// Encode a word, demoting homogeneous literals to fills and merging
    /// fills with the pending run.
    pub fn put_word(&mut self, word: Word) {
        match word.homogeneous() {
            Some(value) => self.put_run(value, word.groups()),
            None => {
                self.flush();
                self.put_raw(word);
            }
        }
    }

    /// Encode `groups` consecutive groups that are entirely `value`.
    pub fn put_run(&mut self, value: bool, groups: u64) {
        if groups == 0 {
            return;
        }
        match &mut self.pending {
            Some((pending, len)) if *pending == value => *len += groups,
            _ => {
                self.flush();
                self.pending = Some((value, groups));
            }
        }
    }

    /// Write out the pending run, chaining fill words when it exceeds
    /// [`MAX_RUN`].
    pub fn flush(&mut self) {
        if let Some((value, mut len)) = self.pending.take() {
            while len > 0 {
                let run = len.min(MAX_RUN as u64) as u32;
                self.put_raw(Word::Fill { value, run });
                len -= run as u64;
            }
        }
    }

    fn put_raw(&mut self, word: Word) {
        self.buf.put_slice(EncodedWord::new(word.to_raw()).as_bytes());
        self.words_written += 1;
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;

    #[test]
    fn test_merges_fills() {
        let mut encoder = Encoder::new(BytesMut::new());
        encoder.put_word(Word::Fill { value: false, run: 3 });
        encoder.put_word(Word::Literal(0));
        encoder.put_group(0);
        assert_eq!(encoder.words_written(), 0);
        encoder.put_word(Word::Literal(0b10));
        assert_eq!(encoder.words_written(), 2);
        encoder.put_word(Word::Fill { value: true, run: 1 });
        encoder.put_group(u32::MAX);
        let buf = encoder.into_inner();

        assert_eq!(
            buf.as_ref(),
            &[
                0x05, 0x00, 0x00, 0x80, // fill 0 x 5
                0x02, 0x00, 0x00, 0x00, // literal
                0x02, 0x00, 0x00, 0xC0, // fill 1 x 2
            ]
        );
    }

    #[test]
    fn test_trimmed() {
        let mut encoder = Encoder::new(BytesMut::new());
        encoder.put_word(Word::Literal(1));
        encoder.put_run(false, 100);
        assert_eq!(encoder.into_trimmed().len(), 4);

        let mut encoder = Encoder::new(BytesMut::new());
        encoder.put_run(true, 2);
        assert_eq!(encoder.into_trimmed().len(), 4);
    }

    #[test]
    fn test_chains_long_runs() {
        let mut encoder = Encoder::new(Vec::new());
        encoder.put_run(true, MAX_RUN as u64 + 5);
        encoder.put_run(false, 0);
        encoder.flush();
        assert_eq!(encoder.words_written(), 2);
        let buf = encoder.into_inner();
        assert_eq!(&buf[..4], &Word::Fill { value: true, run: MAX_RUN }.to_raw().to_le_bytes());
        assert_eq!(&buf[4..], &Word::Fill { value: true, run: 5 }.to_raw().to_le_bytes());
    }
}
