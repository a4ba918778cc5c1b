use std::iter::FusedIterator;

pub trait IteratorExt: Iterator + Sized {
    /// Attach a known exact length to an iterator whose adapters lost it.
    #[inline]
    fn with_exact_len(self, len: usize) -> ExactLenIter<Self> {
        ExactLenIter { remaining: len, iter: self }
    }
}

impl<I: Iterator> IteratorExt for I {}

/// Wraps an iterator that is known to yield exactly `remaining` more items.
#[must_use]
pub struct ExactLenIter<I> {
    remaining: usize,
    iter: I,
}

impl<I: Iterator> Iterator for ExactLenIter<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.iter.next();
        if next.is_some() {
            debug_assert!(self.remaining > 0, "iterator yielded past its length");
            self.remaining = self.remaining.saturating_sub(1);
        }
        next
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<I: Iterator> ExactSizeIterator for ExactLenIter<I> {}
impl<I: FusedIterator> FusedIterator for ExactLenIter<I> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_len() {
        let mut iter = (0..10).filter(|v| v % 2 == 0).with_exact_len(5);
        assert_eq!(iter.len(), 5);
        iter.next();
        iter.next();
        assert_eq!(iter.size_hint(), (3, Some(3)));
        assert_eq!(iter.collect::<Vec<_>>(), [4, 6, 8]);
    }
}
