use std::{fmt, ops::RangeInclusive};

/// The inclusive `(lowest, highest)` offset range spanned by a bitmap.
///
/// The empty range is `(0, -1)`: any bounds with `highest < lowest` are empty.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    lowest: i64,
    highest: i64,
}

impl Bounds {
    pub const EMPTY: Self = Self { lowest: 0, highest: -1 };

    #[inline]
    pub const fn new(lowest: u32, highest: u32) -> Self {
        assert!(lowest <= highest, "bounds are inverted");
        Self {
            lowest: lowest as i64,
            highest: highest as i64,
        }
    }

    /// Bounds covering exactly one offset.
    #[inline]
    pub const fn single(offset: u32) -> Self {
        Self::new(offset, offset)
    }

    #[inline]
    pub const fn lowest(&self) -> i64 {
        self.lowest
    }

    #[inline]
    pub const fn highest(&self) -> i64 {
        self.highest
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.highest < self.lowest
    }

    #[inline]
    pub const fn contains(&self, offset: u32) -> bool {
        let offset = offset as i64;
        self.lowest <= offset && offset <= self.highest
    }

    /// Returns the bounds as a range of offsets, or `None` if empty.
    pub fn range(&self) -> Option<RangeInclusive<u32>> {
        (!self.is_empty()).then(|| self.lowest as u32..=self.highest as u32)
    }

    /// Widens the bounds to cover `offset`.
    pub fn include(&mut self, offset: u32) {
        *self = if self.is_empty() {
            Self::single(offset)
        } else {
            let offset = offset as i64;
            Self {
                lowest: self.lowest.min(offset),
                highest: self.highest.max(offset),
            }
        };
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lowest, self.highest)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
