use crate::Bounds;

pub trait BitmapRead {
    /// returns true if the bit at `offset` is set. Offsets past the end of
    /// the bitmap are unset.
    fn test(&self, offset: u32) -> bool;

    /// the number of set bits in the bitmap.
    fn count_bits(&self) -> usize;

    /// the inclusive range of offsets spanned by this bitmap, never narrower
    /// than the range of set bits.
    fn bounds(&self) -> Bounds;

    /// returns true if no bit is set
    fn is_empty(&self) -> bool;

    /// returns an iterator over the offsets of all set bits, in ascending
    /// order.
    fn iter(&self) -> impl Iterator<Item = u32>;

    /// expands the bitmap into one bool per logical bit. Diagnostic only.
    fn to_bool_vec(&self) -> Vec<bool>;
}

pub trait BitmapWrite {
    /// Sets the bit at `offset`.
    /// Returns `true` if the bit was previously unset, `false` otherwise.
    fn set(&mut self, offset: u32) -> bool;

    /// Clears the bit at `offset`.
    /// Returns `true` if the bit was previously set, `false` otherwise.
    fn clear(&mut self, offset: u32) -> bool;
}
