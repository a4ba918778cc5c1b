//! A Word-Aligned Hybrid (WAH) compressed bitmap over `u32` offsets.
//!
//! Bits are grouped into 31-bit groups, and each group is stored in a 32-bit
//! word. A word is either a literal holding one group verbatim, or a fill
//! standing in for a run of groups that are all zeros or all ones. Sparse and
//! dense regions therefore compress to a handful of words.
//!
//! ## Key Features:
//!
//! - **Zero-copy Reads**: [`CompressedBitmap`] wraps its serialized word stream
//!   directly and answers queries without decoding it into another form.
//!
//! - **Incremental Edits**: [`CompressedBitmapBuilder`] patches literals in
//!   place and splits fill runs around an edited group, appending in O(1)
//!   when offsets arrive in increasing order.
//!
//! - **Simple Wire Format**: the serialized form is the little-endian
//!   concatenation of the words, with no header or footer.

mod bitmap;
mod bounds;
mod builder;
pub mod codec;
mod traits;
mod util;
pub mod word;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use bitmap::CompressedBitmap;
pub use bounds::Bounds;
pub use builder::CompressedBitmapBuilder;
pub use codec::FormatError;
pub use traits::{BitmapRead, BitmapWrite};
pub use word::{GROUP_BITS, MAX_RUN, WORD_SIZE, Word};
