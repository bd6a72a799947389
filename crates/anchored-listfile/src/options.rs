use std::num::NonZeroU8;

use bijective_enum_map::injective_enum_map;

use crate::format;


/// The compression methods a [`ListWriter`] may be configured with.
///
/// The method's byte value is what a compressed block's indicator byte stores; `0` is
/// reserved for "no compression" and is not a valid writer setting.
///
/// [`ListWriter`]: crate::writer::ListWriter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressMethod {
    Lz4,
    Zlib,
}

injective_enum_map! {
    CompressMethod, u8,
    Lz4  <=> 1,
    Zlib <=> 2,
}

/// Configuration for a [`ListWriter`].
///
/// The defaults match what most files should use: 64 KiB blocks, LZ4 compression at
/// level 1.
///
/// [`ListWriter`]: crate::writer::ListWriter
#[derive(Debug, Clone, Copy)]
pub struct WriterOptions {
    /// Blocks are `65536 * block_size_multiplier` bytes.
    ///
    /// This is a property of the file, recorded in its header; every reader and appender
    /// of the file uses the same block size.
    pub block_size_multiplier: NonZeroU8,
    /// Whether full blocks should be compressed when that actually shrinks them.
    pub use_compression:       bool,
    /// Which method compressed blocks use. Ignored if `use_compression` is false.
    pub compress_method:       CompressMethod,
    /// Compression level, `0..=22`. Methods clamp this to their own usable range
    /// (zlib accepts `0..=9`; the LZ4 block format has a single speed setting and
    /// ignores the level).
    pub compress_level:        u8,
    /// Continue an existing file instead of creating a new one. The existing header is
    /// kept (and must be compatible with these options); new records are appended after
    /// the existing data.
    pub append:                bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            block_size_multiplier: NonZeroU8::MIN,
            use_compression:       true,
            compress_method:       CompressMethod::Lz4,
            compress_level:        1,
            append:                false,
        }
    }
}

impl WriterOptions {
    /// The block size, in bytes, of files written with these options.
    #[inline]
    #[must_use]
    pub fn block_size(&self) -> usize {
        format::block_size(self.block_size_multiplier)
    }
}
