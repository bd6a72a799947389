//! Pluggable per-block compression.
//!
//! A [`Compressor`] turns a whole block into a compressed payload and back; the
//! [`CompressorList`] maps the indicator byte stored in compressed blocks to the
//! implementation that can undo it. The list always knows ID 0 ("no compression");
//! LZ4 and zlib are registered at their format-assigned IDs when the corresponding
//! cargo features are enabled (both are, by default).

mod compressor_list;
mod implementors;
#[cfg(feature = "lz4-compression")]
mod lz4_impl;
#[cfg(feature = "zlib-compression")]
mod zlib_impl;

use std::error::Error;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};


pub use self::{compressor_list::CompressorList, implementors::NoneCompressor};
#[cfg(feature = "lz4-compression")]
pub use self::lz4_impl::Lz4Compressor;
#[cfg(feature = "zlib-compression")]
pub use self::zlib_impl::ZlibCompressor;


/// Compress or decompress byte slices.
pub trait Compressor: Debug {
    /// Write the result of compressing `source` into `output_buf`.
    ///
    /// Implementors may assume that the passed `output_buf` is an empty `Vec`, and callers
    /// must uphold this assumption.
    fn encode_into(
        &self,
        source:     &[u8],
        output_buf: &mut Vec<u8>,
    ) -> Result<(), CompressionError>;

    /// Write the result of decompressing `source` into `output_buf`.
    ///
    /// `source` is everything in the block after the indicator byte, so it may carry zero
    /// padding after the real payload; implementors must either tolerate or delimit it.
    ///
    /// Implementors may assume that the passed `output_buf` is an empty `Vec`, and callers
    /// must uphold this assumption.
    fn decode_into(
        &self,
        source:     &[u8],
        output_buf: &mut Vec<u8>,
    ) -> Result<(), DecompressionError>;
}

/// Get the ID associated with a compression format.
///
/// This trait is associated with [`Compressor`], but is kept separate in order to leave
/// [`Compressor`] dyn-compatible.
pub trait CompressorId {
    /// The indicator byte of a [`Compressor`], stored as the first byte of compressed
    /// blocks.
    const ID: u8;
}

/// The indicator byte meaning a block is not compressed.
pub const NO_COMPRESSION:   u8 = 0;
/// The indicator byte of LZ4-compressed blocks.
pub const LZ4_COMPRESSION:  u8 = 1;
/// The indicator byte of zlib-compressed blocks.
pub const ZLIB_COMPRESSION: u8 = 2;


#[derive(Debug, Clone)]
pub struct CompressionError {
    pub error_msg: String,
}

impl CompressionError {
    #[must_use]
    pub fn from_display<E: Display>(err: E) -> Self {
        Self {
            error_msg: err.to_string(),
        }
    }
}

impl Display for CompressionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Error while compressing data: {}", self.error_msg)
    }
}

impl Error for CompressionError {}

#[derive(Debug, Clone)]
pub struct DecompressionError {
    pub error_msg: String,
}

impl DecompressionError {
    #[must_use]
    pub fn from_display<E: Display>(err: E) -> Self {
        Self {
            error_msg: err.to_string(),
        }
    }
}

impl Display for DecompressionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Error while decompressing data: {}", self.error_msg)
    }
}

impl Error for DecompressionError {}
