use lz4_flex::block::{compress_prepend_size, decompress_size_prepended};

use super::{Compressor, CompressorId, CompressionError, DecompressionError, LZ4_COMPRESSION};


/// Uses [`lz4_flex`] to provide support for LZ4 block compression and decompression.
///
/// Raw LZ4 block data is not self-terminating, and compressed blocks are zero-padded out
/// to the full block size, so the encoded payload is length-prefixed: a little-endian
/// `u32` count of the bytes that follow it, which are `lz4_flex`'s size-prepended block
/// format. The decoder reads the prefix and never feeds padding to LZ4.
///
/// The LZ4 block format has no compression levels; the configured level is ignored.
#[derive(Default, Debug, Clone, Copy)]
pub struct Lz4Compressor;

impl CompressorId for Lz4Compressor {
    const ID: u8 = LZ4_COMPRESSION;
}

impl Compressor for Lz4Compressor {
    fn encode_into(
        &self,
        source:     &[u8],
        output_buf: &mut Vec<u8>,
    ) -> Result<(), CompressionError> {
        let compressed = compress_prepend_size(source);

        let compressed_len = u32::try_from(compressed.len())
            .map_err(|_| CompressionError::from_display("compressed block exceeds u32 bytes"))?;

        output_buf.extend(compressed_len.to_le_bytes());
        output_buf.extend(compressed);
        Ok(())
    }

    fn decode_into(
        &self,
        source:     &[u8],
        output_buf: &mut Vec<u8>,
    ) -> Result<(), DecompressionError> {
        let (prefix, rest) = source.split_at_checked(size_of::<u32>())
            .ok_or_else(|| DecompressionError::from_display("LZ4 payload shorter than prefix"))?;

        #[expect(clippy::unwrap_used, reason = "`prefix` has exactly 4 bytes")]
        let compressed_len = u32::from_le_bytes(prefix.try_into().unwrap());
        let compressed_len = usize::try_from(compressed_len)
            .map_err(DecompressionError::from_display)?;

        let compressed = rest.get(..compressed_len)
            .ok_or_else(|| {
                DecompressionError::from_display("LZ4 length prefix exceeds the payload")
            })?;

        *output_buf = decompress_size_prepended(compressed)
            .map_err(DecompressionError::from_display)?;
        Ok(())
    }
}
