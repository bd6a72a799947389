use std::io::Read as _;

use flate2::{Compress, Compression, Decompress};
use flate2::bufread::{ZlibDecoder, ZlibEncoder};

use super::{Compressor, CompressorId, CompressionError, DecompressionError, ZLIB_COMPRESSION};


/// The highest level zlib accepts; configured levels above it are clamped down.
const MAX_ZLIB_LEVEL: u8 = 9;


/// Uses [`flate2`] to provide support for zlib compression and decompression.
///
/// A zlib stream is self-delimiting, so the zero padding after a compressed block's
/// payload is never consumed by the decoder.
#[derive(Debug, Clone, Copy)]
pub struct ZlibCompressor {
    pub compression_level: u8,
}

impl Default for ZlibCompressor {
    fn default() -> Self {
        // This is `flate2::Compression::default()`.
        Self {
            compression_level: 6,
        }
    }
}

impl ZlibCompressor {
    #[must_use]
    pub fn new(compression_level: u8) -> Self {
        Self {
            compression_level: compression_level.min(MAX_ZLIB_LEVEL),
        }
    }
}

impl CompressorId for ZlibCompressor {
    const ID: u8 = ZLIB_COMPRESSION;
}

impl Compressor for ZlibCompressor {
    fn encode_into(
        &self,
        source:     &[u8],
        output_buf: &mut Vec<u8>,
    ) -> Result<(), CompressionError> {
        let level = u32::from(self.compression_level.min(MAX_ZLIB_LEVEL));
        let mut encoder = ZlibEncoder::new_with_compress(
            source,
            Compress::new(Compression::new(level), true),
        );

        encoder.read_to_end(output_buf).map_err(CompressionError::from_display)?;
        Ok(())
    }

    fn decode_into(
        &self,
        source:     &[u8],
        output_buf: &mut Vec<u8>,
    ) -> Result<(), DecompressionError> {
        let mut decoder = ZlibDecoder::new_with_decompress(
            source,
            Decompress::new(true),
        );

        decoder.read_to_end(output_buf).map_err(DecompressionError::from_display)?;
        Ok(())
    }
}
