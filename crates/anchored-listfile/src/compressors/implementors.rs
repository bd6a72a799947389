use super::{Compressor, CompressorId, CompressionError, DecompressionError, NO_COMPRESSION};


/// Performs no compression.
///
/// Block writing special-cases uncompressed blocks and never dispatches to this
/// [`Compressor`]; it exists so that ID 0 is always registered.
#[derive(Default, Debug, Clone, Copy)]
pub struct NoneCompressor;

impl CompressorId for NoneCompressor {
    const ID: u8 = NO_COMPRESSION;
}

impl Compressor for NoneCompressor {
    #[inline]
    fn encode_into(
        &self,
        source:     &[u8],
        output_buf: &mut Vec<u8>,
    ) -> Result<(), CompressionError> {
        output_buf.extend(source);
        Ok(())
    }

    #[inline]
    fn decode_into(
        &self,
        source:     &[u8],
        output_buf: &mut Vec<u8>,
    ) -> Result<(), DecompressionError> {
        output_buf.extend(source);
        Ok(())
    }
}
