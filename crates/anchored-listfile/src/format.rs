use std::num::NonZeroU8;

use bijective_enum_map::injective_enum_map;


// ================================================================
//  On-disk constants
// ================================================================

/// The 8-byte magic prefix of every list file.
pub(crate) const MAGIC: [u8; 8] = *b"LST1.000";

/// Blocks are a multiple of 64 KiB; the multiplier is stored in the file header.
pub(crate) const BLOCK_SIZE_UNIT: usize = 1 << 16;

/// The header of each physical record is 7 bytes long: a masked CRC32C, a little-endian
/// length, and a record type byte.
pub(crate) const RECORD_HEADER_SIZE: usize = size_of::<u32>() + size_of::<u16>() + size_of::<u8>();

/// Records strictly shorter than this are batched into [`RecordType::Array`] records
/// rather than paying [`RECORD_HEADER_SIZE`] bytes of framing each.
pub(crate) const ARRAY_RECORD_MAX_SIZE: usize = 4096;

/// A physical record's length field is two bytes, so no payload may exceed this — even in
/// files whose blocks are larger than 64 KiB.
#[expect(clippy::as_conversions, reason = "`From` conversions do not yet work in const")]
pub(crate) const MAX_PHYSICAL_PAYLOAD: usize = u16::MAX as usize;

/// File header flag bit: a metadata block follows the fixed header fields.
pub(crate) const FLAG_HAS_METADATA: u8 = 1;
/// File header flag bit: blocks of this file may be compressed.
pub(crate) const FLAG_DEFAULT_COMPRESSION: u8 = 1 << 1;
/// Readers must reject files with flag bits outside this mask; the spare bits are the
/// format's room for future revisions.
pub(crate) const KNOWN_FLAGS: u8 = FLAG_HAS_METADATA | FLAG_DEFAULT_COMPRESSION;

/// The block size used by a file with the given header multiplier.
#[inline]
#[must_use]
pub(crate) fn block_size(multiplier: NonZeroU8) -> usize {
    BLOCK_SIZE_UNIT * usize::from(multiplier.get())
}


// ================================================================
//  Physical record types
// ================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecordType {
    /// A reserved or empty slot. Skipped by readers.
    Zero,
    /// An entire logical record in one physical record.
    Full,
    /// The first fragment of a logical record spanning block boundaries.
    First,
    /// An interior fragment.
    Middle,
    /// The final fragment.
    Last,
    /// Several small logical records packed into one physical record.
    Array,
}

impl RecordType {
    pub(crate) const ALL_TYPES: [Self; 6] = [
        Self::Zero, Self::Full, Self::First, Self::Middle, Self::Last, Self::Array,
    ];
}

injective_enum_map! {
    RecordType, u8,
    Zero   <=> 0,
    Full   <=> 1,
    First  <=> 2,
    Middle <=> 3,
    Last   <=> 4,
    Array  <=> 5,
}

pub(crate) trait IndexRecordTypes<T> {
    #[must_use]
    fn infallible_index(&self, record_type: RecordType) -> &T;
}

impl<T> IndexRecordTypes<T> for [T; RecordType::ALL_TYPES.len()] {
    fn infallible_index(&self, record_type: RecordType) -> &T {
        // We need `usize::from(u8::from(record_type)) < self.len()`, which holds since
        // `self.len() == RecordType::ALL_TYPES.len() == 6` and the enum maps into `0..6`.
        #[expect(
            clippy::indexing_slicing,
            reason = "See above. Not pressing enough to use `unsafe`",
        )]
        &self[usize::from(u8::from(record_type))]
    }
}


// ================================================================
//  Varints
// ================================================================

/// Append the base-128 varint encoding of `value` to `out`.
pub(crate) fn put_varint(out: &mut Vec<u8>, value: u64) {
    use integer_encoding::VarInt as _;

    // A u64 varint needs at most 10 bytes.
    let mut buf = [0_u8; 10];
    let len = value.encode_var(&mut buf);
    #[expect(clippy::indexing_slicing, reason = "`encode_var` returns at most `buf.len()`")]
    out.extend(&buf[..len]);
}

/// Decode a varint from the front of `input`, returning the value and the remainder of
/// the slice. Returns `None` on a truncated or overlong encoding.
pub(crate) fn get_varint(input: &[u8]) -> Option<(u64, &[u8])> {
    use integer_encoding::VarInt as _;

    let (value, read) = u64::decode_var(input)?;
    input.get(read..).map(|rest| (value, rest))
}


// ================================================================
//  Checksum masking
// ================================================================

const CHECKSUM_MASK_DELTA: u32 = 0x_a282_ead8;

/// Rotate and offset a CRC32C so that storing the checksum of data which itself contains
/// checksums does not produce aligned, self-similar bytes.
#[inline]
#[must_use]
pub(crate) const fn mask_checksum(unmasked: u32) -> u32 {
    unmasked.rotate_right(15).wrapping_add(CHECKSUM_MASK_DELTA)
}

#[inline]
#[must_use]
pub(crate) const fn unmask_checksum(masked: u32) -> u32 {
    masked.wrapping_sub(CHECKSUM_MASK_DELTA).rotate_left(15)
}
