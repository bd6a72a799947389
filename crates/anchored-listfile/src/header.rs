//! The one-time header at the front of every list file.
//!
//! ```text
//! magic(8) = "LST1.000"    multiplier(1)    flags(1)
//! [ meta_size(u32 LE)  { varint key_len, key, varint value_len, value }*  ]   if bit 0
//! ```
//!
//! Every offset the codec works with afterwards is relative to the first byte past the
//! header (the "block anchor"), so block `k` lives at file offset `anchor + k * B`.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::num::NonZeroU8;

use thiserror::Error;

use crate::error::Error;
use crate::files::ReadonlyFile;
use crate::format::{
    self, FLAG_DEFAULT_COMPRESSION, FLAG_HAS_METADATA, KNOWN_FLAGS, MAGIC,
};


/// User metadata stored once in the file header: unique, ordered, non-empty UTF-8 keys
/// mapped to opaque byte values.
pub type MetaMap = BTreeMap<String, Vec<u8>>;

/// Reserved metadata key naming a serialized schema set. Recognized for downstream
/// tooling; this crate treats its value as opaque bytes.
pub const PROTO_SET_KEY:  &str = "__proto_set__";
/// Reserved metadata key naming a message type. Recognized for downstream tooling;
/// this crate treats its value as opaque bytes.
pub const PROTO_TYPE_KEY: &str = "__proto_type__";

/// Length of the fixed part of the header: magic, multiplier, flags.
const FIXED_HEADER_LEN: usize = MAGIC.len() + 2;

/// The metadata block's size field is a `u32`, so the encoded entries (with their varint
/// framing) must stay under this. [`ListWriter::add_meta`] enforces it entry by entry.
///
/// [`ListWriter::add_meta`]: crate::writer::ListWriter::add_meta
#[expect(clippy::as_conversions, reason = "`From` conversions do not yet work in const")]
pub(crate) const META_SIZE_LIMIT: u64 = (u32::MAX as u64) - (size_of::<u32>() as u64);

/// The encoded size of one metadata entry: varint length prefixes plus key and value
/// bytes. Shared by [`FileHeader::encode`] and the writer's size accounting.
pub(crate) fn encoded_meta_entry_len(key: &str, value: &[u8]) -> u64 {
    #![expect(clippy::as_conversions, reason = "usize fits in u64 on supported platforms")]
    use integer_encoding::VarInt as _;

    let key_len = key.len() as u64;
    let value_len = value.len() as u64;

    (key_len.required_space() as u64) + key_len
        + (value_len.required_space() as u64) + value_len
}


#[derive(Debug, Clone)]
pub(crate) struct FileHeader {
    /// Blocks of this file are `65536 * multiplier` bytes.
    pub multiplier:  NonZeroU8,
    /// Whether blocks of this file may be compressed.
    pub compressed:  bool,
    pub meta:        MetaMap,
    /// File offset of block 0; all block offsets are relative to this.
    pub block_anchor: u64,
}

impl FileHeader {
    pub(crate) fn new(multiplier: NonZeroU8, compressed: bool, meta: MetaMap) -> Self {
        let mut header = Self {
            multiplier,
            compressed,
            meta,
            block_anchor: 0,
        };
        header.block_anchor = header.encoded_len();
        header
    }

    /// The block size of the file this header describes.
    #[inline]
    #[must_use]
    pub(crate) fn block_size(&self) -> usize {
        format::block_size(self.multiplier)
    }

    #[expect(clippy::as_conversions, reason = "small constant sizes fit in u64")]
    #[must_use]
    fn encoded_len(&self) -> u64 {
        let mut len = FIXED_HEADER_LEN as u64;
        if !self.meta.is_empty() {
            len += size_of::<u32>() as u64;
            for (key, value) in &self.meta {
                len += encoded_meta_entry_len(key, value);
            }
        }
        len
    }

    /// Serialize the header. The returned bytes are exactly what [`FileHeader::read_from`]
    /// parses, and their length equals `self.block_anchor`.
    #[expect(clippy::as_conversions, reason = "usize fits in u64 on supported platforms")]
    #[expect(
        clippy::expect_used,
        reason = "`add_meta` keeps the total under `META_SIZE_LIMIT`, which fits in u32",
    )]
    #[must_use]
    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(usize::try_from(self.encoded_len()).unwrap_or(0));

        out.extend(MAGIC);
        out.push(self.multiplier.get());

        let mut flags = 0_u8;
        if !self.meta.is_empty() {
            flags |= FLAG_HAS_METADATA;
        }
        if self.compressed {
            flags |= FLAG_DEFAULT_COMPRESSION;
        }
        out.push(flags);

        if !self.meta.is_empty() {
            let meta_start = out.len() + size_of::<u32>();

            out.extend([0_u8; size_of::<u32>()]);
            for (key, value) in &self.meta {
                format::put_varint(&mut out, key.len() as u64);
                out.extend(key.as_bytes());
                format::put_varint(&mut out, value.len() as u64);
                out.extend(value);
            }

            let meta_size = u32::try_from(out.len() - meta_start)
                .expect("`add_meta` keeps the encoded metadata under `META_SIZE_LIMIT`");
            #[expect(clippy::indexing_slicing, reason = "the placeholder was pushed above")]
            out[meta_start - size_of::<u32>()..meta_start]
                .copy_from_slice(&meta_size.to_le_bytes());
        }

        out
    }

    /// Read and validate a header from the front of `file`.
    #[expect(clippy::as_conversions, reason = "small constant sizes fit in u64")]
    pub(crate) fn read_from<F: ReadonlyFile>(file: &F) -> Result<Self, Error> {
        let mut fixed = [0_u8; FIXED_HEADER_LEN];
        read_fully(file, 0, &mut fixed)?;

        if fixed[..MAGIC.len()] != MAGIC {
            return Err(HeaderError::BadMagic.into());
        }
        let multiplier = NonZeroU8::new(fixed[MAGIC.len()])
            .ok_or(HeaderError::ZeroMultiplier)?;
        let flags = fixed[MAGIC.len() + 1];
        if flags & !KNOWN_FLAGS != 0 {
            return Err(HeaderError::UnknownFlags(flags).into());
        }

        let compressed = flags & FLAG_DEFAULT_COMPRESSION != 0;
        let mut meta = MetaMap::new();
        let mut block_anchor = FIXED_HEADER_LEN as u64;

        if flags & FLAG_HAS_METADATA != 0 {
            let mut size_bytes = [0_u8; size_of::<u32>()];
            read_fully(file, block_anchor, &mut size_bytes)?;
            let meta_size = u32::from_le_bytes(size_bytes);

            let mut meta_bytes = vec![0; usize::try_from(meta_size).unwrap_or(usize::MAX)];
            read_fully(file, block_anchor + size_of::<u32>() as u64, &mut meta_bytes)?;

            parse_meta_entries(&meta_bytes, &mut meta)?;
            if meta.is_empty() {
                // The flag promised at least one entry.
                return Err(HeaderError::TruncatedMetadata.into());
            }

            block_anchor += (size_of::<u32>() as u64) + u64::from(meta_size);
        }

        Ok(Self {
            multiplier,
            compressed,
            meta,
            block_anchor,
        })
    }
}

/// `read_exact_at`, with early end-of-file reported as a truncated header rather than an
/// I/O failure.
fn read_fully<F: ReadonlyFile>(file: &F, offset: u64, buf: &mut [u8]) -> Result<(), Error> {
    file.read_exact_at(offset, buf).map_err(|err| {
        if err.kind() == ErrorKind::UnexpectedEof {
            Error::InvalidHeader(HeaderError::Truncated)
        } else {
            Error::Io(err)
        }
    })
}

fn parse_meta_entries(mut input: &[u8], meta: &mut MetaMap) -> Result<(), HeaderError> {
    while !input.is_empty() {
        let (key, rest) = parse_meta_bytes(input)?;
        let (value, rest) = parse_meta_bytes(rest)?;
        input = rest;

        if key.is_empty() {
            return Err(HeaderError::EmptyMetaKey);
        }
        let key = std::str::from_utf8(key)
            .map_err(|_| HeaderError::MetaKeyNotUtf8)?
            .to_owned();

        if meta.insert(key.clone(), value.to_owned()).is_some() {
            return Err(HeaderError::DuplicateMetaKey(key));
        }
    }

    Ok(())
}

fn parse_meta_bytes(input: &[u8]) -> Result<(&[u8], &[u8]), HeaderError> {
    let (len, rest) = format::get_varint(input).ok_or(HeaderError::TruncatedMetadata)?;
    let len = usize::try_from(len).map_err(|_| HeaderError::TruncatedMetadata)?;

    rest.split_at_checked(len).ok_or(HeaderError::TruncatedMetadata)
}


/// The ways a file can fail to begin with a valid list file header. All of these are
/// fatal: a reader cannot locate block 0 without a well-formed header.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("the file does not begin with the `LST1.000` magic")]
    BadMagic,
    #[error("the block size multiplier must not be zero")]
    ZeroMultiplier,
    #[error("unknown header flag bits are set (flags byte: {0:#04x})")]
    UnknownFlags(u8),
    #[error("the file ends inside its header")]
    Truncated,
    #[error("the metadata block ends inside an entry")]
    TruncatedMetadata,
    #[error("a metadata key is empty")]
    EmptyMetaKey,
    /// Returned by the writer when another entry would push the encoded metadata block
    /// past the `u32` size field's limit.
    #[error("the metadata block would exceed its u32 size limit")]
    MetadataTooLarge,
    #[error("a metadata key is not valid UTF-8")]
    MetaKeyNotUtf8,
    #[error("metadata key `{0}` occurs twice")]
    DuplicateMetaKey(String),
    /// Returned by the writer in append mode when the existing file's header does not
    /// match the supplied options.
    #[error("the existing file's header is incompatible with the writer options: {0}")]
    AppendMismatch(&'static str),
}


#[cfg(test)]
mod tests {
    use super::*;


    fn sample_meta() -> MetaMap {
        MetaMap::from([
            ("owner".to_owned(), b"alice".to_vec()),
            ("schema".to_owned(), b"v2".to_vec()),
        ])
    }

    #[test]
    fn encode_then_parse_without_metadata() {
        let header = FileHeader::new(NonZeroU8::MIN, false, MetaMap::new());
        let encoded = header.encode();
        assert_eq!(encoded.len(), FIXED_HEADER_LEN);
        assert_eq!(header.block_anchor, FIXED_HEADER_LEN as u64);

        let parsed = FileHeader::read_from(&encoded.as_slice()).unwrap();
        assert_eq!(parsed.multiplier, header.multiplier);
        assert!(!parsed.compressed);
        assert!(parsed.meta.is_empty());
        assert_eq!(parsed.block_anchor, header.block_anchor);
    }

    #[test]
    fn encode_then_parse_with_metadata() {
        let header = FileHeader::new(NonZeroU8::new(3).unwrap(), true, sample_meta());
        let encoded = header.encode();
        assert_eq!(encoded.len() as u64, header.block_anchor);

        let parsed = FileHeader::read_from(&encoded.as_slice()).unwrap();
        assert_eq!(parsed.multiplier.get(), 3);
        assert!(parsed.compressed);
        assert_eq!(parsed.meta, sample_meta());
        assert_eq!(parsed.block_anchor, header.block_anchor);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut encoded = FileHeader::new(NonZeroU8::MIN, false, MetaMap::new()).encode();
        encoded[0] = b'M';

        let err = FileHeader::read_from(&encoded.as_slice()).unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(HeaderError::BadMagic)));
    }

    #[test]
    fn rejects_unknown_flags() {
        let mut encoded = FileHeader::new(NonZeroU8::MIN, false, MetaMap::new()).encode();
        encoded[9] |= 1 << 7;

        let err = FileHeader::read_from(&encoded.as_slice()).unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(HeaderError::UnknownFlags(_))));
    }

    #[test]
    fn rejects_truncation() {
        let encoded = FileHeader::new(NonZeroU8::MIN, false, sample_meta()).encode();

        for len in [0, 5, FIXED_HEADER_LEN, encoded.len() - 1] {
            let err = FileHeader::read_from(&&encoded[..len]).unwrap_err();
            assert!(
                matches!(
                    err,
                    Error::InvalidHeader(
                        HeaderError::Truncated | HeaderError::TruncatedMetadata,
                    ),
                ),
                "unexpected error at length {len}: {err}",
            );
        }
    }

    #[test]
    fn rejects_duplicate_keys() {
        let mut meta_bytes = Vec::new();
        for _ in 0..2 {
            format::put_varint(&mut meta_bytes, 3);
            meta_bytes.extend(b"key");
            format::put_varint(&mut meta_bytes, 1);
            meta_bytes.extend(b"v");
        }

        let mut encoded = Vec::new();
        encoded.extend(MAGIC);
        encoded.push(1);
        encoded.push(FLAG_HAS_METADATA);
        encoded.extend(u32::try_from(meta_bytes.len()).unwrap().to_le_bytes());
        encoded.extend(&meta_bytes);

        let err = FileHeader::read_from(&encoded.as_slice()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidHeader(HeaderError::DuplicateMetaKey(key)) if key == "key",
        ));
    }
}
