use std::mem;
use std::fmt::{Debug, Formatter, Result as FmtResult};
#[cfg(any(unix, windows))]
use std::fs::{File, OpenOptions};
#[cfg(any(unix, windows))]
use std::path::Path;

use integer_encoding::VarInt as _;
use tracing::Level as LogLevel;

use crate::compressors::Compressor;
#[cfg(feature = "lz4-compression")]
use crate::compressors::Lz4Compressor;
#[cfg(feature = "zlib-compression")]
use crate::compressors::ZlibCompressor;
use crate::error::{Error, Result, UsageError};
use crate::files::WritableFile;
use crate::format::{
    self, ARRAY_RECORD_MAX_SIZE, IndexRecordTypes as _, MAX_PHYSICAL_PAYLOAD,
    RECORD_HEADER_SIZE, RecordType, mask_checksum,
};
use crate::header::{
    FileHeader, HeaderError, META_SIZE_LIMIT, MetaMap, encoded_meta_entry_len,
};
use crate::options::WriterOptions;


/// A writer for record-oriented list files.
///
/// The lifecycle is `new` (or [`open`]), zero or more [`add_meta`], [`init`], zero or more
/// [`add_record`], [`flush`]. Records become durable at `flush` and at every full-block
/// boundary reached before it; **dropping a writer without flushing loses the buffered
/// partial block**.
///
/// Small records (shorter than 4 KiB) are transparently batched into packed array
/// records, so callers can add many tiny records without paying 7 bytes of framing for
/// each. When compression is enabled, each completed block is compressed as a unit and
/// kept compressed only if that actually made it smaller.
///
/// The writer owns its sink; pass `&mut sink` instead to keep ownership at the caller.
/// Any sink error is fatal for the writer, and every later operation repeats the failure.
///
/// [`open`]: ListWriter::open
/// [`add_meta`]: ListWriter::add_meta
/// [`init`]: ListWriter::init
/// [`add_record`]: ListWriter::add_record
/// [`flush`]: ListWriter::flush
pub struct ListWriter<S> {
    sink:            S,
    options:         WriterOptions,
    meta:            MetaMap,
    /// Encoded size of the entries in `meta`, kept under [`META_SIZE_LIMIT`] so the
    /// header's `u32` metadata size field cannot overflow.
    meta_encoded_len: u64,

    type_checksums:  [u32; RecordType::ALL_TYPES.len()],
    block_size:      usize,
    /// Bytes of the current block not yet handed to the sink. In append mode, the head of
    /// the first block may already be on disk; `block_base` is its length.
    block:           Vec<u8>,
    block_base:      usize,

    /// Packed entries of the pending array record (`varint(len), bytes` pairs, without
    /// the leading element count).
    array_buf:       Vec<u8>,
    array_records:   u32,

    compressor:      Option<Box<dyn Compressor>>,
    method_byte:     u8,
    compress_buf:    Vec<u8>,

    /// Whether the header already exists on disk (always true in append mode).
    header_written:  bool,
    init_called:     bool,
    flushed:         bool,
    /// Rendered message of the first fatal error, repeated by later operations.
    failure:         Option<String>,

    records_added:        u32,
    bytes_added:          u64,
    compression_savings:  u64,
}

impl<S: WritableFile> ListWriter<S> {
    /// Create a writer over an arbitrary sink. The sink must be empty (or, more
    /// precisely, everything this writer emits lands after whatever the sink already
    /// holds, starting with the file header).
    ///
    /// `options.append` cannot be honored here — resuming a file requires reading its
    /// header — and makes [`init`] fail; use [`open`] for append mode.
    ///
    /// [`init`]: ListWriter::init
    /// [`open`]: ListWriter::open
    #[must_use]
    pub fn new(sink: S, options: WriterOptions) -> Self {
        let type_checksums = RecordType::ALL_TYPES.map(|record_type| {
            crc32c::crc32c(&[u8::from(record_type)])
        });

        Self {
            sink,
            options,
            meta: MetaMap::new(),
            meta_encoded_len: 0,
            type_checksums,
            block_size: options.block_size(),
            block: Vec::new(),
            block_base: 0,
            array_buf: Vec::new(),
            array_records: 0,
            compressor: None,
            method_byte: u8::from(options.compress_method),
            compress_buf: Vec::new(),
            header_written: false,
            init_called: false,
            flushed: false,
            failure: None,
            records_added: 0,
            bytes_added: 0,
            compression_savings: 0,
        }
    }

    /// Add one key/value entry to the file's metadata. Must be called before [`init`];
    /// the metadata map is frozen into the header from then on.
    ///
    /// Keys must be non-empty, and the encoded metadata block must stay within its
    /// `u32` size field. Adding a key twice keeps the latest value.
    ///
    /// [`init`]: ListWriter::init
    pub fn add_meta(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Result<()> {
        self.check_usable()?;
        if self.init_called || self.header_written {
            return Err(UsageError::MetaAfterInit.into());
        }

        let key = key.into();
        if key.is_empty() {
            return Err(HeaderError::EmptyMetaKey.into());
        }
        let value = value.into();

        // Re-adding a key replaces its value, releasing the old entry's bytes.
        let replaced_len = self.meta.get(&key)
            .map(|old_value| encoded_meta_entry_len(&key, old_value))
            .unwrap_or(0);
        let new_total = self.meta_encoded_len - replaced_len
            + encoded_meta_entry_len(&key, &value);

        if new_total > META_SIZE_LIMIT {
            return Err(HeaderError::MetadataTooLarge.into());
        }

        self.meta_encoded_len = new_total;
        self.meta.insert(key, value);
        Ok(())
    }

    /// Write the file header (unless appending to a file that already has one) and make
    /// the writer ready for [`add_record`]. Must be called exactly once.
    ///
    /// [`add_record`]: ListWriter::add_record
    pub fn init(&mut self) -> Result<()> {
        self.check_usable()?;
        if self.init_called {
            return Err(UsageError::AlreadyInitialized.into());
        }
        if self.options.append && !self.header_written {
            return Err(UsageError::AppendWithoutFile.into());
        }

        if self.options.use_compression {
            self.compressor = Some(build_compressor(&self.options)?);
            // `compress_bound`-ish: enough for any of the registered methods' worst case
            // on one block, so steady-state writing does not reallocate.
            self.compress_buf.reserve(self.block_size + self.block_size / 16 + 64);
        }
        self.block.reserve(self.block_size);

        let result = self.write_header();
        self.note_failure(&result);
        result?;

        self.init_called = true;
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Ok(());
        }

        let header = FileHeader::new(
            self.options.block_size_multiplier,
            self.options.use_compression,
            mem::take(&mut self.meta),
        );
        self.sink.write_all(&header.encode())?;
        self.meta = header.meta;
        self.header_written = true;
        Ok(())
    }

    /// Add one logical record. The payload is opaque bytes of any length; records longer
    /// than a block are split across blocks and reassembled by the reader.
    pub fn add_record(&mut self, record: &[u8]) -> Result<()> {
        self.check_usable()?;
        if !self.init_called {
            return Err(UsageError::NotInitialized.into());
        }

        let result = self.add_record_inner(record);
        self.note_failure(&result);
        result?;

        self.records_added = self.records_added.wrapping_add(1);
        self.bytes_added = self.bytes_added
            .saturating_add(u64::try_from(record.len()).unwrap_or(u64::MAX));
        Ok(())
    }

    /// Emit any pending array record, write the trailing partial block, and flush and
    /// sync the sink. The writer accepts no further operations afterwards.
    pub fn flush(&mut self) -> Result<()> {
        self.check_usable()?;
        if !self.init_called {
            return Err(UsageError::NotInitialized.into());
        }

        let result = self.flush_inner();
        self.note_failure(&result);
        result?;

        self.flushed = true;
        Ok(())
    }

    fn flush_inner(&mut self) -> Result<()> {
        self.flush_array()?;

        if !self.block.is_empty() {
            // The trailing block is short and is never compressed; compression is a
            // property of full blocks.
            let block = mem::take(&mut self.block);
            self.sink.write_all(&block)?;
        }

        self.sink.flush()?;
        self.sink.sync_data()?;
        Ok(())
    }

    /// The number of logical records added so far.
    #[inline]
    #[must_use]
    pub fn records_added(&self) -> u32 {
        self.records_added
    }

    /// The total length of all logical record payloads added so far.
    #[inline]
    #[must_use]
    pub fn bytes_added(&self) -> u64 {
        self.bytes_added
    }

    /// The number of bytes that block compression removed, measured before the zero
    /// padding that keeps compressed blocks block-sized on disk.
    #[inline]
    #[must_use]
    pub fn compression_savings(&self) -> u64 {
        self.compression_savings
    }

    // ================================
    //  Block and array packing
    // ================================

    /// The space remaining in the current block.
    #[inline]
    #[must_use]
    fn leftover(&self) -> usize {
        self.block_size - self.block_base - self.block.len()
    }

    fn add_record_inner(&mut self, record: &[u8]) -> Result<()> {
        if record.len() < ARRAY_RECORD_MAX_SIZE {
            self.add_to_array(record)
        } else {
            self.flush_array()?;
            self.emit_fragmented(record)
        }
    }

    /// Append a small record to the pending array, first flushing the array if the grown
    /// array record would no longer fit in the current block.
    fn add_to_array(&mut self, record: &[u8]) -> Result<()> {
        #[expect(clippy::as_conversions, reason = "usize fits in u64 on supported platforms")]
        let record_len_u64 = record.len() as u64;
        let entry_len = record_len_u64.required_space() + record.len();

        loop {
            let projected = u64::from(self.array_records + 1).required_space()
                + self.array_buf.len()
                + entry_len;

            if RECORD_HEADER_SIZE + projected <= self.leftover()
                && projected <= MAX_PHYSICAL_PAYLOAD
            {
                break;
            }

            if self.array_records > 0 {
                self.flush_array()?;
            } else {
                // A lone small record at the tail of a block; let it fragment like any
                // other record instead of zero-filling the rest of the block.
                return self.emit_fragmented(record);
            }
        }

        format::put_varint(&mut self.array_buf, record_len_u64);
        self.array_buf.extend(record);
        self.array_records += 1;
        Ok(())
    }

    /// Emit the pending array as one physical record. An array of a single record is
    /// never emitted; that record falls back to ordinary framing.
    fn flush_array(&mut self) -> Result<()> {
        match self.array_records {
            0 => Ok(()),
            1 => {
                let entries = mem::take(&mut self.array_buf);
                self.array_records = 0;

                #[expect(
                    clippy::expect_used,
                    reason = "the array buffer holds exactly the entries the writer packed",
                )]
                let (len, payload) = format::get_varint(&entries)
                    .expect("the array buffer holds exactly the entries the writer packed");
                debug_assert_eq!(u64::try_from(payload.len()).ok(), Some(len));

                let result = self.emit_fragmented(payload);
                self.array_buf = entries;
                self.array_buf.clear();
                result
            }
            count => {
                let entries = mem::take(&mut self.array_buf);
                self.array_records = 0;

                let mut payload = Vec::with_capacity(
                    u64::from(count).required_space() + entries.len(),
                );
                format::put_varint(&mut payload, u64::from(count));
                payload.extend(&entries);

                // `add_to_array` only grew the array while this record fit here.
                let result = self.emit_physical(RecordType::Array, &payload);
                self.array_buf = entries;
                self.array_buf.clear();
                result
            }
        }
    }

    /// Emit one logical record as a `Full` physical record or a
    /// `First`/`Middle`*/`Last` chain, zero-filling block trailers too small for a
    /// record header.
    fn emit_fragmented(&mut self, mut record: &[u8]) -> Result<()> {
        let mut first_physical = true;

        // Empty records are written as a zero-length Full physical record.
        while !record.is_empty() || first_physical {
            if self.leftover() < RECORD_HEADER_SIZE {
                // 0 to 6 bytes remain: too small for any physical record. Zero-fill them
                // and move to the next block.
                let padded_len = self.block.len() + self.leftover();
                self.block.resize(padded_len, 0);
                self.finish_block()?;
            }

            let avail = (self.leftover() - RECORD_HEADER_SIZE).min(MAX_PHYSICAL_PAYLOAD);
            let fragment_len = record.len().min(avail);
            let last_physical = fragment_len == record.len();

            let record_type = match (first_physical, last_physical) {
                (true,  true)  => RecordType::Full,
                (true,  false) => RecordType::First,
                (false, false) => RecordType::Middle,
                (false, true)  => RecordType::Last,
            };

            let (fragment, remaining) = record.split_at(fragment_len);
            self.emit_physical(record_type, fragment)?;

            record = remaining;
            first_physical = false;
        }

        Ok(())
    }

    /// Frame `payload` with a masked checksum, length, and type, and append the physical
    /// record to the current block. The caller must have checked that it fits.
    fn emit_physical(&mut self, record_type: RecordType, payload: &[u8]) -> Result<()> {
        debug_assert!(RECORD_HEADER_SIZE + payload.len() <= self.leftover());

        let checksum = crc32c::crc32c_append(
            *self.type_checksums.infallible_index(record_type),
            payload,
        );
        #[expect(
            clippy::unwrap_used,
            reason = "callers keep payloads within `MAX_PHYSICAL_PAYLOAD == u16::MAX`",
        )]
        let payload_len_u16 = u16::try_from(payload.len()).unwrap();

        self.block.extend(mask_checksum(checksum).to_le_bytes());
        self.block.extend(payload_len_u16.to_le_bytes());
        self.block.push(u8::from(record_type));
        self.block.extend(payload);

        if self.leftover() == 0 {
            self.finish_block()?;
        }
        Ok(())
    }

    /// Write the completed current block to the sink, compressing it if that pays off,
    /// and start the next block.
    fn finish_block(&mut self) -> Result<()> {
        debug_assert_eq!(self.block_base + self.block.len(), self.block_size);

        // A block whose head is already on disk (append resume) cannot be compressed;
        // the compressor would need the bytes we don't have.
        let compressible = self.block_base == 0;

        if let Some(compressor) = self.compressor.as_deref().filter(|_| compressible) {
            self.compress_buf.clear();

            match compressor.encode_into(&self.block, &mut self.compress_buf) {
                Ok(()) if 1 + self.compress_buf.len() < self.block_size => {
                    let saved = self.block_size - (1 + self.compress_buf.len());

                    self.sink.write_all(&[self.method_byte])?;
                    self.sink.write_all(&self.compress_buf)?;
                    write_zeros(&mut self.sink, saved)?;

                    self.compression_savings = self.compression_savings
                        .saturating_add(u64::try_from(saved).unwrap_or(u64::MAX));
                }
                Ok(()) => {
                    tracing::event!(
                        LogLevel::DEBUG,
                        "compressed block did not shrink; writing it uncompressed",
                    );
                    self.sink.write_all(&self.block)?;
                }
                Err(compress_error) => {
                    tracing::event!(
                        LogLevel::DEBUG,
                        "block compression failed, writing uncompressed: {compress_error}",
                    );
                    self.sink.write_all(&self.block)?;
                }
            }
        } else {
            self.sink.write_all(&self.block)?;
        }

        self.block.clear();
        self.block_base = 0;
        Ok(())
    }

    // ================================
    //  Lifecycle bookkeeping
    // ================================

    fn check_usable(&self) -> Result<()> {
        if let Some(failure) = &self.failure {
            return Err(Error::Failed(failure.clone()));
        }
        if self.flushed {
            return Err(UsageError::AlreadyFlushed.into());
        }
        Ok(())
    }

    /// Sink errors poison the writer; usage errors do not.
    fn note_failure(&mut self, result: &Result<()>) {
        if let Err(err @ Error::Io(_)) = result {
            self.failure = Some(err.to_string());
        }
    }
}

#[cfg(any(unix, windows))]
impl ListWriter<File> {
    /// Open a writer on a file path.
    ///
    /// With `options.append` unset, the file is created (or truncated). With it set, the
    /// existing file's header is re-read and validated against `options` — the block
    /// size multiplier and compression flag must match — and writing resumes after the
    /// existing data; the header is not rewritten, and the existing metadata is kept.
    pub fn open(path: impl AsRef<Path>, options: WriterOptions) -> Result<Self> {
        let path = path.as_ref();

        if !options.append {
            return Ok(Self::new(File::create(path)?, options));
        }

        let (header, file_len) = {
            let existing = File::open(path)?;
            let header = FileHeader::read_from(&existing)?;
            (header, existing.metadata()?.len())
        };

        if header.multiplier != options.block_size_multiplier {
            return Err(HeaderError::AppendMismatch("block size multiplier").into());
        }
        if header.compressed != options.use_compression {
            return Err(HeaderError::AppendMismatch("compression flag").into());
        }
        let Some(data_len) = file_len.checked_sub(header.block_anchor) else {
            return Err(HeaderError::Truncated.into());
        };

        let block_size = u64::try_from(header.block_size()).unwrap_or(u64::MAX);
        #[expect(
            clippy::unwrap_used,
            reason = "`data_len % block_size < block_size <= 255 << 16 < usize::MAX`",
        )]
        let offset_into_block = usize::try_from(data_len % block_size).unwrap();

        let sink = OpenOptions::new().append(true).open(path)?;

        let mut writer = Self::new(sink, options);
        writer.meta = header.meta;
        writer.header_written = true;
        writer.block_base = offset_into_block;
        Ok(writer)
    }
}

fn build_compressor(options: &WriterOptions) -> Result<Box<dyn Compressor>> {
    use crate::options::CompressMethod;

    #[cfg(feature = "lz4-compression")]
    if options.compress_method == CompressMethod::Lz4 {
        return Ok(Box::new(Lz4Compressor));
    }
    #[cfg(feature = "zlib-compression")]
    if options.compress_method == CompressMethod::Zlib {
        return Ok(Box::new(ZlibCompressor::new(options.compress_level)));
    }

    Err(Error::UnsupportedCompression(u8::from(options.compress_method)))
}

fn write_zeros<S: WritableFile>(sink: &mut S, mut count: usize) -> Result<()> {
    const ZEROS: [u8; 512] = [0; 512];

    while count > 0 {
        let chunk = count.min(ZEROS.len());
        #[expect(clippy::indexing_slicing, reason = "`chunk <= ZEROS.len()`")]
        sink.write_all(&ZEROS[..chunk])?;
        count -= chunk;
    }
    Ok(())
}

impl<S> Debug for ListWriter<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ListWriter")
            .field("sink",           &"<Sink>")
            .field("options",        &self.options)
            .field("block_size",     &self.block_size)
            .field("block",          &format!("[{} bytes]", self.block.len()))
            .field("block_base",     &self.block_base)
            .field("array_records",  &self.array_records)
            .field("init_called",    &self.init_called)
            .field("flushed",        &self.flushed)
            .field("failure",        &self.failure)
            .field("records_added",  &self.records_added)
            .field("bytes_added",    &self.bytes_added)
            .finish_non_exhaustive()
    }
}
