use std::fmt::{Debug, Formatter, Result as FmtResult};
#[cfg(any(unix, windows))]
use std::fs::File;
use std::io::Error as IoError;
use std::ops::Range;
#[cfg(any(unix, windows))]
use std::path::Path;

use thiserror::Error;
use tracing::Level as LogLevel;

use crate::compressors::{CompressorList, NO_COMPRESSION};
use crate::error::Error;
use crate::files::ReadonlyFile;
use crate::format::{
    self, RECORD_HEADER_SIZE, RecordType, unmask_checksum,
};
use crate::header::{FileHeader, HeaderError, MetaMap};


#[expect(clippy::as_conversions, reason = "`From` conversions do not yet work in const")]
const RECORD_HEADER_SIZE_U64: u64 = RECORD_HEADER_SIZE as u64;


/// A reader for record-oriented list files.
///
/// [`read_record`] yields logical records in file order, reassembling fragmented records
/// and unpacking array records as it goes. Corruption is never fatal: damaged or
/// unparseable stretches are reported to the optional [`CorruptionReporter`] together
/// with a count of the bytes dropped, and reading resynchronizes at the next parseable
/// record or block.
///
/// The reader owns its file; pass `&file` instead to keep ownership (and closing) at the
/// caller.
///
/// [`read_record`]: ListReader::read_record
pub struct ListReader<'a, F> {
    file:             F,
    verify_checksums: bool,
    reporter:         Option<Box<dyn CorruptionReporter + 'a>>,
    compressors:      CompressorList,

    /// Parsed lazily by the first [`ListReader::metadata`] or [`ListReader::read_record`]
    /// call, then cached for the life of the reader (surviving [`ListReader::reset`]).
    header:           Option<FileHeader>,

    /// The raw bytes of the current block, as read from the file. Shorter than the block
    /// size only for the final block of the file.
    backing_store:    Vec<u8>,
    /// The decompressed contents of the current block, when it was compressed.
    uncompress_buf:   Vec<u8>,
    /// Whether the current block's records live in `uncompress_buf` rather than
    /// `backing_store`.
    decompressed:     bool,
    /// Cursor of the next physical record within the current block.
    offset_in_block:  usize,
    /// Offset (relative to the block anchor) at which the next block will be read.
    next_block_offset: u64,
    eof:              bool,

    /// Payload of the array record currently being replayed: the packed entries, with
    /// the leading element count already stripped.
    array_buf:        Vec<u8>,
    array_cursor:     usize,
    /// Elements of the current array record not yet delivered.
    array_remaining:  u64,

    read_header_bytes: u64,
    read_data_bytes:   u64,
}

enum PhysicalStep {
    /// A physical record was parsed; its payload is at `payload` in the current block.
    Record { type_byte: u8, payload: Range<usize> },
    Eof,
    /// An invalid physical record was found and reported; resynchronization already
    /// happened (usually by skipping to the next block).
    Bad,
}

impl<'a, F: ReadonlyFile> ListReader<'a, F> {
    /// Create a reader with no corruption reporter; corruption is still skipped, and
    /// logged at WARN level.
    #[must_use]
    pub fn new(file: F, verify_checksums: bool) -> Self {
        Self::with_optional_reporter(file, verify_checksums, None)
    }

    /// Create a reader that reports dropped bytes to `reporter`.
    #[must_use]
    pub fn with_reporter<R: CorruptionReporter + 'a>(
        file:             F,
        verify_checksums: bool,
        reporter:         R,
    ) -> Self {
        Self::with_optional_reporter(file, verify_checksums, Some(Box::new(reporter)))
    }

    #[must_use]
    pub fn with_optional_reporter(
        file:             F,
        verify_checksums: bool,
        reporter:         Option<Box<dyn CorruptionReporter + 'a>>,
    ) -> Self {
        Self {
            file,
            verify_checksums,
            reporter,
            compressors: CompressorList::with_default_compressors(),
            header: None,
            backing_store: Vec::new(),
            uncompress_buf: Vec::new(),
            decompressed: false,
            offset_in_block: 0,
            next_block_offset: 0,
            eof: false,
            array_buf: Vec::new(),
            array_cursor: 0,
            array_remaining: 0,
            read_header_bytes: 0,
            read_data_bytes: 0,
        }
    }

    /// Replace the registry used to decompress blocks. Only needed when reading files
    /// written with a non-standard method byte.
    pub fn set_compressor_list(&mut self, compressors: CompressorList) {
        self.compressors = compressors;
    }

    /// The metadata map from the file header. Parses the header on first use.
    pub fn metadata(&mut self) -> Result<&MetaMap, Error> {
        if self.header.is_none() {
            let header = FileHeader::read_from(&self.file)?;
            self.header = Some(header);
        }

        #[expect(clippy::unwrap_used, reason = "the header was just cached above")]
        Ok(&self.header.as_ref().unwrap().meta)
    }

    /// Return the next logical record, materialized into `scratch`, or `None` at
    /// end-of-stream. The returned slice is valid until `scratch` is next mutated.
    ///
    /// Corrupt stretches of the file are reported and skipped; a file whose header
    /// cannot be parsed, or whose blocks use an unregistered compression method, ends
    /// the stream instead.
    pub fn read_record<'s>(&mut self, scratch: &'s mut Vec<u8>) -> Option<&'s [u8]> {
        // Leftover elements of an array record are handed out first, one per call.
        if self.array_remaining > 0 {
            if let Some(element) = self.take_array_element() {
                return Some(Self::materialize(&self.array_buf, element, scratch));
            }
            // The array was exhausted or corrupt; continue with the next physical record.
        }

        if self.header.is_none() && !self.read_header() {
            return None;
        }

        // Whether `scratch` currently holds the leading fragments of an unfinished
        // logical record.
        let mut in_fragment = false;

        loop {
            match self.read_physical_record() {
                PhysicalStep::Record { type_byte, payload } => {
                    match RecordType::try_from(type_byte) {
                        Ok(RecordType::Full) => {
                            if in_fragment {
                                self.report(scratch.len(), Corruption::InterruptedChain);
                            }
                            self.count_data(payload.len());
                            return Some(Self::materialize(self.block(), payload, scratch));
                        }
                        Ok(RecordType::First) => {
                            if in_fragment {
                                self.report(scratch.len(), Corruption::InterruptedChain);
                            }
                            scratch.clear();
                            scratch.extend_from_slice(&self.block()[payload.clone()]);
                            self.count_data(payload.len());
                            in_fragment = true;
                        }
                        Ok(RecordType::Middle) => {
                            if in_fragment {
                                scratch.extend_from_slice(&self.block()[payload.clone()]);
                                self.count_data(payload.len());
                            } else {
                                self.report(payload.len(), Corruption::MissingChainStart);
                            }
                        }
                        Ok(RecordType::Last) => {
                            if in_fragment {
                                scratch.extend_from_slice(&self.block()[payload.clone()]);
                                self.count_data(payload.len());
                                return Some(&scratch[..]);
                            }
                            self.report(payload.len(), Corruption::MissingChainStart);
                        }
                        Ok(RecordType::Array) => {
                            if in_fragment {
                                self.report(scratch.len(), Corruption::InterruptedChain);
                                in_fragment = false;
                            }
                            if self.start_array_replay(payload) {
                                if let Some(element) = self.take_array_element() {
                                    return Some(Self::materialize(
                                        &self.array_buf,
                                        element,
                                        scratch,
                                    ));
                                }
                            }
                            // Corrupt array payload, already reported; keep scanning.
                        }
                        Ok(RecordType::Zero) | Err(()) => {
                            // Zero-length Zero records were already skipped silently;
                            // anything else with this type byte is damage.
                            if in_fragment {
                                self.report(scratch.len(), Corruption::InterruptedChain);
                                in_fragment = false;
                            }
                            self.report(payload.len(), Corruption::UnknownRecordType(type_byte));
                        }
                    }
                }
                PhysicalStep::Bad => {
                    if in_fragment {
                        self.report(scratch.len(), Corruption::InterruptedChain);
                        in_fragment = false;
                    }
                    // Keep scanning from wherever resynchronization left the cursor.
                }
                PhysicalStep::Eof => {
                    // An unfinished fragmented record at end-of-file is indistinguishable
                    // from a writer that died before flushing; it is dropped silently.
                    return None;
                }
            }
        }
    }

    /// Rewind to before block 0. The cached header (and metadata) is kept.
    pub fn reset(&mut self) {
        self.backing_store.clear();
        self.uncompress_buf.clear();
        self.decompressed = false;
        self.offset_in_block = 0;
        self.next_block_offset = 0;
        self.eof = false;
        self.array_buf.clear();
        self.array_cursor = 0;
        self.array_remaining = 0;
    }

    /// Bytes of record framing read so far: 7 bytes per physical record header.
    #[inline]
    #[must_use]
    pub fn read_header_bytes(&self) -> u64 {
        self.read_header_bytes
    }

    /// Bytes of logical record payload delivered (or buffered for delivery) so far.
    #[inline]
    #[must_use]
    pub fn read_data_bytes(&self) -> u64 {
        self.read_data_bytes
    }

    // ================================
    //  Header and block loading
    // ================================

    /// Parse and cache the file header, reporting failure to the corruption reporter.
    /// Returns false (and pins the reader at end-of-stream) if the header is unusable.
    fn read_header(&mut self) -> bool {
        match FileHeader::read_from(&self.file) {
            Ok(header) => {
                self.header = Some(header);
                true
            }
            Err(Error::Io(io_err)) => {
                self.eof = true;
                self.report(0, Corruption::Io(io_err));
                false
            }
            Err(Error::InvalidHeader(header_err)) => {
                self.eof = true;
                self.report(0, Corruption::InvalidHeader(header_err));
                false
            }
            Err(_) => {
                // `FileHeader::read_from` only produces the two errors above.
                self.eof = true;
                false
            }
        }
    }

    /// The buffer holding the current block's records.
    #[inline]
    #[must_use]
    fn block(&self) -> &[u8] {
        if self.decompressed {
            &self.uncompress_buf
        } else {
            &self.backing_store
        }
    }

    /// Read the next block into `backing_store`, decompressing it if the file and block
    /// say so. Returns false at end-of-file (or after an unrecoverable read problem,
    /// which pins the reader at end-of-stream).
    fn load_next_block(&mut self) -> bool {
        if self.eof {
            return false;
        }
        #[expect(clippy::expect_used, reason = "callers load blocks only after the header")]
        let header = self.header.as_ref().expect("header is parsed before blocks are read");
        let block_size = header.block_size();
        let block_anchor = header.block_anchor;
        let header_compressed = header.compressed;

        self.decompressed = false;
        self.offset_in_block = 0;
        self.backing_store.resize(block_size, 0);

        let mut filled = 0_usize;
        while filled < block_size {
            let offset = block_anchor
                + self.next_block_offset
                + u64::try_from(filled).unwrap_or(u64::MAX);

            match self.file.read_at(offset, &mut self.backing_store[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(io_err) if io_err.kind() == std::io::ErrorKind::Interrupted => {}
                Err(io_err) => {
                    // Pretend end-of-file was reached; the bytes already read are
                    // dropped along with the rest of the file.
                    self.backing_store.clear();
                    self.eof = true;
                    self.report(filled, Corruption::Io(io_err));
                    return false;
                }
            }
        }

        if filled < block_size {
            self.eof = true;
        }
        self.backing_store.truncate(filled);
        if filled == 0 {
            return false;
        }
        self.next_block_offset = self.next_block_offset
            .saturating_add(u64::try_from(block_size).unwrap_or(u64::MAX));

        // A compressed block is always full-length on disk, begins with a registered
        // method byte, and cannot begin with a checksummed record header. Short blocks
        // and files without the compression flag are always raw.
        if header_compressed && filled == block_size {
            let method = self.backing_store[0];

            if method != NO_COMPRESSION && !self.starts_with_valid_record() {
                if let Some(compressor) = self.compressors.get(method) {
                    self.uncompress_buf.clear();
                    let decoded = compressor
                        .decode_into(&self.backing_store[1..], &mut self.uncompress_buf);

                    match decoded {
                        Ok(()) => self.decompressed = true,
                        Err(decode_err) => {
                            // The whole block is unreadable; skip it.
                            self.offset_in_block = self.backing_store.len();
                            self.report(
                                filled,
                                Corruption::BadCompressedBlock(decode_err.to_string()),
                            );
                        }
                    }
                } else {
                    // Unregistered method: structural, ends the stream. Later blocks
                    // would be misread as garbage.
                    self.eof = true;
                    self.report(filled, Corruption::UnknownCompression(method));
                    return false;
                }
            }
        }

        true
    }

    /// Whether the current `backing_store` begins with a physical record header whose
    /// masked checksum verifies. Used to tell raw blocks from compressed ones; the
    /// checksum is consulted here even when `verify_checksums` is off.
    #[must_use]
    fn starts_with_valid_record(&self) -> bool {
        let block = &self.backing_store;
        let Some(header_bytes) = block.get(..RECORD_HEADER_SIZE) else {
            return false;
        };

        #[expect(clippy::unwrap_used, reason = "`header_bytes` has exactly 7 bytes")]
        let masked_crc = u32::from_le_bytes(header_bytes[0..4].try_into().unwrap());
        #[expect(clippy::unwrap_used, reason = "`header_bytes` has exactly 7 bytes")]
        let length = usize::from(u16::from_le_bytes(header_bytes[4..6].try_into().unwrap()));

        let Some(checksummed) = block.get(6..RECORD_HEADER_SIZE + length) else {
            return false;
        };

        crc32c::crc32c(checksummed) == unmask_checksum(masked_crc)
    }

    // ================================
    //  Physical record iteration
    // ================================

    /// Advance to and parse the next physical record, skipping block trailers and
    /// zero-filled slots, loading blocks as needed.
    fn read_physical_record(&mut self) -> PhysicalStep {
        loop {
            if self.offset_in_block + RECORD_HEADER_SIZE > self.block().len() {
                // A trailer (or nothing) remains in this block: between 0 and 6 zero
                // bytes, or an incomplete header a dying writer left behind. Neither is
                // corruption.
                if !self.load_next_block() {
                    return PhysicalStep::Eof;
                }
                continue;
            }

            let offset = self.offset_in_block;
            let block = self.block();
            #[expect(clippy::indexing_slicing, reason = "bounds were checked above")]
            let header_bytes = &block[offset..offset + RECORD_HEADER_SIZE];

            #[expect(clippy::unwrap_used, reason = "`header_bytes` has exactly 7 bytes")]
            let masked_crc = u32::from_le_bytes(header_bytes[0..4].try_into().unwrap());
            #[expect(clippy::unwrap_used, reason = "`header_bytes` has exactly 7 bytes")]
            let length = usize::from(u16::from_le_bytes(header_bytes[4..6].try_into().unwrap()));
            let type_byte = header_bytes[6];

            let length_with_header = RECORD_HEADER_SIZE + length;
            let len_to_end_of_block = block.len() - offset;

            // The block size bounds what any honest length field can say; past that, the
            // header itself is damaged and the rest of the block cannot be trusted.
            let block_len = block.len();
            if length_with_header > self.current_block_capacity() - offset {
                self.offset_in_block = block_len;
                self.report(len_to_end_of_block, Corruption::BadRecordLength);
                return PhysicalStep::Bad;
            }

            if length_with_header > len_to_end_of_block {
                if self.eof {
                    // A record extends past the short final block: a writer died
                    // mid-record (or the file was truncated). Not corruption.
                    return PhysicalStep::Eof;
                }
                // A record running past a block that should have been complete, which
                // only a bad decompression produces. Drop the block.
                self.offset_in_block = block_len;
                self.report(len_to_end_of_block, Corruption::BadRecordLength);
                return PhysicalStep::Bad;
            }

            if type_byte == u8::from(RecordType::Zero) && length == 0 {
                // A reserved (zero-filled) slot; skip it silently.
                self.offset_in_block += RECORD_HEADER_SIZE;
                self.read_header_bytes = self.read_header_bytes
                    .saturating_add(RECORD_HEADER_SIZE_U64);
                continue;
            }

            if self.verify_checksums {
                #[expect(clippy::indexing_slicing, reason = "`length_with_header` fits the block")]
                let actual_crc = crc32c::crc32c(&block[offset + 6..offset + length_with_header]);

                if actual_crc != unmask_checksum(masked_crc) {
                    // The length field passed its bounds check, so step over just this
                    // record; the ones after it in the block are usually intact. (If the
                    // length itself was damaged, the next parse fails too and resyncs.)
                    self.offset_in_block += length_with_header;
                    self.report(length_with_header, Corruption::ChecksumMismatch);
                    return PhysicalStep::Bad;
                }
            }

            self.offset_in_block += length_with_header;
            self.read_header_bytes = self.read_header_bytes
                .saturating_add(RECORD_HEADER_SIZE_U64);

            return PhysicalStep::Record {
                type_byte,
                payload: offset + RECORD_HEADER_SIZE..offset + length_with_header,
            };
        }
    }

    /// The full size blocks of this file have, regardless of how much of the current
    /// (possibly final, possibly decompressed) block is present.
    #[must_use]
    fn current_block_capacity(&self) -> usize {
        match &self.header {
            Some(header) if self.decompressed => {
                // A decompressed block restores the original block contents, which were
                // themselves bounded by the block size.
                header.block_size().max(self.block().len())
            }
            Some(header) => header.block_size(),
            None => self.block().len(),
        }
    }

    // ================================
    //  Array replay
    // ================================

    /// Begin replaying the array record at `payload` in the current block. Returns false
    /// (after reporting) if the element count cannot be decoded.
    fn start_array_replay(&mut self, payload: Range<usize>) -> bool {
        let payload_len = payload.len();
        // Field accesses rather than `self.block()`, so that the borrow stays disjoint
        // from `self.array_buf` below.
        let block: &[u8] = if self.decompressed {
            &self.uncompress_buf
        } else {
            &self.backing_store
        };
        #[expect(clippy::indexing_slicing, reason = "the range was produced from this block")]
        let payload_bytes = &block[payload];

        let Some((count, entries)) = format::get_varint(payload_bytes) else {
            self.report(payload_len, Corruption::BadArrayPayload);
            return false;
        };
        if count == 0 {
            self.report(payload_len, Corruption::BadArrayPayload);
            return false;
        }

        // The entries must outlive the block they were read from: replay spans multiple
        // `read_record` calls, and the next block load would clobber the slice.
        self.array_buf.clear();
        self.array_buf.extend_from_slice(entries);
        self.array_cursor = 0;
        self.array_remaining = count;
        true
    }

    /// Pop the next `(start..end)` element range out of `array_buf`, reporting and
    /// abandoning the array if its encoding is broken.
    fn take_array_element(&mut self) -> Option<Range<usize>> {
        while self.array_remaining > 0 {
            let rest = self.array_buf.get(self.array_cursor..)?;

            let parsed = format::get_varint(rest).and_then(|(len, data)| {
                let len = usize::try_from(len).ok()?;
                (data.len() >= len).then(|| {
                    let varint_len = rest.len() - data.len();
                    let start = self.array_cursor + varint_len;
                    start..start + len
                })
            });

            match parsed {
                Some(element) => {
                    self.array_remaining -= 1;
                    self.array_cursor = element.end;
                    self.count_data(element.len());
                    return Some(element);
                }
                None => {
                    let dropped = self.array_buf.len() - self.array_cursor;
                    self.array_remaining = 0;
                    self.array_cursor = 0;
                    self.report(dropped, Corruption::BadArrayPayload);
                    return None;
                }
            }
        }
        None
    }

    // ================================
    //  Bookkeeping
    // ================================

    /// Copy `range` of `source` into `scratch` and return it.
    fn materialize<'s>(source: &[u8], range: Range<usize>, scratch: &'s mut Vec<u8>) -> &'s [u8] {
        scratch.clear();
        #[expect(clippy::indexing_slicing, reason = "ranges are produced from `source` itself")]
        scratch.extend_from_slice(&source[range]);
        scratch
    }

    #[inline]
    fn count_data(&mut self, len: usize) {
        self.read_data_bytes = self.read_data_bytes
            .saturating_add(u64::try_from(len).unwrap_or(u64::MAX));
    }

    fn report(&mut self, bytes_dropped: usize, cause: Corruption) {
        if let Some(reporter) = &mut self.reporter {
            reporter.corruption(bytes_dropped, cause);
        } else {
            tracing::event!(
                LogLevel::WARN,
                "dropped {bytes_dropped} bytes of list file data: {cause}",
            );
        }
    }
}

#[cfg(any(unix, windows))]
impl<'a> ListReader<'a, File> {
    /// Open a reader on a file path; the file handle is owned and closed on drop.
    pub fn open(path: impl AsRef<Path>, verify_checksums: bool) -> Result<Self, Error> {
        Ok(Self::new(File::open(path)?, verify_checksums))
    }
}

impl<'a, F: ReadonlyFile> ListReader<'a, F> {
    /// Consume the reader, yielding records through an internal scratch buffer.
    #[must_use]
    pub fn records(self) -> Records<'a, F> {
        Records {
            reader:  self,
            scratch: Vec::new(),
        }
    }
}

/// The "iterator of byte slices" over a list file: each [`next_record`] call yields the
/// next logical record, borrowed until the following call.
///
/// (This cannot be a [`std::iter::Iterator`]; the yielded slice borrows the iterator's
/// own scratch buffer.)
///
/// [`next_record`]: Records::next_record
#[derive(Debug)]
pub struct Records<'a, F> {
    reader:  ListReader<'a, F>,
    scratch: Vec<u8>,
}

impl<F: ReadonlyFile> Records<'_, F> {
    pub fn next_record(&mut self) -> Option<&[u8]> {
        self.reader.read_record(&mut self.scratch)
    }
}

impl<F> Debug for ListReader<'_, F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ListReader")
            .field("file",              &"<File>")
            .field("verify_checksums",  &self.verify_checksums)
            .field("reporter",          &self.reporter.as_ref().map(|_| "<Reporter>"))
            .field("header",            &self.header)
            .field("offset_in_block",   &self.offset_in_block)
            .field("next_block_offset", &self.next_block_offset)
            .field("eof",               &self.eof)
            .field("array_remaining",   &self.array_remaining)
            .field("read_header_bytes", &self.read_header_bytes)
            .field("read_data_bytes",   &self.read_data_bytes)
            .finish_non_exhaustive()
    }
}


/// Receives a notification whenever the reader drops data.
///
/// Any `FnMut(usize, Corruption)` closure is a reporter. Reporting is informational;
/// the reader has already resynchronized by the time the reporter runs.
pub trait CorruptionReporter {
    fn corruption(&mut self, bytes_dropped: usize, cause: Corruption);
}

impl<R: FnMut(usize, Corruption)> CorruptionReporter for R {
    fn corruption(&mut self, bytes_dropped: usize, cause: Corruption) {
        self(bytes_dropped, cause);
    }
}

/// The ways list file data can be found damaged while reading.
///
/// None of these end iteration except [`UnknownCompression`] and [`InvalidHeader`],
/// which are structural: without a header there is no block 0, and without the right
/// compressor a compressed block's records do not exist as bytes.
///
/// [`UnknownCompression`]: Corruption::UnknownCompression
/// [`InvalidHeader`]: Corruption::InvalidHeader
#[allow(variant_size_differences, reason = "the corruption enum shouldn't be hot")]
#[derive(Error, Debug)]
pub enum Corruption {
    /// The expected checksum from a physical record's header did not match the actual
    /// calculated checksum of the record. The record is dropped, and iteration continues
    /// at the next record its (bounds-checked) length field indicates.
    #[error("physical record checksum mismatch")]
    ChecksumMismatch,
    /// The length of a physical record, as given in its header, was too long to possibly
    /// be correct. The rest of the block is skipped.
    #[error("physical record header had corrupted length field")]
    BadRecordLength,
    /// The record type of a physical record was not among the known values (or was a
    /// `Zero` record with a nonzero length).
    #[error("physical record header had unknown record type `{0}`")]
    UnknownRecordType(u8),
    /// A `Middle` or `Last` fragment occurred with no preceding `First`. The fragment is
    /// dropped; an earlier fragment of its record was likely corrupt.
    #[error("a fragment occurred outside a fragmented logical record")]
    MissingChainStart,
    /// A fragmented logical record was interrupted before its `Last` fragment. The
    /// accumulated fragments are dropped; reading restarts at the interrupting record.
    #[error("a fragmented logical record was interrupted before completion")]
    InterruptedChain,
    /// An array record's packed elements could not be decoded. The remainder of the
    /// array is dropped; elements already delivered stand.
    #[error("an array record's packed elements were malformed")]
    BadArrayPayload,
    /// A block carrying a compression indicator failed to decompress. The block is
    /// skipped.
    #[error("a compressed block failed to decompress: {0}")]
    BadCompressedBlock(String),
    /// A block carries a compression method this reader has no compressor for.
    /// Iteration ends; later blocks would be misread as garbage.
    #[error("no compressor is registered for method `{0}`")]
    UnknownCompression(u8),
    /// The file header could not be parsed, so iteration never starts.
    #[error("unreadable file header: {0}")]
    InvalidHeader(#[source] HeaderError),
    /// Reading the underlying file failed with a non-interrupt error. The bytes already
    /// read from the afflicted block are dropped and iteration ends.
    #[error("failed to read the file: {0}")]
    Io(#[source] IoError),
}
