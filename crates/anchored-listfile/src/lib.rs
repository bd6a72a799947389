//! Record-oriented log files: an append-friendly container for an ordered sequence of
//! opaque byte records, preceded by a small metadata dictionary.
//!
//! The on-disk layout descends from the LevelDB log format — fixed-size blocks holding
//! checksummed physical records, with logical records fragmented across blocks — and
//! extends it with user metadata in the file header, optional per-block compression
//! (LZ4 or zlib), and packed "array" records that amortize framing overhead across many
//! small records.
//!
//! Write with [`ListWriter`], read back with [`ListReader`]:
//!
//! ```
//! use anchored_listfile::{ListReader, ListWriter, WriterOptions};
//!
//! let mut file = Vec::new();
//! let mut writer = ListWriter::new(&mut file, WriterOptions::default());
//! writer.add_meta("owner", "alice")?;
//! writer.init()?;
//! writer.add_record(b"hello")?;
//! writer.flush()?;
//!
//! let mut reader = ListReader::new(file.as_slice(), true);
//! let mut scratch = Vec::new();
//! assert_eq!(reader.read_record(&mut scratch), Some(&b"hello"[..]));
//! assert_eq!(reader.read_record(&mut scratch), None);
//! # Ok::<(), anchored_listfile::Error>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod format;
mod header;
mod options;
mod reader;
mod writer;

// Reason these are pub: constants, traits, and alternative implementations that are not
// usually needed. They need to be public, but need not be in the crate root.
pub mod compressors;
pub mod files;
pub mod text;


pub use self::error::{Error, Result, UsageError};
pub use self::header::{HeaderError, MetaMap, PROTO_SET_KEY, PROTO_TYPE_KEY};
pub use self::options::{CompressMethod, WriterOptions};
pub use self::reader::{Corruption, CorruptionReporter, ListReader, Records};
pub use self::writer::ListWriter;
