use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::header::HeaderError;


pub type Result<T> = StdResult<T, Error>;


/// A fatal error from a [`ListWriter`] or [`ListReader`].
///
/// Corruption found while reading is *not* represented here; it is reported through a
/// [`CorruptionReporter`] and skipped, and iteration continues.
///
/// [`ListWriter`]: crate::writer::ListWriter
/// [`ListReader`]: crate::reader::ListReader
/// [`CorruptionReporter`]: crate::reader::CorruptionReporter
#[derive(Error, Debug)]
pub enum Error {
    /// The underlying file failed. Fatal for the reader or writer instance.
    #[error("list file I/O failed: {0}")]
    Io(#[from] IoError),
    /// The file does not begin with a well-formed list file header.
    #[error("invalid list file header: {0}")]
    InvalidHeader(#[from] HeaderError),
    /// An operation was called in a state its contract forbids.
    #[error(transparent)]
    InvalidUsage(#[from] UsageError),
    /// The configured compression method has no registered compressor.
    #[error("compression method `{0}` is not registered")]
    UnsupportedCompression(u8),
    /// A previous operation on this writer failed; the writer refuses all further work
    /// and repeats the original failure.
    #[error("the writer previously failed: {0}")]
    Failed(String),
}

/// Operations called outside the `constructed -> add_meta* -> init -> add_record* -> flush`
/// lifecycle of a writer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageError {
    #[error("`add_meta` must not be called after `init`")]
    MetaAfterInit,
    #[error("`init` must only be called once")]
    AlreadyInitialized,
    #[error("`init` must be called before this operation")]
    NotInitialized,
    #[error("the writer was already flushed")]
    AlreadyFlushed,
    #[error("`append` requires opening an existing file by path")]
    AppendWithoutFile,
}
