use std::collections::BTreeMap;

use super::{Compressor, CompressorId, NoneCompressor};
#[cfg(feature = "lz4-compression")]
use super::Lz4Compressor;
#[cfg(feature = "zlib-compression")]
use super::ZlibCompressor;


/// A list of [`Compressor`] implementations, associated with IDs.
///
/// See [`Compressor`] and [`CompressorId`] for more.
#[derive(Debug)]
pub struct CompressorList(BTreeMap<u8, Box<dyn Compressor>>);

impl CompressorList {
    /// Get a `CompressorList` with only the [`NoneCompressor`] at ID 0.
    #[must_use]
    pub fn new_without_compressors() -> Self {
        let mut compressors = BTreeMap::new();
        compressors.insert(NoneCompressor::ID, Box::new(NoneCompressor) as Box<dyn Compressor>);
        Self(compressors)
    }

    /// Get a `CompressorList` with the [`NoneCompressor`] at ID 0, an LZ4 compressor at
    /// ID 1 (only if the `lz4-compression` feature is enabled), and a zlib compressor at
    /// ID 2 (only if the `zlib-compression` feature is enabled).
    ///
    /// The registered compressors use each method's default level; a [`ListWriter`]
    /// replaces its configured method's entry with one at the configured level.
    ///
    /// [`ListWriter`]: crate::writer::ListWriter
    #[must_use]
    pub fn with_default_compressors() -> Self {
        #[allow(unused_mut, reason = "if neither compression feature is enabled, it's unused")]
        let mut compressor_list = Self::new_without_compressors();
        #[cfg(feature = "lz4-compression")]
        compressor_list.add(Lz4Compressor);
        #[cfg(feature = "zlib-compression")]
        compressor_list.add(ZlibCompressor::default());
        compressor_list
    }

    /// Set the provided `compressor`'s ID to refer to that compressor.
    ///
    /// Returns true if this operation did not overwrite a previous compressor,
    /// and false if a previously-set compressor had the same `id`.
    #[inline]
    pub fn add<C>(&mut self, compressor: C) -> bool
    where
        C: Compressor + CompressorId + 'static,
    {
        self.set_with_id(C::ID, compressor)
    }

    /// Set the given `id` to refer to the provided `compressor`.
    ///
    /// Returns true if this operation did not overwrite a previous compressor,
    /// and false if a previously-set compressor had the same `id`.
    #[inline]
    pub fn set_with_id<C>(&mut self, id: u8, compressor: C) -> bool
    where
        C: Compressor + 'static,
    {
        self.0.insert(id, Box::new(compressor)).is_none()
    }

    /// Check whether the given ID refers to any compressor.
    #[inline]
    #[must_use]
    pub fn is_set(&self, id: u8) -> bool {
        self.0.contains_key(&id)
    }

    /// Get the compressor referred to by `id`, if `id` was set.
    #[inline]
    #[must_use]
    pub fn get(&self, id: u8) -> Option<&dyn Compressor> {
        self.0.get(&id).map(|compressor| &**compressor)
    }
}

impl Default for CompressorList {
    #[inline]
    fn default() -> Self {
        Self::with_default_compressors()
    }
}
