// SPDX-License-Identifier: Apache-2.0

//! The document: a memory pool plus the root of the tree built in it.

use crate::deserializer::{Deserializer, NestingLimit};
use crate::filter::Filter;
use crate::node::NodeData;
use crate::parse_error::DeserializationError;
use crate::pool::{MemoryPool, PoolStorage};
use crate::source::{ByteSource, NulTerminatedSource, Reader, ReaderSource, SliceSource};
use crate::value::{Tree, Value};

/// Settings for a single deserialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeserializeOptions<'f> {
    pub filter: Filter<'f>,
    pub nesting_limit: NestingLimit,
}

impl<'f> DeserializeOptions<'f> {
    /// Keep everything, nest at most 10 levels.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(self, filter: Filter<'f>) -> Self {
        Self { filter, ..self }
    }

    pub fn with_nesting_limit(self, nesting_limit: NestingLimit) -> Self {
        Self {
            nesting_limit,
            ..self
        }
    }
}

/// A JSON tree stored in a memory pool.
///
/// The root node lives in the document itself; its descendants occupy pool
/// slots. With zero-copy inputs, strings may reference the input buffer,
/// which must therefore outlive the document (`'src`).
///
/// Every deserialization starts by clearing the pool, and a failed one
/// leaves the document empty with a null root.
///
/// # Example
/// ```rust
/// use pooljson::{DeserializeOptions, Document, Filter};
///
/// let mut filter_doc = Document::new([0u8; 128]);
/// filter_doc
///     .deserialize_str(r#"{"list": [{"temperature": true}]}"#, DeserializeOptions::new())
///     .unwrap();
///
/// let mut doc = Document::new([0u8; 256]);
/// let input = r#"{"name": "sensor", "list": [{"temperature": 21.5, "humidity": 40}]}"#;
/// let options = DeserializeOptions::new().with_filter(Filter::new(filter_doc.root()));
/// doc.deserialize_str(input, options).unwrap();
///
/// assert_eq!(doc.root().to_string(), r#"{"list":[{"temperature":21.5}]}"#);
/// ```
#[derive(Debug)]
pub struct Document<'src, S: PoolStorage> {
    pool: MemoryPool<S>,
    root: NodeData,
    input: &'src [u8],
}

/// A document over a fixed, inline buffer of `N` bytes.
pub type StaticDocument<'src, const N: usize> = Document<'src, [u8; N]>;

/// A document over a heap buffer that grows on demand.
#[cfg(feature = "alloc")]
pub type DynamicDocument<'src> = Document<'src, alloc::vec::Vec<u8>>;

impl<'src, S: PoolStorage> Document<'src, S> {
    /// Empty document over `storage`, which never grows.
    pub fn new(storage: S) -> Self {
        Self::with_pool(MemoryPool::new(storage))
    }

    pub fn with_pool(pool: MemoryPool<S>) -> Self {
        Self {
            pool,
            root: NodeData::Null,
            input: &[],
        }
    }

    pub fn root(&self) -> Value<'_> {
        Value::new(Tree::new(self.pool.bytes(), self.input), self.root)
    }

    /// The root as a filter for another deserialization.
    pub fn as_filter(&self) -> Filter<'_> {
        Filter::new(self.root())
    }

    /// Pool bytes used by the current tree.
    pub fn memory_usage(&self) -> usize {
        self.pool.memory_usage()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn pool(&self) -> &MemoryPool<S> {
        &self.pool
    }

    /// Drops the tree, keeping the pool's storage.
    pub fn clear(&mut self) {
        self.pool.clear();
        self.root = NodeData::Null;
        self.input = &[];
    }

    /// Deserialize a complete input held in memory.
    ///
    /// Strings without escapes reference `input` instead of being copied.
    /// Returns the pool bytes used on success.
    pub fn deserialize(
        &mut self,
        input: &'src [u8],
        options: DeserializeOptions<'_>,
    ) -> Result<usize, DeserializationError> {
        self.run(SliceSource::new(input), input, options)
    }

    pub fn deserialize_str(
        &mut self,
        input: &'src str,
        options: DeserializeOptions<'_>,
    ) -> Result<usize, DeserializationError> {
        self.deserialize(input.as_bytes(), options)
    }

    /// Deserialize an input that ends at its first NUL byte.
    pub fn deserialize_nul_terminated(
        &mut self,
        input: &'src [u8],
        options: DeserializeOptions<'_>,
    ) -> Result<usize, DeserializationError> {
        self.run(NulTerminatedSource::new(input), input, options)
    }

    pub fn deserialize_c_str(
        &mut self,
        input: &'src core::ffi::CStr,
        options: DeserializeOptions<'_>,
    ) -> Result<usize, DeserializationError> {
        self.deserialize_nul_terminated(input.to_bytes_with_nul(), options)
    }

    /// Deserialize a stream. Every kept string is copied into the pool.
    ///
    /// The reader is drained in chunks, so bytes following the root value may
    /// have been consumed when this returns.
    pub fn deserialize_reader<R: Reader>(
        &mut self,
        reader: R,
        options: DeserializeOptions<'_>,
    ) -> Result<usize, DeserializationError> {
        self.run(ReaderSource::new(reader), &[], options)
    }

    fn run<B: ByteSource>(
        &mut self,
        source: B,
        input: &'src [u8],
        options: DeserializeOptions<'_>,
    ) -> Result<usize, DeserializationError> {
        self.clear();
        self.input = input;
        let parsed = Deserializer::new(&mut self.pool, source)
            .parse(options.filter, options.nesting_limit);
        match parsed {
            Ok(root) => {
                self.root = root;
                log::debug!(
                    "deserialized {:?} root using {} of {} pool bytes",
                    self.root().kind(),
                    self.pool.memory_usage(),
                    self.pool.capacity()
                );
                Ok(self.pool.memory_usage())
            }
            Err(err) => {
                log::debug!("deserialization failed: {}", err);
                self.clear();
                Err(err)
            }
        }
    }
}

#[cfg(feature = "alloc")]
impl<'src> Document<'src, alloc::vec::Vec<u8>> {
    /// Document over a heap pool starting at `initial` bytes and doubling up
    /// to `max_capacity` bytes as the tree needs.
    pub fn growable(initial: usize, max_capacity: usize) -> Self {
        Self::with_pool(MemoryPool::with_max_capacity(
            alloc::vec![0u8; initial],
            max_capacity,
        ))
    }
}
