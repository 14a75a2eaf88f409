// SPDX-License-Identifier: Apache-2.0

//! A filtering JSON deserializer that builds its tree in a caller-provided
//! memory pool.
//!
//! A second JSON document, the filter, selects which parts of the input are
//! kept. Everything else is validated and skipped without using pool memory.

#![cfg_attr(not(test), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Compile-time configuration validation
mod config_check;

mod parse_error;
pub use parse_error::DeserializationError;

mod pool;
pub use pool::{MemoryPool, PoolError, PoolStorage, SLOT_SIZE};

mod node;
pub use node::Integer;

mod value;
pub use value::{Elements, Members, Value, ValueKind};

mod filter;
pub use filter::Filter;

mod source;
pub use source::{
    ByteSource, NulTerminatedSource, Reader, ReaderSource, SliceSource, StringStorage,
    READER_CHUNK_SIZE,
};

mod chunk_reader;
pub use chunk_reader::ChunkReader;

mod escape_processor;

mod number_parser;

mod deserializer;
pub use deserializer::NestingLimit;

mod document;
#[cfg(feature = "alloc")]
pub use document::DynamicDocument;
pub use document::{DeserializeOptions, Document, StaticDocument};
