// SPDX-License-Identifier: Apache-2.0

//! A convenience [`Reader`] over in-memory data.
//!
//! [`ChunkReader`] hands out a byte slice in fixed-size chunks, which is handy
//! for simulating network or serial input and for stress-testing
//! [`Document::deserialize_reader`](crate::Document::deserialize_reader) with
//! short reads. Real deployments implement [`Reader`] for their own input
//! (UART, socket, file, ring buffer).
//!
//! ```rust
//! use pooljson::{ChunkReader, DeserializeOptions, Document};
//!
//! let json = br#"{"name": "Alice", "age": 30}"#;
//! let mut doc = Document::new([0u8; 256]);
//! // At most 4 bytes per read
//! doc.deserialize_reader(ChunkReader::new(json, 4), DeserializeOptions::new())
//!     .unwrap();
//! assert_eq!(doc.root().get("name").as_str(), "Alice");
//! ```

use crate::Reader;

/// A [`Reader`] returning at most `chunk_size` bytes of a slice per `read()` call.
#[derive(Debug)]
pub struct ChunkReader<'a> {
    data: &'a [u8],
    pos: usize,
    chunk_size: usize,
}

impl<'a> ChunkReader<'a> {
    /// Create a reader limited to `chunk_size` bytes per read (minimum 1).
    pub fn new(data: &'a [u8], chunk_size: usize) -> Self {
        Self {
            data,
            pos: 0,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Create a reader that hands out as much as the caller's buffer holds.
    pub fn full_slice(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            chunk_size: usize::MAX,
        }
    }
}

impl Reader for ChunkReader<'_> {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let remaining = self.data.get(self.pos..).unwrap_or(&[]);
        let to_copy = remaining.len().min(buf.len()).min(self.chunk_size);
        match (buf.get_mut(..to_copy), remaining.get(..to_copy)) {
            (Some(dest), Some(src)) => dest.copy_from_slice(src),
            _ => return Ok(0),
        }
        self.pos = self.pos.saturating_add(to_copy);
        Ok(to_copy)
    }
}
