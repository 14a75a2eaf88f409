// SPDX-License-Identifier: Apache-2.0

//! Byte sources the deserializer pulls its input from.
//!
//! A source yields one byte at a time with a one-byte lookahead and reports
//! end of input as `None`, distinct from a NUL byte where that matters.

/// Trait for input sources that supply data in chunks.
pub trait Reader {
    /// The error type returned by read operations
    type Error;

    /// Read data into the provided buffer.
    /// Returns the number of bytes read, or an error.
    ///
    /// # Contract
    /// - A return value of 0 **MUST** indicate true end of stream
    /// - Short reads (fewer bytes than the buffer holds) are allowed at any time
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

impl<R: Reader + ?Sized> Reader for &mut R {
    type Error = R::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).read(buf)
    }
}

/// How string content recognised from a source is stored in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringStorage {
    /// Strings without escapes reference the caller's input directly.
    ZeroCopy,
    /// Every string is duplicated into the memory pool.
    Copy,
}

/// Pull-style byte input consumed by the deserializer.
pub trait ByteSource {
    /// The next byte without consuming it, or `None` at end of input.
    fn peek(&mut self) -> Option<u8>;
    /// Consume the byte returned by the last `peek`.
    fn advance(&mut self);
    /// Number of bytes consumed so far.
    fn position(&self) -> usize;
    /// How strings from this source must be stored.
    fn string_storage(&self) -> StringStorage {
        StringStorage::Copy
    }
    /// Already consumed input between two positions, for zero-copy sources.
    fn span(&self, start: usize, end: usize) -> Option<&[u8]> {
        let _ = (start, end);
        None
    }

    /// Consume and return the next byte.
    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.advance();
        Some(byte)
    }
}

/// Fixed-length in-memory input.
#[derive(Debug)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl ByteSource for SliceSource<'_> {
    fn peek(&mut self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }
    fn advance(&mut self) {
        if self.pos < self.data.len() {
            self.pos += 1;
        }
    }
    fn position(&self) -> usize {
        self.pos
    }
    fn string_storage(&self) -> StringStorage {
        StringStorage::ZeroCopy
    }
    fn span(&self, start: usize, end: usize) -> Option<&[u8]> {
        self.data.get(start..end)
    }
}

/// In-memory input whose end is marked by the first NUL byte rather than a length.
#[derive(Debug)]
pub struct NulTerminatedSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> NulTerminatedSource<'a> {
    /// Bytes after the first NUL (if any) are never read.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn from_c_str(text: &'a core::ffi::CStr) -> Self {
        Self::new(text.to_bytes_with_nul())
    }
}

impl ByteSource for NulTerminatedSource<'_> {
    fn peek(&mut self) -> Option<u8> {
        self.data.get(self.pos).copied().filter(|&b| b != 0)
    }
    fn advance(&mut self) {
        if self.peek().is_some() {
            self.pos += 1;
        }
    }
    fn position(&self) -> usize {
        self.pos
    }
    fn string_storage(&self) -> StringStorage {
        StringStorage::ZeroCopy
    }
    fn span(&self, start: usize, end: usize) -> Option<&[u8]> {
        self.data.get(start..end)
    }
}

/// Size of the chunk buffer a [`ReaderSource`] refills from its reader.
pub const READER_CHUNK_SIZE: usize = 64;

/// Streamed input pulled from a [`Reader`] through a small chunk buffer.
///
/// The data is transient, so every materialized string is copied into the pool.
pub struct ReaderSource<R: Reader> {
    reader: R,
    chunk: [u8; READER_CHUNK_SIZE],
    chunk_len: usize,
    chunk_pos: usize,
    consumed: usize,
    finished: bool,
}

impl<R: Reader> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            chunk: [0u8; READER_CHUNK_SIZE],
            chunk_len: 0,
            chunk_pos: 0,
            consumed: 0,
            finished: false,
        }
    }

    fn refill(&mut self) {
        match self.reader.read(&mut self.chunk) {
            Ok(0) => self.finished = true,
            Ok(n) => {
                self.chunk_len = n.min(READER_CHUNK_SIZE);
                self.chunk_pos = 0;
            }
            Err(_) => {
                log::warn!(
                    "reader failed after {} bytes, treating as end of input",
                    self.consumed
                );
                self.finished = true;
            }
        }
    }
}

impl<R: Reader> ByteSource for ReaderSource<R> {
    fn peek(&mut self) -> Option<u8> {
        while self.chunk_pos >= self.chunk_len && !self.finished {
            self.refill();
        }
        if self.chunk_pos < self.chunk_len {
            self.chunk.get(self.chunk_pos).copied()
        } else {
            None
        }
    }
    fn advance(&mut self) {
        if self.chunk_pos < self.chunk_len {
            self.chunk_pos += 1;
            self.consumed += 1;
        }
    }
    fn position(&self) -> usize {
        self.consumed
    }
}
