// SPDX-License-Identifier: Apache-2.0

//! Filtering recursive-descent deserializer.
//!
//! Every grammar rule is written once and driven in one of two moods given by
//! [`Sink`]: `Build` materializes nodes in the pool, `Discard` only recognises
//! the input. The filter narrows `Build` to `Discard` for values it rejects, and
//! everything below a discarded value is discarded too. Grammar violations are
//! hard errors in both moods; only the content of discarded bare scalars is
//! exempt from validation.

use crate::escape_processor::EscapeProcessor;
use crate::filter::Filter;
use crate::node::{List, NodeData};
use crate::number_parser::{parse_literal, TokenBuffer};
use crate::parse_error::DeserializationError;
use crate::pool::{MemoryPool, PoolStorage, StrRef};
use crate::source::{ByteSource, StringStorage};

type Result<T> = core::result::Result<T, DeserializationError>;

/// Maximum nesting depth of arrays and objects, enforced whether or not
/// the nested values are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestingLimit(pub u8);

impl Default for NestingLimit {
    fn default() -> Self {
        NestingLimit(10)
    }
}

/// What the grammar routines do with the values they recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    Build,
    Discard,
}

impl Sink {
    fn narrow(self, allowed: bool) -> Sink {
        if allowed {
            self
        } else {
            Sink::Discard
        }
    }

    /// Bytes that make up a bare token (literal, number or unquoted key).
    fn accepts_bare(self, byte: u8) -> bool {
        match self {
            Sink::Build => {
                byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'+' | b'-' | b'.')
            }
            // Anything short of a structural byte is stepped over
            Sink::Discard => !matches!(
                byte,
                b',' | b':' | b']' | b'}' | b'[' | b'{' | b'"' | b'\''
            ),
        }
    }
}

/// String content being captured while building.
struct Capture {
    /// Source position of the first content byte
    start: usize,
    /// Content is staged in the pool instead of referenced in the input
    copying: bool,
}

/// Where the bytes of a bare token go.
enum Collect<'c> {
    Nothing,
    Token(&'c mut TokenBuffer),
    Capture(&'c mut Capture),
}

pub(crate) struct Deserializer<'p, S: PoolStorage, B: ByteSource> {
    pool: &'p mut MemoryPool<S>,
    source: B,
    storage: StringStorage,
}

impl<'p, S: PoolStorage, B: ByteSource> Deserializer<'p, S, B> {
    pub(crate) fn new(pool: &'p mut MemoryPool<S>, source: B) -> Self {
        let storage = source.string_storage();
        Self {
            pool,
            source,
            storage,
        }
    }

    /// Parse one value from the source as the root of a document.
    pub(crate) fn parse(&mut self, filter: Filter<'_>, limit: NestingLimit) -> Result<NodeData> {
        self.parse_value(filter, Sink::Build, limit.0)
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\r' | b'\n') = self.source.peek() {
            self.source.advance();
        }
    }

    /// Next significant byte, not consumed.
    fn peek_significant(&mut self) -> Result<u8> {
        self.skip_whitespace();
        self.source
            .peek()
            .ok_or(DeserializationError::IncompleteInput)
    }

    /// Consume `expected` if it is the next significant byte.
    fn eat(&mut self, expected: u8) -> Result<bool> {
        if self.peek_significant()? == expected {
            self.source.advance();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn next_byte(&mut self) -> Result<u8> {
        self.source
            .next_byte()
            .ok_or(DeserializationError::IncompleteInput)
    }

    fn parse_value(&mut self, filter: Filter<'_>, sink: Sink, depth: u8) -> Result<NodeData> {
        let first = self.peek_significant()?;
        let sink = sink.narrow(filter.admits(first));
        match first {
            b'[' => self.parse_array(filter, sink, depth),
            b'{' => self.parse_object(filter, sink, depth),
            b'"' | b'\'' => Ok(self
                .scan_string(sink)?
                .map_or(NodeData::Null, NodeData::Str)),
            _ => self.parse_bare_value(sink),
        }
    }

    fn parse_array(&mut self, filter: Filter<'_>, sink: Sink, depth: u8) -> Result<NodeData> {
        if depth == 0 {
            return Err(DeserializationError::TooDeep);
        }
        log::trace!("array at {} ({:?})", self.source.position(), sink);
        self.source.advance();

        let mut list = List::default();
        if !self.eat(b']')? {
            let mut element_filters = filter.element_filters();
            loop {
                let element_filter = match sink {
                    Sink::Build => element_filters.next_filter(),
                    Sink::Discard => Filter::deny(),
                };
                if sink == Sink::Build && element_filter.admits(self.peek_significant()?) {
                    let slot = self.pool.append_element(&mut list)?;
                    let element = self.parse_value(element_filter, Sink::Build, depth - 1)?;
                    self.pool.write_node(slot, element);
                } else {
                    self.parse_value(element_filter, Sink::Discard, depth - 1)?;
                }

                if self.eat(b']')? {
                    break;
                }
                if !self.eat(b',')? {
                    return Err(DeserializationError::InvalidInput);
                }
            }
        }
        Ok(match sink {
            Sink::Build => NodeData::Array(list),
            Sink::Discard => NodeData::Null,
        })
    }

    fn parse_object(&mut self, filter: Filter<'_>, sink: Sink, depth: u8) -> Result<NodeData> {
        if depth == 0 {
            return Err(DeserializationError::TooDeep);
        }
        log::trace!("object at {} ({:?})", self.source.position(), sink);
        self.source.advance();

        let mut list = List::default();
        if !self.eat(b'}')? {
            loop {
                let key = self.parse_key(sink)?;
                if !self.eat(b':')? {
                    return Err(DeserializationError::InvalidInput);
                }
                match key {
                    Some(key) => {
                        let member_filter = filter.descend_key(self.string_bytes(key));
                        if member_filter.admits(self.peek_significant()?) {
                            let slot = self.pool.append_member(&mut list, key)?;
                            let value = self.parse_value(member_filter, Sink::Build, depth - 1)?;
                            self.pool.write_node(slot, value);
                        } else {
                            self.pool.reclaim_string(key);
                            self.parse_value(Filter::deny(), Sink::Discard, depth - 1)?;
                        }
                    }
                    None => {
                        self.parse_value(Filter::deny(), Sink::Discard, depth - 1)?;
                    }
                }

                if self.eat(b'}')? {
                    break;
                }
                if !self.eat(b',')? {
                    return Err(DeserializationError::InvalidInput);
                }
            }
        }
        Ok(match sink {
            Sink::Build => NodeData::Object(list),
            Sink::Discard => NodeData::Null,
        })
    }

    /// Parse a quoted or bare member key. `None` when discarding.
    fn parse_key(&mut self, sink: Sink) -> Result<Option<StrRef>> {
        if matches!(self.peek_significant()?, b'"' | b'\'') {
            return self.scan_string(sink);
        }
        match sink {
            Sink::Discard => {
                self.scan_bare(sink, Collect::Nothing)?;
                Ok(None)
            }
            Sink::Build => {
                let mut capture = self.begin_capture();
                if self.scan_bare(sink, Collect::Capture(&mut capture))? == 0 {
                    self.pool.abandon_string();
                    return Err(DeserializationError::InvalidInput);
                }
                let end = self.source.position();
                self.finish_capture(capture, end).map(Some)
            }
        }
    }

    fn parse_bare_value(&mut self, sink: Sink) -> Result<NodeData> {
        match sink {
            Sink::Discard => {
                self.scan_bare(sink, Collect::Nothing)?;
                Ok(NodeData::Null)
            }
            Sink::Build => {
                let mut token = TokenBuffer::new();
                self.scan_bare(sink, Collect::Token(&mut token))?;
                let at_end = self.source.peek().is_none();
                parse_literal(token.as_bytes(), at_end)
            }
        }
    }

    /// Consume a bare token, returning its length.
    fn scan_bare(&mut self, sink: Sink, mut collect: Collect<'_>) -> Result<usize> {
        let mut len = 0;
        while let Some(byte) = self.source.peek() {
            if !sink.accepts_bare(byte) {
                break;
            }
            match &mut collect {
                Collect::Nothing => {}
                Collect::Token(token) => token.push(byte)?,
                Collect::Capture(capture) => {
                    if capture.copying {
                        self.pool.push_string_byte(byte)?;
                    }
                }
            }
            self.source.advance();
            len += 1;
        }
        Ok(len)
    }

    /// Scan a single- or double-quoted string. Returns its content when building.
    ///
    /// An unterminated string is an error in both moods.
    fn scan_string(&mut self, sink: Sink) -> Result<Option<StrRef>> {
        let quote = self.next_byte()?;
        let mut capture = match sink {
            Sink::Build => Some(self.begin_capture()),
            Sink::Discard => None,
        };
        loop {
            let content_end = self.source.position();
            let byte = self.next_byte()?;
            if byte == quote {
                return match capture {
                    Some(capture) => self.finish_capture(capture, content_end).map(Some),
                    None => Ok(None),
                };
            }
            match (byte, capture.as_mut()) {
                // The escaped byte is stepped over so an escaped quote cannot end the string
                (b'\\', None) => self.source.advance(),
                (b'\\', Some(capture)) => {
                    self.start_copying(capture, content_end)?;
                    self.unescape()?;
                }
                (_, Some(capture)) if capture.copying => self.pool.push_string_byte(byte)?,
                _ => {}
            }
        }
    }

    fn begin_capture(&mut self) -> Capture {
        let copying = self.storage == StringStorage::Copy;
        if copying {
            self.pool.begin_string();
        }
        Capture {
            start: self.source.position(),
            copying,
        }
    }

    /// Switch a zero-copy capture to staging, copying the content seen up to `end`.
    fn start_copying(&mut self, capture: &mut Capture, end: usize) -> Result<()> {
        if capture.copying {
            return Ok(());
        }
        self.pool.begin_string();
        let prefix = self.source.span(capture.start, end).unwrap_or(&[]);
        self.pool.push_string_bytes(prefix)?;
        capture.copying = true;
        Ok(())
    }

    fn finish_capture(&mut self, capture: Capture, end: usize) -> Result<StrRef> {
        if capture.copying {
            core::str::from_utf8(self.pool.staged())?;
            return Ok(self.pool.commit_string()?);
        }
        let content = self.source.span(capture.start, end).unwrap_or(&[]);
        core::str::from_utf8(content)?;
        match (u32::try_from(capture.start), u32::try_from(content.len())) {
            (Ok(start), Ok(len)) if start.checked_add(len).is_some() => {
                Ok(StrRef::Borrowed { start, len })
            }
            // Input too large to address, fall back to a copy
            _ => Ok(self.pool.alloc_string(content)?),
        }
    }

    /// Resolve one escape sequence (backslash consumed) into the staged string.
    fn unescape(&mut self) -> Result<()> {
        let escape = self.next_byte()?;
        if escape != b'u' {
            let byte = EscapeProcessor::process_simple_escape(escape)?;
            return Ok(self.pool.push_string_byte(byte)?);
        }
        let mut codepoint = self.read_hex4()?;
        if EscapeProcessor::is_high_surrogate(codepoint) {
            self.expect_byte(b'\\')?;
            self.expect_byte(b'u')?;
            let low = self.read_hex4()?;
            codepoint = EscapeProcessor::combine_surrogate_pair(codepoint, low)?;
        }
        let mut utf8 = [0u8; 4];
        let bytes = EscapeProcessor::unicode_to_utf8(codepoint, &mut utf8)?;
        Ok(self.pool.push_string_bytes(bytes)?)
    }

    fn read_hex4(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            let digit = EscapeProcessor::validate_hex_digit(self.next_byte()?)?;
            value = (value << 4) | digit;
        }
        Ok(value)
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.next_byte()? == expected {
            Ok(())
        } else {
            Err(DeserializationError::InvalidInput)
        }
    }

    /// Content of a just-captured string.
    fn string_bytes(&self, string: StrRef) -> &[u8] {
        match string {
            StrRef::Owned { tail, len } => self.pool.owned_string(tail, len),
            StrRef::Borrowed { start, len } => {
                let start = start as usize;
                self.source
                    .span(start, start + len as usize)
                    .unwrap_or(&[])
            }
        }
    }
}
