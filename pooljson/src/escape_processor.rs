// SPDX-License-Identifier: Apache-2.0

use crate::parse_error::DeserializationError;

/// Pure helpers for resolving backslash escapes in materialized strings.
pub struct EscapeProcessor;

impl EscapeProcessor {
    /// Resolve the character following a backslash.
    ///
    /// Both quote styles may be escaped since strings can be single- or double-quoted.
    /// `u` is not handled here, see [`EscapeProcessor::unicode_to_utf8`].
    pub fn process_simple_escape(escape_char: u8) -> Result<u8, DeserializationError> {
        match escape_char {
            b'n' => Ok(b'\n'),
            b't' => Ok(b'\t'),
            b'r' => Ok(b'\r'),
            b'\\' => Ok(b'\\'),
            b'"' => Ok(b'"'),
            b'\'' => Ok(b'\''),
            b'/' => Ok(b'/'),
            b'b' => Ok(0x08), // Backspace
            b'f' => Ok(0x0C), // Form feed
            _ => Err(DeserializationError::InvalidInput),
        }
    }

    /// The numeric value (0-15) of a hexadecimal digit.
    pub fn validate_hex_digit(byte: u8) -> Result<u32, DeserializationError> {
        match byte {
            b'0'..=b'9' => Ok((byte - b'0') as u32),
            b'a'..=b'f' => Ok(byte.wrapping_sub(b'a').wrapping_add(10) as u32),
            b'A'..=b'F' => Ok(byte.wrapping_sub(b'A').wrapping_add(10) as u32),
            _ => Err(DeserializationError::InvalidInput),
        }
    }

    /// Check if a Unicode codepoint is a high surrogate (0xD800-0xDBFF)
    pub fn is_high_surrogate(codepoint: u32) -> bool {
        (0xD800..=0xDBFF).contains(&codepoint)
    }

    /// Check if a Unicode codepoint is a low surrogate (0xDC00-0xDFFF)
    pub fn is_low_surrogate(codepoint: u32) -> bool {
        (0xDC00..=0xDFFF).contains(&codepoint)
    }

    /// Combine a high and low surrogate pair into a single Unicode codepoint
    pub fn combine_surrogate_pair(high: u32, low: u32) -> Result<u32, DeserializationError> {
        if !Self::is_high_surrogate(high) || !Self::is_low_surrogate(low) {
            return Err(DeserializationError::InvalidInput);
        }
        Ok(0x10000 + ((high & 0x3FF) << 10) + (low & 0x3FF))
    }

    /// Encode a complete codepoint (surrogates already combined) as UTF-8 into `buffer`.
    pub fn unicode_to_utf8(
        codepoint: u32,
        buffer: &mut [u8; 4],
    ) -> Result<&[u8], DeserializationError> {
        let ch = char::from_u32(codepoint).ok_or(DeserializationError::InvalidInput)?;
        Ok(ch.encode_utf8(buffer).as_bytes())
    }
}
