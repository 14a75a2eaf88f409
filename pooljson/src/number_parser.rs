// SPDX-License-Identifier: Apache-2.0

//! Conversion of bare tokens (`true`, `false`, `null`, numbers) into node values.

use crate::node::{Integer, NodeData};
use crate::parse_error::DeserializationError;

/// Longest bare token that can be materialized.
pub(crate) const MAX_TOKEN_LEN: usize = 63;

/// Fixed-size buffer collecting a bare token from the byte source.
pub(crate) struct TokenBuffer {
    bytes: [u8; MAX_TOKEN_LEN],
    len: usize,
}

impl TokenBuffer {
    pub(crate) fn new() -> Self {
        Self {
            bytes: [0u8; MAX_TOKEN_LEN],
            len: 0,
        }
    }

    pub(crate) fn push(&mut self, byte: u8) -> Result<(), DeserializationError> {
        let slot = self
            .bytes
            .get_mut(self.len)
            .ok_or(DeserializationError::InvalidInput)?;
        *slot = byte;
        self.len += 1;
        Ok(())
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.bytes.get(..self.len).unwrap_or(&[])
    }
}

const LITERALS: [&[u8]; 3] = [b"true", b"false", b"null"];

/// Interpret a bare token.
///
/// `at_end` tells whether the input ended right after the token, which turns a
/// truncated literal or number into [`DeserializationError::IncompleteInput`].
pub(crate) fn parse_literal(token: &[u8], at_end: bool) -> Result<NodeData, DeserializationError> {
    match token {
        b"true" => return Ok(NodeData::Bool(true)),
        b"false" => return Ok(NodeData::Bool(false)),
        b"null" => return Ok(NodeData::Null),
        _ => {}
    }
    if at_end && LITERALS.iter().any(|literal| literal.starts_with(token)) {
        return Err(DeserializationError::IncompleteInput);
    }
    parse_number(token, at_end)
}

#[derive(Debug, PartialEq)]
enum Shape {
    Integer,
    Float,
}

/// Checks `[+-]? digits ('.' digits)? ([eE] [+-]? digits)?` with at least one
/// mantissa digit. Returns the length of the valid prefix on failure.
fn classify(token: &[u8]) -> Result<Shape, usize> {
    let mut pos = 0;
    let digits_from = |pos: usize| {
        token
            .get(pos..)
            .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
    };

    if matches!(token.first(), Some(b'+' | b'-')) {
        pos += 1;
    }
    let int_digits = digits_from(pos);
    pos += int_digits;
    let mut shape = Shape::Integer;
    let mut frac_digits = 0;
    if token.get(pos) == Some(&b'.') {
        shape = Shape::Float;
        pos += 1;
        frac_digits = digits_from(pos);
        pos += frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return Err(pos);
    }
    if matches!(token.get(pos), Some(b'e' | b'E')) {
        shape = Shape::Float;
        pos += 1;
        if matches!(token.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let exp_digits = digits_from(pos);
        if exp_digits == 0 {
            return Err(pos);
        }
        pos += exp_digits;
    }
    if pos == token.len() {
        Ok(shape)
    } else {
        Err(pos)
    }
}

fn parse_number(token: &[u8], at_end: bool) -> Result<NodeData, DeserializationError> {
    match classify(token) {
        Ok(Shape::Integer) => match parse_integer(token) {
            Some(value) => Ok(NodeData::Int(value)),
            None => parse_float(token),
        },
        Ok(Shape::Float) => parse_float(token),
        // The whole token was a valid number prefix and input ran out
        Err(valid) if at_end && valid == token.len() => {
            Err(DeserializationError::IncompleteInput)
        }
        Err(_) => Err(DeserializationError::InvalidInput),
    }
}

/// Base-10 integer parse with overflow detection. The token is pre-validated.
fn parse_integer(token: &[u8]) -> Option<Integer> {
    let (negative, digits) = match token {
        [b'-', rest @ ..] => (true, rest),
        [b'+', rest @ ..] => (false, rest),
        _ => (false, token),
    };
    let mut result: Integer = 0;
    for &byte in digits {
        let digit = Integer::from(byte.checked_sub(b'0')?);
        result = result.checked_mul(10)?;
        // Accumulating negatively reaches Integer::MIN without overflow
        result = if negative {
            result.checked_sub(digit)?
        } else {
            result.checked_add(digit)?
        };
    }
    Some(result)
}

#[cfg(feature = "float")]
fn parse_float(token: &[u8]) -> Result<NodeData, DeserializationError> {
    let text = core::str::from_utf8(token)?;
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(NodeData::Float(value)),
        _ => Err(DeserializationError::InvalidInput),
    }
}

/// Floats and integers too wide for the configured type cannot be represented.
#[cfg(not(feature = "float"))]
fn parse_float(_token: &[u8]) -> Result<NodeData, DeserializationError> {
    Err(DeserializationError::InvalidInput)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        assert_eq!(parse_literal(b"true", false), Ok(NodeData::Bool(true)));
        assert_eq!(parse_literal(b"false", true), Ok(NodeData::Bool(false)));
        assert_eq!(parse_literal(b"null", false), Ok(NodeData::Null));
    }

    #[test]
    fn test_truncated_literals() {
        assert_eq!(
            parse_literal(b"tru", true),
            Err(DeserializationError::IncompleteInput)
        );
        assert_eq!(
            parse_literal(b"nul", true),
            Err(DeserializationError::IncompleteInput)
        );
        // Not at the end of input: a bad literal, not a truncated one
        assert_eq!(
            parse_literal(b"tru", false),
            Err(DeserializationError::InvalidInput)
        );
        assert_eq!(
            parse_literal(b"truth", true),
            Err(DeserializationError::InvalidInput)
        );
        assert_eq!(
            parse_literal(b"", false),
            Err(DeserializationError::InvalidInput)
        );
    }

    #[test]
    fn test_integers() {
        assert_eq!(parse_literal(b"0", false), Ok(NodeData::Int(0)));
        assert_eq!(parse_literal(b"42", false), Ok(NodeData::Int(42)));
        assert_eq!(parse_literal(b"-666", false), Ok(NodeData::Int(-666)));
        assert_eq!(parse_literal(b"+7", false), Ok(NodeData::Int(7)));
    }

    #[cfg(feature = "int64")]
    #[test]
    fn test_integer_limits() {
        assert_eq!(
            parse_literal(b"9223372036854775807", false),
            Ok(NodeData::Int(i64::MAX))
        );
        assert_eq!(
            parse_literal(b"-9223372036854775808", false),
            Ok(NodeData::Int(i64::MIN))
        );
    }

    #[cfg(all(feature = "int64", feature = "float"))]
    #[test]
    fn test_integer_overflow_becomes_float() {
        assert_eq!(
            parse_literal(b"9223372036854775808", false),
            Ok(NodeData::Float(9223372036854775808.0))
        );
    }

    #[cfg(feature = "float")]
    #[test]
    fn test_floats() {
        assert_eq!(parse_literal(b"2.5", false), Ok(NodeData::Float(2.5)));
        assert_eq!(parse_literal(b"-0.5", false), Ok(NodeData::Float(-0.5)));
        assert_eq!(parse_literal(b"12.34e-6", false), Ok(NodeData::Float(12.34e-6)));
        assert_eq!(parse_literal(b"1E3", false), Ok(NodeData::Float(1000.0)));
        assert_eq!(
            parse_literal(b"1e999", false),
            Err(DeserializationError::InvalidInput)
        );
    }

    #[cfg(not(feature = "float"))]
    #[test]
    fn test_floats_rejected_without_float_support() {
        assert_eq!(
            parse_literal(b"2.5", false),
            Err(DeserializationError::InvalidInput)
        );
    }

    #[test]
    fn test_malformed_numbers() {
        for token in [&b"1x"[..], b"--1", b"1.2.3", b"e5", b".", b"0x10", b"1e+"] {
            assert_eq!(
                parse_literal(token, false),
                Err(DeserializationError::InvalidInput),
                "token {:?}",
                core::str::from_utf8(token)
            );
        }
    }

    #[test]
    fn test_truncated_numbers() {
        assert_eq!(
            parse_literal(b"-", true),
            Err(DeserializationError::IncompleteInput)
        );
        assert_eq!(
            parse_literal(b"1e", true),
            Err(DeserializationError::IncompleteInput)
        );
        assert_eq!(
            parse_literal(b"1e+", true),
            Err(DeserializationError::IncompleteInput)
        );
        assert_eq!(
            parse_literal(b"1x", true),
            Err(DeserializationError::InvalidInput)
        );
    }

    #[test]
    fn test_token_buffer_limit() {
        let mut token = TokenBuffer::new();
        for _ in 0..MAX_TOKEN_LEN {
            token.push(b'1').unwrap();
        }
        assert_eq!(token.as_bytes().len(), MAX_TOKEN_LEN);
        assert_eq!(token.push(b'1'), Err(DeserializationError::InvalidInput));
    }
}
