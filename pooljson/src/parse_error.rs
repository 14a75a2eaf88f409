// SPDX-License-Identifier: Apache-2.0

use crate::pool::PoolError;

/// Errors that can occur while deserializing a document.
///
/// The first error aborts the whole call; the document is left holding `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeserializationError {
    /// The input ended mid-token or mid-container.
    IncompleteInput,
    /// A required structural token was present but wrong, or a literal was malformed.
    InvalidInput,
    /// The memory pool could not satisfy an allocation.
    NoMemory,
    /// Nesting exceeded the configured limit.
    TooDeep,
}

impl DeserializationError {
    /// True for errors caused by the input text itself rather than by resource limits.
    pub fn is_grammar_error(&self) -> bool {
        matches!(
            self,
            DeserializationError::IncompleteInput | DeserializationError::InvalidInput
        )
    }
}

impl From<PoolError> for DeserializationError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Exhausted => DeserializationError::NoMemory,
        }
    }
}

impl From<core::str::Utf8Error> for DeserializationError {
    fn from(_: core::str::Utf8Error) -> Self {
        DeserializationError::InvalidInput
    }
}

impl core::fmt::Display for DeserializationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            DeserializationError::IncompleteInput => "IncompleteInput",
            DeserializationError::InvalidInput => "InvalidInput",
            DeserializationError::NoMemory => "NoMemory",
            DeserializationError::TooDeep => "TooDeep",
        };
        f.write_str(msg)
    }
}
