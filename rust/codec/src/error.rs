// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading, writing or ingesting token tapes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("Unknown type code: {0}")]
    UnknownTypeCode(u32),

    #[error("Line #{0} not found")]
    LineNotFound(u32),

    #[error("Header line {0} not found")]
    HeaderLineNotFound(u32),

    #[error("Line {line} has no argument at position {argument}")]
    ArgumentOutOfRange { line: u32, argument: usize },

    #[error("Unexpected token at offset {offset}: expected {expected}, found {found}")]
    UnexpectedToken {
        offset: usize,
        expected: &'static str,
        found: String,
    },

    #[error("Unexpected end of tape at offset {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("Payload of {0} bytes exceeds the 65535 byte token limit")]
    PayloadTooLong(usize),

    #[error("Invalid real literal: {0:?}")]
    InvalidReal(String),

    #[error("{failures} value(s) could not be encoded, first: {first}")]
    UnsupportedValue { failures: usize, first: String },
}

impl Error {
    /// Create a parse error
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create an unexpected-token error
    pub(crate) fn unexpected(offset: usize, expected: &'static str, found: impl ToString) -> Self {
        Self::UnexpectedToken {
            offset,
            expected,
            found: found.to_string(),
        }
    }
}
