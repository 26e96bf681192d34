// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Token kinds stored on the tape
//!
//! Every token starts with a one-byte tag. The tag values are part of the
//! tape format and must not change.

use std::fmt;

/// Byte written in place of a value the encoder could not represent.
/// It is not a recognized tag, so readers skip over it.
pub const SENTINEL: u8 = b'?';

/// Tape token kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenKind {
    /// Length-prefixed, P21-escaped text
    String = 1,
    /// Length-prefixed type name opening a typed run, e.g. `IFCLABEL(...)`
    Label = 2,
    /// Length-prefixed enumeration literal without the dots
    Enum = 3,
    /// Length-prefixed decimal text
    Real = 4,
    /// Entity identifier (`#123`)
    Reference = 5,
    /// Omitted value (`$` or `*`)
    Empty = 6,
    SetBegin = 7,
    SetEnd = 8,
    LineEnd = 9,
    Integer = 10,
}

impl TokenKind {
    /// Decode a tag byte. Returns `None` for unrecognized tags.
    #[inline]
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            1 => Self::String,
            2 => Self::Label,
            3 => Self::Enum,
            4 => Self::Real,
            5 => Self::Reference,
            6 => Self::Empty,
            7 => Self::SetBegin,
            8 => Self::SetEnd,
            9 => Self::LineEnd,
            10 => Self::Integer,
            _ => return None,
        })
    }

    /// Tag byte written to the tape
    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Number of payload bytes after the tag, or `None` when the payload is
    /// length-prefixed text
    #[inline]
    pub fn fixed_payload(self) -> Option<usize> {
        match self {
            Self::String | Self::Label | Self::Enum | Self::Real => None,
            Self::Reference => Some(4),
            Self::Integer => Some(8),
            Self::Empty | Self::SetBegin | Self::SetEnd | Self::LineEnd => Some(0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Label => "Label",
            Self::Enum => "Enum",
            Self::Real => "Real",
            Self::Reference => "Reference",
            Self::Empty => "Empty",
            Self::SetBegin => "SetBegin",
            Self::SetEnd => "SetEnd",
            Self::LineEnd => "LineEnd",
            Self::Integer => "Integer",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
