// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Token Cursor interface
//!
//! A positionable reader/writer over one document's token tape. The current
//! read position is implicit state shared by every primitive, so a cursor
//! must be used by one codec call at a time; hosts with several threads
//! serialize access per document.
//!
//! Reads consume from the current position. Writes always append to the end
//! of the tape and never move the read position.

use crate::argument::Real;
use crate::error::Result;
use crate::p21;
use crate::token::TokenKind;

pub trait TokenCursor {
    // --- positioning ---

    /// Move to argument `argument` of ordinary line `id`
    fn move_to_argument(&mut self, id: u32, argument: usize) -> Result<()>;

    /// Move to argument `argument` of header line `line` (an index returned
    /// by [`TokenCursor::header_lines_with_type`])
    fn move_to_header_argument(&mut self, line: u32, argument: usize) -> Result<()>;

    /// True once the read position has passed the last byte
    fn is_at_end(&self) -> bool;

    // --- reading ---

    /// Consume the next tag. Returns `None` for an unrecognized tag (the
    /// byte is still consumed) or at the end of the tape.
    fn token_kind(&mut self) -> Option<TokenKind>;

    /// Rewind over the tag consumed by the last [`TokenCursor::token_kind`]
    fn step_back(&mut self);

    /// Read a String, Enum or Label token (tag and payload) as raw tape text
    fn read_string(&mut self) -> Result<String>;

    /// Read a Real token as decimal text
    fn read_real(&mut self) -> Result<Real>;

    fn read_integer(&mut self) -> Result<i64>;

    fn read_reference(&mut self) -> Result<u32>;

    /// Skip one whole token (tag and payload) without interpreting it
    fn skip_token(&mut self) -> Result<()>;

    /// Read a String token and resolve its P21 escapes
    fn read_decoded_string(&mut self) -> Result<String> {
        self.read_string().map(|raw| p21::decode(&raw))
    }

    // --- writing ---

    fn push_kind(&mut self, kind: TokenKind);

    /// Append a length-prefixed text payload
    fn push_text(&mut self, text: &str) -> Result<()>;

    fn push_integer(&mut self, value: i64);

    /// Append a real payload straight from its decimal text
    fn push_real(&mut self, value: &Real) -> Result<()>;

    fn push_reference(&mut self, id: u32);

    /// Append a raw byte outside the token grammar
    fn push_byte(&mut self, byte: u8);

    // --- index maintenance ---

    /// Total tape size in bytes; the offset the next write lands at
    fn total_size(&self) -> usize;

    /// Point `id` at a line starting at `offset`, replacing any previous entry
    fn update_line(&mut self, id: u32, type_code: u32, offset: usize);

    /// Register a header line starting at `offset` and return its index
    fn add_header_line(&mut self, type_code: u32, offset: usize) -> u32;

    /// Drop `id` from the index. Returns false if it was not present.
    fn remove_line(&mut self, id: u32) -> bool;

    /// Largest identifier ever written, 0 for an empty tape
    fn max_id(&self) -> u32;

    fn line_type(&self, id: u32) -> Option<u32>;

    /// True if `id` is currently indexed
    fn is_valid_id(&self, id: u32) -> bool;

    /// Smallest indexed identifier greater than `id`
    fn next_id(&self, id: u32) -> Option<u32>;

    /// Every indexed identifier in ascending order
    fn all_lines(&self) -> Vec<u32>;

    /// All identifiers of one type, in the order they were first written
    fn ids_with_type(&self, type_code: u32) -> Vec<u32>;

    /// Header line indices of one type, in the order they were written
    fn header_lines_with_type(&self, type_code: u32) -> Vec<u32>;
}
