// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory token tape
//!
//! Tokens are stored back to back as `[tag][payload]`:
//!
//! - String, Enum, Label, Real: `u16` LE length + bytes (reals keep their text)
//! - Integer: `i64` LE
//! - Reference: `u32` LE
//! - Empty, SetBegin, SetEnd, LineEnd: no payload
//!
//! An ordinary line is `Reference(id) Label(NAME) SetBegin ... SetEnd LineEnd`,
//! a header line is the same without the leading reference. Rewriting a line
//! appends a new run and repoints the index; old bytes stay in place.

use rustc_hash::FxHashMap;

use crate::argument::Real;
use crate::cursor::TokenCursor;
use crate::error::{Error, Result};
use crate::token::TokenKind;

/// Index entry for one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEntry {
    pub type_code: u32,
    pub offset: usize,
}

/// Token tape for one document
#[derive(Debug, Default, Clone)]
pub struct Tape {
    bytes: Vec<u8>,
    position: usize,
    /// id -> (type, start offset)
    lines: FxHashMap<u32, LineEntry>,
    /// type -> ids in first-write order
    by_type: FxHashMap<u32, Vec<u32>>,
    header_lines: Vec<LineEntry>,
    max_id: u32,
}

impl Tape {
    /// Create an empty tape
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tape with room for `bytes` bytes of tokens
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            ..Self::default()
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Current read position
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of indexed ordinary lines
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line_offset(&self, id: u32) -> Option<usize> {
        self.lines.get(&id).map(|entry| entry.offset)
    }

    #[inline]
    fn take(&mut self, len: usize) -> Result<&[u8]> {
        let start = self.position;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(Error::UnexpectedEnd { offset: start })?;
        self.position = end;
        Ok(&self.bytes[start..end])
    }

    /// Consume a tag and check it is one of `accepted`
    fn expect(&mut self, accepted: &[TokenKind], expected: &'static str) -> Result<TokenKind> {
        let offset = self.position;
        let tag = *self.take(1)?.first().ok_or(Error::UnexpectedEnd { offset })?;
        match TokenKind::from_tag(tag) {
            Some(kind) if accepted.contains(&kind) => Ok(kind),
            Some(kind) => Err(Error::unexpected(offset, expected, kind)),
            None => Err(Error::unexpected(offset, expected, format!("byte 0x{:02X}", tag))),
        }
    }

    fn take_text(&mut self) -> Result<String> {
        let offset = self.position;
        let len = self.take(2)?;
        let len = u16::from_le_bytes([len[0], len[1]]) as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::unexpected(offset, "UTF-8 text", "invalid UTF-8"))
    }

    /// Skip a set run whose SetBegin was already consumed
    fn skip_run(&mut self) -> Result<()> {
        let mut depth = 1usize;
        while depth > 0 {
            if self.is_at_end() {
                return Err(Error::UnexpectedEnd { offset: self.position });
            }
            match self.token_kind() {
                Some(TokenKind::SetBegin) => depth += 1,
                Some(TokenKind::SetEnd) => depth -= 1,
                Some(TokenKind::LineEnd) => {
                    return Err(Error::unexpected(self.position - 1, "SetEnd", TokenKind::LineEnd));
                }
                Some(_) => {
                    self.step_back();
                    self.skip_token()?;
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Skip `count` whole arguments from the current position
    fn skip_arguments(&mut self, count: usize, line: u32) -> Result<()> {
        let out_of_range = Error::ArgumentOutOfRange {
            line,
            argument: count,
        };
        let mut skipped = 0;
        while skipped < count {
            if self.is_at_end() {
                return Err(out_of_range);
            }
            let Some(kind) = self.token_kind() else {
                // stray sentinel byte, not an argument
                continue;
            };
            match kind {
                TokenKind::SetEnd | TokenKind::LineEnd => return Err(out_of_range),
                TokenKind::SetBegin => self.skip_run()?,
                TokenKind::Label => {
                    self.step_back();
                    self.skip_token()?;
                    match self.token_kind() {
                        Some(TokenKind::SetBegin) => self.skip_run()?,
                        Some(_) => self.step_back(),
                        None => {}
                    }
                }
                _ => {
                    self.step_back();
                    self.skip_token()?;
                }
            }
            skipped += 1;
        }
        Ok(())
    }
}

impl TokenCursor for Tape {
    fn move_to_argument(&mut self, id: u32, argument: usize) -> Result<()> {
        let entry = *self.lines.get(&id).ok_or(Error::LineNotFound(id))?;
        self.position = entry.offset;
        self.expect(&[TokenKind::Reference], "Reference")?;
        self.take(4)?;
        self.expect(&[TokenKind::Label], "Label")?;
        self.take_text()?;
        self.expect(&[TokenKind::SetBegin], "SetBegin")?;
        self.skip_arguments(argument, id)
    }

    fn move_to_header_argument(&mut self, line: u32, argument: usize) -> Result<()> {
        let entry = *self
            .header_lines
            .get(line as usize)
            .ok_or(Error::HeaderLineNotFound(line))?;
        self.position = entry.offset;
        self.expect(&[TokenKind::Label], "Label")?;
        self.take_text()?;
        self.expect(&[TokenKind::SetBegin], "SetBegin")?;
        self.skip_arguments(argument, line)
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.position >= self.bytes.len()
    }

    #[inline]
    fn token_kind(&mut self) -> Option<TokenKind> {
        let tag = *self.bytes.get(self.position)?;
        self.position += 1;
        TokenKind::from_tag(tag)
    }

    #[inline]
    fn step_back(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    fn read_string(&mut self) -> Result<String> {
        self.expect(
            &[TokenKind::String, TokenKind::Enum, TokenKind::Label],
            "String, Enum or Label",
        )?;
        self.take_text()
    }

    fn read_real(&mut self) -> Result<Real> {
        self.expect(&[TokenKind::Real], "Real")?;
        Real::new(self.take_text()?)
    }

    fn read_integer(&mut self) -> Result<i64> {
        self.expect(&[TokenKind::Integer], "Integer")?;
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(i64::from_le_bytes(raw))
    }

    fn read_reference(&mut self) -> Result<u32> {
        self.expect(&[TokenKind::Reference], "Reference")?;
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn skip_token(&mut self) -> Result<()> {
        if self.is_at_end() {
            return Err(Error::UnexpectedEnd { offset: self.position });
        }
        let Some(kind) = self.token_kind() else {
            return Ok(());
        };
        match kind.fixed_payload() {
            Some(len) => self.take(len).map(|_| ()),
            None => self.take_text().map(|_| ()),
        }
    }

    #[inline]
    fn push_kind(&mut self, kind: TokenKind) {
        self.bytes.push(kind.tag());
    }

    fn push_text(&mut self, text: &str) -> Result<()> {
        let len = u16::try_from(text.len()).map_err(|_| Error::PayloadTooLong(text.len()))?;
        self.bytes.extend_from_slice(&len.to_le_bytes());
        self.bytes.extend_from_slice(text.as_bytes());
        Ok(())
    }

    #[inline]
    fn push_integer(&mut self, value: i64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    fn push_real(&mut self, value: &Real) -> Result<()> {
        self.push_text(value.as_str())
    }

    #[inline]
    fn push_reference(&mut self, id: u32) {
        self.bytes.extend_from_slice(&id.to_le_bytes());
    }

    #[inline]
    fn push_byte(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    #[inline]
    fn total_size(&self) -> usize {
        self.bytes.len()
    }

    fn update_line(&mut self, id: u32, type_code: u32, offset: usize) {
        let entry = LineEntry { type_code, offset };
        match self.lines.insert(id, entry) {
            Some(previous) if previous.type_code == type_code => {}
            Some(previous) => {
                if let Some(ids) = self.by_type.get_mut(&previous.type_code) {
                    ids.retain(|&other| other != id);
                }
                self.by_type.entry(type_code).or_default().push(id);
            }
            None => self.by_type.entry(type_code).or_default().push(id),
        }
        self.max_id = self.max_id.max(id);
    }

    fn add_header_line(&mut self, type_code: u32, offset: usize) -> u32 {
        self.header_lines.push(LineEntry { type_code, offset });
        (self.header_lines.len() - 1) as u32
    }

    fn remove_line(&mut self, id: u32) -> bool {
        match self.lines.remove(&id) {
            Some(entry) => {
                if let Some(ids) = self.by_type.get_mut(&entry.type_code) {
                    ids.retain(|&other| other != id);
                }
                true
            }
            None => false,
        }
    }

    #[inline]
    fn max_id(&self) -> u32 {
        self.max_id
    }

    fn line_type(&self, id: u32) -> Option<u32> {
        self.lines.get(&id).map(|entry| entry.type_code)
    }

    fn is_valid_id(&self, id: u32) -> bool {
        self.lines.contains_key(&id)
    }

    fn next_id(&self, id: u32) -> Option<u32> {
        self.lines.keys().copied().filter(|&other| other > id).min()
    }

    fn all_lines(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.lines.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn ids_with_type(&self, type_code: u32) -> Vec<u32> {
        self.by_type.get(&type_code).cloned().unwrap_or_default()
    }

    fn header_lines_with_type(&self, type_code: u32) -> Vec<u32> {
        self.header_lines
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.type_code == type_code)
            .map(|(index, _)| index as u32)
            .collect()
    }
}
