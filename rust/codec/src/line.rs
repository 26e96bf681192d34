// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity/Header Line Adapter
//!
//! Reads whole lines off the tape as [`EntityLine`]s and writes argument
//! trees back as new lines. This is the entry point outer layers use; the
//! decoder, encoder and inverse scanner are driven from here.

use rustc_hash::FxHashSet;

use crate::argument::Argument;
use crate::config::CodecConfig;
use crate::cursor::TokenCursor;
use crate::decoder::decode_arguments;
use crate::encoder::encode_argument;
use crate::error::{Error, Result};
use crate::inverse;
use crate::schema::{SchemaLookup, TypeCategory};
use crate::token::TokenKind;

/// One decoded line
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityLine {
    /// Entity id, or the header line index for header lines
    pub id: u32,
    pub type_code: u32,
    /// Canonical type name, if the schema knows the code
    pub type_name: Option<String>,
    /// `Null` for an empty argument list, otherwise a `Set` of arguments
    pub arguments: Argument,
    pub is_header: bool,
}

impl EntityLine {
    /// Get argument by index
    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.arguments.get(index)
    }

    /// Get entity reference at index
    pub fn get_ref(&self, index: usize) -> Option<u32> {
        self.get(index).and_then(Argument::as_reference)
    }

    /// Get decoded text at index
    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Argument::as_text)
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.arguments.as_set().map_or(0, <[Argument]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render as a STEP record: `#id=NAME(args);` or `NAME(args);` for
    /// header lines. `None` if the type name is unknown.
    pub fn to_step(&self) -> Option<String> {
        let name = self.type_name.as_deref()?.to_ascii_uppercase();
        let arguments = match &self.arguments {
            Argument::Null => String::new(),
            Argument::Set(items) => items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
            single => single.to_string(),
        };
        Some(if self.is_header {
            format!("{}({});", name, arguments)
        } else {
            format!("#{}={}({});", self.id, name, arguments)
        })
    }
}

/// Line-level codec over one document's cursor
///
/// Borrows the cursor mutably for its whole lifetime; one `EntityCodec` per
/// document at a time.
pub struct EntityCodec<'a, C: ?Sized, S: ?Sized> {
    cursor: &'a mut C,
    schema: &'a S,
    config: CodecConfig,
}

impl<'a, C, S> EntityCodec<'a, C, S>
where
    C: TokenCursor + ?Sized,
    S: SchemaLookup + ?Sized,
{
    pub fn new(cursor: &'a mut C, schema: &'a S) -> Self {
        Self::with_config(cursor, schema, CodecConfig::default())
    }

    pub fn with_config(cursor: &'a mut C, schema: &'a S, config: CodecConfig) -> Self {
        Self {
            cursor,
            schema,
            config,
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decode line `id`, or `None` if no such line is indexed
    pub fn get_line(&mut self, id: u32) -> Option<EntityLine> {
        let type_code = self.cursor.line_type(id)?;
        if let Err(err) = self.cursor.move_to_argument(id, 0) {
            tracing::warn!(id, error = %err, "Cannot position on line");
            return None;
        }
        let arguments =
            decode_arguments(&mut *self.cursor, self.schema, &self.config, false, false);
        Some(self.package(id, type_code, arguments, false))
    }

    /// Decode several lines; ids that are not indexed are left out
    pub fn get_lines(&mut self, ids: &[u32]) -> Vec<EntityLine> {
        ids.iter().filter_map(|&id| self.get_line(id)).collect()
    }

    /// Decode the first header line of `type_code`
    pub fn get_header_line(&mut self, type_code: u32) -> Option<EntityLine> {
        let line = *self.cursor.header_lines_with_type(type_code).first()?;
        if let Err(err) = self.cursor.move_to_header_argument(line, 0) {
            tracing::warn!(line, error = %err, "Cannot position on header line");
            return None;
        }
        let arguments =
            decode_arguments(&mut *self.cursor, self.schema, &self.config, false, false);
        Some(self.package(line, type_code, arguments, true))
    }

    fn package(&self, id: u32, type_code: u32, arguments: Argument, is_header: bool) -> EntityLine {
        EntityLine {
            id,
            type_code,
            type_name: self.schema.type_name(type_code).map(str::to_string),
            arguments,
            is_header,
        }
    }

    /// Append `arguments` as line `id` and point the index at it.
    ///
    /// An unknown type code is rejected before anything is written. If a
    /// value cannot be encoded the line is still written and indexed, with
    /// sentinels in place of the bad values, and the error is returned: the
    /// caller must rewrite or remove the line.
    pub fn write_line(&mut self, id: u32, type_code: u32, arguments: &Argument) -> Result<()> {
        let name = self.label_for(type_code)?;
        let offset = self.cursor.total_size();

        self.cursor.push_kind(TokenKind::Reference);
        self.cursor.push_reference(id);
        let result = self.write_body(&name, arguments);
        self.cursor.update_line(id, type_code, offset);

        match &result {
            Ok(()) => tracing::debug!(id, type_name = %name, offset, "Wrote line"),
            Err(err) => tracing::warn!(
                id,
                type_name = %name,
                error = %err,
                "Wrote line with unsupported values"
            ),
        }
        result
    }

    /// Append `arguments` as a header line of `type_code`
    pub fn write_header_line(&mut self, type_code: u32, arguments: &Argument) -> Result<()> {
        let name = self.label_for(type_code)?;
        let offset = self.cursor.total_size();

        let result = self.write_body(&name, arguments);
        let line = self.cursor.add_header_line(type_code, offset);

        match &result {
            Ok(()) => tracing::debug!(line, type_name = %name, offset, "Wrote header line"),
            Err(err) => tracing::warn!(
                line,
                type_name = %name,
                error = %err,
                "Wrote header line with unsupported values"
            ),
        }
        result
    }

    /// Upper-cased label for a type code, checked against the token limit
    fn label_for(&self, type_code: u32) -> Result<String> {
        let name = self
            .schema
            .type_name(type_code)
            .ok_or(Error::UnknownTypeCode(type_code))?
            .to_ascii_uppercase();
        if name.len() > u16::MAX as usize {
            return Err(Error::PayloadTooLong(name.len()));
        }
        Ok(name)
    }

    /// `Label(NAME) SetBegin ... SetEnd LineEnd`
    fn write_body(&mut self, name: &str, arguments: &Argument) -> Result<()> {
        self.cursor.push_kind(TokenKind::Label);
        self.cursor.push_text(name)?;

        let result = match arguments {
            Argument::Set(_) => encode_argument(&mut *self.cursor, arguments, &self.config),
            Argument::Null => {
                self.cursor.push_kind(TokenKind::SetBegin);
                self.cursor.push_kind(TokenKind::SetEnd);
                Ok(())
            }
            single => {
                self.cursor.push_kind(TokenKind::SetBegin);
                let result = encode_argument(&mut *self.cursor, single, &self.config);
                self.cursor.push_kind(TokenKind::SetEnd);
                result
            }
        };
        self.cursor.push_kind(TokenKind::LineEnd);
        result
    }

    /// Drop line `id` from the index
    pub fn remove_line(&mut self, id: u32) -> bool {
        self.cursor.remove_line(id)
    }

    pub fn line_type(&self, id: u32) -> Option<u32> {
        self.cursor.line_type(id)
    }

    pub fn max_id(&self) -> u32 {
        self.cursor.max_id()
    }

    pub fn all_lines(&self) -> Vec<u32> {
        self.cursor.all_lines()
    }

    /// Lines of any of `types`, grouped by type in the order given
    pub fn line_ids_with_type(&self, types: &[u32]) -> Vec<u32> {
        let mut seen = FxHashSet::default();
        types
            .iter()
            .flat_map(|&type_code| self.cursor.ids_with_type(type_code))
            .filter(|&id| seen.insert(id))
            .collect()
    }

    pub fn next_id(&self, id: u32) -> Option<u32> {
        self.cursor.next_id(id)
    }

    pub fn is_valid_id(&self, id: u32) -> bool {
        self.cursor.is_valid_id(id)
    }

    /// Lines of `candidate_types` whose argument `position` refers to `target`
    pub fn find_referencing(
        &mut self,
        target: u32,
        candidate_types: &[u32],
        position: usize,
        collect_all: bool,
    ) -> Vec<u32> {
        inverse::find_referencing(&mut *self.cursor, target, candidate_types, position, collect_all)
    }

    /// Same as [`EntityCodec::find_referencing`] with every type of `category`
    /// as a candidate
    pub fn find_referencing_in_category(
        &mut self,
        target: u32,
        category: TypeCategory,
        position: usize,
        collect_all: bool,
    ) -> Vec<u32> {
        let candidates = self.schema.types_in_category(category);
        self.find_referencing(target, &candidates, position, collect_all)
    }
}
