// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value Decoder - token run to Argument Tree
//!
//! Recursive descent over the tape from the cursor's current position until
//! `LineEnd`, or until the `SetEnd` closing the current run.
//!
//! Two context flags shape the result:
//!
//! - **list context** (inside a `SetBegin`): an empty run is an empty `Set`.
//!   Outside it, an empty run is `Null`, which is how an absent argument
//!   list stays distinct from a zero-length one.
//! - **object context** (inside a label's run): a run of exactly one item is
//!   returned as that item, so `IFCLABEL('x')` reads as the scalar `'x'`
//!   instead of a one-element set. Scalars keep their kind tag in every
//!   context.
//!
//! Decoding never fails. Unreadable tokens end the decode at that point and
//! are logged; whatever was read so far is returned.

use smallvec::SmallVec;

use crate::argument::{Argument, Labeled, Scalar, ScalarKind, ScalarValue};
use crate::config::{CodecConfig, UnknownTokenPolicy};
use crate::cursor::TokenCursor;
use crate::error::Result;
use crate::schema::SchemaLookup;
use crate::token::TokenKind;

/// Decode the run at the cursor's position
pub fn decode_arguments<C, S>(
    cursor: &mut C,
    schema: &S,
    config: &CodecConfig,
    in_object: bool,
    in_list: bool,
) -> Argument
where
    C: TokenCursor + ?Sized,
    S: SchemaLookup + ?Sized,
{
    let mut decoder = Decoder {
        cursor,
        schema,
        config,
        halted: false,
    };
    decoder.run(in_object, in_list, 0)
}

struct Decoder<'a, C: ?Sized, S: ?Sized> {
    cursor: &'a mut C,
    schema: &'a S,
    config: &'a CodecConfig,
    /// Set on the first malformed token; unwinds every enclosing run
    halted: bool,
}

impl<C, S> Decoder<'_, C, S>
where
    C: TokenCursor + ?Sized,
    S: SchemaLookup + ?Sized,
{
    fn run(&mut self, in_object: bool, in_list: bool, depth: usize) -> Argument {
        let mut items: SmallVec<[Argument; 4]> = SmallVec::new();

        while !self.halted && !self.cursor.is_at_end() {
            let Some(kind) = self.cursor.token_kind() else {
                match self.config.unknown_tokens {
                    UnknownTokenPolicy::Skip => {
                        tracing::warn!("Skipping unrecognized token tag");
                        continue;
                    }
                    UnknownTokenPolicy::Stop => {
                        tracing::warn!("Unrecognized token tag, stopping decode");
                        self.halted = true;
                        break;
                    }
                }
            };

            match kind {
                TokenKind::LineEnd | TokenKind::SetEnd => break,
                TokenKind::Empty => items.push(Argument::Null),
                TokenKind::SetBegin => {
                    if !self.descend(depth) {
                        break;
                    }
                    items.push(self.run(false, true, depth + 1));
                }
                TokenKind::Label => match self.label(depth) {
                    Some(labeled) => items.push(labeled),
                    None => break,
                },
                TokenKind::String
                | TokenKind::Enum
                | TokenKind::Real
                | TokenKind::Integer
                | TokenKind::Reference => {
                    self.cursor.step_back();
                    match read_scalar(self.cursor, kind) {
                        Ok(scalar) => items.push(Argument::Scalar(scalar)),
                        Err(err) => {
                            tracing::warn!(error = %err, "Malformed scalar token, stopping decode");
                            self.halted = true;
                            break;
                        }
                    }
                }
            }
        }

        if items.is_empty() && !in_list {
            return Argument::Null;
        }
        if items.len() == 1 && in_object {
            if let Some(item) = items.pop() {
                return item;
            }
        }
        Argument::Set(items.into_vec())
    }

    /// Check the nesting limit before entering a nested run
    fn descend(&mut self, depth: usize) -> bool {
        if depth >= self.config.max_depth {
            tracing::warn!(
                max_depth = self.config.max_depth,
                "Nesting limit reached, stopping decode"
            );
            self.halted = true;
            return false;
        }
        true
    }

    /// Decode a label and its typed run. The label tag was just consumed.
    fn label(&mut self, depth: usize) -> Option<Argument> {
        self.cursor.step_back();
        let type_name = match self.cursor.read_string() {
            Ok(name) => name,
            Err(err) => {
                tracing::warn!(error = %err, "Malformed label token, stopping decode");
                self.halted = true;
                return None;
            }
        };

        let type_code = self.schema.type_code(&type_name).unwrap_or_else(|| {
            tracing::debug!(type_name = %type_name, "Label type not in schema");
            0
        });

        match self.cursor.token_kind() {
            Some(TokenKind::SetBegin) => {}
            _ => {
                tracing::warn!(type_name = %type_name, "Label without value run, stopping decode");
                self.halted = true;
                return None;
            }
        }

        if !self.descend(depth) {
            return None;
        }
        let inner = self.run(true, false, depth + 1);

        Some(Argument::Labeled(Labeled {
            type_name,
            type_code,
            inner: Box::new(inner),
        }))
    }
}

/// Read one scalar; the cursor sits on its tag
fn read_scalar<C: TokenCursor + ?Sized>(cursor: &mut C, kind: TokenKind) -> Result<Scalar> {
    let scalar = match kind {
        TokenKind::String => Scalar::new(
            ScalarKind::String,
            ScalarValue::Text(cursor.read_decoded_string()?),
        ),
        TokenKind::Enum => Scalar::new(ScalarKind::Enum, ScalarValue::Text(cursor.read_string()?)),
        TokenKind::Real => Scalar::new(ScalarKind::Real, ScalarValue::Real(cursor.read_real()?)),
        TokenKind::Integer => Scalar::new(
            ScalarKind::Integer,
            ScalarValue::Integer(cursor.read_integer()?),
        ),
        _ => Scalar::new(
            ScalarKind::Reference,
            ScalarValue::Id(cursor.read_reference()?),
        ),
    };
    Ok(scalar)
}
