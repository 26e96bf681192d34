// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value Encoder - Argument Tree to token run
//!
//! Structural inverse of the decoder. A value that cannot be written (a
//! scalar whose payload does not match its kind, or text longer than a
//! token can hold) is replaced by a single `?` byte and counted; its
//! siblings are still written. The call reports failure once the whole tree
//! is on the tape, so the caller decides whether to discard the line.

use crate::argument::{Argument, Labeled, Scalar, ScalarKind, ScalarValue};
use crate::config::CodecConfig;
use crate::cursor::TokenCursor;
use crate::error::{Error, Result};
use crate::p21;
use crate::token::{TokenKind, SENTINEL};

/// Append `tree` at the end of the cursor's tape
pub fn encode_argument<C>(cursor: &mut C, tree: &Argument, config: &CodecConfig) -> Result<()>
where
    C: TokenCursor + ?Sized,
{
    let mut encoder = Encoder {
        cursor,
        config,
        failures: 0,
        first_failure: None,
    };
    encoder.write(tree);
    encoder.finish()
}

struct Encoder<'a, C: ?Sized> {
    cursor: &'a mut C,
    config: &'a CodecConfig,
    failures: usize,
    first_failure: Option<String>,
}

impl<C: TokenCursor + ?Sized> Encoder<'_, C> {
    fn write(&mut self, node: &Argument) {
        match node {
            Argument::Null => self.cursor.push_kind(TokenKind::Empty),
            Argument::Set(items) => {
                self.cursor.push_kind(TokenKind::SetBegin);
                for item in items {
                    self.write(item);
                }
                self.cursor.push_kind(TokenKind::SetEnd);
            }
            Argument::Labeled(labeled) => self.write_labeled(labeled),
            Argument::Scalar(scalar) => self.write_scalar(scalar),
        }
    }

    fn write_labeled(&mut self, labeled: &Labeled) {
        if !self.push_text_token(TokenKind::Label, &labeled.type_name) {
            return;
        }
        self.cursor.push_kind(TokenKind::SetBegin);
        match labeled.inner.as_ref() {
            // The typed run already is the set
            Argument::Set(items) => {
                for item in items {
                    self.write(item);
                }
            }
            inner => self.write(inner),
        }
        self.cursor.push_kind(TokenKind::SetEnd);
    }

    fn write_scalar(&mut self, scalar: &Scalar) {
        match (scalar.kind, &scalar.value) {
            (ScalarKind::String, ScalarValue::Text(text)) => {
                let text = p21::encode(self.normalize(text));
                self.push_text_token(TokenKind::String, &text);
            }
            (ScalarKind::Enum, ScalarValue::Text(text)) => {
                let text = self.normalize(text);
                self.push_text_token(TokenKind::Enum, text);
            }
            (ScalarKind::String, ScalarValue::Logical(logical)) => {
                self.push_text_token(TokenKind::String, logical.literal());
            }
            (ScalarKind::Enum, ScalarValue::Logical(logical)) => {
                self.push_text_token(TokenKind::Enum, logical.literal());
            }
            (ScalarKind::Real, ScalarValue::Real(real)) => {
                if self.fits(real.as_str()) {
                    self.cursor.push_kind(TokenKind::Real);
                    if let Err(err) = self.cursor.push_real(real) {
                        self.fail(err.to_string());
                    }
                }
            }
            (ScalarKind::Integer, ScalarValue::Integer(value)) => {
                self.cursor.push_kind(TokenKind::Integer);
                self.cursor.push_integer(*value);
            }
            (ScalarKind::Reference, ScalarValue::Id(id)) => {
                self.cursor.push_kind(TokenKind::Reference);
                self.cursor.push_reference(*id);
            }
            (kind, value) => self.fail(format!("{:?} scalar with {:?} payload", kind, value)),
        }
    }

    /// `true` / `false` literals become the `T` / `F` enumeration sentinels
    fn normalize<'t>(&self, text: &'t str) -> &'t str {
        if !self.config.normalize_logical_literals {
            return text;
        }
        match text {
            "true" => "T",
            "false" => "F",
            other => other,
        }
    }

    /// Check a payload fits a token; writes the sentinel if it does not
    fn fits(&mut self, text: &str) -> bool {
        if text.len() > u16::MAX as usize {
            self.fail(Error::PayloadTooLong(text.len()).to_string());
            return false;
        }
        true
    }

    /// Write a length-prefixed text token, or a sentinel if it does not fit
    fn push_text_token(&mut self, kind: TokenKind, text: &str) -> bool {
        if !self.fits(text) {
            return false;
        }
        self.cursor.push_kind(kind);
        if let Err(err) = self.cursor.push_text(text) {
            // tag already written; the sentinel marks the hole
            self.fail(err.to_string());
            return false;
        }
        true
    }

    fn fail(&mut self, detail: String) {
        tracing::warn!(detail = %detail, "Unsupported value, writing sentinel");
        self.cursor.push_byte(SENTINEL);
        self.failures += 1;
        self.first_failure.get_or_insert(detail);
    }

    fn finish(self) -> Result<()> {
        match self.first_failure {
            None => Ok(()),
            Some(first) => Err(Error::UnsupportedValue {
                failures: self.failures,
                first,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::{Logical, Real};
    use crate::tape::Tape;

    fn encode(tree: &Argument) -> (Tape, Result<()>) {
        let mut tape = Tape::new();
        let result = encode_argument(&mut tape, tree, &CodecConfig::default());
        (tape, result)
    }

    #[test]
    fn test_null_is_empty_token() {
        let (tape, result) = encode(&Argument::Null);
        assert!(result.is_ok());
        assert_eq!(tape.as_bytes(), &[TokenKind::Empty.tag()]);
    }

    #[test]
    fn test_set_layout() {
        let tree = Argument::Set(vec![Argument::reference(5), Argument::integer(-1)]);
        let (mut tape, result) = encode(&tree);
        assert!(result.is_ok());

        assert_eq!(tape.token_kind(), Some(TokenKind::SetBegin));
        assert_eq!(tape.read_reference().unwrap(), 5);
        assert_eq!(tape.read_integer().unwrap(), -1);
        assert_eq!(tape.token_kind(), Some(TokenKind::SetEnd));
        assert!(tape.is_at_end());
    }

    #[test]
    fn test_labeled_layout() {
        let tree = Argument::labeled("IFCBOOLEAN", 0, Argument::logical(Logical::True));
        let (mut tape, result) = encode(&tree);
        assert!(result.is_ok());

        assert_eq!(tape.read_string().unwrap(), "IFCBOOLEAN");
        assert_eq!(tape.token_kind(), Some(TokenKind::SetBegin));
        assert_eq!(tape.read_string().unwrap(), "T");
        assert_eq!(tape.token_kind(), Some(TokenKind::SetEnd));
    }

    #[test]
    fn test_logical_literals() {
        let tree = Argument::Set(vec![
            Argument::enumeration("true"),
            Argument::enumeration("false"),
            Argument::logical(Logical::Unknown),
            Argument::string("true"),
        ]);
        let (mut tape, result) = encode(&tree);
        assert!(result.is_ok());

        tape.token_kind();
        assert_eq!(tape.read_string().unwrap(), "T");
        assert_eq!(tape.read_string().unwrap(), "F");
        assert_eq!(tape.read_string().unwrap(), "U");
        assert_eq!(tape.read_string().unwrap(), "T");
    }

    #[test]
    fn test_logical_literals_can_be_kept() {
        let mut tape = Tape::new();
        let config = CodecConfig::default().with_logical_literals(false);
        encode_argument(&mut tape, &Argument::enumeration("true"), &config).unwrap();
        assert_eq!(tape.read_string().unwrap(), "true");
    }

    #[test]
    fn test_strings_are_escaped() {
        let (mut tape, _) = encode(&Argument::string("O'Brien ä"));
        assert_eq!(tape.read_string().unwrap(), "O''Brien \\X2\\00E4\\X0\\");
    }

    #[test]
    fn test_real_text_is_verbatim() {
        let (mut tape, _) = encode(&Argument::real(Real::new("3.141592653589793").unwrap()));
        assert_eq!(tape.read_real().unwrap().as_str(), "3.141592653589793");
    }

    #[test]
    fn test_mismatch_writes_sentinel_and_continues() {
        let tree = Argument::Set(vec![
            Argument::integer(1),
            Argument::Scalar(Scalar::new(ScalarKind::Integer, ScalarValue::Text("x".into()))),
            Argument::Scalar(Scalar::new(ScalarKind::Real, ScalarValue::Id(3))),
            Argument::integer(2),
        ]);
        let (mut tape, result) = encode(&tree);

        match result {
            Err(Error::UnsupportedValue { failures, .. }) => assert_eq!(failures, 2),
            other => panic!("expected failure, got {:?}", other),
        }

        tape.token_kind();
        assert_eq!(tape.read_integer().unwrap(), 1);
        assert_eq!(tape.as_bytes()[tape.position()], SENTINEL);
        assert_eq!(tape.as_bytes()[tape.position() + 1], SENTINEL);
    }

    #[test]
    fn test_oversized_text_fails_without_tag() {
        let tree = Argument::Set(vec![Argument::string("x".repeat(70_000))]);
        let (tape, result) = encode(&tree);
        assert!(matches!(result, Err(Error::UnsupportedValue { failures: 1, .. })));
        assert_eq!(
            tape.as_bytes(),
            &[TokenKind::SetBegin.tag(), SENTINEL, TokenKind::SetEnd.tag()]
        );
    }
}
