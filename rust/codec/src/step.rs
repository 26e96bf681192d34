// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP text ingest using nom
//!
//! Fills a token tape from ISO 10303-21 text. Statements are split on `;`
//! with memchr (quotes and `/* */` comments respected), then each record is
//! tokenized with nom and written in the tape's line layout.
//!
//! Strings are written with their P21 escapes intact and reals keep their
//! source text; the decoder resolves escapes on read.

use memchr::{memchr, memchr3, memmem};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while1},
    character::complete::{char, digit1, multispace1, one_of},
    combinator::{eof, map, map_res, opt, recognize, value},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::argument::Real;
use crate::cursor::TokenCursor;
use crate::error::{Error, Result};
use crate::schema::SchemaLookup;
use crate::tape::Tape;
use crate::token::TokenKind;

/// STEP value token
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// Entity reference: #123
    EntityRef(u32),
    /// String literal with P21 escapes intact: 'it''s'
    String(&'a str),
    /// Integer: 42
    Integer(i64),
    /// Real, as written: 3.14, 0., 1.5E-10
    Real(&'a str),
    /// Enum: .T., .ELEMENT.
    Enum(&'a str),
    /// List: (1, 2, 3)
    List(Vec<Token<'a>>),
    /// Typed value: IFCLABEL('x'), IFCBOOLEAN(.T.)
    TypedValue(&'a str, Vec<Token<'a>>),
    /// Null value: $
    Null,
    /// Derived value: *
    Derived,
}

/// Counts from one ingest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub entities: usize,
    pub header_lines: usize,
    /// Records skipped for an unknown type or complex form
    pub skipped: usize,
}

/// Parse STEP text into a new tape
pub fn load_step<S>(content: &str, schema: &S) -> Result<Tape>
where
    S: SchemaLookup + ?Sized,
{
    let mut tape = Tape::with_capacity(content.len());
    load_step_into(&mut tape, content, schema)?;
    Ok(tape)
}

/// Append the records of STEP text to an existing cursor.
///
/// On a parse error the tape may end with an unindexed partial record.
pub fn load_step_into<C, S>(cursor: &mut C, content: &str, schema: &S) -> Result<LoadSummary>
where
    C: TokenCursor + ?Sized,
    S: SchemaLookup + ?Sized,
{
    let mut summary = LoadSummary::default();
    let mut section = Section::None;

    for (start, statement) in Statements::new(content) {
        let body = match ws(statement) {
            Ok((rest, ())) => rest.trim_end(),
            Err(_) => statement.trim(),
        };
        if body.is_empty() {
            continue;
        }

        if body.starts_with('#') {
            let record = parse_or_error(entity_record(body), start, statement, body)?;
            match record {
                Record::Simple(id, name, args) => {
                    if write_entity(cursor, schema, id, name, &args)? {
                        summary.entities += 1;
                    } else {
                        summary.skipped += 1;
                    }
                }
                Record::Complex(id) => {
                    tracing::warn!(id, "Skipping complex entity instance");
                    summary.skipped += 1;
                }
            }
            continue;
        }

        match keyword(body) {
            "ISO-10303-21" | "END-ISO-10303-21" => {}
            "HEADER" => section = Section::Header,
            "DATA" => section = Section::Data,
            "ENDSEC" => section = Section::None,
            _ if section == Section::Header => {
                let (name, args) = parse_or_error(header_record(body), start, statement, body)?;
                if write_header(cursor, schema, name, &args)? {
                    summary.header_lines += 1;
                } else {
                    summary.skipped += 1;
                }
            }
            other => {
                tracing::warn!(
                    statement = other,
                    offset = start,
                    "Skipping statement outside a record section"
                );
                summary.skipped += 1;
            }
        }
    }

    tracing::debug!(
        entities = summary.entities,
        header_lines = summary.header_lines,
        skipped = summary.skipped,
        "Loaded STEP content"
    );
    Ok(summary)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Header,
    Data,
}

enum Record<'a> {
    Simple(u32, &'a str, Vec<Token<'a>>),
    Complex(u32),
}

/// Leading keyword of a statement (`DATA('name')` reads as `DATA`)
fn keyword(body: &str) -> &str {
    let end = body
        .find(|c: char| c == '(' || c.is_whitespace())
        .unwrap_or(body.len());
    &body[..end]
}

fn parse_or_error<'a, T>(
    result: IResult<&'a str, T>,
    start: usize,
    statement: &'a str,
    body: &'a str,
) -> Result<T> {
    match result {
        Ok((_, value)) => Ok(value),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            // body is a sub-slice of statement
            let lead = body.as_ptr() as usize - statement.as_ptr() as usize;
            let position = start + lead + (body.len() - e.input.len());
            Err(Error::parse(
                position,
                format!("Failed to parse record: {}", e.code.description()),
            ))
        }
        Err(nom::Err::Incomplete(_)) => Err(Error::parse(start, "Incomplete record")),
    }
}

fn write_entity<C, S>(
    cursor: &mut C,
    schema: &S,
    id: u32,
    name: &str,
    args: &[Token<'_>],
) -> Result<bool>
where
    C: TokenCursor + ?Sized,
    S: SchemaLookup + ?Sized,
{
    let Some(type_code) = schema.type_code(name) else {
        tracing::warn!(id, type_name = name, "Skipping entity of unknown type");
        return Ok(false);
    };
    let offset = cursor.total_size();
    cursor.push_kind(TokenKind::Reference);
    cursor.push_reference(id);
    write_record_body(cursor, name, args)?;
    cursor.update_line(id, type_code, offset);
    Ok(true)
}

fn write_header<C, S>(cursor: &mut C, schema: &S, name: &str, args: &[Token<'_>]) -> Result<bool>
where
    C: TokenCursor + ?Sized,
    S: SchemaLookup + ?Sized,
{
    let Some(type_code) = schema.type_code(name) else {
        tracing::warn!(type_name = name, "Skipping header entry of unknown type");
        return Ok(false);
    };
    let offset = cursor.total_size();
    write_record_body(cursor, name, args)?;
    cursor.add_header_line(type_code, offset);
    Ok(true)
}

/// `Label(NAME) SetBegin args SetEnd LineEnd`
fn write_record_body<C: TokenCursor + ?Sized>(
    cursor: &mut C,
    name: &str,
    args: &[Token<'_>],
) -> Result<()> {
    push_text_token(cursor, TokenKind::Label, &name.to_ascii_uppercase())?;
    cursor.push_kind(TokenKind::SetBegin);
    for arg in args {
        push_token(cursor, arg)?;
    }
    cursor.push_kind(TokenKind::SetEnd);
    cursor.push_kind(TokenKind::LineEnd);
    Ok(())
}

fn push_text_token<C: TokenCursor + ?Sized>(
    cursor: &mut C,
    kind: TokenKind,
    text: &str,
) -> Result<()> {
    if text.len() > u16::MAX as usize {
        return Err(Error::PayloadTooLong(text.len()));
    }
    cursor.push_kind(kind);
    cursor.push_text(text)
}

fn push_token<C: TokenCursor + ?Sized>(cursor: &mut C, token: &Token<'_>) -> Result<()> {
    match token {
        Token::EntityRef(id) => {
            cursor.push_kind(TokenKind::Reference);
            cursor.push_reference(*id);
        }
        Token::String(text) => push_text_token(cursor, TokenKind::String, text)?,
        Token::Enum(text) => push_text_token(cursor, TokenKind::Enum, text)?,
        Token::Integer(value) => {
            cursor.push_kind(TokenKind::Integer);
            cursor.push_integer(*value);
        }
        Token::Real(text) => {
            let real = Real::new(*text)?;
            if text.len() > u16::MAX as usize {
                return Err(Error::PayloadTooLong(text.len()));
            }
            cursor.push_kind(TokenKind::Real);
            cursor.push_real(&real)?;
        }
        Token::List(items) => {
            cursor.push_kind(TokenKind::SetBegin);
            for item in items {
                push_token(cursor, item)?;
            }
            cursor.push_kind(TokenKind::SetEnd);
        }
        Token::TypedValue(name, items) => {
            push_text_token(cursor, TokenKind::Label, &name.to_ascii_uppercase())?;
            cursor.push_kind(TokenKind::SetBegin);
            for item in items {
                push_token(cursor, item)?;
            }
            cursor.push_kind(TokenKind::SetEnd);
        }
        Token::Null | Token::Derived => cursor.push_kind(TokenKind::Empty),
    }
    Ok(())
}

/// Splits STEP text into `;`-terminated statements
struct Statements<'a> {
    content: &'a str,
    position: usize,
}

impl<'a> Statements<'a> {
    fn new(content: &'a str) -> Self {
        Self { content, position: 0 }
    }
}

impl<'a> Iterator for Statements<'a> {
    /// Start offset and text without the terminating `;`
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.content.as_bytes();
        let start = self.position;
        if start >= bytes.len() {
            return None;
        }

        let mut i = start;
        while let Some(found) = memchr3(b';', b'\'', b'/', &bytes[i..]) {
            let at = i + found;
            match bytes[at] {
                b';' => {
                    self.position = at + 1;
                    return Some((start, &self.content[start..at]));
                }
                // A doubled quote closes and reopens, which is the same walk
                b'\'' => match memchr(b'\'', &bytes[at + 1..]) {
                    Some(end) => i = at + 1 + end + 1,
                    None => break,
                },
                _ if bytes.get(at + 1) == Some(&b'*') => match memmem::find(&bytes[at + 2..], b"*/") {
                    Some(end) => i = at + 2 + end + 2,
                    None => break,
                },
                _ => i = at + 1,
            }
        }

        // Unterminated tail
        self.position = bytes.len();
        let rest = &self.content[start..];
        if rest.trim().is_empty() {
            None
        } else {
            Some((start, rest))
        }
    }
}

/// Skip whitespace and comments
fn ws(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((multispace1, comment))))(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
    recognize(tuple((tag("/*"), take_until("*/"), tag("*/"))))(input)
}

/// Parse entity reference: #123
fn entity_ref(input: &str) -> IResult<&str, Token<'_>> {
    map(entity_id, Token::EntityRef)(input)
}

fn entity_id(input: &str) -> IResult<&str, u32> {
    preceded(
        char('#'),
        map_res(digit1, |s: &str| lexical_core::parse::<u32>(s.as_bytes())),
    )(input)
}

/// Parse string literal, keeping `''` and backslash escapes as written
fn string_literal(input: &str) -> IResult<&str, Token<'_>> {
    fn content(input: &str, quote: u8) -> IResult<&str, &str> {
        let bytes = input.as_bytes();
        let mut i = 0;
        while let Some(found) = memchr(quote, &bytes[i..]) {
            let at = i + found;
            if bytes.get(at + 1) == Some(&quote) {
                i = at + 2;
                continue;
            }
            return Ok((&input[at..], &input[..at]));
        }
        Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char)))
    }

    alt((
        map(delimited(char('\''), |i| content(i, b'\''), char('\'')), Token::String),
        // binary literal
        map(delimited(char('"'), |i| content(i, b'"'), char('"')), Token::String),
    ))(input)
}

/// Parse integer: 42, -42, +42
fn integer(input: &str) -> IResult<&str, Token<'_>> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), |s: &str| {
        let s = s.strip_prefix('+').unwrap_or(s);
        lexical_core::parse::<i64>(s.as_bytes()).map(Token::Integer)
    })(input)
}

/// Parse real: 3.14, -3.14, 1.5E-10, 0.
fn real(input: &str) -> IResult<&str, Token<'_>> {
    map(
        recognize(tuple((
            opt(one_of("+-")),
            digit1,
            char('.'),
            opt(digit1),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        Token::Real,
    )(input)
}

/// Parse enum: .T., .ELEMENT.
fn enum_value(input: &str) -> IResult<&str, Token<'_>> {
    map(
        delimited(
            char('.'),
            take_while1(|c: char| c.is_alphanumeric() || c == '_'),
            char('.'),
        ),
        Token::Enum,
    )(input)
}

fn null(input: &str) -> IResult<&str, Token<'_>> {
    map(char('$'), |_| Token::Null)(input)
}

fn derived(input: &str) -> IResult<&str, Token<'_>> {
    map(char('*'), |_| Token::Derived)(input)
}

fn type_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

/// Parenthesized, comma-separated tokens
fn argument_list(input: &str) -> IResult<&str, Vec<Token<'_>>> {
    delimited(
        pair(char('('), ws),
        separated_list0(delimited(ws, char(','), ws), token),
        pair(ws, char(')')),
    )(input)
}

fn typed_value(input: &str) -> IResult<&str, Token<'_>> {
    map(pair(type_name, preceded(ws, argument_list)), |(name, args)| {
        Token::TypedValue(name, args)
    })(input)
}

fn list(input: &str) -> IResult<&str, Token<'_>> {
    map(argument_list, Token::List)(input)
}

/// Parse a token with optional surrounding whitespace
fn token(input: &str) -> IResult<&str, Token<'_>> {
    delimited(
        ws,
        alt((
            real, // before integer, a real starts like one
            integer,
            entity_ref,
            string_literal,
            enum_value,
            list,
            typed_value,
            null,
            derived,
        )),
        ws,
    )(input)
}

/// `#123=IFCWALL(...)` or the complex form `#123=(A(...)B(...))`
fn entity_record(input: &str) -> IResult<&str, Record<'_>> {
    let (input, id) = terminated(entity_id, tuple((ws, char('='), ws)))(input)?;
    if input.starts_with('(') {
        return Ok(("", Record::Complex(id)));
    }
    terminated(
        map(pair(type_name, preceded(ws, argument_list)), move |(name, args)| {
            Record::Simple(id, name, args)
        }),
        pair(ws, eof),
    )(input)
}

/// `FILE_NAME(...)`
fn header_record(input: &str) -> IResult<&str, (&str, Vec<Token<'_>>)> {
    terminated(pair(type_name, preceded(ws, argument_list)), pair(ws, eof))(input)
}
