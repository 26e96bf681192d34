// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Argument Tree - structured form of an entity's argument list
//!
//! Decoded fresh on every read and consumed by every write; the tape is the
//! only durable state.

use std::fmt;

use crate::error::{Error, Result};
use crate::p21;

/// Kind tag of a scalar argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScalarKind {
    String,
    Enum,
    Real,
    Integer,
    Reference,
}

/// Real number carried as decimal text
///
/// Never converted to binary floating point unless a caller asks for it, so
/// values that are only forwarded keep every digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Real(String);

impl Real {
    /// Validate decimal text such as `3.14`, `0.`, `-1.5E-10`
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if is_decimal(text.as_bytes()) {
            Ok(Self(text))
        } else {
            Err(Error::InvalidReal(text))
        }
    }

    /// Format a binary float. Only use this for freshly computed values.
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::InvalidReal(value.to_string()));
        }
        Ok(Self(format!("{:?}", value)))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the text as f64 (lossy; out-of-range exponents give +/-inf)
    #[inline]
    pub fn to_f64(&self) -> f64 {
        fast_float::parse::<f64, _>(self.0.as_bytes()).unwrap_or(0.0)
    }
}

/// `[+-]digits[.digits][(E|e)[+-]digits]`, magnitude unchecked
fn is_decimal(bytes: &[u8]) -> bool {
    fn digits(bytes: &[u8], at: usize) -> usize {
        bytes[at..].iter().take_while(|b| b.is_ascii_digit()).count()
    }

    let mut i = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let whole = digits(bytes, i);
    if whole == 0 {
        return false;
    }
    i += whole;
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        i += digits(bytes, i);
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exponent = digits(bytes, i);
        if exponent == 0 {
            return false;
        }
        i += exponent;
    }
    i == bytes.len()
}

impl TryFrom<String> for Real {
    type Error = Error;

    fn try_from(text: String) -> Result<Self> {
        Self::new(text)
    }
}

impl From<Real> for String {
    fn from(real: Real) -> Self {
        real.0
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Three-valued reading of the `T` / `F` / `U` enumeration literals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Logical {
    True,
    False,
    Unknown,
}

impl Logical {
    /// Literal written to the tape
    pub fn literal(self) -> &'static str {
        match self {
            Self::True => "T",
            Self::False => "F",
            Self::Unknown => "U",
        }
    }

    pub fn from_literal(literal: &str) -> Option<Self> {
        match literal {
            "T" => Some(Self::True),
            "F" => Some(Self::False),
            "U" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Unknown => None,
        }
    }
}

impl From<bool> for Logical {
    fn from(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

/// Payload of a scalar argument
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScalarValue {
    Text(String),
    /// Boolean or undefined; only valid for `String` and `Enum` kinds
    Logical(Logical),
    Real(Real),
    Integer(i64),
    Id(u32),
}

/// Kind-tagged scalar. The kind is kept separately from the payload so that
/// a string and an enumeration with the same text stay distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scalar {
    pub kind: ScalarKind,
    pub value: ScalarValue,
}

impl Scalar {
    pub fn new(kind: ScalarKind, value: ScalarValue) -> Self {
        Self { kind, value }
    }

    /// Whether the payload is one the encoder can write for this kind
    pub fn is_well_formed(&self) -> bool {
        matches!(
            (self.kind, &self.value),
            (ScalarKind::String | ScalarKind::Enum, ScalarValue::Text(_))
                | (ScalarKind::String | ScalarKind::Enum, ScalarValue::Logical(_))
                | (ScalarKind::Real, ScalarValue::Real(_))
                | (ScalarKind::Integer, ScalarValue::Integer(_))
                | (ScalarKind::Reference, ScalarValue::Id(_))
        )
    }
}

/// Typed wrapper, e.g. `IFCLENGTHMEASURE(2.5)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Labeled {
    pub type_name: String,
    pub type_code: u32,
    pub inner: Box<Argument>,
}

/// Argument Tree node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Argument {
    /// Omitted optional value
    Null,
    Scalar(Scalar),
    /// Ordered list; order is positional
    Set(Vec<Argument>),
    Labeled(Labeled),
}

impl Argument {
    pub fn string(text: impl Into<String>) -> Self {
        Self::Scalar(Scalar::new(ScalarKind::String, ScalarValue::Text(text.into())))
    }

    pub fn enumeration(literal: impl Into<String>) -> Self {
        Self::Scalar(Scalar::new(ScalarKind::Enum, ScalarValue::Text(literal.into())))
    }

    pub fn logical(value: Logical) -> Self {
        Self::Scalar(Scalar::new(ScalarKind::Enum, ScalarValue::Logical(value)))
    }

    pub fn real(real: Real) -> Self {
        Self::Scalar(Scalar::new(ScalarKind::Real, ScalarValue::Real(real)))
    }

    pub fn integer(value: i64) -> Self {
        Self::Scalar(Scalar::new(ScalarKind::Integer, ScalarValue::Integer(value)))
    }

    pub fn reference(id: u32) -> Self {
        Self::Scalar(Scalar::new(ScalarKind::Reference, ScalarValue::Id(id)))
    }

    pub fn labeled(type_name: impl Into<String>, type_code: u32, inner: Argument) -> Self {
        Self::Labeled(Labeled {
            type_name: type_name.into(),
            type_code,
            inner: Box::new(inner),
        })
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get as set items
    #[inline]
    pub fn as_set(&self) -> Option<&[Argument]> {
        match self {
            Self::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Get set item by position
    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.as_set().and_then(|items| items.get(index))
    }

    #[inline]
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Get as entity reference
    #[inline]
    pub fn as_reference(&self) -> Option<u32> {
        match self.as_scalar()?.value {
            ScalarValue::Id(id) => Some(id),
            _ => None,
        }
    }

    /// Get text of a string or enum scalar
    pub fn as_text(&self) -> Option<&str> {
        match &self.as_scalar()?.value {
            ScalarValue::Text(text) => Some(text),
            _ => None,
        }
    }

    #[inline]
    pub fn as_integer(&self) -> Option<i64> {
        match self.as_scalar()?.value {
            ScalarValue::Integer(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<&Real> {
        match &self.as_scalar()?.value {
            ScalarValue::Real(real) => Some(real),
            _ => None,
        }
    }

    /// Boolean/undefined reading of an enumeration scalar.
    /// Any enum literal other than `T`, `F`, `U` yields `None`.
    pub fn as_logical(&self) -> Option<Logical> {
        let scalar = self.as_scalar()?;
        if scalar.kind != ScalarKind::Enum {
            return None;
        }
        match &scalar.value {
            ScalarValue::Logical(logical) => Some(*logical),
            ScalarValue::Text(text) => Logical::from_literal(text),
            _ => None,
        }
    }

    #[inline]
    pub fn as_labeled(&self) -> Option<&Labeled> {
        match self {
            Self::Labeled(labeled) => Some(labeled),
            _ => None,
        }
    }
}

/// STEP notation, e.g. `('a',.T.,#5,IFCLABEL('x'))`
impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("$"),
            Self::Scalar(scalar) => write_scalar(f, scalar),
            Self::Set(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                f.write_str(")")
            }
            Self::Labeled(labeled) => {
                write!(f, "{}(", labeled.type_name)?;
                match labeled.inner.as_ref() {
                    Self::Set(items) => write_items(f, items)?,
                    inner => write!(f, "{}", inner)?,
                }
                f.write_str(")")
            }
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Argument]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_scalar(f: &mut fmt::Formatter<'_>, scalar: &Scalar) -> fmt::Result {
    match (scalar.kind, &scalar.value) {
        (ScalarKind::String, ScalarValue::Text(text)) => write!(f, "'{}'", p21::encode(text)),
        (ScalarKind::String, ScalarValue::Logical(l)) => write!(f, "'{}'", l.literal()),
        (ScalarKind::Enum, ScalarValue::Text(text)) => write!(f, ".{}.", text),
        (ScalarKind::Enum, ScalarValue::Logical(l)) => write!(f, ".{}.", l.literal()),
        (_, ScalarValue::Real(real)) => write!(f, "{}", real),
        (_, ScalarValue::Integer(value)) => write!(f, "{}", value),
        (_, ScalarValue::Id(id)) => write!(f, "#{}", id),
        _ => f.write_str("?"),
    }
}
