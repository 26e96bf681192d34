// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Lite Argument Codec
//!
//! Translates between a document's typed token tape and structured
//! argument trees, one entity line or header line at a time.
//!
//! ## Overview
//!
//! - **Value Decoder**: token run to [`Argument`] tree, with the
//!   empty-vs-absent and single-value unwrap rules
//! - **Value Encoder**: [`Argument`] tree back to tokens; unsupported values
//!   become a `?` sentinel without aborting the write
//! - **Line Adapter**: [`EntityCodec`] reads and writes whole entity and
//!   header lines and keeps the tape's line index current
//! - **Inverse References**: brute-force scan for lines pointing back at an id
//! - **STEP ingest**: [nom](https://docs.rs/nom) tokenizer that fills a
//!   [`Tape`] from ISO 10303-21 text
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_lite_codec::{load_step, Argument, EntityCodec, SchemaLookup, TypeRegistry};
//!
//! let schema = TypeRegistry::with_ifc_defaults();
//! let mut tape = load_step("DATA;#1=IFCWALL('guid',$,'Wall');ENDSEC;", &schema)?;
//! let mut codec = EntityCodec::new(&mut tape, &schema);
//!
//! let wall = codec.get_line(1).unwrap();
//! assert_eq!(wall.get_string(2), Some("Wall"));
//!
//! let arguments = wall.arguments.clone();
//! codec.write_line(2, wall.type_code, &arguments)?;
//! ```
//!
//! ## Concurrency
//!
//! A cursor carries its read position as implicit state. All calls are
//! synchronous and take the cursor by `&mut`; hosts sharing a document
//! between threads wrap it in one lock per document.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for argument trees and lines

pub mod argument;
pub mod config;
pub mod cursor;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod inverse;
pub mod line;
pub mod p21;
pub mod schema;
pub mod step;
pub mod tape;
pub mod token;

pub use argument::{Argument, Labeled, Logical, Real, Scalar, ScalarKind, ScalarValue};
pub use config::{CodecConfig, UnknownTokenPolicy};
pub use cursor::TokenCursor;
pub use decoder::decode_arguments;
pub use encoder::encode_argument;
pub use error::{Error, Result};
pub use inverse::find_referencing;
pub use line::{EntityCodec, EntityLine};
pub use schema::{type_code_for_name, SchemaLookup, TypeCategory, TypeRegistry};
pub use step::{load_step, load_step_into, LoadSummary};
pub use tape::{LineEntry, Tape};
pub use token::{TokenKind, SENTINEL};
