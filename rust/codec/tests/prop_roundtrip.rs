// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property-based round trip: `get_line(write_line(T)) == canonical(T)`
//!
//! Decoding is not a perfect inverse of encoding. The oracle below spells
//! out every rewrite the codec applies, and the property compares against
//! the rewritten tree:
//!
//! - an empty top-level argument list reads back as `Null`
//! - a label's run of exactly one value reads back as that value; an empty
//!   run, or a run holding only `Null`, reads back as `Null`
//! - the text `true` / `false` in a String or Enum scalar reads back as
//!   `T` / `F`
//! - a `Logical` payload reads back as its `T` / `F` / `U` text

use ifc_lite_codec::{
    type_code_for_name, Argument, EntityCodec, Labeled, Logical, Real, Scalar, ScalarKind,
    ScalarValue, SchemaLookup, Tape, TypeRegistry,
};
use proptest::prelude::*;

const LABELS: &[&str] = &["IFCLABEL", "IFCREAL", "IFCBOOLEAN", "IFCLENGTHMEASURE", "IFCTEXT"];

// ============================================================================
// Strategies
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,20}",
        "\\PC{0,12}",
        Just("true".to_string()),
        Just("false".to_string()),
        Just("it's".to_string()),
        Just("path\\to\\file".to_string()),
        Just("\\X2\\00E4\\X0\\".to_string()),
        Just("caf\u{00e9}".to_string()),
        Just("\u{4f60}\u{597d} \u{1F600}".to_string()),
    ]
}

fn arb_logical() -> impl Strategy<Value = Logical> {
    prop_oneof![
        Just(Logical::True),
        Just(Logical::False),
        Just(Logical::Unknown),
    ]
}

fn arb_real() -> impl Strategy<Value = Real> {
    prop_oneof![
        "-?[0-9]{1,6}\\.[0-9]{1,12}(E-?[0-9]{1,2})?",
        Just("0.".to_string()),
    ]
    .prop_map(|text| Real::new(text).unwrap())
}

fn arb_scalar() -> impl Strategy<Value = Argument> {
    prop_oneof![
        arb_text().prop_map(Argument::string),
        prop_oneof!["[A-Z_]{1,12}", Just("true".to_string())].prop_map(Argument::enumeration),
        arb_logical().prop_map(Argument::logical),
        arb_logical()
            .prop_map(|l| Argument::Scalar(Scalar::new(ScalarKind::String, ScalarValue::Logical(l)))),
        arb_real().prop_map(Argument::real),
        any::<i64>().prop_map(Argument::integer),
        any::<u32>().prop_map(Argument::reference),
    ]
}

fn arb_argument() -> impl Strategy<Value = Argument> {
    let leaf = prop_oneof![1 => Just(Argument::Null), 4 => arb_scalar()];
    leaf.prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Argument::Set),
            (prop::sample::select(LABELS), inner).prop_map(|(name, value)| {
                Argument::labeled(name, type_code_for_name(name), value)
            }),
        ]
    })
}

// ============================================================================
// Oracle
// ============================================================================

fn normalize(text: &str) -> String {
    match text {
        "true" => "T".to_string(),
        "false" => "F".to_string(),
        other => other.to_string(),
    }
}

fn canonical(argument: &Argument) -> Argument {
    match argument {
        Argument::Null => Argument::Null,
        Argument::Scalar(scalar) => Argument::Scalar(canonical_scalar(scalar)),
        Argument::Set(items) => Argument::Set(items.iter().map(canonical).collect()),
        Argument::Labeled(labeled) => Argument::Labeled(Labeled {
            type_name: labeled.type_name.clone(),
            type_code: labeled.type_code,
            inner: Box::new(canonical_label_run(&labeled.inner)),
        }),
    }
}

fn canonical_scalar(scalar: &Scalar) -> Scalar {
    let value = match &scalar.value {
        ScalarValue::Text(text) => ScalarValue::Text(normalize(text)),
        ScalarValue::Logical(logical) => ScalarValue::Text(logical.literal().to_string()),
        other => other.clone(),
    };
    Scalar::new(scalar.kind, value)
}

fn canonical_label_run(inner: &Argument) -> Argument {
    match inner {
        Argument::Set(items) => match items.as_slice() {
            [] => Argument::Null,
            [single] => canonical(single),
            _ => canonical(inner),
        },
        other => canonical(other),
    }
}

fn canonical_line(items: &[Argument]) -> Argument {
    if items.is_empty() {
        Argument::Null
    } else {
        Argument::Set(items.iter().map(canonical).collect())
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_line_roundtrip(items in prop::collection::vec(arb_argument(), 0..8)) {
        let schema = TypeRegistry::with_ifc_defaults();
        let wall = schema.type_code("IfcWall").unwrap();

        let mut tape = Tape::new();
        let mut codec = EntityCodec::new(&mut tape, &schema);
        let written = Argument::Set(items.clone());
        prop_assert!(codec.write_line(7, wall, &written).is_ok());

        let line = codec.get_line(7).unwrap();
        prop_assert_eq!(line.arguments, canonical_line(&items));
    }

    #[test]
    fn prop_canonical_trees_are_fixed_points(items in prop::collection::vec(arb_argument(), 1..6)) {
        let schema = TypeRegistry::with_ifc_defaults();
        let wall = schema.type_code("IfcWall").unwrap();
        let canonical = canonical_line(&items);

        let mut tape = Tape::new();
        let mut codec = EntityCodec::new(&mut tape, &schema);
        prop_assert!(codec.write_line(1, wall, &canonical).is_ok());
        let first = codec.get_line(1).unwrap().arguments;
        prop_assert!(codec.write_line(1, wall, &first).is_ok());
        let second = codec.get_line(1).unwrap().arguments;
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_inverse_scan_matches_naive(
        targets in prop::collection::vec(0u32..5, 1..12),
        target in 0u32..5,
    ) {
        let schema = TypeRegistry::with_ifc_defaults();
        let rel = schema.type_code("IfcRelAggregates").unwrap();
        let mut tape = Tape::new();
        let mut codec = EntityCodec::new(&mut tape, &schema);

        for (i, &reference) in targets.iter().enumerate() {
            let arguments = Argument::Set(vec![
                Argument::string("guid"),
                Argument::Set(vec![Argument::integer(0), Argument::reference(reference)]),
            ]);
            prop_assert!(codec.write_line(i as u32 + 1, rel, &arguments).is_ok());
        }

        let expected: Vec<u32> = targets
            .iter()
            .enumerate()
            .filter(|(_, reference)| **reference == target)
            .map(|(i, _)| i as u32 + 1)
            .collect();

        prop_assert_eq!(codec.find_referencing(target, &[rel], 1, true), expected.clone());
        prop_assert_eq!(
            codec.find_referencing(target, &[rel], 1, false),
            expected.into_iter().take(1).collect::<Vec<_>>()
        );
    }
}
