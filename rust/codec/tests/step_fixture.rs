// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP ingest against a small but complete model

use ifc_lite_codec::{
    load_step, Argument, EntityCodec, LoadSummary, SchemaLookup, Tape, TypeCategory, TypeRegistry,
};

const MODEL: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [ReferenceView_V1.2]'),'2;1');
FILE_NAME('wall.ifc','2024-05-02T10:00:00',('Architect'),('Office'),'IFC-Lite','IFC-Lite','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('0YvctVUKr0kugbFTf53O9L',$,'Project',$,$,$,$,(#20),#30);
#2=IFCSITE('1cwlDi_hLEvPsClAelBNnz',$,'Site',$,$,#40,$,$,.ELEMENT.,$,$,$,$,$);
#3=IFCBUILDINGSTOREY('2xgqQLsRn9xBDW1OTnK$Ah',$,'Level 1',$,$,#41,$,$,.ELEMENT.,0.);
#10=IFCWALL('3vB2YO$MX4xv5uCqZZG05x',$,'Wall \X2\00C4\X0\u\X2\00DF\X0\ere',$,$,#42,#50,$,.STANDARD.);
#11=IFCSLAB('0x4j$Ecm1Dv8kfcbKKU6u1',$,'Floor',$,$,#43,#51,$,.FLOOR.);
#20=IFCGEOMETRICREPRESENTATIONCONTEXT($,'Model',3,1.0E-05,#60,$);
#30=IFCUNITASSIGNMENT((#31));
#31=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#60=IFCAXIS2PLACEMENT3D(#61,$,$);
#61=IFCCARTESIANPOINT((0.,0.,0.));
#100=IFCRELAGGREGATES('2Hq7xhGmT5wPNpoMxq1PV0',$,$,$,#1,(#2));
#101=IFCRELCONTAINEDINSPATIALSTRUCTURE('0Cj0rGYxL0t8jFvT3b$RqS',$,$,$,(#10,#11),#3);
#102=IFCPROPERTYSINGLEVALUE('IsExternal',$,IFCBOOLEAN(.T.),$);
#103=IFCPROPERTYSINGLEVALUE('Width',$,IFCLENGTHMEASURE(200.),$);
#104=IFCPROPERTYSET('1Xs2oVtZ1Bsx8LJaCj8Ync',$,'Pset_WallCommon',$,(#102,#103));
#105=IFCRELDEFINESBYPROPERTIES('3T5pqRHYjEmgG0v9Vkm4gS',$,$,$,(#10),#104);
ENDSEC;
END-ISO-10303-21;
"#;

fn load() -> (TypeRegistry, Tape) {
    let schema = TypeRegistry::with_ifc_defaults();
    let tape = load_step(MODEL, &schema).unwrap();
    (schema, tape)
}

#[test]
fn test_every_record_is_indexed() {
    let (schema, mut tape) = load();
    let codec = EntityCodec::new(&mut tape, &schema);

    assert_eq!(
        codec.all_lines(),
        vec![1, 2, 3, 10, 11, 20, 30, 31, 60, 61, 100, 101, 102, 103, 104, 105]
    );
    assert_eq!(codec.max_id(), 105);
    assert_eq!(codec.line_type(10), schema.type_code("IFCWALL"));
}

#[test]
fn test_decoded_attributes() {
    let (schema, mut tape) = load();
    let mut codec = EntityCodec::new(&mut tape, &schema);

    let wall = codec.get_line(10).unwrap();
    assert_eq!(wall.type_name.as_deref(), Some("IfcWall"));
    assert_eq!(wall.get_string(2), Some("Wall \u{00C4}u\u{00DF}ere"));
    assert_eq!(wall.get_ref(5), Some(42));
    assert_eq!(wall.get(8), Some(&Argument::enumeration("STANDARD")));

    let unit = codec.get_line(31).unwrap();
    assert_eq!(unit.get(0), Some(&Argument::Null));

    let context = codec.get_line(20).unwrap();
    assert_eq!(context.get(3).and_then(Argument::as_real).map(|r| r.as_str()), Some("1.0E-05"));

    let external = codec.get_line(102).unwrap();
    let value = external.get(2).and_then(Argument::as_labeled).unwrap();
    assert_eq!(value.type_name, "IFCBOOLEAN");
    assert_eq!(Some(value.type_code), schema.type_code("IfcBoolean"));
    assert_eq!(value.inner.as_logical().and_then(|l| l.as_bool()), Some(true));
}

#[test]
fn test_header_lines() {
    let (schema, mut tape) = load();
    let mut codec = EntityCodec::new(&mut tape, &schema);

    let name = codec.get_header_line(schema.type_code("FILE_NAME").unwrap()).unwrap();
    assert!(name.is_header);
    assert_eq!(name.get_string(0), Some("wall.ifc"));
    assert_eq!(
        name.get(2),
        Some(&Argument::Set(vec![Argument::string("Architect")]))
    );
}

#[test]
fn test_inverse_lookups() {
    let (schema, mut tape) = load();
    let mut codec = EntityCodec::new(&mut tape, &schema);

    // containment: RelatedElements is argument 4
    assert_eq!(
        codec.find_referencing_in_category(11, TypeCategory::Relationship, 4, true),
        vec![101]
    );
    // decomposition: RelatingObject is argument 4, RelatedObjects argument 5
    assert_eq!(
        codec.find_referencing_in_category(1, TypeCategory::Relationship, 4, false),
        vec![100]
    );
    assert_eq!(
        codec.find_referencing_in_category(2, TypeCategory::Relationship, 5, true),
        vec![100]
    );
    // property definitions: RelatedObjects is argument 4
    assert_eq!(
        codec.find_referencing_in_category(10, TypeCategory::Relationship, 4, true),
        vec![101, 105]
    );
    let properties = schema.type_code("IfcPropertySet").unwrap();
    assert_eq!(codec.find_referencing(103, &[properties], 4, true), vec![104]);
}

#[test]
fn test_step_text_survives_reload() {
    let (schema, mut tape) = load();
    let mut codec = EntityCodec::new(&mut tape, &schema);

    let mut text = String::from("ISO-10303-21;\nHEADER;\n");
    for name in ["FILE_DESCRIPTION", "FILE_NAME", "FILE_SCHEMA"] {
        let line = codec.get_header_line(schema.type_code(name).unwrap()).unwrap();
        text.push_str(&line.to_step().unwrap());
        text.push('\n');
    }
    text.push_str("ENDSEC;\nDATA;\n");
    let ids = codec.all_lines();
    let lines = codec.get_lines(&ids);
    for line in &lines {
        text.push_str(&line.to_step().unwrap());
        text.push('\n');
    }
    text.push_str("ENDSEC;\nEND-ISO-10303-21;\n");

    let mut reloaded = load_step(&text, &schema).unwrap();
    let mut codec = EntityCodec::new(&mut reloaded, &schema);
    assert_eq!(codec.get_lines(&ids), lines);
}

#[test]
fn test_summary_counts_skipped_records() {
    let schema = TypeRegistry::with_ifc_defaults();
    let mut tape = Tape::new();
    let content = "DATA;#1=IFCWALL('a');#2=IFCNOTATYPE(1);#3=(IFCA()IFCB());ENDSEC;";
    let summary = ifc_lite_codec::load_step_into(&mut tape, content, &schema).unwrap();
    assert_eq!(
        summary,
        LoadSummary {
            entities: 1,
            header_lines: 0,
            skipped: 2,
        }
    );
}
