// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Schema lookup - type code / name resolution and type categories
//!
//! The codec only needs a narrow view of the schema: name <-> code mapping,
//! category membership, and category enumeration for inverse lookups.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use xxhash_rust::xxh3::xxh3_64;

/// Type categories used to build candidate sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    /// STEP header section entities (FILE_NAME, ...)
    Header,
    /// Physical building elements
    Element,
    /// Project, site, building, storey, space
    SpatialStructure,
    Relationship,
    /// Property sets, properties, quantities
    PropertyDefinition,
    /// Defined types wrapping a bare value (IFCLABEL, IFCLENGTHMEASURE, ...)
    Measure,
    /// Geometry, placement and other shared resources
    Resource,
}

/// Narrow schema interface consumed by the codec
pub trait SchemaLookup {
    /// Canonical name for a type code
    fn type_name(&self, type_code: u32) -> Option<&str>;

    /// Type code for a name, matched case-insensitively
    fn type_code(&self, name: &str) -> Option<u32>;

    fn is_in_category(&self, type_code: u32, category: TypeCategory) -> bool;

    /// Type codes in a category, in registration order
    fn types_in_category(&self, category: TypeCategory) -> Vec<u32>;
}

/// Stable code for a type name: low 32 bits of xxh3 over the upper-cased name
pub fn type_code_for_name(name: &str) -> u32 {
    xxh3_64(name.to_ascii_uppercase().as_bytes()) as u32
}

/// Table-driven schema
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    names: FxHashMap<u32, String>,
    /// upper-cased name -> code
    codes: FxHashMap<String, u32>,
    categories: FxHashMap<u32, SmallVec<[TypeCategory; 2]>>,
    members: FxHashMap<TypeCategory, Vec<u32>>,
}

const HEADER_TYPES: &[&str] = &["FILE_DESCRIPTION", "FILE_NAME", "FILE_SCHEMA"];

const ELEMENT_TYPES: &[&str] = &[
    "IfcWall",
    "IfcWallStandardCase",
    "IfcSlab",
    "IfcBeam",
    "IfcColumn",
    "IfcRoof",
    "IfcStair",
    "IfcRailing",
    "IfcCurtainWall",
    "IfcPlate",
    "IfcMember",
    "IfcDoor",
    "IfcWindow",
    "IfcOpeningElement",
    "IfcFurnishingElement",
    "IfcPipeSegment",
    "IfcDuctSegment",
    "IfcBuildingElementProxy",
];

const SPATIAL_TYPES: &[&str] = &[
    "IfcProject",
    "IfcSite",
    "IfcBuilding",
    "IfcBuildingStorey",
    "IfcSpace",
];

const RELATIONSHIP_TYPES: &[&str] = &[
    "IfcRelAggregates",
    "IfcRelContainedInSpatialStructure",
    "IfcRelDefinesByProperties",
    "IfcRelDefinesByType",
    "IfcRelAssociatesMaterial",
    "IfcRelVoidsElement",
    "IfcRelFillsElement",
];

const PROPERTY_TYPES: &[&str] = &[
    "IfcPropertySet",
    "IfcPropertySingleValue",
    "IfcPropertyEnumeratedValue",
    "IfcElementQuantity",
    "IfcQuantityLength",
    "IfcQuantityArea",
    "IfcQuantityVolume",
];

const MEASURE_TYPES: &[&str] = &[
    "IfcLabel",
    "IfcText",
    "IfcIdentifier",
    "IfcBoolean",
    "IfcLogical",
    "IfcInteger",
    "IfcReal",
    "IfcLengthMeasure",
    "IfcPositiveLengthMeasure",
    "IfcAreaMeasure",
    "IfcVolumeMeasure",
    "IfcPlaneAngleMeasure",
    "IfcRatioMeasure",
    "IfcThermalTransmittanceMeasure",
    "IfcParameterValue",
];

const RESOURCE_TYPES: &[&str] = &[
    "IfcOwnerHistory",
    "IfcPerson",
    "IfcOrganization",
    "IfcApplication",
    "IfcUnitAssignment",
    "IfcSIUnit",
    "IfcMaterial",
    "IfcLocalPlacement",
    "IfcAxis2Placement3D",
    "IfcCartesianPoint",
    "IfcDirection",
    "IfcProductDefinitionShape",
    "IfcShapeRepresentation",
    "IfcGeometricRepresentationContext",
    "IfcExtrudedAreaSolid",
    "IfcRectangleProfileDef",
];

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the STEP header types and a core set of IFC types
    pub fn with_ifc_defaults() -> Self {
        let mut registry = Self::new();
        let tables = [
            (HEADER_TYPES, TypeCategory::Header),
            (ELEMENT_TYPES, TypeCategory::Element),
            (SPATIAL_TYPES, TypeCategory::SpatialStructure),
            (RELATIONSHIP_TYPES, TypeCategory::Relationship),
            (PROPERTY_TYPES, TypeCategory::PropertyDefinition),
            (MEASURE_TYPES, TypeCategory::Measure),
            (RESOURCE_TYPES, TypeCategory::Resource),
        ];
        for (names, category) in tables {
            for name in names {
                registry.register(name, &[category]);
            }
        }
        registry
    }

    /// Register a type under its derived code and return the code
    pub fn register(&mut self, name: &str, categories: &[TypeCategory]) -> u32 {
        let code = type_code_for_name(name);
        self.register_with_code(code, name, categories);
        code
    }

    /// Register a type under an explicit code. Re-registering a code replaces
    /// its name and adds any new categories; re-registering a name under a
    /// new code drops the old code entirely.
    pub fn register_with_code(&mut self, code: u32, name: &str, categories: &[TypeCategory]) {
        let key = name.to_ascii_uppercase();
        if let Some(&old) = self.codes.get(&key) {
            if old != code {
                self.forget_code(old);
            }
        }
        if let Some(previous) = self.names.insert(code, name.to_string()) {
            self.codes.remove(&previous.to_ascii_uppercase());
        }
        self.codes.insert(key, code);

        let assigned = self.categories.entry(code).or_default();
        for &category in categories {
            if !assigned.contains(&category) {
                assigned.push(category);
                self.members.entry(category).or_default().push(code);
            }
        }
    }

    fn forget_code(&mut self, code: u32) {
        self.names.remove(&code);
        for category in self.categories.remove(&code).unwrap_or_default() {
            if let Some(members) = self.members.get_mut(&category) {
                members.retain(|&other| other != code);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl SchemaLookup for TypeRegistry {
    fn type_name(&self, type_code: u32) -> Option<&str> {
        self.names.get(&type_code).map(String::as_str)
    }

    fn type_code(&self, name: &str) -> Option<u32> {
        self.codes.get(&name.to_ascii_uppercase()).copied()
    }

    fn is_in_category(&self, type_code: u32, category: TypeCategory) -> bool {
        self.categories
            .get(&type_code)
            .is_some_and(|categories| categories.contains(&category))
    }

    fn types_in_category(&self, category: TypeCategory) -> Vec<u32> {
        self.members.get(&category).cloned().unwrap_or_default()
    }
}
