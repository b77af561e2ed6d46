//! Translated schema objects: the output of conversion.
//!
//! A [`Document`] is a registry of named [`SchemaObject`]s plus the ordered
//! list of root names. It is independent of any text encoding; see
//! [`crate::openapi`] for the OpenAPI rendering.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Stable identifier of a schema in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SchemaName(String);

impl SchemaName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for SchemaName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SchemaName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SchemaName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ---------------------------------------------------------------------------
// SchemaObject
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SchemaObject {
    Reference { target: SchemaName },
    Object(ObjectSchema),
    Array(ArraySchema),
    VariantSet(VariantSet),
    Scalar(ScalarSchema),
}

impl SchemaObject {
    pub fn reference(target: SchemaName) -> Self {
        SchemaObject::Reference { target }
    }

    /// Placeholder for a schema whose translation failed.
    pub fn opaque(description: impl Into<String>) -> Self {
        SchemaObject::Scalar(ScalarSchema {
            description: Some(description.into()),
            ..ScalarSchema::new(Primitive::Opaque)
        })
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            SchemaObject::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarSchema> {
        match self {
            SchemaObject::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_variant_set(&self) -> Option<&VariantSet> {
        match self {
            SchemaObject::VariantSet(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&SchemaName> {
        match self {
            SchemaObject::Reference { target } => Some(target),
            _ => None,
        }
    }

    /// Attach documentation where the shape can carry it.
    pub(crate) fn describe(&mut self, documentation: Option<&str>) {
        let Some(doc) = documentation else {
            return;
        };
        match self {
            SchemaObject::Object(obj) => obj.description = Some(doc.to_string()),
            SchemaObject::Scalar(scalar) => scalar.description = Some(doc.to_string()),
            _ => {}
        }
    }

    /// Every reference target reachable from this schema, in visiting order.
    pub fn references(&self) -> Vec<&SchemaName> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a SchemaName>) {
        match self {
            SchemaObject::Reference { target } => out.push(target),
            SchemaObject::Object(obj) => {
                for prop in obj.properties.values() {
                    prop.collect_references(out);
                }
                for set in &obj.variant_sets {
                    for variant in &set.variants {
                        variant.collect_references(out);
                    }
                }
            }
            SchemaObject::Array(arr) => arr.items.collect_references(out),
            SchemaObject::VariantSet(set) => {
                for variant in &set.variants {
                    variant.collect_references(out);
                }
            }
            SchemaObject::Scalar(_) => {}
        }
    }
}

/// An object shape: properties, required set and alternation groups.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ObjectSchema {
    pub properties: IndexMap<String, SchemaObject>,
    /// Required property names, in first-declared order, without duplicates.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Alternation groups of the content model. Branch properties live only
    /// inside their variants.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variant_sets: Vec<VariantSet>,
    /// Properties that came from XML attributes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
    /// Properties that may carry an explicit nil.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nillable: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ObjectSchema {
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    pub(crate) fn require(&mut self, name: &str) {
        if !self.is_required(name) {
            self.required.push(name.to_string());
        }
    }

    pub(crate) fn mark_attribute(&mut self, name: &str) {
        if !self.attributes.iter().any(|a| a == name) {
            self.attributes.push(name.to_string());
        }
    }

    pub(crate) fn mark_nillable(&mut self, name: &str) {
        if !self.nillable.iter().any(|n| n == name) {
            self.nillable.push(name.to_string());
        }
    }

    /// Whether the object has neither properties nor alternation groups.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.variant_sets.is_empty()
    }
}

impl From<VariantSet> for ObjectSchema {
    fn from(set: VariantSet) -> Self {
        Self {
            variant_sets: vec![set],
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArraySchema {
    pub items: Box<SchemaObject>,
    pub min_items: u32,
    /// `None` when unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
}

/// Mutually exclusive alternatives.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct VariantSet {
    pub variants: Vec<SchemaObject>,
    /// No branch at all is also acceptable.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl VariantSet {
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Primitive {
    String,
    Number,
    Integer,
    Boolean,
    /// Unconstrained content (`xs:anyType`, failed translations).
    Opaque,
}

impl Primitive {
    pub fn is_numeric(self) -> bool {
        matches!(self, Primitive::Number | Primitive::Integer)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Integer => "integer",
            Primitive::Boolean => "boolean",
            Primitive::Opaque => "opaque",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScalarSchema {
    pub primitive: Primitive,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub constraints: Constraints,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ScalarSchema {
    pub fn new(primitive: Primitive) -> Self {
        Self {
            primitive,
            format: None,
            constraints: Constraints::default(),
            description: None,
        }
    }

    pub(crate) fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }
}

/// A numeric bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bound {
    pub value: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub exclusive: bool,
}

impl Bound {
    pub fn inclusive(value: f64) -> Self {
        Self {
            value,
            exclusive: false,
        }
    }

    pub fn exclusive(value: f64) -> Self {
        Self {
            value,
            exclusive: true,
        }
    }

    /// Whether `self` admits values below `other` as a lower bound.
    pub(crate) fn looser_lower_than(&self, other: &Bound) -> bool {
        self.value < other.value || (self.value == other.value && !self.exclusive && other.exclusive)
    }

    /// Whether `self` admits values above `other` as an upper bound.
    pub(crate) fn looser_upper_than(&self, other: &Bound) -> bool {
        self.value > other.value || (self.value == other.value && !self.exclusive && other.exclusive)
    }

    pub(crate) fn admits_above(&self, value: f64) -> bool {
        if self.exclusive {
            value > self.value
        } else {
            value >= self.value
        }
    }

    pub(crate) fn admits_below(&self, value: f64) -> bool {
        if self.exclusive {
            value < self.value
        } else {
            value <= self.value
        }
    }
}

/// Validation keywords of a scalar.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Bound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Bound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_digits: Option<u32>,
    /// Format hint only; not enforced as a hard constraint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fraction_digits: Option<u32>,
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The result of a conversion run.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Document {
    /// Named schemas in first-encountered order.
    pub registry: IndexMap<SchemaName, SchemaObject>,
    pub roots: Vec<SchemaName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
}

impl Document {
    pub fn get(&self, name: &str) -> Option<&SchemaObject> {
        self.registry.get(name)
    }

    /// Registry keys in emission order.
    pub fn names(&self) -> impl Iterator<Item = &SchemaName> {
        self.registry.keys()
    }

    /// Every reference in the registry whose target is missing.
    pub fn dangling_references(&self) -> Vec<&SchemaName> {
        self.registry
            .values()
            .flat_map(SchemaObject::references)
            .filter(|target| !self.registry.contains_key(target.as_str()))
            .collect()
    }
}
