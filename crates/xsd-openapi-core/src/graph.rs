//! Resolved XML Schema type graph: the input of conversion.
//!
//! The graph is an arena: every type definition, named or anonymous, lives in
//! one `Vec<TypeNode>` and is addressed by its [`TypeId`]. Cross-references
//! between types are lookups (by qualified name or by arena index), never
//! ownership, so self- and mutually-referential types need no cyclic
//! structures.
//!
//! Parsing raw `.xsd` documents and merging imports/includes happens before
//! this graph is built. The graph can also be loaded from JSON
//! (`kebab-case` field and variant names) with [`TypeGraph::from_json`].
//!
//! ```
//! use xsd_openapi_core::{ContentModel, Particle, StructuredType, TypeGraph, TypeNode, TypeRef};
//!
//! let mut graph = TypeGraph::new();
//! graph.add_type(TypeNode::structured(
//!     "Note",
//!     StructuredType::new(ContentModel::sequence(vec![Particle::element(
//!         "body",
//!         TypeRef::builtin("string"),
//!     )])),
//! ));
//! assert!(graph.type_id("Note").is_some());
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

/// Arena index of a type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub usize);

/// Index of a global element declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub usize);

/// Strip a namespace from a qualified name.
///
/// Handles Clark notation (`{urn:x}Name`) and prefixed names (`tns:Name`).
///
/// ```
/// use xsd_openapi_core::local_name;
/// assert_eq!(local_name("{http://example.com/ns}Order"), "Order");
/// assert_eq!(local_name("xs:decimal"), "decimal");
/// assert_eq!(local_name("Order"), "Order");
/// ```
pub fn local_name(name: &str) -> &str {
    if let Some(rest) = name.strip_prefix('{') {
        return rest.split_once('}').map(|(_, local)| local).unwrap_or(name);
    }
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

// ---------------------------------------------------------------------------
// Type definitions
// ---------------------------------------------------------------------------

/// Name of a type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeName {
    /// A top-level named type.
    Qualified(String),
    /// An inline type, tagged with the path of its defining context
    /// (e.g. `Order/item`).
    Anonymous { context: String },
}

/// A reference from one declaration to a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeRef {
    /// An XSD built-in datatype (`decimal`, `xs:string`, ...).
    Builtin(String),
    /// A top-level named type, looked up by qualified name.
    Named(String),
    /// An anonymous type by arena index.
    Anonymous(TypeId),
}

impl TypeRef {
    pub fn builtin(name: impl Into<String>) -> Self {
        TypeRef::Builtin(name.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Builtin(name) => write!(f, "builtin {name}"),
            TypeRef::Named(name) => write!(f, "{name}"),
            TypeRef::Anonymous(id) => write!(f, "anonymous type #{}", id.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TypeNode {
    pub name: TypeName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub kind: TypeKind,
}

impl TypeNode {
    pub fn atomic(name: impl Into<String>, base: TypeRef, facets: Facets) -> Self {
        Self::new(
            TypeName::Qualified(name.into()),
            TypeKind::Atomic(AtomicType { base, facets }),
        )
    }

    pub fn union(name: impl Into<String>, members: Vec<TypeRef>) -> Self {
        Self::new(
            TypeName::Qualified(name.into()),
            TypeKind::Union(UnionType { members }),
        )
    }

    pub fn structured(name: impl Into<String>, structured: StructuredType) -> Self {
        Self::new(
            TypeName::Qualified(name.into()),
            TypeKind::Structured(structured),
        )
    }

    pub fn anonymous(context: impl Into<String>, kind: TypeKind) -> Self {
        Self::new(
            TypeName::Anonymous {
                context: context.into(),
            },
            kind,
        )
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    fn new(name: TypeName, kind: TypeKind) -> Self {
        Self {
            name,
            documentation: None,
            kind,
        }
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self.kind, TypeKind::Atomic(_) | TypeKind::Union(_))
    }

    /// The type this node derives from, if any. Unions have none.
    pub fn base(&self) -> Option<&TypeRef> {
        match &self.kind {
            TypeKind::Atomic(atomic) => Some(&atomic.base),
            TypeKind::Union(_) => None,
            TypeKind::Structured(structured) => structured.base.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeKind {
    /// A simple type restricting a built-in or another atomic type.
    Atomic(AtomicType),
    /// A simple type whose value space is the union of its members.
    Union(UnionType),
    /// A complex type: content model plus attributes.
    Structured(StructuredType),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AtomicType {
    pub base: TypeRef,
    #[serde(default)]
    pub facets: Facets,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UnionType {
    pub members: Vec<TypeRef>,
}

/// Additive vs narrowing derivation from a base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Derivation {
    #[default]
    Extension,
    Restriction,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StructuredType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<TypeRef>,
    #[serde(default)]
    pub derivation: Derivation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentModel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeDecl>,
}

impl StructuredType {
    pub fn new(content: ContentModel) -> Self {
        Self {
            content: Some(content),
            ..Self::default()
        }
    }

    pub fn with_attributes(mut self, attributes: Vec<AttributeDecl>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn extending(mut self, base: TypeRef) -> Self {
        self.base = Some(base);
        self.derivation = Derivation::Extension;
        self
    }

    pub fn restricting(mut self, base: TypeRef) -> Self {
        self.base = Some(base);
        self.derivation = Derivation::Restriction;
        self
    }
}

/// Value-space restrictions on an atomic type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Facets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_inclusive: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_inclusive: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_exclusive: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_exclusive: Option<f64>,
    /// Enumerated values in their lexical form.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enumeration: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_digits: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fraction_digits: Option<u32>,
}

impl Facets {
    pub fn is_empty(&self) -> bool {
        *self == Facets::default()
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enumeration: values.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Content models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentModel {
    /// Ordered group (`xs:sequence`).
    Sequence(Vec<Particle>),
    /// Unordered group (`xs:all`).
    All(Vec<Particle>),
    /// Alternation group (`xs:choice`).
    Choice(Vec<Particle>),
}

impl ContentModel {
    pub fn sequence(particles: Vec<Particle>) -> Self {
        ContentModel::Sequence(particles)
    }

    pub fn all(particles: Vec<Particle>) -> Self {
        ContentModel::All(particles)
    }

    pub fn choice(particles: Vec<Particle>) -> Self {
        ContentModel::Choice(particles)
    }

    pub fn particles(&self) -> &[Particle] {
        match self {
            ContentModel::Sequence(p) | ContentModel::All(p) | ContentModel::Choice(p) => p,
        }
    }

    pub fn is_alternation(&self) -> bool {
        matches!(self, ContentModel::Choice(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Particle {
    Element(ElementParticle),
    Group(GroupParticle),
}

impl Particle {
    /// A required, single-occurrence member.
    pub fn element(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Particle::Element(ElementParticle {
            name: name.into(),
            type_ref,
            occurs: Occurs::ONCE,
            nillable: false,
            documentation: None,
        })
    }

    /// A required, single-occurrence nested group.
    pub fn group(model: ContentModel) -> Self {
        Particle::Group(GroupParticle {
            model,
            occurs: Occurs::ONCE,
        })
    }

    pub fn occurs(mut self, min: u32, max: MaxOccurs) -> Self {
        *self.occurs_mut() = Occurs { min, max };
        self
    }

    pub fn optional(mut self) -> Self {
        self.occurs_mut().min = 0;
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.occurs_mut().max = MaxOccurs::Unbounded;
        self
    }

    pub fn nillable(mut self) -> Self {
        if let Particle::Element(el) = &mut self {
            el.nillable = true;
        }
        self
    }

    pub fn occurrence(&self) -> Occurs {
        match self {
            Particle::Element(el) => el.occurs,
            Particle::Group(g) => g.occurs,
        }
    }

    fn occurs_mut(&mut self) -> &mut Occurs {
        match self {
            Particle::Element(el) => &mut el.occurs,
            Particle::Group(g) => &mut g.occurs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ElementParticle {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(flatten)]
    pub occurs: Occurs,
    #[serde(default)]
    pub nillable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GroupParticle {
    pub model: ContentModel,
    #[serde(flatten)]
    pub occurs: Occurs,
}

// ---------------------------------------------------------------------------
// Occurrence bounds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MaxOccursRepr", into = "MaxOccursRepr")]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl MaxOccurs {
    /// The numeric bound, or `None` when unbounded.
    pub fn bound(self) -> Option<u32> {
        match self {
            MaxOccurs::Bounded(n) => Some(n),
            MaxOccurs::Unbounded => None,
        }
    }
}

impl Default for MaxOccurs {
    fn default() -> Self {
        MaxOccurs::Bounded(1)
    }
}

/// Wire form of `maxOccurs`: a count or the keyword `"unbounded"`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum MaxOccursRepr {
    Count(u32),
    Keyword(String),
}

impl TryFrom<MaxOccursRepr> for MaxOccurs {
    type Error = String;

    fn try_from(repr: MaxOccursRepr) -> Result<Self, Self::Error> {
        match repr {
            MaxOccursRepr::Count(n) => Ok(MaxOccurs::Bounded(n)),
            MaxOccursRepr::Keyword(word) if word == "unbounded" => Ok(MaxOccurs::Unbounded),
            MaxOccursRepr::Keyword(word) => Err(format!("invalid maxOccurs value '{word}'")),
        }
    }
}

impl From<MaxOccurs> for MaxOccursRepr {
    fn from(max: MaxOccurs) -> Self {
        match max {
            MaxOccurs::Bounded(n) => MaxOccursRepr::Count(n),
            MaxOccurs::Unbounded => MaxOccursRepr::Keyword("unbounded".to_string()),
        }
    }
}

/// Occurrence bounds `[min, max]` of a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Occurs {
    #[serde(default = "one")]
    pub min: u32,
    #[serde(default)]
    pub max: MaxOccurs,
}

fn one() -> u32 {
    1
}

impl Default for Occurs {
    fn default() -> Self {
        Occurs::ONCE
    }
}

impl Occurs {
    pub const ONCE: Occurs = Occurs {
        min: 1,
        max: MaxOccurs::Bounded(1),
    };

    pub fn is_optional(&self) -> bool {
        self.min == 0
    }

    /// More than one occurrence allowed.
    pub fn is_repeated(&self) -> bool {
        match self.max {
            MaxOccurs::Bounded(n) => n > 1,
            MaxOccurs::Unbounded => true,
        }
    }

    /// Prohibited particle (`maxOccurs="0"`).
    pub fn is_prohibited(&self) -> bool {
        self.max == MaxOccurs::Bounded(0)
    }

    pub fn is_consistent(&self) -> bool {
        match self.max {
            MaxOccurs::Bounded(n) => self.min <= n,
            MaxOccurs::Unbounded => true,
        }
    }

    /// Effective bounds of a particle nested inside a group with `outer`
    /// bounds: both ends multiply.
    pub fn within(self, outer: Occurs) -> Occurs {
        let min = self.min.saturating_mul(outer.min);
        let max = match (self.max, outer.max) {
            (MaxOccurs::Bounded(0), _) | (_, MaxOccurs::Bounded(0)) => MaxOccurs::Bounded(0),
            (MaxOccurs::Bounded(a), MaxOccurs::Bounded(b)) => MaxOccurs::Bounded(a.saturating_mul(b)),
            _ => MaxOccurs::Unbounded,
        };
        Occurs { min, max }
    }
}

// ---------------------------------------------------------------------------
// Attributes and elements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AttributeDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl AttributeDecl {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
            required: false,
            documentation: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A global element declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ElementDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default)]
    pub nillable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl ElementDecl {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
            nillable: false,
            documentation: None,
        }
    }
}

// ---------------------------------------------------------------------------
// TypeGraph
// ---------------------------------------------------------------------------

/// A fully import/include-resolved type graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "TypeGraphRepr")]
pub struct TypeGraph {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
    types: Vec<TypeNode>,
    elements: Vec<ElementDecl>,
    #[serde(skip)]
    type_index: HashMap<String, TypeId>,
    #[serde(skip)]
    local_type_index: HashMap<String, Vec<TypeId>>,
    #[serde(skip)]
    element_index: HashMap<String, ElementId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TypeGraphRepr {
    #[serde(default)]
    target_namespace: Option<String>,
    #[serde(default)]
    types: Vec<TypeNode>,
    #[serde(default)]
    elements: Vec<ElementDecl>,
}

impl From<TypeGraphRepr> for TypeGraph {
    fn from(repr: TypeGraphRepr) -> Self {
        let mut graph = TypeGraph::new();
        graph.target_namespace = repr.target_namespace;
        for node in repr.types {
            graph.add_type(node);
        }
        for element in repr.elements {
            graph.add_element(element);
        }
        graph
    }
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a graph from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, ConvertError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_target_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.target_namespace = Some(namespace.into());
        self
    }

    /// Append a type definition and return its arena index.
    ///
    /// A qualified name already present keeps pointing at the first
    /// definition.
    pub fn add_type(&mut self, node: TypeNode) -> TypeId {
        let id = TypeId(self.types.len());
        if let TypeName::Qualified(name) = &node.name {
            if self.type_index.contains_key(name) {
                tracing::warn!(name = %name, "duplicate type definition ignored for lookups");
            } else {
                self.type_index.insert(name.clone(), id);
                self.local_type_index
                    .entry(local_name(name).to_string())
                    .or_default()
                    .push(id);
            }
        }
        self.types.push(node);
        id
    }

    pub fn add_element(&mut self, element: ElementDecl) -> ElementId {
        let id = ElementId(self.elements.len());
        self.element_index.entry(element.name.clone()).or_insert(id);
        self.elements.push(element);
        id
    }

    pub fn node(&self, id: TypeId) -> Option<&TypeNode> {
        self.types.get(id.0)
    }

    pub fn element(&self, id: ElementId) -> Option<&ElementDecl> {
        self.elements.get(id.0)
    }

    /// Look up a named type by qualified name.
    ///
    /// Falls back to the local name when it identifies exactly one type, so
    /// `tns:Order` finds `{urn:x}Order`.
    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        if let Some(id) = self.type_index.get(name) {
            return Some(*id);
        }
        match self.local_type_index.get(local_name(name)).map(Vec::as_slice) {
            Some([only]) => Some(*only),
            _ => None,
        }
    }

    pub fn element_id(&self, name: &str) -> Option<ElementId> {
        if let Some(id) = self.element_index.get(name) {
            return Some(*id);
        }
        let wanted = local_name(name);
        let mut matches = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| local_name(&el.name) == wanted);
        match (matches.next(), matches.next()) {
            (Some((idx, _)), None) => Some(ElementId(idx)),
            _ => None,
        }
    }

    /// All type definitions in declaration order.
    pub fn types(&self) -> impl Iterator<Item = (TypeId, &TypeNode)> {
        self.types.iter().enumerate().map(|(i, node)| (TypeId(i), node))
    }

    /// All global element declarations in declaration order.
    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &ElementDecl)> {
        self.elements
            .iter()
            .enumerate()
            .map(|(i, el)| (ElementId(i), el))
    }

    /// Whether the base chain of `id` passes through `ancestor`.
    ///
    /// A chain that loops without meeting `ancestor` ends after every type
    /// has been visited once.
    pub fn derives_from(&self, id: TypeId, ancestor: TypeId) -> bool {
        let mut current = id;
        for _ in 0..self.types.len() {
            let next = match self.node(current).and_then(TypeNode::base) {
                Some(base @ (TypeRef::Named(_) | TypeRef::Anonymous(_))) => {
                    match self.resolve(base, "") {
                        Ok((next, _)) => next,
                        Err(_) => return false,
                    }
                }
                _ => return false,
            };
            if next == ancestor {
                return true;
            }
            current = next;
        }
        false
    }

    /// Resolve a non-builtin reference to its arena entry.
    pub(crate) fn resolve(
        &self,
        reference: &TypeRef,
        path: &str,
    ) -> Result<(TypeId, &TypeNode), ConvertError> {
        let unresolved = || ConvertError::UnresolvedTypeReference {
            path: path.to_string(),
            reference: reference.to_string(),
        };
        let id = match reference {
            TypeRef::Named(name) => self.type_id(name).ok_or_else(unresolved)?,
            TypeRef::Anonymous(id) => *id,
            TypeRef::Builtin(name) => {
                return Err(ConvertError::unsupported(
                    path,
                    format!("built-in type '{name}' has no graph node"),
                ))
            }
        };
        let node = self.node(id).ok_or_else(unresolved)?;
        Ok((id, node))
    }
}
