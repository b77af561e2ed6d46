//! Translate a resolved XML Schema type graph into OpenAPI component schemas.
//!
//! The engine walks a [`TypeGraph`] from a set of roots and fills a registry
//! of named [`SchemaObject`]s:
//!
//! - named types are entered once and referenced everywhere else, so self-
//!   and mutually-referential types terminate;
//! - occurrence bounds become optionality and array wrapping;
//! - alternation groups become [`VariantSet`]s of mutually exclusive branches;
//! - extension and restriction are resolved against the translated base.
//!
//! ```
//! use xsd_openapi_core::{
//!     convert, ContentModel, ConvertOptions, Particle, RootRef, StructuredType, TypeGraph,
//!     TypeNode, TypeRef,
//! };
//!
//! let mut graph = TypeGraph::new();
//! graph.add_type(TypeNode::structured(
//!     "Payment",
//!     StructuredType::new(ContentModel::sequence(vec![
//!         Particle::element("amount", TypeRef::builtin("decimal")),
//!         Particle::group(ContentModel::choice(vec![
//!             Particle::element("card", TypeRef::builtin("string")),
//!             Particle::element("iban", TypeRef::builtin("string")),
//!         ])),
//!     ])),
//! ));
//!
//! let result = convert(&graph, &[RootRef::type_name("Payment")], &ConvertOptions::default())?;
//! let payment = result.document.get("Payment").and_then(|s| s.as_object()).unwrap();
//! assert_eq!(payment.required, vec!["amount"]);
//! assert_eq!(payment.variant_sets[0].len(), 2);
//! # Ok::<(), xsd_openapi_core::ConvertError>(())
//! ```

pub mod analyze;
pub mod assemble;
pub mod config;
mod context;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod openapi;
mod resolver;
pub mod schema;
mod translate;

pub use analyze::{analyze, GraphInfo};
pub use assemble::{all_roots, convert, convert_all, ConvertResult, RootRef};
pub use config::{ConvertOptions, DiagnosticsMode};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::ConvertError;
pub use graph::{
    local_name, AtomicType, AttributeDecl, ContentModel, Derivation, ElementDecl, ElementId,
    ElementParticle, Facets, GroupParticle, MaxOccurs, Occurs, Particle, StructuredType, TypeGraph,
    TypeId, TypeKind, TypeName, TypeNode, TypeRef, UnionType,
};
pub use openapi::{to_openapi, OpenApiOptions};
pub use schema::{
    ArraySchema, Bound, Constraints, Document, ObjectSchema, Primitive, ScalarSchema, SchemaName,
    SchemaObject, VariantSet,
};
