//! Translation of type nodes into schema objects.
//!
//! Every named type (and every anonymous structured type) is entered through
//! [`type_reference`], which reserves its registry slot via the resolver,
//! translates the node one level deeper and fills the slot. Members refer to
//! registered types by [`SchemaObject::Reference`]; built-ins and anonymous
//! atomic types are inlined.
//!
//! - [`constraints`]: built-in datatypes, facets, atomic and union types
//! - [`structure`]: ordered/unordered groups, members, attributes
//! - [`choice`]: alternation groups → variant sets
//! - [`inheritance`]: extension and restriction of a base type

pub(crate) mod choice;
pub(crate) mod constraints;
pub(crate) mod inheritance;
pub(crate) mod structure;

use crate::context::{ConversionContext, Identity};
use crate::diagnostics::Diagnostic;
use crate::error::ConvertError;
use crate::graph::{ElementId, TypeId, TypeKind, TypeNode, TypeRef};
use crate::resolver::{resolve_name, Resolution};
use crate::schema::{SchemaName, SchemaObject};

/// Registry name of the type at `id`, translating it on first encounter.
pub(crate) fn type_reference(
    cx: &mut ConversionContext<'_>,
    id: TypeId,
    path: &str,
) -> Result<SchemaName, ConvertError> {
    let graph = cx.graph();
    let node = graph
        .node(id)
        .ok_or_else(|| ConvertError::UnresolvedTypeReference {
            path: path.to_string(),
            reference: TypeRef::Anonymous(id).to_string(),
        })?;
    let name = match resolve_name(cx, Identity::Type(id), path)? {
        Resolution::Known(name) => return Ok(name),
        Resolution::Reserved(name) => name,
    };

    tracing::debug!(schema = %name, "translating type");
    let type_path = name.to_string();
    let result = cx.nested(&type_path, |cx| translate_type(cx, node, &type_path));
    settle(cx, Identity::Type(id), name, result)
}

/// Registry name for a global element root.
///
/// Elements typed by a graph node share that node's entry; an element typed
/// by a built-in gets an entry of its own, named after the element.
pub(crate) fn element_reference(
    cx: &mut ConversionContext<'_>,
    id: ElementId,
    path: &str,
) -> Result<SchemaName, ConvertError> {
    let graph = cx.graph();
    let element = graph.element(id).ok_or_else(|| ConvertError::UnknownRoot {
        kind: "element".to_string(),
        name: format!("#{}", id.0),
    })?;

    let builtin = match &element.type_ref {
        TypeRef::Builtin(builtin) => builtin,
        other => {
            let (type_id, _) = graph.resolve(other, path)?;
            return type_reference(cx, type_id, path);
        }
    };

    let name = match resolve_name(cx, Identity::Element(id), path)? {
        Resolution::Known(name) => return Ok(name),
        Resolution::Reserved(name) => name,
    };
    let element_path = name.to_string();
    let result = constraints::builtin_scalar(builtin, &element_path).map(|scalar| {
        let mut schema = SchemaObject::Scalar(scalar);
        schema.describe(element.documentation.as_deref());
        schema
    });
    settle(cx, Identity::Element(id), name, result)
}

/// Fill the reserved slot with the translation outcome.
///
/// In collect mode a recoverable failure is recorded against `name` and the
/// slot gets an opaque placeholder, so references to it stay valid.
fn settle(
    cx: &mut ConversionContext<'_>,
    identity: Identity,
    name: SchemaName,
    result: Result<SchemaObject, ConvertError>,
) -> Result<SchemaName, ConvertError> {
    match result {
        Ok(schema) => {
            cx.fill(identity, &name, schema);
            Ok(name)
        }
        Err(err) if cx.options().collect_diagnostics() && err.is_recoverable() => {
            tracing::warn!(schema = %name, error = %err, "substituting opaque placeholder");
            if let Some(diagnostic) = Diagnostic::from_error(name.as_str(), &err) {
                cx.record(diagnostic);
            }
            cx.fill(
                identity,
                &name,
                SchemaObject::opaque(format!("Translation failed: {err}")),
            );
            Ok(name)
        }
        Err(err) => Err(err),
    }
}

/// Schema for a declaration's type: inline for built-ins and anonymous
/// atomic types, a reference for everything else.
pub(crate) fn reference(
    cx: &mut ConversionContext<'_>,
    type_ref: &TypeRef,
    path: &str,
) -> Result<SchemaObject, ConvertError> {
    if let TypeRef::Builtin(name) = type_ref {
        return Ok(SchemaObject::Scalar(constraints::builtin_scalar(name, path)?));
    }

    let graph = cx.graph();
    let (id, node) = graph.resolve(type_ref, path)?;
    if matches!(type_ref, TypeRef::Anonymous(_)) && node.is_atomic() {
        return cx.nested(path, |cx| translate_type(cx, node, path));
    }
    Ok(SchemaObject::reference(type_reference(cx, id, path)?))
}

/// Translate a node without entering it in the registry.
pub(crate) fn translate_type(
    cx: &mut ConversionContext<'_>,
    node: &TypeNode,
    path: &str,
) -> Result<SchemaObject, ConvertError> {
    let mut schema = match &node.kind {
        TypeKind::Atomic(atomic) => constraints::translate_atomic(cx, atomic, path)?,
        TypeKind::Union(union) => constraints::translate_union(cx, union, path)?,
        TypeKind::Structured(structured) => match &structured.base {
            Some(base) => inheritance::derive(cx, structured, base, path)?,
            None => structure::translate_structured(cx, structured, path)?,
        },
    };
    schema.describe(node.documentation.as_deref());
    Ok(schema)
}
