//! Reference resolution: stable, collision-free schema names.
//!
//! [`resolve_name`] is the single point where identities (type nodes and
//! built-in-typed elements) are turned into registry names. On first
//! encounter it reserves a placeholder registry entry and marks the identity
//! in progress *before* any child is visited, so a self- or
//! mutually-referential type that is met again short-circuits to the memoized
//! name instead of re-entering translation.

use crate::context::{ConversionContext, Identity};
use crate::error::ConvertError;
use crate::graph::{local_name, TypeName};
use crate::schema::SchemaName;

/// Outcome of a name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// Seen before (finished or still in progress); do not translate again.
    Known(SchemaName),
    /// First encounter; the caller must translate and fill the placeholder.
    Reserved(SchemaName),
}

/// Get or reserve the schema name for `identity`.
pub(crate) fn resolve_name(
    cx: &mut ConversionContext<'_>,
    identity: Identity,
    path: &str,
) -> Result<Resolution, ConvertError> {
    if let Some(name) = cx.names.get(&identity) {
        return Ok(Resolution::Known(name.clone()));
    }

    let candidate = candidate_name(cx, identity, path)?;
    let name = disambiguate(cx, &candidate)?;

    tracing::debug!(name = %name, candidate = %candidate, "reserved schema name");
    cx.names.insert(identity, name.clone());
    cx.owners.insert(name.clone(), identity);
    cx.in_progress.insert(identity);
    cx.registry.insert(name.clone(), None);
    Ok(Resolution::Reserved(name))
}

/// Human-readable name derived from the declaration.
fn candidate_name(
    cx: &ConversionContext<'_>,
    identity: Identity,
    path: &str,
) -> Result<String, ConvertError> {
    let unresolved = |reference: String| ConvertError::UnresolvedTypeReference {
        path: path.to_string(),
        reference,
    };
    let raw = match identity {
        Identity::Type(id) => {
            let node = cx
                .graph()
                .node(id)
                .ok_or_else(|| unresolved(format!("anonymous type #{}", id.0)))?;
            match &node.name {
                TypeName::Qualified(name) => sanitize(local_name(name)),
                TypeName::Anonymous { context } => synthesize(context),
            }
        }
        Identity::Element(id) => {
            let element = cx
                .graph()
                .element(id)
                .ok_or_else(|| unresolved(format!("element #{}", id.0)))?;
            sanitize(local_name(&element.name))
        }
    };
    Ok(if raw.is_empty() {
        "Anonymous".to_string()
    } else {
        raw
    })
}

/// First free name among `candidate`, `candidate_2`, `candidate_3`, ...
fn disambiguate(cx: &ConversionContext<'_>, candidate: &str) -> Result<SchemaName, ConvertError> {
    if !cx.owners.contains_key(candidate) {
        return Ok(SchemaName::new(candidate));
    }
    let limit = cx.options().name_suffix_limit;
    for n in 2..limit.saturating_add(2) {
        let attempt = format!("{candidate}_{n}");
        if !cx.owners.contains_key(attempt.as_str()) {
            return Ok(SchemaName::new(attempt));
        }
    }
    Err(ConvertError::NameCollision {
        name: candidate.to_string(),
        attempts: limit,
    })
}

/// Replace characters outside `[A-Za-z0-9._-]` with `_`.
pub(crate) fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// PascalCase name for an anonymous type from its defining context.
///
/// `Order/shipping-address` → `OrderShippingAddress`.
pub(crate) fn synthesize(context: &str) -> String {
    context
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
