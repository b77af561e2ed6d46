//! Output assembly: drive a conversion run from its roots to a [`Document`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConvertOptions;
use crate::context::ConversionContext;
use crate::diagnostics::Diagnostic;
use crate::error::ConvertError;
use crate::graph::{TypeGraph, TypeName};
use crate::schema::{Document, SchemaName};
use crate::translate::{element_reference, type_reference};

/// A requested root: a named type or a global element, by (qualified or
/// local) name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RootRef {
    Type(String),
    Element(String),
}

impl RootRef {
    pub fn type_name(name: impl Into<String>) -> Self {
        RootRef::Type(name.into())
    }

    pub fn element(name: impl Into<String>) -> Self {
        RootRef::Element(name.into())
    }
}

impl fmt::Display for RootRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootRef::Type(name) => write!(f, "type:{name}"),
            RootRef::Element(name) => write!(f, "element:{name}"),
        }
    }
}

impl std::str::FromStr for RootRef {
    type Err = String;

    /// Parse `type:Name` or `element:Name`; a bare name is a type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(name) = s.strip_prefix("type:") {
            Ok(RootRef::type_name(name))
        } else if let Some(name) = s.strip_prefix("element:") {
            Ok(RootRef::element(name))
        } else if s.is_empty() {
            Err("empty root name".to_string())
        } else {
            Ok(RootRef::type_name(s))
        }
    }
}

/// Result of a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    pub document: Document,
    /// Per-type failures recovered from; always empty in fail-fast mode.
    pub diagnostics: Vec<Diagnostic>,
}

/// Convert the types reachable from `roots` into a schema [`Document`].
///
/// The registry lists schemas in the order they were first encountered, so
/// the same graph and roots always produce the same document. Unknown roots
/// are fatal in every diagnostics mode.
///
/// # Errors
///
/// In fail-fast mode, the first translation error. In collect mode, only
/// run-fatal errors ([`ConvertError::is_recoverable`] is false).
pub fn convert(
    graph: &TypeGraph,
    roots: &[RootRef],
    options: &ConvertOptions,
) -> Result<ConvertResult, ConvertError> {
    let mut cx = ConversionContext::new(graph, options);
    let mut root_names: Vec<SchemaName> = Vec::with_capacity(roots.len());

    for root in roots {
        let path = root.to_string();
        let name = match root {
            RootRef::Type(name) => {
                let id = graph.type_id(name).ok_or_else(|| unknown_root("type", name))?;
                type_reference(&mut cx, id, &path)?
            }
            RootRef::Element(name) => {
                let id = graph
                    .element_id(name)
                    .ok_or_else(|| unknown_root("element", name))?;
                element_reference(&mut cx, id, &path)?
            }
        };
        if !root_names.contains(&name) {
            root_names.push(name);
        }
    }

    let (document, diagnostics) = cx.finish(root_names)?;
    tracing::info!(
        schemas = document.registry.len(),
        roots = document.roots.len(),
        diagnostics = diagnostics.len(),
        "conversion complete"
    );
    Ok(ConvertResult {
        document,
        diagnostics,
    })
}

/// Convert every named type (in declaration order), then every global
/// element.
pub fn convert_all(graph: &TypeGraph, options: &ConvertOptions) -> Result<ConvertResult, ConvertError> {
    convert(graph, &all_roots(graph), options)
}

/// Every named type and global element of `graph` as roots.
pub fn all_roots(graph: &TypeGraph) -> Vec<RootRef> {
    let types = graph.types().filter_map(|(_, node)| match &node.name {
        TypeName::Qualified(name) => Some(RootRef::type_name(name.clone())),
        TypeName::Anonymous { .. } => None,
    });
    let elements = graph
        .elements()
        .map(|(_, element)| RootRef::element(element.name.clone()));
    types.chain(elements).collect()
}

fn unknown_root(kind: &str, name: &str) -> ConvertError {
    ConvertError::UnknownRoot {
        kind: kind.to_string(),
        name: name.to_string(),
    }
}
