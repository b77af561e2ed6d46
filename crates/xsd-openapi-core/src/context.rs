//! Per-run mutable state threaded through every translation call.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use regex::Regex;

use crate::config::ConvertOptions;
use crate::diagnostics::Diagnostic;
use crate::error::ConvertError;
use crate::graph::{ElementId, TypeGraph, TypeId};
use crate::schema::{Document, SchemaName, SchemaObject};

/// Something that can own a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Identity {
    Type(TypeId),
    /// A global element whose type is a built-in and so has no type node.
    Element(ElementId),
}

/// State of one conversion run.
///
/// Created by [`crate::convert`], passed by `&mut` through every translator
/// and consumed into a [`Document`] when the run ends. Never shared between
/// runs.
pub(crate) struct ConversionContext<'a> {
    graph: &'a TypeGraph,
    options: &'a ConvertOptions,
    /// identity → assigned name (memo).
    pub(crate) names: HashMap<Identity, SchemaName>,
    /// assigned name → identity, for collision checks.
    pub(crate) owners: HashMap<SchemaName, Identity>,
    /// Identities whose translation has started but not finished.
    pub(crate) in_progress: HashSet<Identity>,
    /// `None` marks a reserved placeholder.
    pub(crate) registry: IndexMap<SchemaName, Option<SchemaObject>>,
    depth: usize,
    diagnostics: Vec<Diagnostic>,
    regex_cache: HashMap<String, Result<Regex, String>>,
}

impl<'a> ConversionContext<'a> {
    pub(crate) fn new(graph: &'a TypeGraph, options: &'a ConvertOptions) -> Self {
        Self {
            graph,
            options,
            names: HashMap::new(),
            owners: HashMap::new(),
            in_progress: HashSet::new(),
            registry: IndexMap::new(),
            depth: 0,
            diagnostics: Vec::new(),
            regex_cache: HashMap::new(),
        }
    }

    pub(crate) fn graph(&self) -> &'a TypeGraph {
        self.graph
    }

    pub(crate) fn options(&self) -> &'a ConvertOptions {
        self.options
    }

    /// Run `f` one level deeper, failing once the configured ceiling is hit.
    ///
    /// The depth is restored whether or not `f` succeeds, so collect mode can
    /// keep going after a failure.
    pub(crate) fn nested<T>(
        &mut self,
        path: &str,
        f: impl FnOnce(&mut Self) -> Result<T, ConvertError>,
    ) -> Result<T, ConvertError> {
        if self.depth >= self.options.max_depth {
            return Err(ConvertError::DepthLimitExceeded {
                path: path.to_string(),
                max_depth: self.options.max_depth,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// The finished schema registered under `name`; `None` while it is
    /// still a placeholder.
    pub(crate) fn registered(&self, name: &SchemaName) -> Option<&SchemaObject> {
        self.registry.get(name).and_then(Option::as_ref)
    }

    /// Fill a reserved placeholder and mark its owner as finished.
    pub(crate) fn fill(&mut self, identity: Identity, name: &SchemaName, schema: SchemaObject) {
        self.registry.insert(name.clone(), Some(schema));
        self.in_progress.remove(&identity);
    }

    pub(crate) fn record(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Compile (once) a pattern anchored to the whole value.
    ///
    /// Patterns that are not valid for the `regex` dialect yield `None`.
    pub(crate) fn full_match_regex(&mut self, pattern: &str) -> Option<&Regex> {
        let entry = self
            .regex_cache
            .entry(pattern.to_string())
            .or_insert_with(|| {
                let result = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| e.to_string());
                if let Err(e) = &result {
                    tracing::debug!(pattern = %pattern, error = %e, "pattern not checkable");
                }
                result
            });
        entry.as_ref().ok()
    }

    /// Consume the context into the finished document.
    ///
    /// Fails if any reserved placeholder was never filled.
    pub(crate) fn finish(
        self,
        roots: Vec<SchemaName>,
    ) -> Result<(Document, Vec<Diagnostic>), ConvertError> {
        let mut registry = IndexMap::with_capacity(self.registry.len());
        for (name, slot) in self.registry {
            match slot {
                Some(schema) => {
                    registry.insert(name, schema);
                }
                None => {
                    return Err(ConvertError::IncompleteRegistry {
                        name: name.to_string(),
                    })
                }
            }
        }
        let document = Document {
            registry,
            roots,
            target_namespace: self.graph.target_namespace.clone(),
        };
        Ok((document, self.diagnostics))
    }
}
