//! Configuration for type-graph conversion.

use serde::{Deserialize, Serialize};

/// How per-type translation errors are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticsMode {
    /// Abort the run on the first error (default).
    #[default]
    FailFast,
    /// Record the error against the failing type, substitute an opaque
    /// placeholder and keep translating the remaining types.
    Collect,
}

/// Options for type-graph conversion.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `max-depth`, `name-suffix-limit`).
/// This naming convention is part of the public API contract for config files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConvertOptions {
    /// Maximum traversal depth (stack overflow guard). Every named type,
    /// nested group and inline atomic type entered counts one level.
    pub max_depth: usize,
    /// Error propagation policy.
    pub diagnostics: DiagnosticsMode,
    /// Number of numeric suffixes tried when de-duplicating a schema name
    /// before giving up with a name collision.
    pub name_suffix_limit: usize,
    /// Property name holding the text value of a structured type that
    /// extends an atomic type (simple content with attributes).
    pub text_property: String,
}

impl ConvertOptions {
    pub fn collect_diagnostics(&self) -> bool {
        self.diagnostics == DiagnosticsMode::Collect
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            max_depth: 128,
            diagnostics: DiagnosticsMode::FailFast,
            name_suffix_limit: 1000,
            text_property: "value".to_string(),
        }
    }
}
