//! Diagnostics recorded in collect mode when a type fails to translate.

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// A per-type translation failure that was recovered from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Schema name the failure was recorded against (its registry entry holds
    /// an opaque placeholder).
    pub schema: String,
    /// Graph location where the error was raised (e.g. "Order/line/price").
    pub path: String,
    /// Classification of the failure.
    pub kind: DiagnosticKind,
    /// Human-readable description.
    pub message: String,
}

/// Classification of diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiagnosticKind {
    UnresolvedTypeReference { reference: String },
    InvalidNarrowing,
    UnsupportedConstruct { construct: String },
    DepthLimitExceeded { max_depth: usize },
}

impl Diagnostic {
    /// Build a diagnostic from a recoverable error; `None` for run-fatal ones.
    pub(crate) fn from_error(schema: &str, err: &ConvertError) -> Option<Self> {
        let kind = match err {
            ConvertError::UnresolvedTypeReference { reference, .. } => {
                DiagnosticKind::UnresolvedTypeReference {
                    reference: reference.clone(),
                }
            }
            ConvertError::InvalidNarrowing { .. } => DiagnosticKind::InvalidNarrowing,
            ConvertError::UnsupportedConstruct { construct, .. } => {
                DiagnosticKind::UnsupportedConstruct {
                    construct: construct.clone(),
                }
            }
            ConvertError::DepthLimitExceeded { max_depth, .. } => {
                DiagnosticKind::DepthLimitExceeded {
                    max_depth: *max_depth,
                }
            }
            _ => return None,
        };
        Some(Self {
            schema: schema.to_string(),
            path: err.path().unwrap_or(schema).to_string(),
            kind,
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_recoverable_error() {
        let err = ConvertError::UnresolvedTypeReference {
            path: "Order/line".to_string(),
            reference: "Line".to_string(),
        };
        let diag = Diagnostic::from_error("Order", &err).unwrap();
        assert_eq!(diag.schema, "Order");
        assert_eq!(diag.path, "Order/line");
        assert_eq!(
            serde_json::to_value(&diag.kind).unwrap(),
            json!({ "type": "unresolved_type_reference", "reference": "Line" })
        );
    }

    #[test]
    fn test_fatal_error_has_no_diagnostic() {
        let err = ConvertError::NameCollision {
            name: "Order".to_string(),
            attempts: 10,
        };
        assert!(Diagnostic::from_error("Order", &err).is_none());
    }
}
