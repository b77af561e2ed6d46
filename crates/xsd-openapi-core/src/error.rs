//! Error types for type-graph conversion.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unresolved type reference at {path}: {reference}")]
    UnresolvedTypeReference { path: String, reference: String },

    #[error("Invalid narrowing at {path}: {message}")]
    InvalidNarrowing { path: String, message: String },

    #[error("Unsupported construct at {path}: {construct}")]
    UnsupportedConstruct { path: String, construct: String },

    #[error("Name collision for '{name}': no free name after {attempts} suffixes")]
    NameCollision { name: String, attempts: usize },

    #[error("Depth limit exceeded at {path} (max: {max_depth})")]
    DepthLimitExceeded { path: String, max_depth: usize },

    #[error("Unknown root {kind} '{name}'")]
    UnknownRoot { kind: String, name: String },

    #[error("Registry entry '{name}' was reserved but never filled")]
    IncompleteRegistry { name: String },
}

impl ConvertError {
    /// Whether the error is scoped to the type being translated.
    ///
    /// Recoverable errors can be recorded as diagnostics in collect mode;
    /// everything else aborts the run regardless of mode.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ConvertError::UnresolvedTypeReference { .. }
                | ConvertError::InvalidNarrowing { .. }
                | ConvertError::UnsupportedConstruct { .. }
                | ConvertError::DepthLimitExceeded { .. }
        )
    }

    /// The graph location the error was raised at, when it has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            ConvertError::UnresolvedTypeReference { path, .. }
            | ConvertError::InvalidNarrowing { path, .. }
            | ConvertError::UnsupportedConstruct { path, .. }
            | ConvertError::DepthLimitExceeded { path, .. } => Some(path),
            _ => None,
        }
    }

    pub(crate) fn unsupported(path: &str, construct: impl Into<String>) -> Self {
        ConvertError::UnsupportedConstruct {
            path: path.to_string(),
            construct: construct.into(),
        }
    }

    pub(crate) fn narrowing(path: &str, message: impl Into<String>) -> Self {
        ConvertError::InvalidNarrowing {
            path: path.to_string(),
            message: message.into(),
        }
    }
}
