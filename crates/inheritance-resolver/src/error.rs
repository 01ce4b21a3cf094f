//! Error types for inheritance resolution

use pin_graph::GraphError;
use thiserror::Error;

/// Result type alias using ResolveError
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Errors that can occur while resolving an inheritance chain
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A document inherits from a name no document carries
    #[error("document '{document}' inherits unknown document '{inherits}'")]
    UnknownDocument { document: String, inherits: String },

    /// Two documents share a name
    #[error("multiple documents named '{0}'")]
    DuplicateDocument(String),

    /// A document node lacks one of its connection pins
    #[error("node for document '{document}' has no free '{pin}' pin")]
    MissingPin { document: String, pin: String },

    /// The merge function refused a document
    #[error("failed to merge document '{document}': {message}")]
    Merge { document: String, message: String },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Error from the underlying graph
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// Document parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ResolveError {
    /// Create a merge error for a document
    pub fn merge(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Merge {
            document: document.into(),
            message: message.into(),
        }
    }
}
