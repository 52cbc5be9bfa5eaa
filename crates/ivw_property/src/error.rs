//! Property errors

use ivw_core::SourceContext;
use thiserror::Error;

/// Boxed error returned by fallible change observers
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("property '{identifier}' already exists in '{owner}' (raised in {context})")]
    DuplicateIdentifier {
        identifier: String,
        owner: String,
        context: SourceContext,
    },

    #[error("'{identifier}' is not a valid property identifier (raised in {context})")]
    InvalidIdentifier {
        identifier: String,
        context: SourceContext,
    },

    #[error("no property at '{path}' (raised in {context})")]
    NotFound { path: String, context: SourceContext },

    #[error("property '{identifier}' does not hold a {expected} (raised in {context})")]
    TypeMismatch {
        identifier: String,
        expected: &'static str,
        context: SourceContext,
    },

    #[error("property '{identifier}' has no option '{option}' (raised in {context})")]
    UnknownOption {
        identifier: String,
        option: String,
        context: SourceContext,
    },

    /// A change observer failed; the new value stays committed
    #[error("change observer of property '{property}' failed: {source}")]
    Observer {
        property: String,
        #[source]
        source: BoxError,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PropertyError>;
