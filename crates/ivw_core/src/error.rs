//! Error types for the core primitives

use thiserror::Error;

/// Errors raised by the core primitives
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// An integer did not map onto an invalidation level
    #[error("unknown invalidation level: {0}")]
    UnknownInvalidationLevel(u8),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CoreError>;
