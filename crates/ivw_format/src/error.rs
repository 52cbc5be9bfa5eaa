//! Data format lookup errors

use ivw_core::SourceContext;
use thiserror::Error;

/// Raised when a format id, name or structural triple has no descriptor, or
/// when a runtime dispatch cannot be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataFormatError {
    #[error("no data format named '{name}' (raised in {context})")]
    UnknownName { name: String, context: SourceContext },

    #[error("unsupported data format: {what} (raised in {context})")]
    Unsupported { what: String, context: SourceContext },

    #[error("data format index {index} is outside the format table (raised in {context})")]
    InvalidIndex { index: usize, context: SourceContext },

    #[error("cannot dispatch on an unspecialized data format (raised in {context})")]
    NotSpecialized { context: SourceContext },

    #[error("{format} values take {expected} bytes, got {actual} (raised in {context})")]
    BufferSize {
        format: String,
        expected: usize,
        actual: usize,
        context: SourceContext,
    },
}

impl DataFormatError {
    /// Where the error was raised
    pub fn context(&self) -> &SourceContext {
        match self {
            DataFormatError::UnknownName { context, .. }
            | DataFormatError::Unsupported { context, .. }
            | DataFormatError::InvalidIndex { context, .. }
            | DataFormatError::NotSpecialized { context }
            | DataFormatError::BufferSize { context, .. } => context,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, DataFormatError>;
