//! Processor errors

use ivw_core::SourceContext;
use ivw_format::DataFormatError;
use ivw_property::PropertyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("port '{port}' already exists in processor '{processor}' (raised in {context})")]
    DuplicatePort {
        port: String,
        processor: String,
        context: SourceContext,
    },

    #[error("inport '{inport}' accepts at most {max} connection(s) (raised in {context})")]
    ConnectionLimit {
        inport: String,
        max: usize,
        context: SourceContext,
    },

    #[error("'{outport}' is already connected to '{inport}' (raised in {context})")]
    AlreadyConnected {
        outport: String,
        inport: String,
        context: SourceContext,
    },

    #[error("'{outport}' is not connected to '{inport}' (raised in {context})")]
    NotConnected {
        outport: String,
        inport: String,
        context: SourceContext,
    },

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error(transparent)]
    Format(#[from] DataFormatError),

    #[error("processor '{processor}' failed: {message}")]
    Process { processor: String, message: String },

    #[error("background job failed: {0}")]
    Job(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ProcessorError>;
