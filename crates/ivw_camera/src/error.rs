//! Camera errors

use ivw_core::SourceContext;
use ivw_property::PropertyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("{camera} has no parameter '{parameter}' (raised in {context})")]
    UnsupportedParameter {
        parameter: &'static str,
        camera: &'static str,
        context: SourceContext,
    },

    #[error(transparent)]
    Property(#[from] PropertyError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CameraError>;
