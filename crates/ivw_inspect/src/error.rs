//! Inspect errors

use ivw_camera::CameraError;
use ivw_processor::ProcessorError;
use ivw_property::PropertyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Processor(#[from] ProcessorError),

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error(transparent)]
    Camera(#[from] CameraError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, InspectError>;
