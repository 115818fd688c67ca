use thiserror::Error;

use crate::capture::error::CaptureError;
use crate::color::error::ColorError;
use crate::config::ConfigError;

/// Startup and top-level serving errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("colour transform: {0}")]
    Color(#[from] ColorError),

    #[error("capture: {0}")]
    Capture(#[from] CaptureError),

    #[error("server: {0}")]
    Server(std::io::Error),
}
