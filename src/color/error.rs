use thiserror::Error;

use crate::color::deficiency::DeficiencyMode;

/// Colour transform errors.
#[derive(Debug, Error)]
pub enum ColorError {
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("unknown deficiency mode: '{0}'")]
    UnknownMode(String),

    #[error("no transform profile for mode '{0}'")]
    UnsupportedMode(DeficiencyMode),

    #[error("transform configuration error: {0}")]
    Configuration(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, ColorError>;
