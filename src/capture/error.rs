use thiserror::Error;

/// Capture subsystem errors. Any of these ends a stream; none is retried.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("end of stream")]
    EndOfStream,

    #[error("capture source could not be opened: {0}")]
    Open(String),

    #[error("device disconnected: {0}")]
    Disconnected(String),

    #[error("frame decode failed: {0}")]
    Decode(String),

    #[error("capture I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, CaptureError>;
