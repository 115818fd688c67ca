// Capture domain — frame sources feeding the stream loop.

pub mod error;
pub mod sequence;
pub mod source;
pub mod synthetic;
