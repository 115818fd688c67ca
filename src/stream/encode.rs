use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::frame::Frame;

/// Default JPEG quality for the live stream.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Largest width or height a baseline JPEG can carry.
pub const MAX_JPEG_DIMENSION: u32 = u16::MAX as u32;

/// A single frame's encoding failed. The stream skips the frame and carries on.
#[derive(Debug, Error)]
#[error("frame encoding failed: {0}")]
pub struct EncodeError(pub String);

/// A transport-ready compressed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub bytes: Bytes,
    pub content_type: &'static str,
    /// Capture timestamp of the source frame in microseconds.
    pub timestamp_us: u64,
}

/// Compresses frames for the transport.
pub trait FrameEncoder: Send {
    fn encode(&self, frame: &Frame) -> Result<EncodedFrame, EncodeError>;
}

/// Baseline JPEG encoder.
#[derive(Debug, Clone, Copy)]
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    /// Quality is clamped to 1-100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl FrameEncoder for JpegEncoder {
    fn encode(&self, frame: &Frame) -> Result<EncodedFrame, EncodeError> {
        frame.validate().map_err(|e| EncodeError(e.to_string()))?;
        if frame.width > MAX_JPEG_DIMENSION || frame.height > MAX_JPEG_DIMENSION {
            return Err(EncodeError(format!(
                "{}x{} exceeds the JPEG limit of {MAX_JPEG_DIMENSION}",
                frame.width, frame.height
            )));
        }

        let mut buf = Vec::new();
        ImageJpegEncoder::new_with_quality(&mut buf, self.quality)
            .write_image(&frame.data, frame.width, frame.height, ExtendedColorType::Rgb8)
            .map_err(|e| EncodeError(e.to_string()))?;

        Ok(EncodedFrame {
            bytes: Bytes::from(buf),
            content_type: "image/jpeg",
            timestamp_us: frame.timestamp_us,
        })
    }
}
