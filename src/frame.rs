use crate::color::error::{ColorError, Result};

/// Bytes per packed RGB8 pixel.
pub const CHANNELS: usize = 3;

/// A single captured frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw pixel data (RGB, row-major).
    pub data: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Capture timestamp in microseconds.
    pub timestamp_us: u64,
}

impl Frame {
    /// Wrap a packed RGB buffer, checking that it matches the dimensions.
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_us: u64) -> Result<Self> {
        let frame = Self {
            data,
            width,
            height,
            timestamp_us,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// A frame where every pixel has the same colour.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }
        Self {
            data,
            width,
            height,
            timestamp_us: 0,
        }
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Check that the buffer holds exactly `width * height` RGB pixels.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ColorError::InvalidFrame(format!(
                "zero-sized frame {}x{}",
                self.width, self.height
            )));
        }
        let expected = self.stride() * self.height as usize;
        if self.data.len() != expected {
            return Err(ColorError::InvalidFrame(format!(
                "buffer holds {} bytes, {}x{} RGB needs {expected}",
                self.data.len(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }

    /// RGB value at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.stride() + x as usize * CHANNELS;
        let px = self.data.get(idx..idx + CHANNELS)?;
        Some([px[0], px[1], px[2]])
    }

    /// Left-right flip into a new frame. Applying it twice restores the
    /// original pixel arrangement.
    pub fn mirrored(&self) -> Frame {
        let mut out = self.clone();
        out.mirror_in_place();
        out
    }

    /// Left-right flip of each row in place.
    pub fn mirror_in_place(&mut self) {
        let stride = self.stride();
        if stride == 0 {
            return;
        }
        for row in self.data.chunks_exact_mut(stride) {
            let width = row.len() / CHANNELS;
            for x in 0..width / 2 {
                let left = x * CHANNELS;
                let right = (width - 1 - x) * CHANNELS;
                for c in 0..CHANNELS {
                    row.swap(left + c, right + c);
                }
            }
        }
    }
}

impl From<image::RgbImage> for Frame {
    fn from(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            data: img.into_raw(),
            width,
            height,
            timestamp_us: 0,
        }
    }
}
