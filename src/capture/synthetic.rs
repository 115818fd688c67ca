use std::time::Instant;

use crate::capture::error::{CaptureError, Result};
use crate::capture::source::{CaptureSource, FramePacer};
use crate::frame::Frame;

/// SMPTE-style bars: white, yellow, cyan, green, magenta, red, blue, black.
const COLOR_BARS: [[u8; 3]; 8] = [
    [255, 255, 255],
    [255, 255, 0],
    [0, 255, 255],
    [0, 255, 0],
    [255, 0, 255],
    [255, 0, 0],
    [0, 0, 255],
    [0, 0, 0],
];

/// Simulated camera producing colour bars over a scrolling hue gradient.
///
/// Useful without camera hardware, and as a deterministic source in tests.
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    max_frames: Option<u64>,
    frame_index: u64,
    pacer: FramePacer,
    started: Instant,
}

impl SyntheticCamera {
    /// Create a camera producing `width`x`height` frames at `fps`.
    /// A non-positive `fps` produces frames as fast as they are read.
    pub fn new(width: u32, height: u32, fps: f32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CaptureError::Open(format!(
                "synthetic camera needs non-zero size, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            max_frames: None,
            frame_index: 0,
            pacer: FramePacer::new(fps),
            started: Instant::now(),
        })
    }

    /// Report end-of-stream after `limit` frames.
    pub fn with_max_frames(mut self, limit: u64) -> Self {
        self.max_frames = Some(limit);
        self
    }

    /// Render frame `index` without advancing the camera.
    pub fn render(&self, index: u64) -> Frame {
        let (w, h) = (self.width as usize, self.height as usize);
        let bars_height = h * 2 / 3;
        let mut data = Vec::with_capacity(w * h * 3);

        for y in 0..h {
            for x in 0..w {
                let rgb = if y < bars_height {
                    COLOR_BARS[x * COLOR_BARS.len() / w]
                } else {
                    let pos = (x as u64 + index * 4) % w as u64;
                    hue_ramp(pos as f32 / w as f32)
                };
                data.extend_from_slice(&rgb);
            }
        }

        Frame {
            data,
            width: self.width,
            height: self.height,
            timestamp_us: 0,
        }
    }
}

/// Fully saturated hue at `t` in `[0, 1)`.
fn hue_ramp(t: f32) -> [u8; 3] {
    let h = (t.fract() * 6.0).min(5.999);
    let sector = h as u32;
    let f = ((h - sector as f32) * 255.0) as u8;
    match sector {
        0 => [255, f, 0],
        1 => [255 - f, 255, 0],
        2 => [0, 255, f],
        3 => [0, 255 - f, 255],
        4 => [f, 0, 255],
        _ => [255, 0, 255 - f],
    }
}

impl CaptureSource for SyntheticCamera {
    fn read_frame(&mut self) -> Result<Frame> {
        if self.max_frames.is_some_and(|max| self.frame_index >= max) {
            return Err(CaptureError::EndOfStream);
        }
        self.pacer.wait();

        let mut frame = self.render(self.frame_index);
        frame.timestamp_us = self.started.elapsed().as_micros() as u64;
        self.frame_index += 1;
        Ok(frame)
    }

    fn describe(&self) -> String {
        format!("synthetic {}x{}", self.width, self.height)
    }
}
