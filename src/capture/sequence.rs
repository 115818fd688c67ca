use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::capture::error::{CaptureError, Result};
use crate::capture::source::{CaptureSource, FramePacer};
use crate::frame::Frame;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Replays a directory of still images as a video feed, in file-name order.
pub struct ImageSequence {
    dir: PathBuf,
    paths: Vec<PathBuf>,
    next: usize,
    looping: bool,
    pacer: FramePacer,
    started: Instant,
}

impl ImageSequence {
    /// Scan `dir` for image files. Fails if it cannot be read or holds no
    /// images.
    pub fn open(dir: impl AsRef<Path>, fps: f32, looping: bool) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let paths = list_images(&dir)?;
        if paths.is_empty() {
            return Err(CaptureError::Open(format!(
                "no images found in {}",
                dir.display()
            )));
        }
        tracing::info!("image sequence: {} frames from {}", paths.len(), dir.display());
        Ok(Self {
            dir,
            paths,
            next: 0,
            looping,
            pacer: FramePacer::new(fps),
            started: Instant::now(),
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Image files directly inside `dir`, sorted by name.
fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if is_image && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

impl CaptureSource for ImageSequence {
    fn read_frame(&mut self) -> Result<Frame> {
        if self.next >= self.paths.len() {
            if !self.looping {
                return Err(CaptureError::EndOfStream);
            }
            self.next = 0;
        }
        self.pacer.wait();

        // Advance first so a corrupt file is skipped by the next reader.
        let path = &self.paths[self.next];
        self.next += 1;
        let img = image::open(path)
            .map_err(|e| CaptureError::Decode(format!("{}: {e}", path.display())))?;

        let mut frame = Frame::from(img.to_rgb8());
        frame.timestamp_us = self.started.elapsed().as_micros() as u64;
        Ok(frame)
    }

    fn describe(&self) -> String {
        format!("images from {}", self.dir.display())
    }
}
