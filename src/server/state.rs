use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::capture::source::{CaptureSource, SharedCapture};
use crate::color::deficiency::ModeSelector;
use crate::color::engine::ColorTransform;
use crate::diagnostics::stats::StreamStats;
use crate::stream::encode::JpegEncoder;
use crate::stream::stream_loop::StreamLoop;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub capture: SharedCapture,
    pub engine: Arc<ColorTransform>,
    pub mode: ModeSelector,
    pub encoder: JpegEncoder,
    pub stats: Arc<Mutex<StreamStats>>,
    /// Set once the server starts shutting down; running streams stop at
    /// their next frame.
    pub shutdown: Arc<AtomicBool>,
    pub active_streams: Arc<AtomicUsize>,
    /// Captured at startup so diagnostics never wait on the capture lock.
    pub source_name: Arc<str>,
}

impl AppState {
    pub fn new(
        capture: SharedCapture,
        engine: Arc<ColorTransform>,
        mode: ModeSelector,
        encoder: JpegEncoder,
    ) -> Self {
        let source_name = Arc::from(capture.describe());
        Self {
            capture,
            engine,
            mode,
            encoder,
            stats: Arc::new(Mutex::new(StreamStats::new())),
            shutdown: Arc::new(AtomicBool::new(false)),
            active_streams: Arc::new(AtomicUsize::new(0)),
            source_name,
        }
    }

    /// A fresh stream loop over the shared capture source and mode.
    pub fn stream_loop(&self) -> StreamLoop<SharedCapture, JpegEncoder> {
        StreamLoop::new(
            self.capture.clone(),
            self.encoder,
            Arc::clone(&self.engine),
            self.mode.clone(),
        )
        .with_stats(Arc::clone(&self.stats))
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub fn active_stream_count(&self) -> usize {
        self.active_streams.load(Ordering::Relaxed)
    }
}
