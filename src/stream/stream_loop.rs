use parking_lot::Mutex;
use std::iter::FusedIterator;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::capture::error::CaptureError;
use crate::capture::source::CaptureSource;
use crate::color::deficiency::ModeSelector;
use crate::color::engine::ColorTransform;
use crate::diagnostics::stats::StreamStats;
use crate::frame::Frame;
use crate::stream::encode::{EncodedFrame, FrameEncoder};

/// Drives capture → transform → mirror → encode, one frame per `next()`.
///
/// The sequence is infinite until the capture source fails or reports
/// end-of-stream; after that it yields `None` forever. Frames that are
/// malformed or fail to encode are skipped without ending the sequence.
///
/// A cancel check set with [`StreamLoop::with_cancel`] runs before every
/// capture read, skipped frames included, so a loop whose consumer has gone
/// stops even when it never yields.
pub struct StreamLoop<S, E> {
    source: S,
    encoder: E,
    engine: Arc<ColorTransform>,
    mode: ModeSelector,
    stats: Arc<Mutex<StreamStats>>,
    cancel: Option<CancelCheck>,
    finished: bool,
}

type CancelCheck = Box<dyn Fn() -> bool + Send>;

impl<S: CaptureSource, E: FrameEncoder> StreamLoop<S, E> {
    pub fn new(source: S, encoder: E, engine: Arc<ColorTransform>, mode: ModeSelector) -> Self {
        Self {
            source,
            encoder,
            engine,
            mode,
            stats: Arc::new(Mutex::new(StreamStats::new())),
            cancel: None,
            finished: false,
        }
    }

    /// End the sequence as soon as `cancelled` returns true.
    pub fn with_cancel(mut self, cancelled: impl Fn() -> bool + Send + 'static) -> Self {
        self.cancel = Some(Box::new(cancelled));
        self
    }

    /// Report into shared stats instead of a private counter set.
    pub fn with_stats(mut self, stats: Arc<Mutex<StreamStats>>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> &Arc<Mutex<StreamStats>> {
        &self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|cancelled| cancelled())
    }

    /// Transform and mirror one frame. `None` means the frame was skipped.
    fn compensate(&self, frame: Frame) -> Option<Frame> {
        if let Err(e) = frame.validate() {
            warn!("skipping malformed frame: {e}");
            self.stats.lock().record_invalid();
            return None;
        }

        let mode = self.mode.get();
        let processed = if mode.is_passthrough() {
            frame
        } else {
            match self.engine.transform(&frame, mode) {
                Ok(out) => out,
                Err(e) => {
                    warn!("skipping frame, {mode} transform failed: {e}");
                    self.stats.lock().record_invalid();
                    return None;
                }
            }
        };

        Some(processed.mirrored())
    }
}

impl<S: CaptureSource, E: FrameEncoder> Iterator for StreamLoop<S, E> {
    type Item = EncodedFrame;

    fn next(&mut self) -> Option<EncodedFrame> {
        if self.finished {
            return None;
        }

        loop {
            if self.is_cancelled() {
                info!("stream cancelled");
                self.finished = true;
                return None;
            }

            let frame = match self.source.read_frame() {
                Ok(frame) => frame,
                Err(CaptureError::EndOfStream) => {
                    info!("capture reached end of stream");
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    warn!("capture failed, ending stream: {e}");
                    self.finished = true;
                    return None;
                }
            };

            let started = Instant::now();
            let Some(output) = self.compensate(frame) else {
                continue;
            };

            match self.encoder.encode(&output) {
                Ok(encoded) => {
                    self.stats
                        .lock()
                        .record_frame(encoded.bytes.len(), started.elapsed());
                    return Some(encoded);
                }
                Err(e) => {
                    warn!("dropping frame {}: {e}", output.timestamp_us);
                    self.stats.lock().record_drop();
                }
            }
        }
    }
}

impl<S: CaptureSource, E: FrameEncoder> FusedIterator for StreamLoop<S, E> {}
