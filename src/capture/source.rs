use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::capture::error::Result;
use crate::frame::Frame;

/// Pull-based frame source.
///
/// Implementations may block until a frame is ready. An `Err` is final:
/// callers treat it as the end of the stream and do not read again.
pub trait CaptureSource: Send {
    /// Read the next frame, or report why none is available.
    fn read_frame(&mut self) -> Result<Frame>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

/// The process-wide capture source, shared by every stream.
///
/// Acquired once at startup. Each read holds the lock for exactly one frame,
/// so concurrent streams interleave frame by frame.
#[derive(Clone)]
pub struct SharedCapture {
    inner: Arc<Mutex<Box<dyn CaptureSource>>>,
}

impl SharedCapture {
    pub fn new(source: Box<dyn CaptureSource>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(source)),
        }
    }
}

impl CaptureSource for SharedCapture {
    fn read_frame(&mut self) -> Result<Frame> {
        self.inner.lock().read_frame()
    }

    fn describe(&self) -> String {
        self.inner.lock().describe()
    }
}

/// Sleeps between reads so a source delivers frames at a fixed rate.
#[derive(Debug)]
pub struct FramePacer {
    interval: Option<Duration>,
    next_deadline: Option<Instant>,
}

impl FramePacer {
    /// Pace at `fps`. A non-positive rate disables pacing.
    pub fn new(fps: f32) -> Self {
        let interval = (fps > 0.0).then(|| Duration::from_secs_f64(1.0 / f64::from(fps)));
        Self {
            interval,
            next_deadline: None,
        }
    }

    /// Block until the next frame slot. The first call returns immediately.
    pub fn wait(&mut self) {
        let Some(interval) = self.interval else {
            return;
        };
        let now = Instant::now();
        match self.next_deadline {
            Some(deadline) if deadline > now => {
                std::thread::sleep(deadline - now);
                self.next_deadline = Some(deadline + interval);
            }
            // First frame, or we fell behind: restart the schedule from now.
            _ => self.next_deadline = Some(now + interval),
        }
    }
}
