use serde::Serialize;
use std::time::{Duration, Instant};

/// Collects diagnostic statistics across all stream loops.
pub struct StreamStats {
    frame_count: u64,
    drop_count: u64,
    invalid_count: u64,
    total_bytes: u64,
    start_time: Instant,
    last_frame_time: Option<Instant>,
    processing_us: u64,
}

/// Snapshot of stream stats for JSON serialisation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub fps: f64,
    pub frame_count: u64,
    pub drop_count: u64,
    pub invalid_count: u64,
    pub drop_rate: f64,
    pub processing_ms: f64,
    pub bandwidth_bps: u64,
    pub seconds_since_last_frame: Option<f64>,
}

impl StreamStats {
    /// Create new stats with zeroed counters.
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            drop_count: 0,
            invalid_count: 0,
            total_bytes: 0,
            start_time: Instant::now(),
            last_frame_time: None,
            processing_us: 0,
        }
    }

    /// Record a frame delivered to the transport.
    ///
    /// `processing` covers transform, mirror and encode for that frame.
    pub fn record_frame(&mut self, bytes: usize, processing: Duration) {
        self.frame_count += 1;
        self.total_bytes += bytes as u64;
        self.last_frame_time = Some(Instant::now());
        self.processing_us = processing.as_micros() as u64;
    }

    /// Record a frame skipped because encoding failed.
    pub fn record_drop(&mut self) {
        self.drop_count += 1;
    }

    /// Record a frame skipped because its pixel data was malformed.
    pub fn record_invalid(&mut self) {
        self.invalid_count += 1;
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn drop_count(&self) -> u64 {
        self.drop_count
    }

    pub fn invalid_count(&self) -> u64 {
        self.invalid_count
    }

    /// Calculate current FPS based on elapsed time.
    pub fn fps(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed < 0.001 {
            return 0.0;
        }
        self.frame_count as f64 / elapsed
    }

    /// Share of skipped frames as a percentage (0.0 - 100.0).
    pub fn drop_rate(&self) -> f64 {
        let skipped = self.drop_count + self.invalid_count;
        let total = self.frame_count + skipped;
        if total == 0 {
            return 0.0;
        }
        (skipped as f64 / total as f64) * 100.0
    }

    /// Latest per-frame processing time in milliseconds.
    pub fn processing_ms(&self) -> f64 {
        self.processing_us as f64 / 1000.0
    }

    /// Bandwidth in bytes per second.
    pub fn bandwidth_bps(&self) -> u64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed < 0.001 {
            return 0;
        }
        (self.total_bytes as f64 / elapsed) as u64
    }

    /// Take a serialisable snapshot.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            fps: self.fps(),
            frame_count: self.frame_count,
            drop_count: self.drop_count,
            invalid_count: self.invalid_count,
            drop_rate: self.drop_rate(),
            processing_ms: self.processing_ms(),
            bandwidth_bps: self.bandwidth_bps(),
            seconds_since_last_frame: self.last_frame_time.map(|t| t.elapsed().as_secs_f64()),
        }
    }
}

impl Default for StreamStats {
    fn default() -> Self {
        Self::new()
    }
}
