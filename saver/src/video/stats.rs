//! Playback statistics tracking
//!
//! Counts what the presentation surface actually received:
//! - Frames presented (live frames only, poster swaps are not counted)
//! - Completed loops
//! - Decode errors

use common::PresentationStats;
use std::time::{Duration, Instant};

/// Tracks presentation statistics for one playback core
pub struct PlaybackStats {
    counters: PresentationStats,

    /// Detected clip frame rate, for logging
    pub(crate) detected_fps: Option<f64>,

    /// Last time stats were logged
    last_stats_log: Instant,
}

impl PlaybackStats {
    pub fn new() -> Self {
        Self {
            counters: PresentationStats::default(),
            detected_fps: None,
            last_stats_log: Instant::now(),
        }
    }

    pub fn increment_presented(&mut self) {
        self.counters.frames_presented += 1;
    }

    pub fn record_loops(&mut self, loops: u64) {
        self.counters.loops_completed += loops;
    }

    pub fn record_decode_error(&mut self) {
        self.counters.decode_errors += 1;
    }

    pub fn snapshot(&self) -> PresentationStats {
        self.counters
    }

    /// Log statistics if interval has elapsed
    pub fn maybe_log_stats(&mut self, interval: Duration) {
        if self.last_stats_log.elapsed() < interval {
            return;
        }

        log::info!(
            "Playback stats ({:.2} fps source): {} frames presented, {} loops, {} decode errors",
            self.detected_fps.unwrap_or(0.0),
            self.counters.frames_presented,
            self.counters.loops_completed,
            self.counters.decode_errors
        );

        self.last_stats_log = Instant::now();
    }

    /// Reset statistics counters
    pub fn reset(&mut self) {
        self.counters = PresentationStats::default();
        self.detected_fps = None;
        self.last_stats_log = Instant::now();
    }
}

impl Default for PlaybackStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_reset() {
        let mut stats = PlaybackStats::new();
        stats.increment_presented();
        stats.increment_presented();
        stats.record_loops(3);
        stats.record_decode_error();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames_presented, 2);
        assert_eq!(snapshot.loops_completed, 3);
        assert_eq!(snapshot.decode_errors, 1);

        stats.reset();
        assert_eq!(stats.snapshot(), PresentationStats::default());
    }
}
