//! Frame timing and FPS history

use bevy_ecs::prelude::*;

/// Longest frame step fed to behaviours, in seconds
pub const MAX_DELTA: f32 = 1.0;

/// Number of frames kept by [`FpsTracker`]
pub const FPS_HISTORY: usize = 128;

/// Per-frame clock, stored as a world resource
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct Timing {
    /// Seconds since start at the current frame
    pub current_frame: f32,
    pub last_frame: f32,
    /// Clamped to [`MAX_DELTA`]
    pub delta: f32,
}

impl Timing {
    pub fn new(start: f32) -> Self {
        Self {
            current_frame: start,
            last_frame: start,
            delta: 0.0,
        }
    }

    /// Move the clock to `now` and return the clamped step
    pub fn advance(&mut self, now: f32) -> f32 {
        self.last_frame = self.current_frame;
        self.current_frame = now;
        self.delta = (self.current_frame - self.last_frame).clamp(0.0, MAX_DELTA);
        self.delta
    }
}

/// Summary of the recorded frame rates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FpsStats {
    pub min: f32,
    pub max: f32,
    pub avg: f32,
}

/// Ring buffer of instantaneous frame rates
#[derive(Debug, Clone)]
pub struct FpsTracker {
    samples: [f32; FPS_HISTORY],
    next: usize,
    filled: usize,
}

impl Default for FpsTracker {
    fn default() -> Self {
        Self {
            samples: [0.0; FPS_HISTORY],
            next: 0,
            filled: 0,
        }
    }
}

impl FpsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `1 / delta`. Zero-length frames are skipped.
    pub fn record(&mut self, delta: f32) {
        if delta <= 0.0 {
            return;
        }
        self.samples[self.next] = 1.0 / delta;
        self.next = (self.next + 1) % FPS_HISTORY;
        self.filled = (self.filled + 1).min(FPS_HISTORY);
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Samples from oldest to newest
    pub fn samples(&self) -> impl Iterator<Item = f32> + '_ {
        let start = if self.filled < FPS_HISTORY { 0 } else { self.next };
        (0..self.filled).map(move |i| self.samples[(start + i) % FPS_HISTORY])
    }

    pub fn stats(&self) -> Option<FpsStats> {
        if self.filled == 0 {
            return None;
        }
        let (mut min, mut max, mut sum) = (f32::MAX, f32::MIN, 0.0);
        for s in self.samples() {
            min = min.min(s);
            max = max.max(s);
            sum += s;
        }
        Some(FpsStats {
            min,
            max,
            avg: sum / self.filled as f32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_clamped_to_one_second() {
        let mut timing = Timing::new(0.0);
        assert!((timing.advance(0.016) - 0.016).abs() < 1e-6);
        assert!((timing.advance(5.0) - 1.0).abs() < 1e-6);
        assert!((timing.last_frame - 0.016).abs() < 1e-6);
    }

    #[test]
    fn stats_cover_recorded_samples_only() {
        let mut fps = FpsTracker::new();
        assert!(fps.stats().is_none());
        fps.record(0.5);
        fps.record(0.25);
        fps.record(0.1);
        let stats = fps.stats().unwrap();
        assert!((stats.min - 2.0).abs() < 1e-5);
        assert!((stats.max - 10.0).abs() < 1e-5);
        assert!((stats.avg - 16.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn ring_wraps_after_history_length() {
        let mut fps = FpsTracker::new();
        fps.record(1.0);
        for _ in 0..FPS_HISTORY {
            fps.record(0.5);
        }
        assert_eq!(fps.len(), FPS_HISTORY);
        let stats = fps.stats().unwrap();
        // the 1 fps sample has been overwritten
        assert!((stats.min - 2.0).abs() < 1e-5);
        assert!((stats.avg - 2.0).abs() < 1e-5);
    }

    #[test]
    fn samples_run_oldest_to_newest() {
        let mut fps = FpsTracker::new();
        for i in 1..=(FPS_HISTORY + 2) {
            fps.record(1.0 / i as f32);
        }
        let samples: Vec<f32> = fps.samples().collect();
        assert!((samples[0] - 3.0).abs() < 1e-3);
        assert!((samples[FPS_HISTORY - 1] - (FPS_HISTORY + 2) as f32).abs() < 1e-2);
    }
}
