use std::time::{Duration, Instant};

use log::debug;

/// Length of the throughput measurement window.
const MEASURE_WINDOW: Duration = Duration::from_secs(1);

/// Measured throughput plus the target rate used to pace the main loop.
#[derive(Debug, Clone)]
pub struct CadenceController {
    fast_fps: u32,
    slow_fps: u32,
    target_fps: u32,
    measured_fps: f64,
    frame_count: u32,
    window_start: Instant,
}

impl CadenceController {
    /// Starts on the fast rate with no measurement yet.
    pub fn new(fast_fps: u32, slow_fps: u32, now: Instant) -> Self {
        Self {
            fast_fps,
            slow_fps,
            target_fps: fast_fps,
            measured_fps: 0.0,
            frame_count: 0,
            window_start: now,
        }
    }

    pub fn record_frame_processed(&mut self) {
        self.frame_count += 1;
    }

    /// Close the window once a second has passed. Returns the new estimate
    /// when it changed, otherwise the last value stays current.
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < MEASURE_WINDOW {
            return None;
        }

        self.measured_fps = f64::from(self.frame_count) / elapsed.as_secs_f64();
        debug!(
            "measured {:.1} fps over {} frames, target {}",
            self.measured_fps, self.frame_count, self.target_fps
        );
        self.frame_count = 0;
        self.window_start = now;
        Some(self.measured_fps)
    }

    pub fn set_target(&mut self, fast: bool) {
        self.target_fps = if fast { self.fast_fps } else { self.slow_fps };
    }

    /// Soft pacing delay, whole milliseconds.
    pub fn delay_for_next_frame(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.target_fps.max(1)))
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    pub fn measured_fps(&self) -> f64 {
        self.measured_fps
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }
}
