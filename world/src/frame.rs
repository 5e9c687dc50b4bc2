//! Conversion of host frame timestamps into bounded simulation steps.

use std::time::Duration;

use outbreak_core::MAX_TICK_SECONDS;

/// Turns successive host timestamps into clamped tick durations.
///
/// The first frame after construction or [`FrameClock::reset`] only records
/// its timestamp, so time spent paused or backgrounded never reaches the
/// simulation.
#[derive(Clone, Debug, Default)]
pub struct FrameClock {
    last: Option<f64>,
    clamped_frames: u64,
}

impl FrameClock {
    /// Creates a clock that has not observed any frame yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a frame at `timestamp` seconds and returns the step to simulate.
    ///
    /// Timestamps that move backwards yield a zero step.
    pub fn frame(&mut self, timestamp: f64) -> Option<Duration> {
        let previous = self.last.replace(timestamp)?;
        let elapsed = timestamp - previous;
        if !elapsed.is_finite() || elapsed <= 0.0 {
            return Some(Duration::ZERO);
        }
        if elapsed > MAX_TICK_SECONDS {
            self.clamped_frames += 1;
        }
        Some(Duration::from_secs_f64(elapsed.min(MAX_TICK_SECONDS)))
    }

    /// Forgets the last timestamp, typically on pause or resume.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Number of frames whose delta exceeded the tick bound.
    #[must_use]
    pub fn clamped_frames(&self) -> u64 {
        self.clamped_frames
    }
}
