//! Frame clock: turns frame timestamps into simulation deltas

use crate::consts::MAX_FRAME_DELTA_MS;

#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_timestamp: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta (ms) since the previous frame.
    ///
    /// The first frame and any timestamp that goes backwards yield 0. Long
    /// gaps are clamped so a hidden tab doesn't dump seconds into one tick.
    pub fn advance(&mut self, timestamp: f64) -> f64 {
        let delta = match self.last_timestamp {
            Some(last) if timestamp > last => (timestamp - last).min(MAX_FRAME_DELTA_MS),
            _ => 0.0,
        };
        if self.last_timestamp.is_none_or(|last| timestamp > last) {
            self.last_timestamp = Some(timestamp);
        }
        delta
    }

    /// Forget the last timestamp (after a restart or resume)
    pub fn reset(&mut self) {
        self.last_timestamp = None;
    }
}
