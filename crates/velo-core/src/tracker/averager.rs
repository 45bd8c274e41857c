use heapless::Vec;

use crate::config::SPEED_SAMPLE_COUNT;

/// Smoothed speed built from batches of window speeds.
///
/// Samples are collected into a fixed batch of [`SPEED_SAMPLE_COUNT`]. Each
/// full batch is averaged and then blended 50/50 into the running value, so
/// a single fast window only moves the display half way.
#[derive(Debug, Clone, Default)]
pub struct SpeedAverager {
    batch: Vec<f32, SPEED_SAMPLE_COUNT>,
    average: f32,
}

impl SpeedAverager {
    pub const fn new() -> Self {
        Self {
            batch: Vec::new(),
            average: 0.0,
        }
    }

    /// Add a window speed in km/h.
    ///
    /// Returns `true` if the batch completed and the average changed.
    pub fn push(&mut self, speed_kmh: f32) -> bool {
        let pushed = self.batch.push(speed_kmh);
        debug_assert!(pushed.is_ok(), "full batches are drained on push");
        if !self.batch.is_full() {
            return false;
        }

        let mean = self.batch.iter().sum::<f32>() / SPEED_SAMPLE_COUNT as f32;
        self.average = if self.average == 0.0 {
            mean
        } else {
            (self.average + mean) / 2.0
        };
        self.batch.clear();
        true
    }

    /// Current smoothed speed in km/h, 0 until the first batch completes
    pub const fn average(&self) -> f32 {
        self.average
    }

    pub fn reset(&mut self) {
        self.batch.clear();
        self.average = 0.0;
    }
}
