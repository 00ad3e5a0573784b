//! Bounded rolling log of health samples.
//!
//! Fixed-capacity ring over an `ArrayVec`: a circular write cursor replaces
//! dynamic resizing, so storage is bounded and `record` is O(1).

use arrayvec::ArrayVec;

use crate::state::{HealthSample, BufferParams, MAX_HEALTH_SAMPLES, SCALE};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HealthHistory {
    samples: ArrayVec<HealthSample, MAX_HEALTH_SAMPLES>,
    /// Next slot to write, modulo capacity
    cursor: usize,
}

impl HealthHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Appends a sample, overwriting the oldest once capacity is reached.
    pub fn record(&mut self, sample: HealthSample) {
        if self.samples.is_full() {
            self.samples[self.cursor] = sample;
        } else {
            self.samples.push(sample);
        }
        self.cursor = (self.cursor + 1) % MAX_HEALTH_SAMPLES;
    }

    /// Most recently recorded sample.
    pub fn latest(&self) -> Option<&HealthSample> {
        if self.samples.is_empty() {
            return None;
        }
        let idx = (self.cursor + MAX_HEALTH_SAMPLES - 1) % MAX_HEALTH_SAMPLES;
        self.samples.get(idx)
    }

    /// Smoothing input for the target controller.
    ///
    /// Trailing truncating average over all retained samples; below the
    /// minimum window the most recent sample stands in, and an empty history
    /// reads as neutral health.
    pub fn aggregate(&self, params: &BufferParams) -> u128 {
        let latest = match self.latest() {
            Some(sample) => sample.health,
            None => return SCALE,
        };
        if self.samples.len() < params.min_aggregate_window {
            return latest;
        }
        let sum = self
            .samples
            .iter()
            .fold(0u128, |acc, s| acc.saturating_add(s.health));
        sum / self.samples.len() as u128
    }
}
