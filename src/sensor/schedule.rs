//! Delay between consecutive samples, in whole seconds.

use rand::Rng;
use std::time::Duration;

/// Fixed or randomized wait between readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelaySchedule {
    min: u32,
    max: u32,
    randomize: bool,
}

impl DelaySchedule {
    pub fn new(min: u32, max: u32, randomize: bool) -> Self {
        Self { min, max, randomize }
    }

    pub fn fixed(seconds: u32) -> Self {
        Self::new(seconds, seconds, false)
    }

    /// Apply the start-time invariants: the minimum is at least one second,
    /// and a randomized schedule whose bounds are inverted or equal collapses
    /// to a fixed delay of `min`.
    pub fn normalized(self) -> Self {
        let min = self.min.max(1);
        let max = if self.randomize && min >= self.max {
            min
        } else {
            self.max
        };
        Self { min, max, randomize: self.randomize }
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_randomized(&self) -> bool {
        self.randomize
    }

    /// Seconds to wait before the next sample: `min` when fixed, otherwise a
    /// uniform draw from `[min, max)`.
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let min = self.min.max(1);
        if !self.randomize || self.max <= min {
            return min;
        }
        rng.random_range(min..self.max)
    }

    pub fn next_duration<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_secs(self.next_delay(rng).into())
    }
}
