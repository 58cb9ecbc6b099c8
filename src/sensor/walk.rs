//! Mean-Reverting Random Walk
//!
//! Each step moves the value by at most a tenth of the spread. Whether it
//! keeps drifting away from the mean or turns back is a weighted coin flip:
//! the further the value is from the mean, the less likely it keeps going.

use chrono::Utc;
use rand::Rng;

use super::{Reading, SensorState};

/// Sensitivity of the reversion pressure to the distance from the mean.
pub const DISTANCE_DIVISOR: f64 = 50.0;

/// Direction chosen for one step, relative to the mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep moving away from the mean.
    Continue,
    /// Turn back toward the mean.
    Reverse,
}

/// Decide the direction of the next step and return it with its sign.
///
/// `draw` is a uniform sample in `[0, 1)`.
pub fn choose_step(current: f64, mean: f64, spread: f64, draw: f64) -> (Step, f64) {
    let (distance, continue_sign, reverse_sign) = if current > mean {
        (current - mean, 1.0, -1.0)
    } else {
        (mean - current, -1.0, 1.0)
    };

    let chance = spread / 2.0 - distance / DISTANCE_DIVISOR;
    if draw * spread < chance {
        (Step::Continue, continue_sign)
    } else {
        (Step::Reverse, reverse_sign)
    }
}

impl SensorState {
    /// Advance the walk by one step and return the resulting reading.
    pub fn next_reading<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Reading {
        let magnitude = rng.random::<f64>() * self.spread / 10.0;
        let (_, sign) = choose_step(self.current_value, self.mean, self.spread, rng.random());

        self.current_value += magnitude * sign;
        self.sequence += 1;

        Reading {
            value: self.current_value,
            timestamp: Utc::now(),
            seq: self.sequence,
        }
    }
}
