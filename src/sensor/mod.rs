//! Sensor Simulation Engine
//!
//! Everything needed to turn a sensor configuration into a stream of
//! readings: the random walk that produces values, the delay schedule
//! between samples, and the lifecycle that drives both on a background task.

pub mod lifecycle;
pub mod schedule;
pub mod walk;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SensorConfig;
use crate::error::SimError;

pub use lifecycle::SensorSimulator;
pub use schedule::DelaySchedule;
pub use walk::{Step, choose_step};

/// One produced sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub seq: u64,
}

/// Mutable walk state for a single sensor.
///
/// Owned by exactly one simulator (or one pull sink); never shared.
#[derive(Debug, Clone)]
pub struct SensorState {
    id: String,
    mean: f64,
    spread: f64,
    current_value: f64,
    sequence: u64,
    alias: u64,
}

impl SensorState {
    /// Create the state for `id`, drawing the starting value and the alias
    /// from `rng`.
    pub fn new<R: Rng + ?Sized>(id: impl Into<String>, mean: f64, spread: f64, rng: &mut R) -> Self {
        Self {
            id: id.into(),
            mean,
            spread: spread.abs(),
            current_value: mean - rng.random::<f64>(),
            sequence: 0,
            alias: 100 + rng.random_range(0..10_000u64),
        }
    }

    pub fn from_config<R: Rng + ?Sized>(config: &SensorConfig, rng: &mut R) -> Self {
        Self::new(
            config.sensor_id.clone(),
            config.mean,
            config.standard_deviation,
            rng,
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn spread(&self) -> f64 {
        self.spread
    }

    pub fn current_value(&self) -> f64 {
        self.current_value
    }

    /// Number of readings produced so far.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn alias(&self) -> u64 {
        self.alias
    }

    /// Pin the walk to a given value. Used to probe the walk from a known
    /// position.
    pub fn set_current_value(&mut self, value: f64) {
        self.current_value = value;
    }
}

/// Flip a one-shot assignment flag, failing if it was already set.
pub(crate) fn claim(assigned: &mut bool, sensor_id: &str) -> Result<(), SimError> {
    if *assigned {
        return Err(SimError::AlreadyAssigned(sensor_id.to_string()));
    }
    *assigned = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_spread_stored_as_absolute() {
        let mut rng = StdRng::seed_from_u64(1);
        let state = SensorState::new("t", 10.0, -2.5, &mut rng);
        assert_eq!(state.spread(), 2.5);
    }

    #[test]
    fn test_initial_value_just_below_mean() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let state = SensorState::new("t", 30.6, 3.1, &mut rng);
            assert!(state.current_value() <= 30.6);
            assert!(state.current_value() > 29.6);
            assert_eq!(state.sequence(), 0);
            assert!((100..10_100).contains(&state.alias()));
        }
    }

    #[test]
    fn test_claim_is_one_shot() {
        let mut assigned = false;
        assert!(claim(&mut assigned, "t").is_ok());
        assert!(matches!(
            claim(&mut assigned, "t"),
            Err(SimError::AlreadyAssigned(id)) if id == "t"
        ));
    }

    #[test]
    fn test_reading_json_shape() {
        let reading = Reading {
            value: 1.5,
            timestamp: DateTime::from_timestamp(0, 0).unwrap(),
            seq: 3,
        };
        let json = serde_json::to_value(reading).unwrap();
        assert_eq!(json["value"], 1.5);
        assert_eq!(json["seq"], 3);
        assert_eq!(json["timestamp"], "1970-01-01T00:00:00Z");
    }
}
