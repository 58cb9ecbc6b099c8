//! Pull sink: readings computed on demand.
//!
//! No background loop is involved. Each `read` advances the walk by one
//! step and returns the result, so the sample rate is whatever rate the
//! caller asks at.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Mutex, PoisonError};

use crate::config::SensorConfig;
use crate::error::SimError;
use crate::sensor::{Reading, SensorState, claim};

struct Walker {
    state: SensorState,
    rng: StdRng,
}

pub struct PullSink {
    id: String,
    assigned: bool,
    walker: Mutex<Walker>,
}

impl PullSink {
    pub fn new(config: &SensorConfig, mut rng: StdRng) -> Self {
        let state = SensorState::from_config(config, &mut rng);
        Self {
            id: state.id().to_string(),
            assigned: false,
            walker: Mutex::new(Walker { state, rng }),
        }
    }

    pub fn from_os_rng(config: &SensorConfig) -> Self {
        Self::new(config, StdRng::from_os_rng())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Attach this sensor to its route. Fails on the second call.
    pub fn assign(&mut self) -> Result<(), SimError> {
        claim(&mut self.assigned, &self.id)
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned
    }

    /// Compute and return the next reading.
    pub fn read(&self) -> Reading {
        let mut guard = self.walker.lock().unwrap_or_else(PoisonError::into_inner);
        let Walker { state, rng } = &mut *guard;
        state.next_reading(rng)
    }
}
