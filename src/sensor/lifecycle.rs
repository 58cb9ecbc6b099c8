//! Simulator Lifecycle
//!
//! A `SensorSimulator` is either idle, holding its walk state, random source
//! and sink, or running, in which case all three have been moved into the
//! sampling task. Stopping cancels the task and waits for it to hand them
//! back, so the sink is never used after `stop` returns.
//!
//! ```text
//!   Idle ──run()──▶ Running ──stop()──▶ Idle
//!    ▲                 │
//!    └── open() error ─┘ (sink setup failed, nothing spawned)
//! ```

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{DelaySchedule, SensorState, claim};
use crate::config::SensorConfig;
use crate::error::SimError;
use crate::sink::Sink;

/// Everything the sampling loop owns while it runs.
struct Parked<S> {
    state: SensorState,
    rng: StdRng,
    sink: S,
}

struct RunningLoop<S> {
    cancel: CancellationToken,
    done: JoinHandle<Parked<S>>,
}

/// A simulated sensor delivering readings to a sink on a background task.
pub struct SensorSimulator<S: Sink + 'static> {
    id: String,
    alias: u64,
    schedule: DelaySchedule,
    assigned: bool,
    parked: Option<Parked<S>>,
    running: Option<RunningLoop<S>>,
}

impl<S: Sink + 'static> SensorSimulator<S> {
    /// Create an idle simulator. `rng` becomes the simulator's only source of
    /// randomness, for both values and delays.
    pub fn new(config: &SensorConfig, sink: S, mut rng: StdRng) -> Self {
        let state = SensorState::from_config(config, &mut rng);
        Self {
            id: state.id().to_string(),
            alias: state.alias(),
            schedule: DelaySchedule::new(config.delay_min, config.delay_max, config.randomize),
            assigned: false,
            parked: Some(Parked { state, rng, sink }),
            running: None,
        }
    }

    pub fn with_seed(config: &SensorConfig, sink: S, seed: u64) -> Self {
        Self::new(config, sink, StdRng::seed_from_u64(seed))
    }

    pub fn from_os_rng(config: &SensorConfig, sink: S) -> Self {
        Self::new(config, sink, StdRng::from_os_rng())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn alias(&self) -> u64 {
        self.alias
    }

    /// Current schedule; normalized once the simulator has been started.
    pub fn schedule(&self) -> DelaySchedule {
        self.schedule
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Attach the simulator to its consumer. Fails on the second call.
    pub fn assign(&mut self) -> Result<(), SimError> {
        claim(&mut self.assigned, &self.id)
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned
    }

    /// Readings produced so far, or `None` while the loop owns the state.
    pub fn sequence(&self) -> Option<u64> {
        self.parked.as_ref().map(|p| p.state.sequence())
    }

    /// Start the sampling loop.
    ///
    /// Returns as soon as the loop is spawned. Calling it while running is a
    /// no-op. A sink setup failure is returned and the simulator stays idle.
    pub async fn run(&mut self) -> Result<(), SimError> {
        if self.running.is_some() {
            info!(sensor_id = %self.id, "Already running");
            return Ok(());
        }

        let mut parked = self
            .parked
            .take()
            .ok_or_else(|| SimError::Unavailable(self.id.clone()))?;

        self.schedule = self.schedule.normalized();
        if let Err(e) = parked.sink.open().await {
            self.parked = Some(parked);
            return Err(e);
        }

        let cancel = CancellationToken::new();
        let done = tokio::spawn(sampling_loop(
            self.id.clone(),
            self.schedule,
            parked,
            cancel.clone(),
        ));

        self.running = Some(RunningLoop { cancel, done });
        Ok(())
    }

    /// Stop the sampling loop and wait until it has exited.
    ///
    /// A no-op when idle. Interrupts the loop at its next suspension point,
    /// so an in-flight delivery completes first. Cancel-safe: if the returned
    /// future is dropped early the simulator stays running (already
    /// cancelled) and a later `stop` finishes the join.
    pub async fn stop(&mut self) -> Result<(), SimError> {
        let Some(running) = self.running.as_mut() else {
            debug!(sensor_id = %self.id, "Not running, nothing to stop");
            return Ok(());
        };

        running.cancel.cancel();
        let joined = (&mut running.done).await;
        self.running = None;

        match joined {
            Ok(parked) => {
                self.parked = Some(parked);
                info!(sensor_id = %self.id, "Stopped");
                Ok(())
            }
            Err(e) => Err(SimError::LoopAborted {
                sensor_id: self.id.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

impl<S: Sink + 'static> Drop for SensorSimulator<S> {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.cancel.cancel();
        }
    }
}

async fn sampling_loop<S: Sink>(
    id: String,
    schedule: DelaySchedule,
    mut parked: Parked<S>,
    cancel: CancellationToken,
) -> Parked<S> {
    info!(sensor_id = %id, sink = parked.sink.name(), "Started running");

    let mut delay = schedule.min();
    loop {
        let reading = parked.state.next_reading(&mut parked.rng);
        debug!(sensor_id = %id, seq = reading.seq, value = reading.value, "Produced reading");

        if let Err(e) = parked.sink.deliver(&reading).await {
            warn!(sensor_id = %id, seq = reading.seq, error = %e, "Delivery failed");
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(sensor_id = %id, "Got shutdown signal");
                break;
            }
            _ = tokio::time::sleep(Duration::from_secs(delay.into())) => {}
        }

        delay = schedule.next_delay(&mut parked.rng);
    }

    parked.sink.close().await;
    parked
}
