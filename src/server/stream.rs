//! Stream mode: every configured sensor pushes readings onto its own
//! in-process channel, drained by a consumer task that logs them.

use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::Config;
use crate::error::SimError;
use crate::sensor::{Reading, SensorSimulator};
use crate::sink::ChannelSink;

fn spawn_consumer(device_id: String, sensor_id: String, mut rx: mpsc::Receiver<Reading>) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut received = 0u64;
        while let Some(reading) = rx.recv().await {
            received += 1;
            info!(
                device = %device_id,
                sensor = %sensor_id,
                seq = reading.seq,
                value = reading.value,
                timestamp = %reading.timestamp,
                "Reading"
            );
        }
        received
    })
}

/// Run one simulator per configured sensor until `shutdown` resolves.
///
/// Returns the number of readings consumed.
pub async fn run<F>(config: &Config, shutdown: F) -> Result<u64, SimError>
where
    F: Future<Output = ()>,
{
    let mut simulators = Vec::new();
    let mut consumers = Vec::new();

    for (device_id, sensor) in config.sensors() {
        let (sink, rx) = ChannelSink::channel();
        let mut sim = SensorSimulator::from_os_rng(sensor, sink);
        sim.assign()?;
        consumers.push(spawn_consumer(device_id.to_string(), sensor.sensor_id.clone(), rx));
        simulators.push(sim);
    }

    if simulators.is_empty() {
        return Err(SimError::Configuration(
            "no sensors configured".to_string(),
        ));
    }

    let mut result = Ok(());
    for sim in &mut simulators {
        if let Err(e) = sim.run().await {
            result = Err(e);
            break;
        }
    }

    if result.is_ok() {
        info!(sensors = simulators.len(), "Streaming readings");
        shutdown.await;
    }

    for sim in &mut simulators {
        if let Err(e) = sim.stop().await {
            error!(sensor_id = sim.id(), error = %e, "Failed to stop simulator");
        }
    }
    // dropping the simulators closes every channel and ends the consumers
    drop(simulators);

    let mut total = 0;
    for consumer in consumers {
        total += consumer.await.unwrap_or_default();
    }
    info!(readings = total, "All simulators stopped");

    result.map(|_| total)
}
