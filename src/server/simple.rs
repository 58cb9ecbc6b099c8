use std::future::Future;
use tracing::info;

use crate::config::SensorConfig;
use crate::error::SimError;
use crate::sensor::SensorSimulator;
use crate::sink::LogSink;

pub const SENSOR_ID: &str = "simple-sim";

/// Run a single temperature sensor that only logs its readings.
pub async fn run<F>(shutdown: F) -> Result<(), SimError>
where
    F: Future<Output = ()>,
{
    let config = SensorConfig::temperature().with_id(SENSOR_ID);
    let mut sim = SensorSimulator::from_os_rng(&config, LogSink::new(SENSOR_ID));

    info!(sensor_id = SENSOR_ID, "Starting simple simulator");
    sim.run().await?;
    shutdown.await;
    sim.stop().await
}
