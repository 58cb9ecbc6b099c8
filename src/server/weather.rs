//! Weather publisher: one temperature sensor publishing to an MQTT broker.

use std::future::Future;
use tracing::{error, info};

use crate::broker::{BrokerClient, MqttBroker};
use crate::config::{PublishConfig, SensorConfig};
use crate::error::SimError;
use crate::sensor::SensorSimulator;
use crate::sink::PublishSink;

pub const SENSOR_ID: &str = "weather-sim";

/// Publish temperature readings through `broker` until `shutdown` resolves.
///
/// A setup failure (bad URL, bad topic, unreachable broker) is returned
/// before any reading is produced.
pub async fn run_with<B, F>(broker: B, publish: &PublishConfig, shutdown: F) -> Result<(), SimError>
where
    B: BrokerClient + 'static,
    F: Future<Output = ()>,
{
    let config = SensorConfig::temperature().with_id(SENSOR_ID);
    let sink = PublishSink::from_config(broker, publish);
    let mut sim = SensorSimulator::from_os_rng(&config, sink);
    sim.assign()?;

    info!(topic = %publish.topic, "Starting weather simulator");
    sim.run().await?;

    shutdown.await;

    if let Err(e) = sim.stop().await {
        error!(error = %e, "Failed to stop simulator");
        return Err(e);
    }
    info!("Simulator stopped");
    Ok(())
}

/// `run_with` over the MQTT client.
pub async fn run<F>(publish: &PublishConfig, shutdown: F) -> Result<(), SimError>
where
    F: Future<Output = ()>,
{
    run_with(MqttBroker::default(), publish, shutdown).await
}
