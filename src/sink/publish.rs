//! Publish sink: readings serialized as JSON and handed to a broker.
//!
//! The destination and topic are validated in `open`, so a bad address
//! surfaces from `SensorSimulator::run` instead of inside the loop.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::Sink;
use crate::broker::{BrokerClient, QoS};
use crate::config::PublishConfig;
use crate::error::{DeliveryError, SimError};
use crate::sensor::Reading;

pub struct PublishSink<B: BrokerClient> {
    broker: B,
    destination: String,
    topic: String,
    qos: QoS,
    connection: Option<B::Connection>,
}

impl<B: BrokerClient> PublishSink<B> {
    pub fn new(broker: B, destination: impl Into<String>, topic: impl Into<String>, qos: QoS) -> Self {
        Self {
            broker,
            destination: destination.into(),
            topic: topic.into(),
            qos,
            connection: None,
        }
    }

    pub fn from_config(broker: B, config: &PublishConfig) -> Self {
        Self::new(broker, config.server_url.clone(), config.topic.clone(), config.qos)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }
}

/// Parse a broker address, rejecting anything without a host.
pub fn parse_destination(raw: &str) -> Result<Url, SimError> {
    let url = Url::parse(raw)
        .map_err(|e| SimError::Configuration(format!("invalid server URL '{}': {}", raw, e)))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(SimError::Configuration(format!(
            "server URL '{}' has no host",
            raw
        )));
    }
    Ok(url)
}

/// Topics are non-empty and free of wildcards and NUL characters.
pub fn validate_topic(topic: &str) -> Result<(), SimError> {
    if topic.is_empty() {
        return Err(SimError::Configuration("topic must not be empty".to_string()));
    }
    if topic.contains(['+', '#', '\0']) {
        return Err(SimError::Configuration(format!(
            "topic '{}' contains a wildcard or NUL character",
            topic
        )));
    }
    Ok(())
}

#[async_trait]
impl<B> Sink for PublishSink<B>
where
    B: BrokerClient + 'static,
{
    fn name(&self) -> &str {
        "publish"
    }

    async fn open(&mut self) -> Result<(), SimError> {
        let url = parse_destination(&self.destination)?;
        if !self.broker.supports_scheme(url.scheme()) {
            return Err(SimError::Configuration(format!(
                "unsupported scheme '{}' in server URL '{}'",
                url.scheme(),
                self.destination
            )));
        }
        validate_topic(&self.topic)?;

        let connection = self.broker.connect(&url).await?;
        self.connection = Some(connection);
        Ok(())
    }

    async fn deliver(&mut self, reading: &Reading) -> Result<(), DeliveryError> {
        let connection = self.connection.as_mut().ok_or(DeliveryError::NotConnected)?;
        let payload = serde_json::to_vec(reading)?;

        debug!(
            topic = %self.topic,
            payload = %String::from_utf8_lossy(&payload),
            "Publishing data"
        );
        self.broker
            .publish(connection, &self.topic, payload, self.qos)
            .await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.broker.disconnect(connection).await;
        }
    }
}
