//! Message Broker Collaborator
//!
//! The simulator never speaks a broker protocol itself. A `BrokerClient`
//! connects to a destination, publishes opaque payloads on a topic and
//! disconnects; `mqtt::MqttBroker` is the production implementation.

pub mod mqtt;

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::BrokerError;

pub use mqtt::MqttBroker;

/// Delivery assurance requested for a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum QoS {
    AtMostOnce,
    #[default]
    AtLeastOnce,
    ExactlyOnce,
}

/// Client for an external message broker.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Live session returned by `connect`.
    type Connection: Send;

    /// Whether destinations with this URL scheme can be reached at all.
    fn supports_scheme(&self, _scheme: &str) -> bool {
        true
    }

    async fn connect(&self, destination: &Url) -> Result<Self::Connection, BrokerError>;

    async fn publish(
        &self,
        connection: &mut Self::Connection,
        topic: &str,
        payload: Vec<u8>,
        qos: QoS,
    ) -> Result<(), BrokerError>;

    async fn disconnect(&self, connection: Self::Connection);
}
