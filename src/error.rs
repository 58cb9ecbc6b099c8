//! Error types for the simulator core.
//!
//! `SimError` covers failures that are returned to the caller of a lifecycle
//! or setup operation. `DeliveryError` covers per-reading delivery failures,
//! which the sampling loop logs and then moves past.

use thiserror::Error;

/// Errors surfaced synchronously from setup and lifecycle operations.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid destination address, malformed topic, bad device path.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The sensor is already attached to a consumer.
    #[error("sensor '{0}' is already assigned")]
    AlreadyAssigned(String),

    /// The broker could not be reached while starting.
    #[error("broker connection failed: {0}")]
    Connect(#[from] BrokerError),

    /// The sampling task panicked before acknowledging shutdown.
    #[error("sampling loop for sensor '{sensor_id}' aborted: {reason}")]
    LoopAborted { sensor_id: String, reason: String },

    /// Sensor state was lost with an aborted loop and cannot be restarted.
    #[error("sensor '{0}' is unavailable")]
    Unavailable(String),

    #[error("invalid config file: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure to hand a single reading to its destination.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("receiver dropped")]
    ChannelClosed,

    #[error("not connected")]
    NotConnected,

    #[error("failed to encode reading: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Broker(#[from] BrokerError),
}

/// Errors reported by a broker client.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("cannot connect to {destination}: {reason}")]
    Connect { destination: String, reason: String },

    #[error("publish to '{topic}' failed: {reason}")]
    Publish { topic: String, reason: String },
}
