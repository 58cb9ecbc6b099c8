//! Reading Destinations
//!
//! A sink receives every reading the sampling loop produces, in sequence
//! order. Delivery failures are returned to the loop, which logs them and
//! carries on with the next tick.
//!
//! - **channel**: in-process handoff queue with backpressure
//! - **publish**: serialized payload handed to a message broker
//! - **log**: readings written to the log only
//! - **pull**: on-demand readings, outside of any background loop

pub mod channel;
pub mod log;
pub mod publish;
pub mod pull;

use async_trait::async_trait;

use crate::error::{DeliveryError, SimError};
use crate::sensor::Reading;

pub use channel::ChannelSink;
pub use log::LogSink;
pub use publish::PublishSink;
pub use pull::PullSink;

/// Destination for readings produced by a background sampling loop.
#[async_trait]
pub trait Sink: Send {
    /// Human-readable name of the sink kind
    fn name(&self) -> &str;

    /// Acquire whatever the sink needs before the loop starts.
    ///
    /// Called from `SensorSimulator::run`; an error here keeps the simulator
    /// idle and is returned to the caller.
    async fn open(&mut self) -> Result<(), SimError> {
        Ok(())
    }

    /// Deliver one reading.
    async fn deliver(&mut self, reading: &Reading) -> Result<(), DeliveryError>;

    /// Release resources once the loop has exited.
    async fn close(&mut self) {}
}
