use async_trait::async_trait;
use tracing::info;

use super::Sink;
use crate::error::DeliveryError;
use crate::sensor::Reading;

/// Sink that only reports each reading in the log.
pub struct LogSink {
    sensor_id: String,
}

impl LogSink {
    pub fn new(sensor_id: impl Into<String>) -> Self {
        Self {
            sensor_id: sensor_id.into(),
        }
    }
}

#[async_trait]
impl Sink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&mut self, reading: &Reading) -> Result<(), DeliveryError> {
        info!(
            sensor_id = %self.sensor_id,
            seq = reading.seq,
            value = reading.value,
            "Next value"
        );
        Ok(())
    }
}
