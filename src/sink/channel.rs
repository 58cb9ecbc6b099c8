//! Push-channel sink.
//!
//! Readings are sent over a bounded `tokio::sync::mpsc` queue. The send
//! waits for room, so a consumer that stops receiving also stops the
//! producing loop instead of losing readings.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::Sink;
use crate::error::DeliveryError;
use crate::sensor::Reading;

/// Default queue depth: a single pending reading.
pub const DEFAULT_CAPACITY: usize = 1;

pub struct ChannelSink {
    tx: mpsc::Sender<Reading>,
}

impl ChannelSink {
    /// Create a sink and the receiver its readings arrive on.
    pub fn channel() -> (Self, mpsc::Receiver<Reading>) {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<Reading>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Sink for ChannelSink {
    fn name(&self) -> &str {
        "channel"
    }

    async fn deliver(&mut self, reading: &Reading) -> Result<(), DeliveryError> {
        self.tx
            .send(*reading)
            .await
            .map_err(|_| DeliveryError::ChannelClosed)
    }
}
