//! MQTT broker client backed by `rumqttc`.
//!
//! `connect` waits for the broker's CONNACK, then hands the event loop to a
//! background task that keeps polling (and therefore reconnecting) until the
//! DISCONNECT goes out. Publishes only enqueue onto the client's bounded
//! request queue and fail when it is full, so a dead broker never blocks the
//! caller.

use async_trait::async_trait;
use rumqttc::{AsyncClient, ClientError, Event, EventLoop, MqttOptions, Outgoing, Packet};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use super::{BrokerClient, QoS};
use crate::error::BrokerError;

/// Prefix of every generated client id.
pub const CLIENT_ID_PREFIX: &str = "aio-weather";
pub const DEFAULT_PORT: u16 = 1883;

/// URL schemes accepted as MQTT-over-TCP destinations.
pub const SUPPORTED_SCHEMES: [&str; 2] = ["mqtt", "tcp"];

/// Upper bound on waiting for the DISCONNECT to be written.
pub const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub keep_alive: Duration,
    pub clean_session: bool,
    pub connect_timeout: Duration,
    pub reconnect_delay: Duration,
    pub request_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            keep_alive: Duration::from_secs(20),
            clean_session: false,
            connect_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(1),
            request_capacity: 16,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MqttBroker {
    config: MqttConfig,
}

pub struct MqttConnection {
    client: AsyncClient,
    driver: JoinHandle<()>,
}

impl MqttBroker {
    pub fn new(config: MqttConfig) -> Self {
        Self { config }
    }

    fn options(&self, destination: &Url) -> Result<MqttOptions, BrokerError> {
        let host = destination.host_str().ok_or_else(|| BrokerError::Connect {
            destination: destination.to_string(),
            reason: "missing host".to_string(),
        })?;
        let port = destination.port().unwrap_or(DEFAULT_PORT);
        let client_id = format!("{}-{}", CLIENT_ID_PREFIX, Uuid::new_v4());

        let mut options = MqttOptions::new(client_id, host, port);
        options.set_keep_alive(self.config.keep_alive);
        options.set_clean_session(self.config.clean_session);
        Ok(options)
    }

    async fn await_connack(eventloop: &mut EventLoop, destination: &Url) -> Result<(), BrokerError> {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    debug!(code = ?ack.code, "CONNACK received");
                    return Ok(());
                }
                Ok(_) => continue,
                Err(e) => {
                    return Err(BrokerError::Connect {
                        destination: destination.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    fn drive(mut eventloop: EventLoop, destination: String, reconnect_delay: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                        debug!(destination = %destination, "DISCONNECT sent");
                        break;
                    }
                    Ok(Event::Incoming(Packet::Disconnect)) => {
                        info!(destination = %destination, "Server requested disconnect");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(destination = %destination, error = %e, "MQTT connection error, retrying");
                        tokio::time::sleep(reconnect_delay).await;
                    }
                }
            }
        })
    }
}

fn to_rumqttc(qos: QoS) -> rumqttc::QoS {
    match qos {
        QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
        QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
        QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
    }
}

#[async_trait]
impl BrokerClient for MqttBroker {
    type Connection = MqttConnection;

    fn supports_scheme(&self, scheme: &str) -> bool {
        SUPPORTED_SCHEMES.contains(&scheme)
    }

    async fn connect(&self, destination: &Url) -> Result<MqttConnection, BrokerError> {
        if !self.supports_scheme(destination.scheme()) {
            return Err(BrokerError::Connect {
                destination: destination.to_string(),
                reason: format!("unsupported scheme '{}'", destination.scheme()),
            });
        }

        let options = self.options(destination)?;
        let (client, mut eventloop) = AsyncClient::new(options, self.config.request_capacity);

        info!(destination = %destination, "Attempting to connect");
        match tokio::time::timeout(
            self.config.connect_timeout,
            Self::await_connack(&mut eventloop, destination),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(BrokerError::Connect {
                    destination: destination.to_string(),
                    reason: "timed out waiting for CONNACK".to_string(),
                });
            }
        }
        info!(destination = %destination, "MQTT connection established");

        let driver = Self::drive(eventloop, destination.to_string(), self.config.reconnect_delay);
        Ok(MqttConnection { client, driver })
    }

    async fn publish(
        &self,
        connection: &mut MqttConnection,
        topic: &str,
        payload: Vec<u8>,
        qos: QoS,
    ) -> Result<(), BrokerError> {
        connection
            .client
            .try_publish(topic, to_rumqttc(qos), false, payload)
            .map_err(|e| BrokerError::Publish {
                topic: topic.to_string(),
                reason: match e {
                    ClientError::TryRequest(_) => "request queue full, broker unreachable".to_string(),
                    other => other.to_string(),
                },
            })
    }

    async fn disconnect(&self, connection: MqttConnection) {
        let MqttConnection { client, mut driver } = connection;

        if let Err(e) = client.try_disconnect() {
            warn!(error = %e, "MQTT disconnect request failed");
            driver.abort();
            return;
        }

        // the driver exits once the DISCONNECT has been written
        if tokio::time::timeout(DISCONNECT_TIMEOUT, &mut driver).await.is_err() {
            warn!("DISCONNECT not flushed in time, dropping connection");
            driver.abort();
        }
        info!("MQTT connection closed");
    }
}
