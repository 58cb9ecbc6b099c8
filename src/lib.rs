//! # weather-sim - Emulated IoT Weather Sensors
//!
//! Simulated temperature, humidity and weather sensors that produce a
//! continuous stream of plausible readings and deliver them over HTTP, an
//! in-process channel, or an MQTT broker.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      SensorSimulator                         │
//! │                                                              │
//! │  ┌──────────────┐   ┌───────────────┐   ┌────────────────┐  │
//! │  │ SensorState  │   │ DelaySchedule │   │ Cancellation   │  │
//! │  │ (random walk)│──▶│ (next wait)   │──▶│ + JoinHandle   │  │
//! │  └──────────────┘   └───────────────┘   └────────────────┘  │
//! │          │                                                   │
//! │          ▼                                                   │
//! │     ┌─────────┐                                              │
//! │     │  Sink   │  channel │ publish (BrokerClient) │ log      │
//! │     └─────────┘                                              │
//! └──────────────────────────────────────────────────────────────┘
//!
//!   PullSink: same random walk, one reading per HTTP request
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use weather_sim::{ChannelSink, SensorConfig, SensorSimulator};
//!
//! # async fn demo() -> Result<(), weather_sim::SimError> {
//! let (sink, mut readings) = ChannelSink::channel();
//! let mut sim = SensorSimulator::from_os_rng(&SensorConfig::temperature(), sink);
//!
//! sim.run().await?;
//! while let Some(reading) = readings.recv().await {
//!     println!("{} {}", reading.seq, reading.value);
//!     if reading.seq == 10 {
//!         break;
//!     }
//! }
//! sim.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod broker;
pub mod config;
pub mod error;
pub mod logging;
pub mod sensor;
pub mod server;
pub mod sink;

pub use broker::{BrokerClient, MqttBroker, QoS};
pub use config::{Config, DeviceConfig, EdgeNodeConfig, PublishConfig, SensorConfig, SensorKind};
pub use error::{BrokerError, DeliveryError, SimError};
pub use sensor::{DelaySchedule, Reading, SensorSimulator, SensorState};
pub use sink::{ChannelSink, LogSink, PublishSink, PullSink, Sink};
