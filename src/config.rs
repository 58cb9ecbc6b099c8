//! Sensor and Edge-Node Configuration
//!
//! JSON-backed configuration. Field names follow the on-disk format, so an
//! existing config file can be loaded unchanged.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::broker::QoS;
use crate::error::SimError;

/// Parameters of one simulated sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub sensor_id: String,
    pub mean: f64,
    pub standard_deviation: f64,
    pub delay_min: u32,
    pub delay_max: u32,
    pub randomize: bool,
}

impl SensorConfig {
    pub fn temperature() -> Self {
        Self {
            sensor_id: "Temperature".to_string(),
            mean: 30.6,
            standard_deviation: 3.1,
            delay_min: 3,
            delay_max: 6,
            randomize: true,
        }
    }

    pub fn humidity() -> Self {
        Self {
            sensor_id: "Humidity".to_string(),
            mean: 40.7,
            standard_deviation: 2.3,
            delay_min: 4,
            delay_max: 10,
            randomize: false,
        }
    }

    /// Same parameters under a different id.
    pub fn with_id(mut self, sensor_id: impl Into<String>) -> Self {
        self.sensor_id = sensor_id.into();
        self
    }
}

/// Known sensor kinds, selected by the first path segment of a device URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Temperature,
    Humidity,
}

impl SensorKind {
    /// Resolve a kind name, case-sensitively. Unknown names fall back to
    /// temperature.
    pub fn from_name(name: &str) -> Self {
        match name {
            "temperature" => Self::Temperature,
            "humidity" => Self::Humidity,
            other => {
                warn!(
                    device_type = other,
                    "Using temperature configuration since device type is not recognized"
                );
                Self::Temperature
            }
        }
    }

    pub fn default_config(self) -> SensorConfig {
        match self {
            Self::Temperature => SensorConfig::temperature(),
            Self::Humidity => SensorConfig::humidity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub device_id: String,
    #[serde(default)]
    pub store_and_forward: bool,
    #[serde(default)]
    pub time_to_live: u32,
    #[serde(default)]
    pub simulators: Vec<SensorConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeNodeConfig {
    pub namespace: String,
    pub group_id: String,
    pub node_id: String,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "eon_node")]
    pub edge_node: EdgeNodeConfig,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let config = Self::from_json(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), devices = config.edge_node.devices.len(), "Config loaded");
        Ok(config)
    }

    /// Every configured sensor, paired with the id of its device.
    pub fn sensors(&self) -> impl Iterator<Item = (&str, &SensorConfig)> {
        self.edge_node.devices.iter().flat_map(|device| {
            device
                .simulators
                .iter()
                .map(move |sensor| (device.device_id.as_str(), sensor))
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            edge_node: EdgeNodeConfig {
                namespace: "spBv1.0".to_string(),
                group_id: "WeatherSensors".to_string(),
                node_id: "SparkplugB".to_string(),
                devices: vec![
                    DeviceConfig {
                        device_id: "emulatedDevice".to_string(),
                        store_and_forward: true,
                        time_to_live: 10,
                        simulators: vec![SensorConfig::temperature()],
                    },
                    DeviceConfig {
                        device_id: "anotherEmulatedDevice".to_string(),
                        store_and_forward: true,
                        time_to_live: 15,
                        simulators: vec![SensorConfig::humidity()],
                    },
                ],
            },
        }
    }
}

/// Where and how the weather publisher sends its readings.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishConfig {
    pub server_url: String,
    pub topic: String,
    pub qos: QoS,
}
