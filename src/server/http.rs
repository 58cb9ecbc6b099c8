//! HTTP Pull Server
//!
//! Every `--device` URL becomes a route on this server. The first path
//! segment selects the sensor kind (`/temperature/1`, `/humidity/2`), and
//! each request to the route computes one fresh reading.
//!
//! Endpoints:
//! - `GET /discovery`        device URLs, one per line
//! - `GET <path>`            next value as plain text
//! - `GET <path>/reading`    next reading as JSON

use axum::{Json, Router, routing::get};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use url::Url;

use crate::config::SensorKind;
use crate::error::SimError;
use crate::sink::PullSink;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";
pub const DISCOVERY_PATH: &str = "/discovery";

/// A device URL resolved to its route and sensor kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRoute {
    pub path: String,
    pub kind: SensorKind,
}

impl DeviceRoute {
    pub fn parse(raw: &str) -> Result<Self, SimError> {
        let url = Url::parse(raw)
            .map_err(|e| SimError::Configuration(format!("invalid device URL '{}': {}", raw, e)))?;
        let path = url.path().to_string();

        if !path.starts_with('/') {
            return Err(SimError::Configuration(format!(
                "device URL '{}' has no path",
                raw
            )));
        }
        if path == DISCOVERY_PATH {
            return Err(SimError::Configuration(format!(
                "device path '{}' is reserved",
                path
            )));
        }
        // axum refuses routes with these segments
        if path.split('/').any(|segment| segment.starts_with([':', '*'])) {
            return Err(SimError::Configuration(format!(
                "device path '{}' has a capture or wildcard segment",
                path
            )));
        }

        let kind = SensorKind::from_name(path.split('/').nth(1).unwrap_or_default());
        Ok(Self { path, kind })
    }

    fn reading_path(&self) -> String {
        format!("{}/reading", self.path.trim_end_matches('/'))
    }
}

/// Build the router serving every device in `devices`.
///
/// Each device gets its own pull sensor. Listing the same path twice is an
/// error since a sensor may only be assigned to one route.
pub fn router(devices: &[String]) -> Result<Router, SimError> {
    if devices.is_empty() {
        return Err(SimError::Configuration(
            "must have at least 1 device defined".to_string(),
        ));
    }
    info!(devices = devices.len(), "Creating device routes");

    let mut sensors: HashMap<String, (DeviceRoute, PullSink)> = HashMap::new();
    for raw in devices {
        let route = DeviceRoute::parse(raw)?;
        match sensors.get_mut(&route.path) {
            Some((_, sensor)) => sensor.assign()?,
            None => {
                let config = route.kind.default_config().with_id(route.path.clone());
                let mut sensor = PullSink::from_os_rng(&config);
                sensor.assign()?;
                info!(path = %route.path, kind = ?route.kind, "Creating handler");
                sensors.insert(route.path.clone(), (route, sensor));
            }
        }
    }

    let listing = format!("{}\n", devices.join("\n"));
    let mut app = Router::new().route(
        DISCOVERY_PATH,
        get(move || async move { listing }),
    );

    let mut registered = HashSet::from([DISCOVERY_PATH.to_string()]);
    for (route, sensor) in sensors.into_values() {
        for path in [route.path.clone(), route.reading_path()] {
            if !registered.insert(path.clone()) {
                return Err(SimError::Configuration(format!(
                    "route '{}' is defined twice",
                    path
                )));
            }
        }
        let sensor = Arc::new(sensor);

        let value_sensor = sensor.clone();
        app = app.route(
            &route.path,
            get(move || async move {
                info!(sensor_id = value_sensor.id(), "Invoking sensor");
                value_sensor.read().value.to_string()
            }),
        );

        app = app.route(
            &route.reading_path(),
            get(move || async move { Json(sensor.read()) }),
        );
    }

    Ok(app)
}

/// Serve `devices` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, devices: &[String], shutdown: F) -> Result<(), SimError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(devices)?;
    info!(addr = %listener.local_addr()?, "Device server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Device server stopped");
    Ok(())
}
