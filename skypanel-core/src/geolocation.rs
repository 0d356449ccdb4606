//! Where is the user? Used by "use my location" lookups.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::{config::GeolocationConfig, error::WeatherError, model::Coordinates};

pub const DEFAULT_GEOLOCATION_ENDPOINT: &str = "https://ipapi.co/json/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("geolocation blocked in this context")]
    BlockedContext,
}

impl From<GeolocationError> for WeatherError {
    fn from(err: GeolocationError) -> Self {
        match err {
            GeolocationError::PermissionDenied => WeatherError::GeolocationDenied,
            GeolocationError::PositionUnavailable => WeatherError::GeolocationUnavailable,
            GeolocationError::Timeout => WeatherError::GeolocationTimeout,
            GeolocationError::BlockedContext => WeatherError::GeolocationBlockedContext,
        }
    }
}

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, GeolocationError>;
}

/// Always answers with the same position, or "unavailable" if none is set.
#[derive(Debug, Clone, Default)]
pub struct FixedGeolocator {
    position: Option<Coordinates>,
}

impl FixedGeolocator {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        self.position.ok_or(GeolocationError::PositionUnavailable)
    }
}

/// Approximate position from the caller's public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    endpoint: String,
    enabled: bool,
    allow_insecure: bool,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpLocation {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl IpGeolocator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            enabled: true,
            allow_insecure: false,
            http,
        })
    }

    pub fn from_config(config: &GeolocationConfig) -> Result<Self, WeatherError> {
        let mut geo = Self::new(config.endpoint(), config.timeout())?;
        geo.enabled = config.enabled;
        geo.allow_insecure = config.allow_insecure;
        Ok(geo)
    }

    pub fn allow_insecure(mut self, allow: bool) -> Self {
        self.allow_insecure = allow;
        self
    }

    fn check_context(&self) -> Result<(), GeolocationError> {
        if !self.enabled {
            return Err(GeolocationError::PermissionDenied);
        }
        if !self.endpoint.starts_with("https://") && !self.allow_insecure {
            return Err(GeolocationError::BlockedContext);
        }
        Ok(())
    }
}

fn classify_status(status: StatusCode) -> Option<GeolocationError> {
    if status.is_success() {
        return None;
    }
    match status.as_u16() {
        401 | 403 | 429 => Some(GeolocationError::PermissionDenied),
        408 | 504 => Some(GeolocationError::Timeout),
        _ => Some(GeolocationError::PositionUnavailable),
    }
}

/// Pick the right error for a failed `get`, telling timeouts apart.
fn classify_transport(err: &reqwest::Error) -> GeolocationError {
    if err.is_timeout() {
        GeolocationError::Timeout
    } else {
        GeolocationError::PositionUnavailable
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        self.check_context()?;

        let res = self.http.get(&self.endpoint).send().await.map_err(|err| {
            tracing::warn!(error = %err, "geolocation request failed");
            classify_transport(&err)
        })?;

        if let Some(err) = classify_status(res.status()) {
            tracing::warn!(status = %res.status(), "geolocation endpoint refused");
            return Err(err);
        }

        let body: IpLocation = res.json().await.map_err(|err| {
            tracing::warn!(error = %err, "geolocation response unreadable");
            classify_transport(&err)
        })?;

        let (Some(lat), Some(lon)) = (body.latitude, body.longitude) else {
            return Err(GeolocationError::PositionUnavailable);
        };

        let coords =
            Coordinates::new(lat, lon).map_err(|_| GeolocationError::PositionUnavailable)?;
        tracing::info!(%coords, "located by ip address");
        Ok(coords)
    }
}

/// Pick a geolocator from config: a fixed position wins over the IP lookup.
pub fn geolocator_from_config(config: &GeolocationConfig) -> Result<Box<dyn Geolocator>, WeatherError> {
    match config.fixed_position() {
        Some(position) if config.enabled => Ok(Box::new(FixedGeolocator::new(Some(position)))),
        _ => Ok(Box::new(IpGeolocator::from_config(config)?)),
    }
}
