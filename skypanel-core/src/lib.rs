//! Core library for the `skypanel` weather panel.
//!
//! This crate defines:
//! - The canonical weather record and the normalizer that builds it from
//!   wttr.in JSON
//! - The renderer turning a record into a display panel
//! - Session state (cached record, active unit, request sequencing)
//! - Weather sources, geolocation and configuration
//!
//! It is used by `skypanel-cli`, but can also be reused by other front ends.

pub mod config;
pub mod controller;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod normalize;
pub mod render;
pub mod source;
pub mod state;

pub use config::{Config, GeolocationConfig};
pub use controller::Controller;
pub use error::{ErrorKind, WeatherError};
pub use geolocation::{FixedGeolocator, GeolocationError, Geolocator, IpGeolocator};
pub use model::{Coordinates, ForecastRecord, Query, RawResponse, Unit, WeatherRecord};
pub use normalize::normalize;
pub use render::{Icon, Panel, render};
pub use source::{WeatherSource, WttrSource};
pub use state::{AppState, CachedWeather};
