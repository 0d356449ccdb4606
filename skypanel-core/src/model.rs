use std::{fmt, str::FromStr};

use anyhow::anyhow;
use chrono::NaiveDate;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Characters escaped in place names. Mirrors `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> anyhow::Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(anyhow!("Latitude {latitude} is outside -90..=90"));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(anyhow!("Longitude {longitude} is outside -180..=180"));
        }
        Ok(Self { latitude, longitude })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// What the user asked for. Built once at the input boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    ByName(String),
    ByCoordinates(Coordinates),
}

impl Query {
    /// Location path segment sent upstream.
    pub fn location(&self) -> String {
        match self {
            Query::ByName(name) => utf8_percent_encode(name, COMPONENT).to_string(),
            Query::ByCoordinates(coords) => coords.to_string(),
        }
    }

    /// Name used when the upstream does not resolve a nearest area.
    pub fn display_name(&self) -> String {
        match self {
            Query::ByName(name) => name.clone(),
            Query::ByCoordinates(coords) => coords.to_string(),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl FromStr for Query {
    type Err = anyhow::Error;

    /// `"<lat>,<lon>"` becomes coordinates, any other non-empty text a place name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("Query is empty"));
        }

        if let Some((lat, lon)) = trimmed.split_once(',') {
            if let (Ok(lat), Ok(lon)) = (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
                return Coordinates::new(lat, lon).map(Query::ByCoordinates);
            }
        }

        Ok(Query::ByName(trimmed.to_string()))
    }
}

/// Temperature unit used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Celsius => "C",
            Unit::Fahrenheit => "F",
        }
    }

    pub fn toggled(&self) -> Unit {
        match self {
            Unit::Celsius => Unit::Fahrenheit,
            Unit::Fahrenheit => Unit::Celsius,
        }
    }

    /// Convert a Celsius value into this unit. Not rounded.
    pub fn convert_celsius(&self, celsius: f64) -> f64 {
        match self {
            Unit::Celsius => celsius,
            Unit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c" | "celsius" => Ok(Unit::Celsius),
            "f" | "fahrenheit" => Ok(Unit::Fahrenheit),
            _ => Err(anyhow!("Unknown unit '{s}'. Use C or F.")),
        }
    }
}

/// Canonical current-conditions record. All quantities are SI / Celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub location_name: String,
    pub country_code: String,
    pub condition_code: i32,
    pub condition_text: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub temperature_max_c: f64,
    pub temperature_min_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: i32,
    pub wind_speed_mps: f64,
    pub wind_direction_deg: u16,
    pub visibility_m: f64,
    pub cloud_cover_pct: u8,
    pub observed_at_epoch_sec: i64,
    /// 0 when unknown.
    pub sunrise_epoch_sec: i64,
    /// 0 when unknown.
    pub sunset_epoch_sec: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub temperature_max_c: f64,
    pub temperature_min_c: f64,
    pub condition_code: i32,
}

/// Multi-day forecast. Nothing produces one yet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub days: Vec<ForecastDay>,
}

/// Unparsed upstream answer handed to the normalizer.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: StatusCode::OK, body: body.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_parse_into_coordinate_query() {
        let q: Query = "51.5074, -0.1278".parse().expect("valid coordinates");
        assert_eq!(
            q,
            Query::ByCoordinates(Coordinates { latitude: 51.5074, longitude: -0.1278 })
        );
        assert_eq!(q.location(), "51.5074,-0.1278");
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let err = "91,10".parse::<Query>().unwrap_err();
        assert!(err.to_string().contains("Latitude"));
    }

    #[test]
    fn names_with_commas_stay_names() {
        let q: Query = "Paris, France".parse().expect("valid name");
        assert_eq!(q, Query::ByName("Paris, France".to_string()));
    }

    #[test]
    fn place_names_are_component_escaped() {
        let q = Query::ByName("São Paulo, BR".to_string());
        assert_eq!(q.location(), "S%C3%A3o%20Paulo%2C%20BR");
        assert_eq!(q.display_name(), "São Paulo, BR");

        let q = Query::ByName("it's-a_place.(x)".to_string());
        assert_eq!(q.location(), "it's-a_place.(x)");
    }

    #[test]
    fn empty_query_is_an_error() {
        assert!("   ".parse::<Query>().is_err());
    }

    #[test]
    fn unit_parsing_and_toggle() {
        assert_eq!("f".parse::<Unit>().expect("unit"), Unit::Fahrenheit);
        assert_eq!("Celsius".parse::<Unit>().expect("unit"), Unit::Celsius);
        assert!("kelvin".parse::<Unit>().is_err());
        assert_eq!(Unit::Celsius.toggled(), Unit::Fahrenheit);
        assert_eq!(Unit::Fahrenheit.toggled().toggled(), Unit::Fahrenheit);
    }

    #[test]
    fn fahrenheit_conversion() {
        assert_eq!(Unit::Fahrenheit.convert_celsius(0.0), 32.0);
        assert_eq!(Unit::Fahrenheit.convert_celsius(100.0), 212.0);
        assert_eq!(Unit::Celsius.convert_celsius(21.5), 21.5);
    }
}
