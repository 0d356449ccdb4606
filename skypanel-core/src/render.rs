//! Presentation of a [`WeatherRecord`].
//!
//! [`render`] is pure: the same record and unit always give the same
//! [`Panel`], and the record itself is never touched. Unit conversion back
//! to display units (°F, km/h, km) happens only here.

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::model::{Unit, WeatherRecord};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const COMPASS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Thunderstorm,
    Drizzle,
    Sleet,
    LightRain,
    Storm,
    Snow,
    Tornado,
    Fog,
    ClearDay,
    ClearNight,
    PartlyCloudyDay,
    PartlyCloudyNight,
    ScatteredClouds,
    Cloudy,
    Unknown,
}

impl Icon {
    /// Pick an icon for a canonical condition code.
    ///
    /// Thunderstorms are recognised both in the raw 2xx band and in the 4xx
    /// band the normalizer shifts them into.
    pub fn for_condition(code: i32, is_daytime: bool) -> Icon {
        match code {
            200..=299 | 400..=499 => Icon::Thunderstorm,
            300..=399 => Icon::Drizzle,
            511 => Icon::Sleet,
            500..=501 => Icon::LightRain,
            502..=599 => Icon::Storm,
            600..=699 => Icon::Snow,
            781 => Icon::Tornado,
            700..=799 => Icon::Fog,
            800 if is_daytime => Icon::ClearDay,
            800 => Icon::ClearNight,
            801 if is_daytime => Icon::PartlyCloudyDay,
            801 => Icon::PartlyCloudyNight,
            802 => Icon::ScatteredClouds,
            803.. => Icon::Cloudy,
            _ => Icon::Unknown,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Icon::Thunderstorm | Icon::Storm => "⛈️",
            Icon::Drizzle => "🌦️",
            Icon::Sleet => "🌨️",
            Icon::LightRain => "🌧️",
            Icon::Snow => "❄️",
            Icon::Tornado => "🌪️",
            Icon::Fog => "🌫️",
            Icon::ClearDay => "☀️",
            Icon::ClearNight | Icon::PartlyCloudyNight => "🌙",
            Icon::PartlyCloudyDay => "🌤️",
            Icon::ScatteredClouds => "⛅",
            Icon::Cloudy => "☁️",
            Icon::Unknown => "🌡️",
        }
    }
}

/// Everything needed to draw the weather panel, already formatted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub location: String,
    pub country: String,
    pub weekday: &'static str,
    pub date: String,
    pub time: String,
    pub icon: Icon,
    pub condition: String,
    pub unit: Unit,
    pub temperature: String,
    pub feels_like: String,
    pub high: String,
    pub low: String,
    pub humidity: String,
    pub wind_speed: String,
    pub wind_direction: &'static str,
    pub visibility: String,
    pub pressure: String,
    pub cloud_cover: String,
}

/// Build the display panel for `record` in `unit`.
pub fn render(record: &WeatherRecord, unit: Unit) -> Panel {
    let observed = timestamp(record.observed_at_epoch_sec);
    let icon = Icon::for_condition(record.condition_code, is_daytime(record));

    Panel {
        location: record.location_name.clone(),
        country: record.country_code.clone(),
        weekday: weekday_label(record.observed_at_epoch_sec),
        date: observed.format("%B %-d").to_string(),
        time: observed.format("%H:%M UTC").to_string(),
        icon,
        condition: record.condition_text.clone(),
        unit,
        temperature: display_temperature(record.temperature_c, unit),
        feels_like: display_temperature(record.feels_like_c, unit),
        high: display_temperature(record.temperature_max_c, unit),
        low: display_temperature(record.temperature_min_c, unit),
        humidity: format!("{}%", record.humidity_pct),
        wind_speed: format!("{:.1} km/h", record.wind_speed_mps * 3.6),
        wind_direction: compass_point(Some(f64::from(record.wind_direction_deg))),
        visibility: format!("{:.1} km", record.visibility_m / 1000.0),
        pressure: format!("{} hPa", record.pressure_hpa),
        cloud_cover: format!("{}%", record.cloud_cover_pct),
    }
}

/// Whole-degree temperature in `unit`, e.g. `"72°"`.
pub fn display_temperature(celsius: f64, unit: Unit) -> String {
    let rounded = unit.convert_celsius(celsius).round() as i64;
    format!("{rounded}°")
}

/// 8-point compass label. Each point owns the 45° sector starting at it.
/// Missing or non-finite directions read as north.
pub fn compass_point(degrees: Option<f64>) -> &'static str {
    let Some(deg) = degrees.filter(|d| d.is_finite()) else {
        return COMPASS[0];
    };
    let normalized = deg.rem_euclid(360.0);
    COMPASS[(normalized / 45.0).floor() as usize % COMPASS.len()]
}

/// Short English weekday (UTC) for an epoch timestamp.
pub fn weekday_label(epoch_sec: i64) -> &'static str {
    let day = timestamp(epoch_sec).weekday().num_days_from_sunday() as usize;
    WEEKDAYS[day % WEEKDAYS.len()]
}

/// Day when sunrise and sunset are both known and the observation falls
/// between them; otherwise assumed to be day.
pub fn is_daytime(record: &WeatherRecord) -> bool {
    let (rise, set) = (record.sunrise_epoch_sec, record.sunset_epoch_sec);
    if rise == 0 || set == 0 || rise >= set {
        return true;
    }
    (rise..set).contains(&record.observed_at_epoch_sec)
}

fn timestamp(epoch_sec: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(epoch_sec, 0).unwrap_or_default()
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.unit.symbol();

        writeln!(f, "{}", self.location)?;
        if self.country.is_empty() {
            writeln!(f, "{}, {} · {}", self.weekday, self.date, self.time)?;
        } else {
            writeln!(f, "{} · {}, {} · {}", self.country, self.weekday, self.date, self.time)?;
        }
        writeln!(f)?;
        writeln!(f, "  {}  {}{}  {}", self.icon.emoji(), self.temperature, unit, self.condition)?;
        writeln!(f, "  Feels like {}{}", self.feels_like, unit)?;
        writeln!(f, "  ↑ {}{}  ↓ {}{}", self.high, unit, self.low, unit)?;
        writeln!(f)?;
        writeln!(f, "Conditions")?;
        writeln!(f, "  {:<12} {}", "Humidity", self.humidity)?;
        writeln!(f, "  {:<12} {} {}", "Wind", self.wind_speed, self.wind_direction)?;
        writeln!(f, "  {:<12} {}", "Visibility", self.visibility)?;
        writeln!(f, "  {:<12} {}", "Pressure", self.pressure)?;
        write!(f, "  {:<12} {}", "Cloud cover", self.cloud_cover)
    }
}
