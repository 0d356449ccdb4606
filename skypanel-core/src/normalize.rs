//! Turns a wttr.in `?format=j1` payload into a [`WeatherRecord`].
//!
//! Everything here is pure: the caller performs the request and hands over
//! the status and body. A record is either complete or not produced at all.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    error::WeatherError,
    model::{ForecastRecord, Query, RawResponse, WeatherRecord},
};

/// Upstream numbers arrive as strings ("12") from wttr.in, but plain JSON
/// numbers are accepted too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Integer part, like a lenient `parseInt`.
    fn as_i64(&self) -> Option<i64> {
        self.as_f64().map(|v| v.trunc() as i64)
    }

    /// Strict integer, used for epoch timestamps.
    fn as_epoch(&self) -> Option<i64> {
        match self {
            Numeric::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            Numeric::Number(_) => None,
            Numeric::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WttrText {
    value: String,
}

#[derive(Debug, Deserialize)]
struct WttrCurrent {
    #[serde(rename = "temp_C")]
    temp_c: Numeric,
    #[serde(rename = "FeelsLikeC")]
    feels_like_c: Numeric,
    humidity: Numeric,
    pressure: Numeric,
    #[serde(rename = "windspeedKmph")]
    wind_speed_kmph: Numeric,
    #[serde(rename = "winddirDegree")]
    wind_dir_degree: Numeric,
    visibility: Numeric,
    cloudcover: Numeric,
    #[serde(rename = "weatherCode")]
    weather_code: Numeric,
    #[serde(rename = "weatherDesc")]
    weather_desc: Vec<WttrText>,
}

#[derive(Debug, Default, Deserialize)]
struct WttrArea {
    #[serde(rename = "areaName", default)]
    area_name: Vec<WttrText>,
    #[serde(default)]
    country: Vec<WttrText>,
    #[serde(default)]
    sunrise: Vec<Numeric>,
    #[serde(default)]
    sunset: Vec<Numeric>,
}

#[derive(Debug, Deserialize)]
struct WttrPayload {
    #[serde(default)]
    current_condition: Option<Vec<WttrCurrent>>,
    #[serde(default)]
    nearest_area: Option<Vec<WttrArea>>,
}

/// Map an upstream weather code onto the canonical code space.
pub fn canonical_condition_code(upstream: i32) -> i32 {
    match upstream {
        113 => 800,
        116 => 801,
        119 | 122 => 803,
        200..=299 => upstream + 200,
        300..=399 => 300,
        500..=599 => 500,
        600..=699 => 600,
        700..=799 => 700,
        _ => 800,
    }
}

/// Normalize against the current wall clock.
pub fn normalize(query: &Query, raw: &RawResponse) -> Result<WeatherRecord, WeatherError> {
    normalize_at(query, raw, Utc::now())
}

pub fn normalize_at(
    query: &Query,
    raw: &RawResponse,
    now: DateTime<Utc>,
) -> Result<WeatherRecord, WeatherError> {
    if !raw.status.is_success() {
        tracing::debug!(status = %raw.status, location = %query, "upstream rejected location");
        return Err(WeatherError::NotFound);
    }

    let payload: WttrPayload = serde_json::from_str(&raw.body).map_err(|err| {
        tracing::debug!(error = %err, "upstream payload did not match the expected shape");
        WeatherError::DataUnavailable
    })?;

    let current = payload
        .current_condition
        .as_deref()
        .and_then(<[WttrCurrent]>::first)
        .ok_or(WeatherError::DataUnavailable)?;

    let area = payload.nearest_area.as_deref().and_then(<[WttrArea]>::first);

    let location_name = area
        .and_then(|a| a.area_name.first())
        .map(|t| t.value.clone())
        .unwrap_or_else(|| query.display_name());

    let country_code = area
        .and_then(|a| a.country.first())
        .map(|t| t.value.clone())
        .unwrap_or_default();

    let (sunrise_epoch_sec, sunset_epoch_sec) = area.map(sun_times).unwrap_or((0, 0));

    let upstream_code = int_field(&current.weather_code, "weatherCode")?;
    let condition_code = canonical_condition_code(i32::try_from(upstream_code).unwrap_or(0));

    let condition_text = current
        .weather_desc
        .first()
        .map(|t| t.value.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            tracing::debug!("weatherDesc is missing or empty");
            WeatherError::DataUnavailable
        })?;

    let temperature_c = float_field(&current.temp_c, "temp_C")?;

    Ok(WeatherRecord {
        location_name,
        country_code,
        condition_code,
        condition_text,
        temperature_c,
        feels_like_c: float_field(&current.feels_like_c, "FeelsLikeC")?,
        temperature_max_c: temperature_c,
        temperature_min_c: temperature_c,
        humidity_pct: percent(int_field(&current.humidity, "humidity")?),
        pressure_hpa: i32::try_from(int_field(&current.pressure, "pressure")?)
            .map_err(|_| WeatherError::DataUnavailable)?,
        wind_speed_mps: float_field(&current.wind_speed_kmph, "windspeedKmph")? / 3.6,
        wind_direction_deg: int_field(&current.wind_dir_degree, "winddirDegree")?.rem_euclid(360)
            as u16,
        visibility_m: float_field(&current.visibility, "visibility")? * 1000.0,
        cloud_cover_pct: percent(int_field(&current.cloudcover, "cloudcover")?),
        observed_at_epoch_sec: now.timestamp(),
        sunrise_epoch_sec,
        sunset_epoch_sec,
    })
}

/// Multi-day forecast assembly is not implemented.
pub fn assemble_forecast(_raw: &RawResponse) -> Option<ForecastRecord> {
    None
}

fn float_field(value: &Numeric, name: &str) -> Result<f64, WeatherError> {
    value.as_f64().ok_or_else(|| {
        tracing::debug!(field = name, ?value, "field is not numeric");
        WeatherError::DataUnavailable
    })
}

fn int_field(value: &Numeric, name: &str) -> Result<i64, WeatherError> {
    value.as_i64().ok_or_else(|| {
        tracing::debug!(field = name, ?value, "field is not an integer");
        WeatherError::DataUnavailable
    })
}

fn percent(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

fn sun_times(area: &WttrArea) -> (i64, i64) {
    let sunrise = area.sunrise.first().and_then(Numeric::as_epoch);
    let sunset = area.sunset.first().and_then(Numeric::as_epoch);
    match (sunrise, sunset) {
        (Some(rise), Some(set)) => (rise, set),
        _ => (0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    fn london_payload() -> serde_json::Value {
        json!({
            "current_condition": [{
                "FeelsLikeC": "9",
                "cloudcover": "75",
                "humidity": "81",
                "pressure": "1012",
                "temp_C": "11",
                "visibility": "10",
                "weatherCode": "116",
                "weatherDesc": [{ "value": "Partly cloudy" }],
                "winddirDegree": "230",
                "windspeedKmph": "18"
            }],
            "nearest_area": [{
                "areaName": [{ "value": "London" }],
                "country": [{ "value": "United Kingdom" }]
            }]
        })
    }

    fn raw(value: &serde_json::Value) -> RawResponse {
        RawResponse::ok(value.to_string())
    }

    fn london() -> Query {
        Query::ByName("London".to_string())
    }

    #[test]
    fn code_table_first_match_wins() {
        assert_eq!(canonical_condition_code(113), 800);
        assert_eq!(canonical_condition_code(116), 801);
        assert_eq!(canonical_condition_code(119), 803);
        assert_eq!(canonical_condition_code(122), 803);
        assert_eq!(canonical_condition_code(302), 300);
        assert_eq!(canonical_condition_code(599), 500);
        assert_eq!(canonical_condition_code(600), 600);
        assert_eq!(canonical_condition_code(781), 700);
        assert_eq!(canonical_condition_code(143), 800);
        assert_eq!(canonical_condition_code(-4), 800);
    }

    #[test]
    fn thunderstorm_band_is_shifted_by_200() {
        for code in 200..300 {
            assert_eq!(canonical_condition_code(code), code + 200);
        }
    }

    #[test]
    fn normalizes_a_full_payload() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).expect("valid ts");
        let record = normalize_at(&london(), &raw(&london_payload()), now).expect("record");

        assert_eq!(record.location_name, "London");
        assert_eq!(record.country_code, "United Kingdom");
        assert_eq!(record.condition_code, 801);
        assert_eq!(record.condition_text, "Partly cloudy");
        assert_eq!(record.temperature_c, 11.0);
        assert_eq!(record.feels_like_c, 9.0);
        assert_eq!(record.temperature_max_c, 11.0);
        assert_eq!(record.temperature_min_c, 11.0);
        assert_eq!(record.humidity_pct, 81);
        assert_eq!(record.pressure_hpa, 1012);
        assert!((record.wind_speed_mps - 5.0).abs() < 1e-9);
        assert_eq!(record.wind_direction_deg, 230);
        assert_eq!(record.visibility_m, 10_000.0);
        assert_eq!(record.cloud_cover_pct, 75);
        assert_eq!(record.observed_at_epoch_sec, 1_700_000_000);
        assert_eq!(record.sunrise_epoch_sec, 0);
        assert_eq!(record.sunset_epoch_sec, 0);
    }

    #[test]
    fn code_116_is_partly_cloudy_whatever_else_is_sent() {
        let mut payload = london_payload();
        payload["current_condition"][0]["weatherDesc"] = json!([{ "value": "Heavy snow" }]);
        payload["current_condition"][0]["cloudcover"] = json!("100");
        let record = normalize(&london(), &raw(&payload)).expect("record");
        assert_eq!(record.condition_code, 801);
    }

    #[test]
    fn non_success_status_is_not_found() {
        let response = RawResponse {
            status: StatusCode::NOT_FOUND,
            body: london_payload().to_string(),
        };
        assert_eq!(normalize(&london(), &response), Err(WeatherError::NotFound));

        let response = RawResponse { status: StatusCode::BAD_GATEWAY, body: String::new() };
        assert_eq!(normalize(&london(), &response), Err(WeatherError::NotFound));
    }

    #[test]
    fn missing_or_empty_current_conditions_is_data_unavailable() {
        let mut payload = london_payload();
        payload.as_object_mut().expect("object").remove("current_condition");
        assert_eq!(normalize(&london(), &raw(&payload)), Err(WeatherError::DataUnavailable));

        payload["current_condition"] = json!([]);
        assert_eq!(normalize(&london(), &raw(&payload)), Err(WeatherError::DataUnavailable));

        payload["current_condition"] = json!(null);
        assert_eq!(normalize(&london(), &raw(&payload)), Err(WeatherError::DataUnavailable));
    }

    #[test]
    fn a_missing_field_fails_the_whole_record() {
        let mut payload = london_payload();
        payload["current_condition"][0]
            .as_object_mut()
            .expect("object")
            .remove("pressure");
        assert_eq!(normalize(&london(), &raw(&payload)), Err(WeatherError::DataUnavailable));
    }

    #[test]
    fn a_non_numeric_field_fails_the_whole_record() {
        let mut payload = london_payload();
        payload["current_condition"][0]["temp_C"] = json!("warm");
        assert_eq!(normalize(&london(), &raw(&payload)), Err(WeatherError::DataUnavailable));
    }

    #[test]
    fn non_json_body_is_data_unavailable() {
        let response = RawResponse::ok("Unknown location; please try ~51.5,-0.1");
        assert_eq!(normalize(&london(), &response), Err(WeatherError::DataUnavailable));
    }

    #[test]
    fn falls_back_to_query_without_nearest_area() {
        let mut payload = london_payload();
        payload.as_object_mut().expect("object").remove("nearest_area");

        let query = Query::ByName("Timbuktu".to_string());
        let record = normalize(&query, &raw(&payload)).expect("record");
        assert_eq!(record.location_name, "Timbuktu");
        assert_eq!(record.country_code, "");

        let query: Query = "16.77,-3.01".parse().expect("coords");
        let record = normalize(&query, &raw(&payload)).expect("record");
        assert_eq!(record.location_name, "16.77,-3.01");
    }

    #[test]
    fn sun_times_are_copied_when_epoch_like() {
        let mut payload = london_payload();
        payload["nearest_area"][0]["sunrise"] = json!(["1699945200"]);
        payload["nearest_area"][0]["sunset"] = json!([1699978800]);
        let record = normalize(&london(), &raw(&payload)).expect("record");
        assert_eq!(record.sunrise_epoch_sec, 1_699_945_200);
        assert_eq!(record.sunset_epoch_sec, 1_699_978_800);

        payload["nearest_area"][0]["sunset"] = json!(["04:31 PM"]);
        let record = normalize(&london(), &raw(&payload)).expect("record");
        assert_eq!(record.sunrise_epoch_sec, 0);
        assert_eq!(record.sunset_epoch_sec, 0);
    }

    #[test]
    fn numbers_are_accepted_as_json_numbers() {
        let mut payload = london_payload();
        payload["current_condition"][0]["temp_C"] = json!(-3.5);
        payload["current_condition"][0]["winddirDegree"] = json!(360);
        payload["current_condition"][0]["humidity"] = json!(140);
        let record = normalize(&london(), &raw(&payload)).expect("record");
        assert_eq!(record.temperature_c, -3.5);
        assert_eq!(record.wind_direction_deg, 0);
        assert_eq!(record.humidity_pct, 100);
    }

    #[test]
    fn missing_or_blank_description_fails_the_whole_record() {
        let mut payload = london_payload();
        payload["current_condition"][0]
            .as_object_mut()
            .expect("object")
            .remove("weatherDesc");
        assert_eq!(normalize(&london(), &raw(&payload)), Err(WeatherError::DataUnavailable));

        payload["current_condition"][0]["weatherDesc"] = json!([]);
        assert_eq!(normalize(&london(), &raw(&payload)), Err(WeatherError::DataUnavailable));

        payload["current_condition"][0]["weatherDesc"] = json!([{ "value": "  " }]);
        assert_eq!(normalize(&london(), &raw(&payload)), Err(WeatherError::DataUnavailable));
    }

    #[test]
    fn repeated_runs_differ_only_in_observed_time() {
        let a = normalize_at(
            &london(),
            &raw(&london_payload()),
            DateTime::from_timestamp(1_000, 0).expect("ts"),
        )
        .expect("record");
        let mut b = normalize_at(
            &london(),
            &raw(&london_payload()),
            DateTime::from_timestamp(2_000, 0).expect("ts"),
        )
        .expect("record");

        assert_ne!(a.observed_at_epoch_sec, b.observed_at_epoch_sec);
        b.observed_at_epoch_sec = a.observed_at_epoch_sec;
        assert_eq!(
            serde_json::to_string(&a).expect("json"),
            serde_json::to_string(&b).expect("json")
        );
    }

    #[test]
    fn forecast_is_never_assembled() {
        assert_eq!(assemble_forecast(&raw(&london_payload())), None);
    }
}
