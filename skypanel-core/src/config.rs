use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    geolocation::DEFAULT_GEOLOCATION_ENDPOINT,
    model::{Coordinates, Unit},
    source::DEFAULT_BASE_URL,
};

/// Overrides `base_url` from the file when set.
pub const BASE_URL_ENV: &str = "SKYPANEL_BASE_URL";

pub const DEFAULT_CITY: &str = "London";

const DEFAULT_GEOLOCATION_TIMEOUT_SECS: u64 = 10;

/// `[geolocation]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeolocationConfig {
    /// When false, location lookups are refused as if permission was denied.
    pub enabled: bool,
    /// IP geolocation endpoint returning `latitude`/`longitude` JSON.
    pub endpoint: Option<String>,
    /// Allow a plain `http://` endpoint.
    pub allow_insecure: bool,
    pub timeout_secs: Option<u64>,
    /// Fixed home position; used instead of the IP lookup when both are set.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            allow_insecure: false,
            timeout_secs: None,
            latitude: None,
            longitude: None,
        }
    }
}

impl GeolocationConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_GEOLOCATION_ENDPOINT)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_GEOLOCATION_TIMEOUT_SECS))
    }

    /// Fixed position, if one is configured and valid.
    pub fn fixed_position(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon).ok(),
            _ => None,
        }
    }
}

/// Preferences stored on disk. Weather data itself is never persisted.
///
/// Example TOML:
/// ```toml
/// unit = "F"
/// default_city = "Amsterdam"
///
/// [geolocation]
/// latitude = 52.37
/// longitude = 4.89
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub unit: Option<Unit>,
    pub default_city: Option<String>,
    pub base_url: Option<String>,
    /// No timeout is applied to weather requests unless set.
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub geolocation: GeolocationConfig,
}

impl Config {
    pub fn unit(&self) -> Unit {
        self.unit.unwrap_or_default()
    }

    pub fn set_unit(&mut self, unit: Unit) {
        self.unit = Some(unit);
    }

    /// City searched when the user gives no query.
    pub fn default_city(&self) -> &str {
        self.default_city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CITY)
    }

    pub fn set_default_city(&mut self, city: String) {
        let city = city.trim().to_string();
        self.default_city = (!city.is_empty()).then_some(city);
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn set_base_url(&mut self, url: String) -> Result<()> {
        let url = url.trim().trim_end_matches('/').to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow!("Base URL must start with http:// or https://, got '{url}'"));
        }
        self.base_url = Some(url);
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    /// Environment overrides are applied on top.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            tracing::debug!(%url, "base url overridden from environment");
            cfg.set_base_url(url)?;
        }

        Ok(cfg)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(&path, self.to_toml()?)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skypanel", "skypanel")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
