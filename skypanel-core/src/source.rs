use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;

use crate::{config::Config, error::WeatherError, model::RawResponse};

pub const DEFAULT_BASE_URL: &str = "https://wttr.in";

/// Somewhere current conditions can be fetched from.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    /// Fetch the raw answer for an already resolved location segment.
    ///
    /// Non-success statuses are returned as-is; only transport failures are
    /// errors here.
    async fn fetch(&self, location: &str) -> Result<RawResponse, WeatherError>;
}

/// wttr.in JSON endpoint (`/{location}?format=j1`).
#[derive(Debug, Clone)]
pub struct WttrSource {
    base_url: String,
    http: Client,
}

impl WttrSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    /// Like [`WttrSource::new`] but with a whole-request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url: base_url.into(), http })
    }

    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        let base_url = config.base_url();
        match config.request_timeout() {
            Some(timeout) => Self::with_timeout(base_url, timeout),
            None => Ok(Self::new(base_url)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, location: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), location)
    }
}

impl Default for WttrSource {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl WeatherSource for WttrSource {
    async fn fetch(&self, location: &str) -> Result<RawResponse, WeatherError> {
        let url = self.url_for(location);
        tracing::debug!(%url, "requesting current conditions");

        let res = self
            .http
            .get(&url)
            .query(&[("format", "j1")])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        tracing::debug!(%status, bytes = body.len(), "upstream responded");

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_location() {
        let source = WttrSource::new("https://wttr.in/");
        assert_eq!(source.url_for("New%20York"), "https://wttr.in/New%20York");

        let source = WttrSource::default();
        assert_eq!(source.url_for("51.5,-0.1"), "https://wttr.in/51.5,-0.1");
    }
}
