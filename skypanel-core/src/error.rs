use thiserror::Error;

/// Everything that can end a weather lookup.
///
/// The `Display` text of each variant is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    #[error("Location not found")]
    NotFound,

    #[error("Weather data not available")]
    DataUnavailable,

    #[error(
        "Location permission denied. Please allow location access or search for a city manually."
    )]
    GeolocationDenied,

    #[error("Location information is unavailable.")]
    GeolocationUnavailable,

    #[error("Location request timed out.")]
    GeolocationTimeout,

    #[error("Geolocation may be blocked. Please use a secure connection or search for a city manually.")]
    GeolocationBlockedContext,

    #[error("Could not reach the weather service: {0}")]
    Transport(String),

    /// A newer request was started before this one finished.
    #[error("Request was superseded by a newer search")]
    Superseded,
}

/// Fieldless mirror of [`WeatherError`], recorded in the controller status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    DataUnavailable,
    GeolocationDenied,
    GeolocationUnavailable,
    GeolocationTimeout,
    GeolocationBlockedContext,
    Transport,
    Superseded,
}

impl WeatherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::NotFound => ErrorKind::NotFound,
            WeatherError::DataUnavailable => ErrorKind::DataUnavailable,
            WeatherError::GeolocationDenied => ErrorKind::GeolocationDenied,
            WeatherError::GeolocationUnavailable => ErrorKind::GeolocationUnavailable,
            WeatherError::GeolocationTimeout => ErrorKind::GeolocationTimeout,
            WeatherError::GeolocationBlockedContext => ErrorKind::GeolocationBlockedContext,
            WeatherError::Transport(_) => ErrorKind::Transport,
            WeatherError::Superseded => ErrorKind::Superseded,
        }
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        WeatherError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_user_facing_text() {
        assert_eq!(WeatherError::NotFound.to_string(), "Location not found");
        assert_eq!(WeatherError::DataUnavailable.to_string(), "Weather data not available");
        assert_eq!(
            WeatherError::GeolocationTimeout.to_string(),
            "Location request timed out."
        );
    }

    #[test]
    fn kind_drops_transport_detail() {
        assert_eq!(WeatherError::Transport("boom".into()).kind(), ErrorKind::Transport);
        assert_eq!(
            WeatherError::GeolocationBlockedContext.kind(),
            ErrorKind::GeolocationBlockedContext
        );
    }
}
