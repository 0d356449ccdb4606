use parking_lot::Mutex;

use crate::{
    error::WeatherError,
    geolocation::Geolocator,
    model::{Query, Unit},
    normalize::{assemble_forecast, normalize},
    render::Panel,
    source::WeatherSource,
    state::{AppState, CachedWeather, Completion, RequestTicket},
};

/// Glue between user actions, the weather source and the panel state.
///
/// Lookups take `&self`, so a new search may start while an older one is
/// still waiting on the network. The state lock is never held across an
/// `.await`; only the most recently started lookup may update the panel,
/// older ones finish with [`WeatherError::Superseded`].
#[derive(Debug)]
pub struct Controller<S: WeatherSource> {
    source: S,
    state: Mutex<AppState>,
}

impl<S: WeatherSource> Controller<S> {
    pub fn new(source: S, unit: Unit) -> Self {
        Self {
            source,
            state: Mutex::new(AppState::new(unit)),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AppState {
        self.state.lock().clone()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Look up `query` and render it in the active unit.
    pub async fn search(&self, query: &Query) -> Result<Panel, WeatherError> {
        let ticket = self.state.lock().begin_request();
        let result = self.lookup(query).await;
        self.finish(ticket, query, result)
    }

    /// Ask `geolocator` for a position, then search there.
    pub async fn locate_and_search(
        &self,
        geolocator: &dyn Geolocator,
    ) -> Result<Panel, WeatherError> {
        let ticket = self.state.lock().begin_request();
        let query = match geolocator.locate().await {
            Ok(coords) => Query::ByCoordinates(coords),
            Err(err) => {
                let err = WeatherError::from(err);
                tracing::warn!(error = %err, "could not determine location");
                return match self.state.lock().complete(ticket, Err(err)) {
                    Completion::Failed(err) => Err(err),
                    _ => Err(WeatherError::Superseded),
                };
            }
        };

        let result = self.lookup(&query).await;
        self.finish(ticket, &query, result)
    }

    /// Switch the display unit; re-renders from cache without any I/O.
    pub fn toggle_unit(&self, unit: Unit) -> Option<Panel> {
        self.state.lock().toggle_unit(unit)
    }

    pub fn current_panel(&self) -> Option<Panel> {
        self.state.lock().rerender()
    }

    async fn lookup(&self, query: &Query) -> Result<CachedWeather, WeatherError> {
        let location = query.location();
        tracing::info!(%query, %location, "fetching weather");

        let raw = self.source.fetch(&location).await?;
        let record = normalize(query, &raw)?;
        let forecast = assemble_forecast(&raw);

        Ok(CachedWeather { record, forecast })
    }

    fn finish(
        &self,
        ticket: RequestTicket,
        query: &Query,
        result: Result<CachedWeather, WeatherError>,
    ) -> Result<Panel, WeatherError> {
        let completion = self.state.lock().complete(ticket, result);
        match completion {
            Completion::Updated(panel) => {
                tracing::info!(%query, location = %panel.location, "weather updated");
                Ok(panel)
            }
            Completion::Failed(err) => {
                tracing::warn!(%query, error = %err, "weather lookup failed");
                Err(err)
            }
            Completion::Stale => {
                tracing::debug!(%query, "lookup superseded by a newer one");
                Err(WeatherError::Superseded)
            }
        }
    }
}
