use crate::{
    error::{ErrorKind, WeatherError},
    model::{ForecastRecord, Unit, WeatherRecord},
    render::{Panel, render},
};

/// The last successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedWeather {
    pub record: WeatherRecord,
    pub forecast: Option<ForecastRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Error(ErrorKind),
}

/// Handed out when a lookup starts; required to complete it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Updated(Panel),
    Failed(WeatherError),
    /// A newer request was started; the result was thrown away.
    Stale,
}

/// Everything the panel needs between lookups. Lives as long as the session.
#[derive(Debug, Clone)]
pub struct AppState {
    last: Option<CachedWeather>,
    unit: Unit,
    latest_request: u64,
    status: Status,
    last_outcome: Option<Outcome>,
}

impl AppState {
    pub fn new(unit: Unit) -> Self {
        Self {
            last: None,
            unit,
            latest_request: 0,
            status: Status::Idle,
            last_outcome: None,
        }
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn last(&self) -> Option<&CachedWeather> {
        self.last.as_ref()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }

    /// Start a lookup. Any ticket handed out earlier becomes stale.
    pub fn begin_request(&mut self) -> RequestTicket {
        self.latest_request += 1;
        self.status = Status::Loading;
        RequestTicket(self.latest_request)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.latest_request
    }

    /// Finish a lookup. Only the most recent ticket may change the cache;
    /// it also always clears the loading status.
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        result: Result<CachedWeather, WeatherError>,
    ) -> Completion {
        if !self.is_current(ticket) {
            tracing::debug!(ticket = ticket.id(), latest = self.latest_request, "dropping stale result");
            return Completion::Stale;
        }

        self.status = Status::Idle;
        match result {
            Ok(cached) => {
                let panel = render(&cached.record, self.unit);
                self.last = Some(cached);
                self.last_outcome = Some(Outcome::Success);
                Completion::Updated(panel)
            }
            Err(err) => {
                self.last_outcome = Some(Outcome::Error(err.kind()));
                Completion::Failed(err)
            }
        }
    }

    /// Render the cached record in the active unit.
    pub fn rerender(&self) -> Option<Panel> {
        self.last.as_ref().map(|cached| render(&cached.record, self.unit))
    }

    /// Switch units and re-render from cache. Does nothing without a cached
    /// record or when `unit` is already active.
    pub fn toggle_unit(&mut self, unit: Unit) -> Option<Panel> {
        if self.last.is_none() || unit == self.unit {
            return None;
        }
        self.unit = unit;
        self.rerender()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Unit::default())
    }
}
