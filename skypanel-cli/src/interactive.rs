use std::fmt;

use anyhow::Result;
use inquire::{InquireError, Select, Text};
use skypanel_core::{
    Config, Controller, Panel, Query, Unit, WeatherError, WeatherSource, WttrSource, geolocation,
};

use crate::cli::print_panel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Search,
    Locate,
    SwitchUnit(Unit),
    Quit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Search => f.write_str("Search city"),
            Action::Locate => f.write_str("Use my location"),
            Action::SwitchUnit(unit) => write!(f, "Switch to °{unit}"),
            Action::Quit => f.write_str("Quit"),
        }
    }
}

/// Menu entries for the current state. Unit switching needs a cached record.
fn actions<S: WeatherSource>(controller: &Controller<S>) -> Vec<Action> {
    let state = controller.state();
    let mut actions = vec![Action::Search, Action::Locate];
    if state.last().is_some() {
        actions.push(Action::SwitchUnit(state.unit().toggled()));
    }
    actions.push(Action::Quit);
    actions
}

pub async fn run(config: &Config, unit: Unit) -> Result<()> {
    let source = WttrSource::from_config(config)?;
    let geolocator = geolocation::geolocator_from_config(&config.geolocation)?;
    let controller = Controller::new(source, unit);

    // Start with the default city, the way a freshly opened panel does.
    let initial = Query::ByName(config.default_city().to_string());
    report(controller.search(&initial).await);

    loop {
        let Some(action) = answered(Select::new("What next?", actions(&controller)).prompt())?
        else {
            break;
        };

        match action {
            Action::Search => {
                let prompt = Text::new("City or <lat>,<lon>:").with_default(config.default_city());
                let Some(text) = answered(prompt.prompt())? else {
                    break;
                };
                match text.parse::<Query>() {
                    Ok(query) => report(controller.search(&query).await),
                    Err(err) => eprintln!("{err}"),
                }
            }
            Action::Locate => report(controller.locate_and_search(geolocator.as_ref()).await),
            Action::SwitchUnit(unit) => {
                if let Some(panel) = controller.toggle_unit(unit) {
                    print_panel(&panel);
                }
            }
            Action::Quit => break,
        }
    }

    Ok(())
}

/// Esc and Ctrl-C at any prompt end the session instead of failing it.
fn answered<T>(answer: Result<T, InquireError>) -> Result<Option<T>> {
    match answer {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn report(result: Result<Panel, WeatherError>) {
    match result {
        Ok(panel) => print_panel(&panel),
        Err(err) => {
            tracing::warn!(kind = ?err.kind(), error = %err, "lookup failed");
            eprintln!("{err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_unit_only_offered_with_a_record() {
        let controller = Controller::new(WttrSource::default(), Unit::Celsius);
        assert_eq!(actions(&controller), vec![Action::Search, Action::Locate, Action::Quit]);
    }

    #[test]
    fn cancelled_prompts_quit_quietly() {
        assert_eq!(answered::<String>(Err(InquireError::OperationCanceled)).ok(), Some(None));
        assert_eq!(answered::<String>(Err(InquireError::OperationInterrupted)).ok(), Some(None));
        assert_eq!(answered(Ok("Lisbon")).ok(), Some(Some("Lisbon")));
        assert!(answered::<String>(Err(InquireError::NotTTY)).is_err());
    }

    #[test]
    fn action_labels() {
        assert_eq!(Action::SwitchUnit(Unit::Fahrenheit).to_string(), "Switch to °F");
        assert_eq!(Action::Search.to_string(), "Search city");
    }
}
