use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use inquire::{Select, Text};
use skypanel_core::{
    Config, Controller, Coordinates, Panel, Query, Unit, WttrSource, geolocation,
};

use crate::interactive;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skypanel", version, about = "Current weather in your terminal")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show current weather for a place, coordinates, or your location.
    Show(ShowArgs),

    /// Search repeatedly and switch between °C and °F.
    Interactive {
        /// Unit to start with; defaults to the configured one.
        #[arg(long)]
        unit: Option<Unit>,
    },

    /// Set preferences: default unit, default city, weather service URL.
    Configure,

    /// Print where the configuration file lives.
    ConfigPath,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Place name, or "<lat>,<lon>". Defaults to the configured city.
    pub query: Option<String>,

    #[arg(long, requires = "lon", conflicts_with_all = ["query", "here"], allow_hyphen_values = true)]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Use your current location.
    #[arg(long, conflicts_with = "query")]
    pub here: bool,

    /// Display unit (C or F).
    #[arg(short, long)]
    pub unit: Option<Unit>,

    /// Print the record and panel as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Show(args) => show(&config, args).await,
            Command::Interactive { unit } => {
                let unit = unit.unwrap_or_else(|| config.unit());
                interactive::run(&config, unit).await
            }
            Command::Configure => configure(config),
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
        }
    }
}

/// Turn the `show` arguments into a query. `None` means "locate me".
fn resolve_query(config: &Config, args: &ShowArgs) -> Result<Option<Query>> {
    if args.here {
        return Ok(None);
    }
    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        return Ok(Some(Query::ByCoordinates(Coordinates::new(lat, lon)?)));
    }

    let text = args
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or_else(|| config.default_city());

    Ok(Some(text.parse()?))
}

async fn show(config: &Config, args: ShowArgs) -> Result<()> {
    let unit = args.unit.unwrap_or_else(|| config.unit());
    let source = WttrSource::from_config(config)?;
    let controller = Controller::new(source, unit);

    let panel = match resolve_query(config, &args)? {
        Some(query) => controller.search(&query).await?,
        None => {
            let geolocator = geolocation::geolocator_from_config(&config.geolocation)?;
            controller.locate_and_search(geolocator.as_ref()).await?
        }
    };

    if args.json {
        let record = controller.state().last().map(|c| c.record.clone());
        let out = serde_json::json!({ "record": record, "panel": panel });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("Failed to serialize panel")?
        );
    } else {
        print_panel(&panel);
    }

    Ok(())
}

pub fn print_panel(panel: &Panel) {
    println!("{panel}");
}

fn configure(mut config: Config) -> Result<()> {
    let units = vec![Unit::Celsius, Unit::Fahrenheit];
    let start = units.iter().position(|u| *u == config.unit()).unwrap_or(0);
    let unit = Select::new("Default unit:", units)
        .with_starting_cursor(start)
        .prompt()?;
    config.set_unit(unit);

    let city = Text::new("Default city:")
        .with_default(config.default_city())
        .prompt()?;
    config.set_default_city(city);

    let url = Text::new("Weather service URL:")
        .with_default(config.base_url())
        .prompt()?;
    config.set_base_url(url)?;

    config.save()?;
    println!("Saved to {}", Config::config_file_path()?.display());
    Ok(())
}
