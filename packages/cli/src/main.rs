#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the saferoute engine.
//!
//! ```text
//! saferoute summary 51.5074,-0.1278
//! saferoute routes 51.5074,-0.1278 51.5155,-0.1419 --mode walking
//! saferoute compare 51.5074,-0.1278 51.5155,-0.1419
//! saferoute assess 51.5074,-0.1278 --at 2024-06-01T23:30
//! saferoute time 51.5074,-0.1278
//! saferoute hotspots 51.5074,-0.1278
//! ```
//!
//! Every command prints JSON. Crime data comes from the UK Police API,
//! routes from `OpenRouteService` when `OPENROUTE_API_KEY` is set (a
//! direct-line estimate otherwise) and weather from Open-Meteo.

mod weights;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use saferoute_analysis::SafetyEngine;
use saferoute_analysis::point_queries::DEFAULT_BASELINE;
use saferoute_assessment::{LocationAssessor, TimeOfDay};
use saferoute_geo::Coordinate;
use saferoute_incident_models::WeightScheme;
use saferoute_provider::open_meteo::OpenMeteoProvider;
use saferoute_provider::openroute::OpenRouteServiceProvider;
use saferoute_provider::police::UkPoliceProvider;
use saferoute_provider::{CrimeDataProvider, RoutingProvider, TravelMode, WeatherProvider};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "saferoute",
    about = "Crime-aware route comparison and location risk assessment"
)]
struct Cli {
    /// Category weighting preset (counts, severity, moderated)
    #[arg(long, global = true, default_value = "severity")]
    weights: WeightScheme,

    /// TOML file with custom category weights (overrides --weights)
    #[arg(long, global = true)]
    weights_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the incidents around a point
    Summary {
        /// Point as `lat,lon`
        #[arg(allow_hyphen_values = true)]
        point: Coordinate,
    },
    /// Build candidate routes and analyze each one
    Routes {
        /// Origin as `lat,lon`
        #[arg(allow_hyphen_values = true)]
        origin: Coordinate,
        /// Destination as `lat,lon`
        #[arg(allow_hyphen_values = true)]
        destination: Coordinate,
        /// Travel mode (walking, cycling, driving)
        #[arg(long, default_value = "walking")]
        mode: TravelMode,
    },
    /// Build candidate routes and rank them by safety
    Compare {
        /// Origin as `lat,lon`
        #[arg(allow_hyphen_values = true)]
        origin: Coordinate,
        /// Destination as `lat,lon`
        #[arg(allow_hyphen_values = true)]
        destination: Coordinate,
        /// Travel mode (walking, cycling, driving)
        #[arg(long, default_value = "walking")]
        mode: TravelMode,
    },
    /// Risk level of a point, including weather and time of day
    Assess {
        /// Point as `lat,lon`
        #[arg(allow_hyphen_values = true)]
        point: Coordinate,
        /// Local time as `YYYY-MM-DDTHH:MM` (defaults to now)
        #[arg(long, value_parser = parse_local_time)]
        at: Option<NaiveDateTime>,
    },
    /// Sunrise, sunset, daylight and day of week at a point
    Time {
        /// Point as `lat,lon`
        #[arg(allow_hyphen_values = true)]
        point: Coordinate,
        /// Local time as `YYYY-MM-DDTHH:MM` (defaults to now)
        #[arg(long, value_parser = parse_local_time)]
        at: Option<NaiveDateTime>,
    },
    /// Streets with clusters of incidents around a point
    Hotspots {
        /// Point as `lat,lon`
        #[arg(allow_hyphen_values = true)]
        point: Coordinate,
    },
    /// Compare a point's incident count with a baseline
    Average {
        /// Point as `lat,lon`
        #[arg(allow_hyphen_values = true)]
        point: Coordinate,
        /// Baseline monthly incident count
        #[arg(long, default_value_t = DEFAULT_BASELINE)]
        baseline: u64,
    },
    /// Counts and sample locations for specific categories
    Categories {
        /// Point as `lat,lon`
        #[arg(allow_hyphen_values = true)]
        point: Coordinate,
        /// Category slugs, e.g. `burglary`
        #[arg(required = true)]
        categories: Vec<String>,
    },
    /// Expected incidents during a part of the day
    Period {
        /// Point as `lat,lon`
        #[arg(allow_hyphen_values = true)]
        point: Coordinate,
        /// morning, afternoon, evening or night
        period: TimeOfDay,
    },
    /// Current weather at a point
    Weather {
        /// Point as `lat,lon`
        #[arg(allow_hyphen_values = true)]
        point: Coordinate,
    },
}

fn parse_local_time(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
}

/// `at` in this machine's time zone, or the current time.
fn resolve_local_time(at: Option<NaiveDateTime>) -> DateTime<FixedOffset> {
    at.and_then(|at| at.and_local_timezone(Local).earliest())
        .unwrap_or_else(Local::now)
        .fixed_offset()
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let weights = weights::load_weights(cli.weights, cli.weights_file.as_deref())?;
    let crime: Arc<dyn CrimeDataProvider> = Arc::new(UkPoliceProvider::from_env()?);
    let routing = OpenRouteServiceProvider::from_env()?
        .map(|provider| Arc::new(provider) as Arc<dyn RoutingProvider>);
    let engine = SafetyEngine::new(crime, routing, weights);

    match cli.command {
        Commands::Summary { point } => {
            print_json(&engine.summarize(point).await?)?;
        }
        Commands::Routes {
            origin,
            destination,
            mode,
        } => {
            let options = engine.build_routes(origin, destination, mode).await;
            let mut analyses = Vec::with_capacity(options.len());
            for option in &options {
                analyses.push(engine.analyze(option.handle).await?);
            }
            print_json(&serde_json::json!({
                "routes": options,
                "analyses": analyses,
            }))?;
        }
        Commands::Compare {
            origin,
            destination,
            mode,
        } => {
            let options = engine.build_routes(origin, destination, mode).await;
            let handles: Vec<_> = options.iter().map(|o| o.handle).collect();
            let report = engine.compare(&handles).await?;
            print_json(&serde_json::json!({
                "routes": options,
                "comparison": report,
            }))?;
        }
        Commands::Assess { point, at } => {
            let at = resolve_local_time(at);
            let assessor = LocationAssessor::new(
                Arc::clone(engine.aggregator()),
                Some(Arc::new(OpenMeteoProvider::from_env()?)),
            );
            print_json(&assessor.assess_point(point, at).await?)?;
        }
        Commands::Time { point, at } => {
            let at = resolve_local_time(at);
            print_json(&LocationAssessor::time_context(point, at))?;
        }
        Commands::Hotspots { point } => {
            print_json(&engine.hotspots(point).await?)?;
        }
        Commands::Average { point, baseline } => {
            print_json(&engine.compare_to_average(point, baseline).await?)?;
        }
        Commands::Categories { point, categories } => {
            print_json(&engine.incidents_by_category(point, &categories).await?)?;
        }
        Commands::Period { point, period } => {
            let records = engine.aggregator().records(point).await?;
            print_json(&saferoute_assessment::estimate_period(&records, period))?;
        }
        Commands::Weather { point } => {
            let weather = OpenMeteoProvider::from_env()?.current(point).await?;
            print_json(&serde_json::json!({
                "description": weather.description(),
                "raining": weather.is_raining(),
                "severe": weather.is_severe(),
                "visibilityLevel": weather.visibility_level(),
                "conditions": weather,
            }))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_route_mode_and_weights() {
        let cli = Cli::try_parse_from([
            "saferoute",
            "--weights",
            "moderated",
            "routes",
            "51.5,-0.1",
            "51.6,-0.2",
            "--mode",
            "cycling",
        ])
        .unwrap();

        assert_eq!(cli.weights, WeightScheme::Moderated);
        assert!(matches!(
            cli.command,
            Commands::Routes {
                mode: TravelMode::Cycling,
                ..
            }
        ));
    }

    #[test]
    fn parses_period_and_local_time() {
        let cli = Cli::try_parse_from(["saferoute", "period", "51.5,-0.1", "night"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Period {
                period: TimeOfDay::Night,
                ..
            }
        ));

        let cli = Cli::try_parse_from([
            "saferoute",
            "time",
            "-33.87,151.21",
            "--at",
            "2024-12-15T17:30",
        ])
        .unwrap();
        let Commands::Time { point, at } = cli.command else {
            panic!("expected time command");
        };
        assert!((point.latitude() + 33.87).abs() < 1e-9);
        assert_eq!(at, parse_local_time("2024-12-15T17:30:00").ok());
    }

    #[test]
    fn rejects_unknown_mode() {
        let result = Cli::try_parse_from([
            "saferoute",
            "compare",
            "51.5,-0.1",
            "51.6,-0.2",
            "--mode",
            "boat",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn explicit_local_time_is_kept() {
        let naive = parse_local_time("2024-06-01T23:30").unwrap();
        assert_eq!(resolve_local_time(Some(naive)).naive_local(), naive);
    }
}
