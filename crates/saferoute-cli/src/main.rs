use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use saferoute_core::{Coordinate, Hazard, RouteMode};
use saferoute_engine::{Config, RouteSafetyEngine};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Disaster-aware route safety engine", long_about = None)]
struct Args {
    /// JSON file holding the current hazard list
    #[arg(long, global = true)]
    hazards: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show avoidance regions and active hazards for a trip
    Polygons {
        /// Origin as "lat,lon"
        #[arg(value_parser = parse_coordinate, allow_hyphen_values = true)]
        origin: Coordinate,
        /// Destination as "lat,lon"
        #[arg(value_parser = parse_coordinate, allow_hyphen_values = true)]
        destination: Coordinate,
    },
    /// Request hazard-avoiding routes and score them
    Routes {
        #[arg(value_parser = parse_coordinate, allow_hyphen_values = true)]
        origin: Coordinate,
        #[arg(value_parser = parse_coordinate, allow_hyphen_values = true)]
        destination: Coordinate,
        /// Send hazard buffers to the routing provider
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        avoid: bool,
        #[arg(long, default_value_t = 1)]
        alternatives: usize,
    },
    /// Request the hazard-agnostic baseline route
    Baseline {
        #[arg(value_parser = parse_coordinate, allow_hyphen_values = true)]
        origin: Coordinate,
        #[arg(value_parser = parse_coordinate, allow_hyphen_values = true)]
        destination: Coordinate,
        /// fastest or shortest
        #[arg(long, default_value = "fastest")]
        mode: RouteMode,
    },
    /// Compare the safest avoidance route against the baseline
    Compare {
        #[arg(value_parser = parse_coordinate, allow_hyphen_values = true)]
        origin: Coordinate,
        #[arg(value_parser = parse_coordinate, allow_hyphen_values = true)]
        destination: Coordinate,
        #[arg(long, default_value_t = 3)]
        alternatives: usize,
        #[arg(long, default_value = "fastest")]
        mode: RouteMode,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs)?;

    let hazards = match args.hazards.as_deref() {
        Some(path) => load_hazards(path)?,
        None => Vec::new(),
    };
    tracing::info!("Loaded {} hazards", hazards.len());

    let config = Config::from_env();
    let engine = RouteSafetyEngine::from_config(&config, Arc::new(hazards))
        .context("failed to initialize routing engine")?;

    match args.command {
        Command::Polygons {
            origin,
            destination,
        } => {
            let plan = engine.get_disaster_polygons(origin, destination)?;
            print_json(&plan)
        }
        Command::Routes {
            origin,
            destination,
            avoid,
            alternatives,
        } => {
            let outcome = engine
                .calculate_routes(origin, destination, avoid, alternatives)
                .await;
            print_json(&outcome)
        }
        Command::Baseline {
            origin,
            destination,
            mode,
        } => {
            let outcome = engine
                .calculate_baseline_route(origin, destination, mode)
                .await;
            print_json(&outcome)
        }
        Command::Compare {
            origin,
            destination,
            alternatives,
            mode,
        } => {
            let comparison = engine
                .compare_routes(origin, destination, alternatives, mode)
                .await;
            print_json(&comparison)
        }
    }
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("saferoute=info"))?;

    // Logs go to stderr so stdout stays machine-readable.
    if json {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
    Ok(())
}

fn load_hazards(path: &Path) -> Result<Vec<Hazard>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read hazards from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse hazards in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{}", rendered);
    Ok(())
}

fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got '{}'", raw))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lon.trim()))?;
    Coordinate::checked(lat, lon).map_err(|err| err.to_string())
}
