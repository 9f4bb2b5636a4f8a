#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for inspecting and sharing Rampart maps.

mod map_transfer;
mod report;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec2;
use rampart_core::{Command, Event, MapData, NavigationConfig};
use rampart_world::{apply, query, MapManager};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Inspect, probe and share Rampart map files.
#[derive(Debug, Parser)]
#[command(name = "rampart", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,

    /// Log navigation rebuilds and searches.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Side length of a tile in world units.
    #[arg(long, global = true)]
    tile_size: Option<f32>,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Print the route, validation issues and flow field of a map.
    Inspect {
        /// Map file in JSON format.
        map: PathBuf,
    },
    /// Print the steering vector at a world-space position.
    Probe {
        /// Map file in JSON format.
        map: PathBuf,
        /// Horizontal world coordinate.
        #[arg(long, allow_negative_numbers = true)]
        x: f32,
        /// Vertical world coordinate.
        #[arg(long, allow_negative_numbers = true)]
        y: f32,
    },
    /// Encode a map into a single-line share string.
    Share {
        /// Map file in JSON format.
        map: PathBuf,
    },
    /// Decode a share string back into map JSON.
    Import {
        /// String produced by `rampart share`.
        value: String,
        /// Writes the map to this file instead of standard output.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

/// Entry point for the Rampart command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = NavigationConfig::default();
    if let Some(tile_size) = cli.tile_size {
        if !(tile_size.is_finite() && tile_size > 0.0) {
            bail!("tile size must be a positive number, got {tile_size}");
        }
        config.tile_size = tile_size;
    }

    match cli.command {
        CliCommand::Inspect { map } => inspect(&map, config),
        CliCommand::Probe { map, x, y } => probe(&map, config, Vec2::new(x, y)),
        CliCommand::Share { map } => share(&map),
        CliCommand::Import { value, output } => import(&value, output.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn inspect(path: &Path, config: NavigationConfig) -> Result<()> {
    let mut world = load_world(path, config)?;
    let grid = query::grid(&world);

    println!(
        "{}x{} map, {:?} waypoints: {}",
        grid.columns(),
        grid.rows(),
        query::waypoints_mode(&world),
        query::waypoints(&world).len()
    );

    let route = query::route(&world);
    if route.is_empty() {
        println!("no route");
    } else {
        let cells: Vec<String> = route
            .iter()
            .map(|cell| format!("({}, {})", cell.column(), cell.row()))
            .collect();
        println!("route ({} cells): {}", route.len(), cells.join(" "));
    }

    print!("{}", report::issues(&world.validate_route()));
    println!();
    print!("{}", report::distance_field(&world));
    println!();
    print!("{}", report::flow_arrows(&world));
    Ok(())
}

fn probe(path: &Path, config: NavigationConfig, position: Vec2) -> Result<()> {
    let world = load_world(path, config)?;
    let tile_size = query::config(&world).tile_size;
    let steer = query::steering_vector(&world, position);

    if position.x >= 0.0 && position.y >= 0.0 {
        let column = (position.x / tile_size).floor();
        let row = (position.y / tile_size).floor();
        println!("cell ({column}, {row})");
    }
    println!("steer {:.3} {:.3}", steer.x, steer.y);
    Ok(())
}

fn share(path: &Path) -> Result<()> {
    let map = read_map(path)?;
    map.validate()
        .with_context(|| format!("map {} is malformed", path.display()))?;
    let encoded = map_transfer::encode(&map).context("failed to encode map")?;
    println!("{encoded}");
    Ok(())
}

fn import(value: &str, output: Option<&Path>) -> Result<()> {
    let map = map_transfer::decode(value).context("failed to import shared map")?;
    let json = serde_json::to_string_pretty(&map).context("failed to serialise map")?;

    match output {
        Some(path) => {
            fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "map written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn read_map(path: &Path) -> Result<MapData> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

fn load_world(path: &Path, config: NavigationConfig) -> Result<MapManager> {
    let map = read_map(path)?;
    let mut world = MapManager::with_config(config);
    let mut events = Vec::new();
    apply(&mut world, Command::LoadMap { map }, &mut events);

    for event in &events {
        if let Event::MapRejected { reason } = event {
            bail!("map {} is malformed: {reason}", path.display());
        }
    }
    Ok(world)
}
