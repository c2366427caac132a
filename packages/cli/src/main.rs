#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command line front end for the nitrate / cancer rate surface.
//!
//! Loads the census tract and well datasets once, then either computes a
//! single surface and prints its snapshot as JSON (`run`), or opens a
//! menu for repeated calculate / reset / summary cycles (`interactive`,
//! the default).
//!
//! Uses `indicatif-log-bridge` (via [`nitrate_map_cli_utils::init_logger`])
//! so log lines and progress bars share the terminal.

mod interactive;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use nitrate_map_cli_utils::{IndicatifProgress, MultiProgress};
use nitrate_map_geography::load_inputs;
use nitrate_map_pipeline::{PipelineConfig, Session, null_progress};

#[derive(Parser)]
#[command(
    name = "nitrate_map",
    about = "Relates well nitrate levels to census tract cancer rates"
)]
struct Cli {
    /// Census tract polygons (`GeoJSON`) carrying `canrate`
    #[arg(long, global = true, default_value = "assets/data/tracts.json")]
    tracts: PathBuf,
    /// Well sample points (`GeoJSON`) carrying `nitconc`
    #[arg(long, global = true, default_value = "assets/data/wells.json")]
    wells: PathBuf,
    /// Pipeline configuration (TOML) replacing the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate one surface and print the snapshot as JSON
    Run {
        /// Inverse distance weighting exponent
        #[arg(long)]
        distance_decay: f64,
        /// Hexagon size in kilometers
        #[arg(long)]
        cell_size: f64,
        /// Include the grid feature collection in the output
        #[arg(long)]
        include_grid: bool,
    },
    /// Calculate, reset, and inspect surfaces from a menu
    Interactive,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = nitrate_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::embedded()?,
    };

    let start = Instant::now();
    let spinner = IndicatifProgress::spinner(&multi, "Loading tracts and wells");
    let inputs = load_inputs(&cli.tracts, &cli.wells).await;
    spinner.finish_and_clear();
    let inputs = inputs?;
    log::info!(
        "Loaded {} tracts and {} wells in {:.1?}",
        inputs.tracts.len(),
        inputs.wells.len(),
        start.elapsed()
    );

    let mut session = Session::new(inputs, config, null_progress())?;

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Run {
            distance_decay,
            cell_size,
            include_grid,
        } => run_once(&mut session, &multi, distance_decay, cell_size, include_grid)?,
        Commands::Interactive => interactive::run(&mut session, &multi)?,
    }

    Ok(())
}

/// Computes one surface and prints its snapshot, or the error report, as
/// JSON on stdout.
fn run_once(
    session: &mut Session,
    multi: &MultiProgress,
    distance_decay: f64,
    cell_size: f64,
    include_grid: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = session
        .validate(distance_decay, cell_size)
        .and_then(|params| {
            session.set_progress(IndicatifProgress::stages_bar(multi, "Calculating"));
            session.run(params).map(|_| ())
        });

    if let Err(e) = result {
        println!("{}", serde_json::to_string_pretty(&e.report())?);
        return Err(e.into());
    }

    let mut snapshot = session.snapshot();
    if !include_grid {
        snapshot.grid = None;
    }
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}
