//! terrain2stl: turn a directory of heightmap tiles into a printable STL.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=terrain_mesh=info` - One line per pipeline stage
//! - `RUST_LOG=terrain_grid=debug` - Per-folder and per-tile loading detail
//! - `RUST_LOG=terrain_mesh::timing=debug` - Performance timing
//! - `RUST_LOG=debug` - All debug output
//!
//! # Example
//!
//! ```bash
//! # Reference conversion with stage logging
//! terrain2stl -v convert tiles/ -o terrain.stl
//!
//! # Quick, coarse preview without the crop
//! terrain2stl convert tiles/ -o preview.stl --factor 0.1 --no-crop
//!
//! # Check a previously written file
//! terrain2stl validate terrain.stl
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use terrain_grid::{GridError, ResampleFilter};
use terrain_mesh::MeshError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::{convert, inspect, validate};

/// terrain2stl - Convert heightmap tiles into a watertight STL solid.
///
/// Assembles 16-bit elevation tiles into one grid, crops and resamples it,
/// and closes it into a solid with a flat base and side walls.
#[derive(Parser)]
#[command(name = "terrain2stl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FilterArg {
    /// Catmull-Rom cubic interpolation
    Cubic,
    /// Bilinear interpolation
    Linear,
}

impl From<FilterArg> for ResampleFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Cubic => ResampleFilter::Cubic,
            FilterArg::Linear => ResampleFilter::Linear,
        }
    }
}

/// Command-line overrides applied on top of the config file.
#[derive(clap::Args)]
pub struct ConvertArgs {
    /// Directory holding one sub-folder of tiles per super-tile
    input: PathBuf,

    /// Output STL path [default: terrain.stl, or the config's `output`]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resampling factor applied after cropping
    #[arg(long)]
    factor: Option<f64>,

    /// Resampling kernel
    #[arg(long)]
    filter: Option<FilterArg>,

    /// Elevation subtracted from every sample
    #[arg(long)]
    base_height: Option<f32>,

    /// Height of the solid's bottom face (negative is below sea level)
    #[arg(long, allow_negative_numbers = true)]
    wall_thickness: Option<f64>,

    /// Footprint size of the grid width, in output units
    #[arg(long)]
    target_size: Option<f64>,

    /// Vertical exaggeration (defaults to the resampling factor)
    #[arg(long)]
    zoom: Option<f64>,

    /// Fail when a tile is missing instead of leaving zeros
    #[arg(long)]
    strict: bool,

    /// Keep the full assembled grid
    #[arg(long)]
    no_crop: bool,

    /// Do not zero out the exclusion rectangle
    #[arg(long)]
    no_mask: bool,

    /// Write the cropped grid as a grayscale PNG
    #[arg(long)]
    debug_raster: Option<PathBuf>,

    /// Skip the watertightness check before export
    #[arg(long)]
    skip_validation: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a tile directory to a watertight STL
    Convert(ConvertArgs),

    /// Report the tile layout, crop window and mesh size without writing
    Inspect {
        /// Directory holding one sub-folder of tiles per super-tile
        input: PathBuf,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check an STL file for watertightness and winding
    Validate {
        /// Input STL file
        input: PathBuf,
    },
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "terrain_mesh=info,terrain_grid=info",
            2 => "terrain_mesh=debug,terrain_grid=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn report_error(e: &anyhow::Error) {
    // A grid failure inside the pipeline still reports its own GRID code.
    let grid_err = e.downcast_ref::<GridError>().or_else(|| {
        e.downcast_ref::<MeshError>().and_then(|m| match m {
            MeshError::Grid(inner) => Some(inner),
            _ => None,
        })
    });

    if let Some(grid_err) = grid_err {
        eprintln!("{}: {}", "Error".red().bold(), grid_err);
        eprintln!("  {}: {}", "Code".cyan(), grid_err.code());
        eprintln!(
            "  {}: {}",
            "Suggestion".green(),
            grid_err.recovery_suggestion()
        );
    } else if let Some(mesh_err) = e.downcast_ref::<MeshError>() {
        eprintln!("{}: {}", "Error".red().bold(), mesh_err);
        eprintln!("  {}: {}", "Code".cyan(), mesh_err.code());
        eprintln!(
            "  {}: {}",
            "Suggestion".green(),
            mesh_err.recovery_suggestion()
        );
    } else {
        eprintln!("{}: {}", "Error".red().bold(), e);
        for cause in e.chain().skip(1) {
            eprintln!("  {}: {}", "Caused by".yellow(), cause);
        }
    }
}

fn main() -> Result<()> {
    #[cfg(debug_assertions)]
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Convert(args) => convert::run(args, &cli),
        Commands::Inspect { input, config } => inspect::run(input, config.as_deref(), &cli),
        Commands::Validate { input } => validate::run(input, &cli),
    };

    if let Err(e) = &result {
        if !cli.quiet {
            report_error(e);
        }
        std::process::exit(1);
    }

    Ok(())
}
