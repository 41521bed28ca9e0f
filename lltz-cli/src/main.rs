mod error;
mod input;

use clap::{Parser, Subcommand};
use error::{exit_with_error, CliError};
use lltz_index::BuildConfig;
use std::path::PathBuf;

/// Compile GeoJSON region sets into LLTZ lookup artifacts.
#[derive(Parser)]
#[command(name = "lltz", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a GeoJSON FeatureCollection into an artifact
    Build {
        /// Input GeoJSON FeatureCollection
        geojson_path: PathBuf,

        /// Output artifact path
        output_path: PathBuf,

        /// Maximum quadtree depth per whole-degree cell
        #[arg(long, default_value_t = lltz_index::config::DEFAULT_MAX_DEPTH)]
        max_depth: u8,

        /// Fixed-point grid units per degree
        #[arg(long, default_value_t = lltz_index::config::DEFAULT_SCALE)]
        scale: i64,

        /// Feature property holding the region name
        #[arg(long, default_value = "tzid")]
        name_property: String,
    },
}

fn init_tracing(quiet: bool, verbose: bool) {
    // --quiet → no logs; --verbose → info for our crates; default → honour
    // RUST_LOG, otherwise warnings only.
    let filter = if quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else if verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Build {
            geojson_path,
            output_path,
            max_depth,
            scale,
            name_property,
        } => {
            let config = BuildConfig::new().with_scale(scale).with_max_depth(max_depth);

            let features = input::load_features(&geojson_path, &name_property)?;
            let stats = lltz_index::build(features, &output_path, &config)?;

            if !cli.quiet {
                println!(
                    "{}: {} regions, {} owned / {} leaf / {} internal / {} empty roots, {} blob bytes",
                    output_path.display(),
                    stats.regions,
                    stats.roots_owned,
                    stats.roots_leaf,
                    stats.roots_internal,
                    stats.roots_empty,
                    stats.blob_bytes,
                );
            }
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    if let Err(e) = run(cli) {
        exit_with_error(e);
    }
}
