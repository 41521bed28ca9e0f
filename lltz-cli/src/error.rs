//! CLI error type.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("input is not a GeoJSON FeatureCollection")]
    NotFeatureCollection,

    #[error("feature {index} has no geometry")]
    MissingGeometry { index: usize },

    #[error("feature {index} has no string property {property:?}")]
    MissingName { index: usize, property: String },

    #[error(transparent)]
    Index(#[from] lltz_index::IndexError),
}

/// Print the error to stderr and exit non-zero.
pub fn exit_with_error(err: CliError) -> ! {
    eprintln!("error: {err}");
    std::process::exit(1);
}
