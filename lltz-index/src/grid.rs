//! Top-level 360×180 grid assembly.
//!
//! One whole-degree cell per grid slot. Longitude columns are independent
//! and encoded in parallel; the merge is a single-threaded pass in
//! row-major (latitude, longitude) order, so the artifact is byte-identical
//! regardless of completion order. The grid is the quadtree's implicit
//! root: the same tagged-pointer scheme as an Internal node, with 360×180
//! children sharing one blob instead of a private buffer.

use crate::config::BuildConfig;
use crate::encode::{CellEncoder, GridBox};
use crate::error::Result;
use crate::format::{self, EncodedNode};
use crate::region::RegionSet;
use crate::snapshot::RegionSnapshot;
use rayon::prelude::*;

/// Grid columns (longitude degrees).
pub const GRID_WIDTH: usize = 360;

/// Grid rows (latitude degrees).
pub const GRID_HEIGHT: usize = 180;

/// The assembled top level: root tagged pointers in row-major (latitude,
/// longitude) order plus the shared blob they point into.
#[derive(Debug, Clone)]
pub struct GridIndex {
    pub root_words: Vec<u32>,
    pub blob: Vec<u8>,
}

/// Encode every whole-degree cell and merge the results.
pub fn assemble(regions: &RegionSet, config: &BuildConfig) -> Result<GridIndex> {
    let columns: Vec<Vec<EncodedNode>> = (0..GRID_WIDTH as i64)
        .into_par_iter()
        .map(|lon| encode_column(regions, config, lon))
        .collect::<Result<_>>()?;

    let mut root_words = Vec::with_capacity(GRID_WIDTH * GRID_HEIGHT);
    let mut blob = Vec::new();
    for lat in 0..GRID_HEIGHT {
        for column in columns.iter().take(GRID_WIDTH) {
            let node = &column[lat];
            root_words.push(format::with_offset(node.word, blob.len())?);
            blob.extend_from_slice(&node.buffer);
        }
    }

    tracing::info!(
        roots = root_words.len(),
        blob_bytes = blob.len(),
        "grid assembled"
    );
    Ok(GridIndex { root_words, blob })
}

/// Encode the 180 cells of one longitude column, south to north.
///
/// The snapshot window spans the full column with one grid unit of slack
/// so envelope rounding at the band edge cannot drop a member.
fn encode_column(regions: &RegionSet, config: &BuildConfig, lon: i64) -> Result<Vec<EncodedNode>> {
    let s = config.scale;
    let window = GridBox::new(lon * s - 1, (lon + 1) * s + 1, -1, 180 * s + 1);
    let snapshot = RegionSnapshot::build(regions.regions(), &window);
    let encoder = CellEncoder::new(&snapshot, config.max_depth);

    tracing::debug!(lon = lon, members = snapshot.len(), "encoding column");

    (0..GRID_HEIGHT as i64)
        .map(|lat| {
            let cell = GridBox::new(lon * s, (lon + 1) * s, lat * s, (lat + 1) * s);
            let node = encoder.encode(cell)?;
            format::serialize_node(&node)
        })
        .collect()
}
