//! Degree → fixed-point grid mapping.
//!
//! Geographic coordinates are mapped onto a non-negative integer grid:
//! `x = (lon + 180) * scale`, `y = (lat + 90) * scale`, so the domain is
//! `x ∈ [0, 360*scale)`, `y ∈ [0, 180*scale)`. Rounding is half-away-from-
//! zero (`f64::round`) and the same [`round_grid`] function is applied to
//! every coordinate the compiler ever rounds, both input vertices at ingest
//! and ring vertices produced by clipping, so independently-rounded copies
//! of a shared boundary never diverge.

use geo::MapCoords;
use geo_types::{Coord, MultiPolygon};

/// Round a grid-space coordinate to its integer cell. Half-away-from-zero.
#[inline]
pub fn round_grid(v: f64) -> i64 {
    v.round() as i64
}

/// Maps geographic degrees to the fixed-point integer grid.
#[derive(Debug, Clone, Copy)]
pub struct Quantizer {
    scale: i64,
}

impl Quantizer {
    /// Create a quantizer with the given grid units per degree.
    pub fn new(scale: i64) -> Self {
        Self { scale }
    }

    /// Grid units per degree.
    pub fn scale(&self) -> i64 {
        self.scale
    }

    /// Longitude in degrees → unrounded grid x.
    #[inline]
    pub fn grid_x(&self, lon: f64) -> f64 {
        (lon + 180.0) * self.scale as f64
    }

    /// Latitude in degrees → unrounded grid y.
    #[inline]
    pub fn grid_y(&self, lat: f64) -> f64 {
        (lat + 90.0) * self.scale as f64
    }

    /// Quantize a polygonal geometry from degrees to the integer grid.
    ///
    /// Every vertex is shifted, scaled, and rounded once; the result holds
    /// integer-valued f64 coordinates so downstream geometry predicates and
    /// clipping operate on exactly the coordinates that get serialized.
    pub fn quantize(&self, geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        geometry.map_coords(|c: Coord<f64>| Coord {
            x: round_grid(self.grid_x(c.x)) as f64,
            y: round_grid(self.grid_y(c.y)) as f64,
        })
    }
}
