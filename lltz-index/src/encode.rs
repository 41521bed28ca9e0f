//! Recursive cell classification and leaf clipping.
//!
//! The encoder turns one box into one [`Node`] of the quadtree. Per box:
//!
//! 1. Query the snapshot for candidate regions, sorted by id.
//! 2. No candidates → [`Node::Empty`].
//! 3. Exactly one candidate that fully contains the box (boundary may
//!    touch, not cross) → [`Node::Owned`].
//! 4. Depth limit reached → [`Node::Leaf`]: clip every candidate to the
//!    box and re-encode its rings in cell-local u16 coordinates.
//! 5. Otherwise → [`Node::Internal`] over the four midpoint quadrants.
//!
//! Classification precedence is fixed; a box decided Empty or Owned is
//! never subdivided. Candidate order, polygon order within a clip result,
//! and ring vertex order are all rule-determined, so encoding is a pure
//! function of (box, depth).

use crate::error::{IndexError, Result};
use crate::quantize::round_grid;
use crate::snapshot::RegionSnapshot;
use geo::BooleanOps;
use geo_types::{coord, MultiPolygon, Polygon, Rect};
use rstar::AABB;
use std::fmt;

/// Axis-aligned box in quantized integer grid coordinates. Ephemeral,
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBox {
    pub x_min: i64,
    pub x_max: i64,
    pub y_min: i64,
    pub y_max: i64,
}

impl GridBox {
    /// Create a box from its corners.
    pub fn new(x_min: i64, x_max: i64, y_min: i64, y_max: i64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// The box as a closed polygon for exact geometry predicates.
    pub fn to_polygon(&self) -> Polygon<f64> {
        Rect::new(
            coord! { x: self.x_min as f64, y: self.y_min as f64 },
            coord! { x: self.x_max as f64, y: self.y_max as f64 },
        )
        .to_polygon()
    }

    /// The box as an R-tree envelope.
    pub fn envelope(&self) -> AABB<[f64; 2]> {
        AABB::from_corners(
            [self.x_min as f64, self.y_min as f64],
            [self.x_max as f64, self.y_max as f64],
        )
    }

    /// Split at the floor midpoints of both axes.
    ///
    /// Canonical child order: SW, SE, NW, NE. Every consumer of an
    /// Internal node relies on this order.
    pub fn split(&self) -> [GridBox; 4] {
        let x_mid = (self.x_min + self.x_max) / 2;
        let y_mid = (self.y_min + self.y_max) / 2;
        [
            GridBox::new(self.x_min, x_mid, self.y_min, y_mid),
            GridBox::new(x_mid, self.x_max, self.y_min, y_mid),
            GridBox::new(self.x_min, x_mid, y_mid, self.y_max),
            GridBox::new(x_mid, self.x_max, y_mid, self.y_max),
        ]
    }
}

impl fmt::Display for GridBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})x[{}, {})",
            self.x_min, self.x_max, self.y_min, self.y_max
        )
    }
}

/// One quadtree node. Closed sum; matched exhaustively everywhere.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// No region's interior intersects the box.
    Empty,

    /// Exactly one region intersects the box and fully contains it.
    Owned(u16),

    /// Depth limit reached with unresolved overlap: explicit clipped
    /// polygon data, one entry per candidate in id order.
    Leaf(Vec<LeafEntry>),

    /// Four children for the quadrants, in SW, SE, NW, NE order.
    Internal(Box<[Node; 4]>),
}

/// A leaf's payload for one region: the region clipped to the cell.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafEntry {
    /// Region identifier.
    pub region: u16,

    /// Simple polygons-with-holes; multi-part clip results yield several.
    pub polygons: Vec<CellPolygon>,
}

/// A simple polygon in cell-local coordinates: exterior ring first, then
/// holes; each ring implicitly closed (closing vertex dropped).
#[derive(Debug, Clone, PartialEq)]
pub struct CellPolygon {
    pub rings: Vec<Vec<(u16, u16)>>,
}

impl CellPolygon {
    /// Bounding box over all ring vertices as (min_x, max_x, min_y, max_y).
    /// `None` for a degenerate polygon with no vertices.
    pub fn bounds(&self) -> Option<(u16, u16, u16, u16)> {
        let mut it = self.rings.iter().flatten();
        let &(x0, y0) = it.next()?;
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (x0, x0, y0, y0);
        for &(x, y) in it {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        Some((min_x, max_x, min_y, max_y))
    }
}

/// Maximum candidates a leaf's u8 entry counter can hold.
pub const MAX_LEAF_OVERLAPS: usize = u8::MAX as usize;

/// Maximum rings per polygon.
pub const MAX_RINGS: usize = u8::MAX as usize;

/// Maximum vertices per ring.
pub const MAX_RING_VERTICES: usize = u16::MAX as usize;

/// Recursive encoder for one top-level cell.
///
/// Pure: no mutable state survives an [`encode`](Self::encode) call, so
/// encoders for different cells may run in parallel.
pub struct CellEncoder<'a> {
    snapshot: &'a RegionSnapshot<'a>,
    max_depth: u8,
}

impl<'a> CellEncoder<'a> {
    /// Create an encoder over a snapshot consistent with the boxes it will
    /// be asked to encode.
    pub fn new(snapshot: &'a RegionSnapshot<'a>, max_depth: u8) -> Self {
        Self {
            snapshot,
            max_depth,
        }
    }

    /// Encode a box into a node, recursing at most `max_depth` levels.
    pub fn encode(&self, b: GridBox) -> Result<Node> {
        self.encode_at(b, 0)
    }

    fn encode_at(&self, b: GridBox, depth: u8) -> Result<Node> {
        let candidates = self.snapshot.candidates(&b);

        if candidates.is_empty() {
            return Ok(Node::Empty);
        }
        if candidates.len() == 1 && candidates[0].contains_box {
            return Ok(Node::Owned(candidates[0].id));
        }
        if depth >= self.max_depth {
            return self.leaf(&b, &candidates);
        }

        let [sw, se, nw, ne] = b.split();
        Ok(Node::Internal(Box::new([
            self.encode_at(sw, depth + 1)?,
            self.encode_at(se, depth + 1)?,
            self.encode_at(nw, depth + 1)?,
            self.encode_at(ne, depth + 1)?,
        ])))
    }

    fn leaf(&self, b: &GridBox, candidates: &[crate::snapshot::Candidate<'a>]) -> Result<Node> {
        if candidates.len() > MAX_LEAF_OVERLAPS {
            return Err(IndexError::TooManyOverlaps {
                cell: b.to_string(),
                count: candidates.len(),
            });
        }

        let cell = MultiPolygon::new(vec![b.to_polygon()]);
        let mut entries = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let clipped = candidate.geometry.intersection(&cell);
            let mut polygons = Vec::with_capacity(clipped.0.len());
            for polygon in &clipped {
                polygons.push(cell_polygon(polygon, b, candidate.id)?);
            }
            entries.push(LeafEntry {
                region: candidate.id,
                polygons,
            });
        }
        Ok(Node::Leaf(entries))
    }
}

/// Translate one clipped polygon into cell-local u16 coordinates.
fn cell_polygon(polygon: &Polygon<f64>, b: &GridBox, region: u16) -> Result<CellPolygon> {
    let ring_count = 1 + polygon.interiors().len();
    if ring_count > MAX_RINGS {
        return Err(IndexError::TooManyRings {
            cell: b.to_string(),
            region,
            count: ring_count,
        });
    }

    let mut rings = Vec::with_capacity(ring_count);
    for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors().iter()) {
        let coords = &ring.0;
        // Rings arrive closed; the wire format closes them implicitly.
        let open = if coords.len() >= 2 && coords.first() == coords.last() {
            &coords[..coords.len() - 1]
        } else {
            &coords[..]
        };
        if open.len() > MAX_RING_VERTICES {
            return Err(IndexError::RingTooLarge {
                cell: b.to_string(),
                region,
                count: open.len(),
            });
        }

        let mut vertices = Vec::with_capacity(open.len());
        for c in open {
            let x = round_grid(c.x - b.x_min as f64);
            let y = round_grid(c.y - b.y_min as f64);
            let range = 0..=u16::MAX as i64;
            if !range.contains(&x) || !range.contains(&y) {
                return Err(IndexError::CoordinateOverflow {
                    cell: b.to_string(),
                    region,
                    value: if range.contains(&x) { y } else { x },
                });
            }
            vertices.push((x as u16, y as u16));
        }
        rings.push(vertices);
    }
    Ok(CellPolygon { rings })
}
