//! Per-band spatial snapshot over region envelopes.
//!
//! The grid assembler builds one snapshot per longitude column; the cell
//! encoder then queries it once per node. Membership is a cheap envelope
//! filter; geometry is never pre-clipped, so the exact clip happens once,
//! at leaf granularity.
//!
//! A region is a *candidate* for a box only if its interior intersects the
//! box's interior. Boundary-only touches (a region ending exactly on a cell
//! edge) are excluded; they would otherwise force degenerate leaves along
//! every shared boundary.

use crate::encode::GridBox;
use crate::region::Region;
use geo::{BoundingRect, Contains, Intersects};
use geo_types::MultiPolygon;
use rstar::{Envelope, RTree, RTreeObject, AABB};

/// R-tree entry: a member region's bounding box.
struct RegionEnvelope {
    slot: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for RegionEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// A candidate region for one box.
pub struct Candidate<'a> {
    /// Region identifier.
    pub id: u16,

    /// The region's quantized geometry.
    pub geometry: &'a MultiPolygon<f64>,

    /// True if the region fully contains the box (boundary may touch).
    pub contains_box: bool,
}

/// Read-only spatial index over the regions intersecting one window.
///
/// Rebuilt per band; never shared across columns, so parallel encoding
/// needs no locking.
pub struct RegionSnapshot<'a> {
    members: Vec<&'a Region>,
    rtree: RTree<RegionEnvelope>,
}

impl<'a> RegionSnapshot<'a> {
    /// Build a snapshot of the regions whose envelopes intersect `window`.
    pub fn build(regions: &'a [Region], window: &GridBox) -> Self {
        let win = window.envelope();
        let mut members = Vec::new();
        let mut objects = Vec::new();
        for region in regions {
            let Some(rect) = region.geometry.bounding_rect() else {
                continue;
            };
            let envelope =
                AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
            if envelope.intersects(&win) {
                objects.push(RegionEnvelope {
                    slot: members.len(),
                    envelope,
                });
                members.push(region);
            }
        }
        let rtree = RTree::bulk_load(objects);
        Self { members, rtree }
    }

    /// Number of member regions.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the snapshot has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Candidate regions whose interiors intersect the box, sorted by id.
    pub fn candidates(&self, b: &GridBox) -> Vec<Candidate<'a>> {
        let cell = b.to_polygon();
        let cell_multi = MultiPolygon::new(vec![cell.clone()]);

        let mut out: Vec<Candidate<'a>> = self
            .rtree
            .locate_in_envelope_intersecting(&b.envelope())
            .filter_map(|entry| {
                let region = self.members[entry.slot];
                if !region.geometry.intersects(&cell) {
                    return None;
                }
                if region.geometry.contains(&cell) {
                    return Some(Candidate {
                        id: region.id,
                        geometry: &region.geometry,
                        contains_box: true,
                    });
                }
                // Intersecting but not containing: keep only proper
                // overlaps, where the exact intersection has area.
                use geo::BooleanOps;
                let clipped = region.geometry.intersection(&cell_multi);
                if clipped.0.is_empty() {
                    return None;
                }
                Some(Candidate {
                    id: region.id,
                    geometry: &region.geometry,
                    contains_box: false,
                })
            })
            .collect();

        out.sort_by_key(|c| c.id);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;

    fn grid_square(id: u16, x0: i64, y0: i64, x1: i64, y1: i64) -> Region {
        let (x0, y0, x1, y1) = (x0 as f64, y0 as f64, x1 as f64, y1 as f64);
        Region {
            id,
            name: format!("region-{id}"),
            geometry: MultiPolygon::new(vec![polygon![
                (x: x0, y: y0),
                (x: x1, y: y0),
                (x: x1, y: y1),
                (x: x0, y: y1),
                (x: x0, y: y0),
            ]]),
        }
    }

    #[test]
    fn test_window_filters_members() {
        let regions = vec![
            grid_square(0, 0, 0, 100, 100),
            grid_square(1, 1_000, 0, 1_100, 100),
        ];
        let window = GridBox::new(0, 500, 0, 500);
        let snapshot = RegionSnapshot::build(&regions, &window);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_candidates_sorted_by_id() {
        let regions = vec![
            grid_square(2, 0, 0, 100, 100),
            grid_square(0, 0, 0, 100, 100),
            grid_square(1, 0, 0, 100, 100),
        ];
        let b = GridBox::new(0, 100, 0, 100);
        let snapshot = RegionSnapshot::build(&regions, &b);
        let ids: Vec<u16> = snapshot.candidates(&b).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_touch_only_neighbor_is_not_a_candidate() {
        // Region 1 shares only the x=100 edge with the box.
        let regions = vec![
            grid_square(0, 0, 0, 100, 100),
            grid_square(1, 100, 0, 200, 100),
        ];
        let b = GridBox::new(0, 100, 0, 100);
        let snapshot = RegionSnapshot::build(&regions, &b);
        let candidates = snapshot.candidates(&b);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, 0);
        assert!(candidates[0].contains_box);
    }

    #[test]
    fn test_partial_overlap_is_candidate_without_containment() {
        let regions = vec![grid_square(0, 50, 0, 150, 100)];
        let b = GridBox::new(0, 100, 0, 100);
        let snapshot = RegionSnapshot::build(&regions, &b);
        let candidates = snapshot.candidates(&b);
        assert_eq!(candidates.len(), 1);
        assert!(!candidates[0].contains_box);
    }

    #[test]
    fn test_empty_geometry_is_skipped() {
        let empty = Region {
            id: 0,
            name: "empty".into(),
            geometry: MultiPolygon::new(Vec::new()),
        };
        let window = GridBox::new(0, 100, 0, 100);
        let snapshot = RegionSnapshot::build(std::slice::from_ref(&empty), &window);
        assert!(snapshot.is_empty());
    }
}
