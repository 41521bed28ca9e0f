//! Region model and identifier assignment.
//!
//! Regions arrive as named geographic features in degrees. The set is
//! stably sorted by name, dense `u16` identifiers are assigned in sorted
//! order (the artifact's name table relies on this), and every geometry is
//! quantized onto the integer grid exactly once.

use crate::error::{IndexError, Result};
use crate::quantize::Quantizer;
use geo_types::{Geometry, MultiPolygon};

/// A named input feature in geographic degrees, not yet quantized.
#[derive(Debug, Clone)]
pub struct NamedFeature {
    /// Region name (e.g., a time-zone identifier).
    pub name: String,

    /// Feature geometry in degrees. Must be areal.
    pub geometry: Geometry<f64>,
}

impl NamedFeature {
    /// Create a named feature.
    pub fn new(name: impl Into<String>, geometry: Geometry<f64>) -> Self {
        Self {
            name: name.into(),
            geometry,
        }
    }
}

/// An immutable region with a dense identifier and quantized geometry.
#[derive(Debug, Clone)]
pub struct Region {
    /// Dense 0-based identifier, assigned after sorting by name.
    pub id: u16,

    /// Region name, used only for the artifact's name table.
    pub name: String,

    /// Polygonal geometry with integer-valued grid coordinates.
    pub geometry: MultiPolygon<f64>,
}

/// The full, id-ordered region set for one build.
#[derive(Debug, Clone)]
pub struct RegionSet {
    regions: Vec<Region>,
}

impl RegionSet {
    /// Build a region set from named features.
    ///
    /// Sorts stably by name, assigns identifiers in sorted order, and
    /// quantizes every geometry. Non-areal geometry kinds are rejected.
    pub fn from_features(features: Vec<NamedFeature>, quantizer: &Quantizer) -> Result<Self> {
        if features.len() > u16::MAX as usize {
            return Err(IndexError::TooManyRegions {
                count: features.len(),
            });
        }

        let mut features = features;
        features.sort_by(|a, b| a.name.cmp(&b.name));

        let mut regions = Vec::with_capacity(features.len());
        for (id, feature) in features.into_iter().enumerate() {
            let multi = as_multi_polygon(&feature)?;
            regions.push(Region {
                id: id as u16,
                name: feature.name,
                geometry: quantizer.quantize(&multi),
            });
        }

        tracing::debug!(regions = regions.len(), "region set quantized");
        Ok(Self { regions })
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// All regions in identifier order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Region names in identifier order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|r| r.name.as_str())
    }

    /// Construct directly from id-ordered regions. Test seam; callers are
    /// responsible for the sort/id invariants.
    pub fn from_regions(regions: Vec<Region>) -> Self {
        Self { regions }
    }
}

/// Coerce an input geometry to a multipolygon, rejecting non-areal kinds.
fn as_multi_polygon(feature: &NamedFeature) -> Result<MultiPolygon<f64>> {
    match &feature.geometry {
        Geometry::Polygon(p) => Ok(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Ok(mp.clone()),
        other => Err(IndexError::UnsupportedGeometry {
            region: feature.name.clone(),
            kind: geometry_kind(other),
        }),
    }
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
