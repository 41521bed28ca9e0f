//! End-to-end artifact tests.
//!
//! These tests build real artifacts and walk them with a small test-local
//! decoder that follows the wire format independently of the encoder.

use geo::{Area, Contains};
use geo_types::{polygon, Geometry, LineString, Point, Polygon};
use lltz_index::format::{payload, tag, TAG_EMPTY, TAG_INTERNAL, TAG_LEAF, TAG_OWNED};
use lltz_index::grid::GRID_WIDTH;
use lltz_index::{BuildConfig, GridBox, IndexBuilder, IndexError, NamedFeature};

// ---------------------------------------------------------------------------
// Test-local decoder
// ---------------------------------------------------------------------------

struct Decoded {
    names: Vec<String>,
    roots: Vec<u32>,
    blob: Vec<u8>,
}

fn parse_artifact(bytes: &[u8]) -> Decoded {
    assert_eq!(&bytes[..8], b"LLTZ1\0\0\0", "bad magic");
    let table_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let table = &bytes[10..10 + table_len];
    let names = if table.is_empty() {
        Vec::new()
    } else {
        String::from_utf8(table.to_vec())
            .unwrap()
            .split('\0')
            .map(str::to_owned)
            .collect()
    };

    let mut p = 10 + table_len;
    let mut roots = Vec::with_capacity(360 * 180);
    for _ in 0..360 * 180 {
        roots.push(u32::from_le_bytes(bytes[p..p + 4].try_into().unwrap()));
        p += 4;
    }
    Decoded {
        names,
        roots,
        blob: bytes[p..].to_vec(),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DecodedPolygon {
    bbox: (u16, u16, u16, u16),
    rings: Vec<Vec<(u16, u16)>>,
}

#[derive(Debug, Clone, PartialEq)]
struct DecodedEntry {
    region: u16,
    polygons: Vec<DecodedPolygon>,
}

fn decode_leaf(buf: &[u8]) -> Vec<DecodedEntry> {
    let mut p = 0usize;
    let count = buf[p] as usize;
    p += 1;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let region = u16::from_le_bytes([buf[p], buf[p + 1]]);
        p += 2;
        let polygon_count = buf[p] as usize;
        p += 1;
        let mut polygons = Vec::with_capacity(polygon_count);
        for _ in 0..polygon_count {
            let len = u16::from_le_bytes([buf[p], buf[p + 1]]) as usize;
            p += 2;
            let record = &buf[p..p + len];
            p += len;
            polygons.push(decode_polygon(record));
        }
        entries.push(DecodedEntry { region, polygons });
    }
    entries
}

fn decode_polygon(record: &[u8]) -> DecodedPolygon {
    let mut p = 0usize;
    let ring_count = record[p] as usize;
    p += 1;
    let mut bbox = [0u16; 4];
    for b in &mut bbox {
        *b = u16::from_le_bytes([record[p], record[p + 1]]);
        p += 2;
    }
    let mut rings = Vec::with_capacity(ring_count);
    for _ in 0..ring_count {
        let vertex_count = u16::from_le_bytes([record[p], record[p + 1]]) as usize;
        p += 2;
        let mut ring = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            let x = u16::from_le_bytes([record[p], record[p + 1]]);
            let y = u16::from_le_bytes([record[p + 2], record[p + 3]]);
            p += 4;
            ring.push((x, y));
        }
        rings.push(ring);
    }
    assert_eq!(p, record.len(), "polygon record fully consumed");
    DecodedPolygon {
        bbox: (bbox[0], bbox[1], bbox[2], bbox[3]),
        rings,
    }
}

/// Collect (box, depth, entries) for every leaf reachable from `word`.
fn collect_leaves(
    blob: &[u8],
    word: u32,
    region_base: usize,
    b: GridBox,
    depth: usize,
    out: &mut Vec<(GridBox, usize, Vec<DecodedEntry>)>,
) {
    match tag(word) {
        TAG_EMPTY | TAG_OWNED => {}
        TAG_LEAF => {
            let off = region_base + payload(word) as usize;
            out.push((b, depth, decode_leaf(&blob[off..])));
        }
        TAG_INTERNAL => {
            let off = region_base + payload(word) as usize;
            let children_base = off + 16;
            let quads = b.split();
            for (i, quad) in quads.into_iter().enumerate() {
                let child =
                    u32::from_le_bytes(blob[off + i * 4..off + i * 4 + 4].try_into().unwrap());
                collect_leaves(blob, child, children_base, quad, depth + 1, out);
            }
        }
        _ => unreachable!(),
    }
}

/// Resolve a grid point to the set of owning region ids.
fn resolve(decoded: &Decoded, scale: i64, x: i64, y: i64) -> Vec<u16> {
    let lon_idx = (x / scale) as usize;
    let lat_idx = (y / scale) as usize;
    let word = decoded.roots[lat_idx * GRID_WIDTH + lon_idx];
    let cell = GridBox::new(
        lon_idx as i64 * scale,
        (lon_idx as i64 + 1) * scale,
        lat_idx as i64 * scale,
        (lat_idx as i64 + 1) * scale,
    );
    resolve_in(&decoded.blob, word, 0, cell, x, y)
}

fn resolve_in(blob: &[u8], word: u32, region_base: usize, b: GridBox, x: i64, y: i64) -> Vec<u16> {
    match tag(word) {
        TAG_EMPTY => Vec::new(),
        TAG_OWNED => vec![payload(word) as u16],
        TAG_LEAF => {
            let off = region_base + payload(word) as usize;
            let point = Point::new(x as f64, y as f64);
            decode_leaf(&blob[off..])
                .iter()
                .filter(|entry| {
                    entry
                        .polygons
                        .iter()
                        .any(|poly| to_geo_polygon(poly, &b).contains(&point))
                })
                .map(|entry| entry.region)
                .collect()
        }
        TAG_INTERNAL => {
            let off = region_base + payload(word) as usize;
            let quads = b.split();
            let idx = quads
                .iter()
                .position(|q| x >= q.x_min && x < q.x_max && y >= q.y_min && y < q.y_max)
                .expect("point inside exactly one quadrant");
            let child = u32::from_le_bytes(blob[off + idx * 4..off + idx * 4 + 4].try_into().unwrap());
            resolve_in(blob, child, off + 16, quads[idx], x, y)
        }
        _ => unreachable!(),
    }
}

/// Rebuild a clipped polygon in absolute grid coordinates.
fn to_geo_polygon(poly: &DecodedPolygon, b: &GridBox) -> Polygon<f64> {
    let abs_ring = |ring: &Vec<(u16, u16)>| {
        let mut coords: Vec<(f64, f64)> = ring
            .iter()
            .map(|&(x, y)| ((b.x_min + x as i64) as f64, (b.y_min + y as i64) as f64))
            .collect();
        if let Some(&first) = coords.first() {
            coords.push(first); // re-close
        }
        LineString::from(coords)
    };
    let exterior = abs_ring(&poly.rings[0]);
    let interiors = poly.rings[1..].iter().map(abs_ring).collect();
    Polygon::new(exterior, interiors)
}

fn degrees_square(lon: f64, lat: f64, side: f64) -> Geometry<f64> {
    Geometry::Polygon(polygon![
        (x: lon, y: lat),
        (x: lon + side, y: lat),
        (x: lon + side, y: lat + side),
        (x: lon, y: lat + side),
        (x: lon, y: lat),
    ])
}

fn build_bytes(features: Vec<NamedFeature>, config: BuildConfig) -> Vec<u8> {
    let mut builder = IndexBuilder::new(config);
    for f in features {
        builder.add_feature(f.name, f.geometry);
    }
    builder.build().unwrap().0.to_bytes()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn zigzag_partition_clips_to_two_entry_leaves() {
    // Two regions partition the cell at lon 0..1, lat 0..1 along a zigzag
    // whose diagonal sweeps cross every depth-2 sub-cell. At max_depth 2
    // every deepest node must be a two-entry leaf, and each leaf's clipped
    // areas must sum to the sub-cell area.
    let zig = [(0.1, 0.0), (0.9, 0.25), (0.1, 0.5), (0.9, 0.75), (0.1, 1.0)];
    let mut left = vec![(0.0, 0.0)];
    left.extend_from_slice(&zig);
    left.push((0.0, 1.0));
    left.push((0.0, 0.0));
    // Reversed zigzag ends back at (0.1, 0.0), closing the ring.
    let mut right = vec![(0.1, 0.0), (1.0, 0.0), (1.0, 1.0)];
    right.extend(zig.iter().rev().map(|&(x, y)| (x, y)));

    let to_poly = |pts: Vec<(f64, f64)>| Geometry::Polygon(Polygon::new(LineString::from(pts), vec![]));

    // Depth-2 leaves at scale 200,000 are 50,000 units wide, within u16.
    let scale = 200_000i64;
    let config = BuildConfig::new().with_scale(scale).with_max_depth(2);
    let bytes = build_bytes(
        vec![
            NamedFeature::new("left", to_poly(left)),
            NamedFeature::new("right", to_poly(right)),
        ],
        config,
    );
    let decoded = parse_artifact(&bytes);
    assert_eq!(decoded.names, vec!["left", "right"]);

    let lon_idx = 180usize;
    let lat_idx = 90usize;
    let word = decoded.roots[lat_idx * GRID_WIDTH + lon_idx];
    assert_eq!(tag(word), TAG_INTERNAL);

    let cell = GridBox::new(
        lon_idx as i64 * scale,
        (lon_idx as i64 + 1) * scale,
        lat_idx as i64 * scale,
        (lat_idx as i64 + 1) * scale,
    );
    let mut leaves = Vec::new();
    collect_leaves(&decoded.blob, word, 0, cell, 0, &mut leaves);

    assert_eq!(leaves.len(), 16, "boundary crosses every depth-2 sub-cell");
    let sub_area = (scale as f64 / 4.0) * (scale as f64 / 4.0);
    for (b, depth, entries) in &leaves {
        assert_eq!(*depth, 2);
        assert_eq!(entries.len(), 2, "both regions present in {b}");
        let clipped_area: f64 = entries
            .iter()
            .flat_map(|e| e.polygons.iter())
            .map(|p| to_geo_polygon(p, b).unsigned_area())
            .sum();
        let rel = (clipped_area - sub_area).abs() / sub_area;
        assert!(rel < 1e-3, "areas sum to sub-cell area, got rel err {rel}");
    }
}

#[test]
fn overlap_capacity_aborts_build() {
    // 256 regions over one leaf exceed the u8 entry counter; the build
    // fails and no artifact is written.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("overflow.lltz");

    let features: Vec<NamedFeature> = (0..256)
        .map(|i| NamedFeature::new(format!("tz-{i:03}"), degrees_square(0.0, 0.0, 1.0)))
        .collect();

    let config = BuildConfig::new().with_scale(50_000).with_max_depth(0);
    let err = lltz_index::build(features, &path, &config).unwrap_err();
    assert!(matches!(err, IndexError::TooManyOverlaps { count: 256, .. }));
    assert!(!path.exists(), "failed build must not write an artifact");
}

#[test]
fn leaf_completeness_for_points_inside_regions() {
    // "cover" owns the whole cell; "inner" overlaps its center. Any point
    // inside a region must resolve to that region through the artifact.
    let scale = 100_000i64;
    let config = BuildConfig::new().with_scale(scale).with_max_depth(1);
    let bytes = build_bytes(
        vec![
            NamedFeature::new("cover", degrees_square(0.0, 0.0, 1.0)),
            NamedFeature::new("inner", degrees_square(0.4, 0.4, 0.2)),
        ],
        config,
    );
    let decoded = parse_artifact(&bytes);
    assert_eq!(decoded.names, vec!["cover", "inner"]);

    let gx = |lon: f64| ((lon + 180.0) * scale as f64) as i64;
    let gy = |lat: f64| ((lat + 90.0) * scale as f64) as i64;

    // Inside both regions.
    let both = resolve(&decoded, scale, gx(0.45), gy(0.45));
    assert_eq!(both, vec![0, 1]);

    // Inside "cover" only.
    let cover_only = resolve(&decoded, scale, gx(0.2), gy(0.2));
    assert_eq!(cover_only, vec![0]);

    // Outside every region.
    let none = resolve(&decoded, scale, gx(5.5), gy(5.5));
    assert!(none.is_empty());
}

#[test]
fn decoded_leaves_match_encoder_output() {
    // Round-trip: the vertex lists decoded from the artifact are exactly
    // the vertex lists the encoder produced for the same cell.
    use lltz_index::encode::{CellEncoder, Node};
    use lltz_index::{Quantizer, RegionSet, RegionSnapshot};

    let scale = 100_000i64;
    let config = BuildConfig::new().with_scale(scale).with_max_depth(1);
    let features = vec![
        NamedFeature::new("cover", degrees_square(0.0, 0.0, 1.0)),
        NamedFeature::new("inner", degrees_square(0.4, 0.4, 0.2)),
    ];

    let bytes = build_bytes(features.clone(), config.clone());
    let decoded = parse_artifact(&bytes);

    let cell = GridBox::new(180 * scale, 181 * scale, 90 * scale, 91 * scale);
    let regions = RegionSet::from_features(features, &Quantizer::new(scale)).unwrap();
    let snapshot = RegionSnapshot::build(regions.regions(), &cell);
    let encoder = CellEncoder::new(&snapshot, config.max_depth);
    let node = encoder.encode(cell).unwrap();

    let word = decoded.roots[90 * GRID_WIDTH + 180];
    let mut decoded_leaves = Vec::new();
    collect_leaves(&decoded.blob, word, 0, cell, 0, &mut decoded_leaves);

    let mut encoded_leaves = Vec::new();
    fn walk(node: &Node, b: GridBox, out: &mut Vec<(GridBox, Vec<lltz_index::LeafEntry>)>) {
        match node {
            Node::Empty | Node::Owned(_) => {}
            Node::Leaf(entries) => out.push((b, entries.clone())),
            Node::Internal(children) => {
                let quads = b.split();
                for (child, quad) in children.iter().zip(quads) {
                    walk(child, quad, out);
                }
            }
        }
    }
    walk(&node, cell, &mut encoded_leaves);

    assert_eq!(decoded_leaves.len(), encoded_leaves.len());
    for ((db, _, dentries), (eb, eentries)) in decoded_leaves.iter().zip(&encoded_leaves) {
        assert_eq!(db, eb);
        assert_eq!(dentries.len(), eentries.len());
        for (dentry, eentry) in dentries.iter().zip(eentries) {
            assert_eq!(dentry.region, eentry.region);
            assert_eq!(dentry.polygons.len(), eentry.polygons.len());
            for (dpoly, epoly) in dentry.polygons.iter().zip(&eentry.polygons) {
                assert_eq!(dpoly.rings, epoly.rings);
                let (min_x, max_x, min_y, max_y) = epoly.bounds().unwrap();
                assert_eq!(dpoly.bbox, (min_x, max_x, min_y, max_y));
            }
        }
    }
}

#[test]
fn owned_and_empty_roots_are_sound() {
    // A region covering cells exactly: its cells are Owned by it, every
    // untouched cell is Empty, and no blob space is spent on either.
    let scale = 1_000_000i64;
    let bytes = build_bytes(
        vec![NamedFeature::new("wide", degrees_square(10.0, 20.0, 2.0))],
        BuildConfig::default(),
    );
    let decoded = parse_artifact(&bytes);

    for dlon in 0..2usize {
        for dlat in 0..2usize {
            let idx = (110 + dlat) * GRID_WIDTH + 190 + dlon;
            let word = decoded.roots[idx];
            assert_eq!(tag(word), TAG_OWNED);
            assert_eq!(payload(word), 0);
        }
    }
    assert!(decoded.blob.is_empty());

    let owned = decoded.roots.iter().filter(|&&w| tag(w) == TAG_OWNED).count();
    assert_eq!(owned, 4);
    assert!(decoded
        .roots
        .iter()
        .filter(|&&w| tag(w) != TAG_OWNED)
        .all(|&w| tag(w) == TAG_EMPTY));

    // Sanity: a point in an owned cell resolves to the region.
    let x = ((10.5 + 180.0) * scale as f64) as i64;
    let y = ((20.5 + 90.0) * scale as f64) as i64;
    assert_eq!(resolve(&decoded, scale, x, y), vec![0]);
}
