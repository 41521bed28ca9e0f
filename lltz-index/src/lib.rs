//! Quadtree compiler for named polygonal regions.
//!
//! This crate compiles a set of named polygonal regions in geographic
//! coordinates (e.g., time-zone boundaries) into a compact, randomly
//! accessible binary artifact. A consumer resolves a point by locating its
//! whole-degree cell, reading one tagged pointer, and walking at most
//! `max_depth` quadtree levels to either a direct owner or a short list of
//! clipped polygons for point-in-polygon testing. The build is an offline
//! batch job: one deterministic pass per input dataset, no incremental
//! updates.
//!
//! # Architecture
//!
//! ```text
//! GeoJSON features (degrees)
//!         │
//!         ▼
//! Quantizer ──► RegionSet (sorted by name, dense u16 ids, integer grid)
//!         │
//!         ▼
//! GridAssembler ──► 360 longitude columns in parallel (rayon)
//!         │             │
//!         │             ▼
//!         │       RegionSnapshot (per-band R-tree + exact relate)
//!         │             │
//!         │             ▼
//!         │       CellEncoder (Empty | Owned | Leaf | Internal)
//!         │             │
//!         │             ▼
//!         │       tagged-pointer buffers (self-relative offsets)
//!         ▼
//! ordered merge ──► Artifact (magic + names + 360×180 roots + blob)
//! ```
//!
//! # Modules
//!
//! - [`config`]: build configuration (scale factor, recursion depth)
//! - [`quantize`]: degree → fixed-point grid mapping
//! - [`region`]: region model and name-sorted id assignment
//! - [`snapshot`]: per-band spatial index over region envelopes
//! - [`encode`]: the recursive cell classifier and leaf clipper
//! - [`format`]: tagged pointers and the little-endian wire format
//! - [`grid`]: 360×180 top-level grid assembly
//! - [`artifact`]: final artifact layout and persistence
//! - [`builder`]: end-to-end build driver and statistics
//! - [`error`]: error types

pub mod artifact;
pub mod builder;
pub mod config;
pub mod encode;
pub mod error;
pub mod format;
pub mod grid;
pub mod quantize;
pub mod region;
pub mod snapshot;

pub use artifact::Artifact;
pub use builder::{build, BuildStats, IndexBuilder};
pub use config::BuildConfig;
pub use encode::{CellEncoder, CellPolygon, GridBox, LeafEntry, Node};
pub use error::{IndexError, Result};
pub use quantize::Quantizer;
pub use region::{NamedFeature, Region, RegionSet};
pub use snapshot::RegionSnapshot;
