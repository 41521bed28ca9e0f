//! End-to-end build driver.
//!
//! ```ignore
//! let mut builder = IndexBuilder::new(BuildConfig::default());
//! builder.add_feature("Europe/Berlin", geometry);
//! let (artifact, stats) = builder.build()?;
//! artifact.write_to(&path)?;
//! ```
//!
//! Or in one call: [`build`] quantizes, assembles, and writes the artifact.

use crate::artifact::Artifact;
use crate::config::BuildConfig;
use crate::error::Result;
use crate::format::{tag, TAG_EMPTY, TAG_INTERNAL, TAG_LEAF, TAG_OWNED};
use crate::grid;
use crate::quantize::Quantizer;
use crate::region::{NamedFeature, RegionSet};
use geo_types::Geometry;
use std::path::Path;

/// Statistics collected during a build.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of regions indexed.
    pub regions: usize,

    /// Root cells with no owning region.
    pub roots_empty: usize,

    /// Root cells owned outright by one region.
    pub roots_owned: usize,

    /// Root cells that are leaves (overlap at depth 0).
    pub roots_leaf: usize,

    /// Root cells that subdivide.
    pub roots_internal: usize,

    /// Bytes in the shared blob.
    pub blob_bytes: usize,

    /// Bytes in the name table.
    pub name_table_bytes: usize,
}

/// Accumulates named features and drives the build.
pub struct IndexBuilder {
    config: BuildConfig,
    features: Vec<NamedFeature>,
}

impl IndexBuilder {
    /// Create a builder with the given configuration.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            features: Vec::new(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Add one named feature in geographic degrees.
    pub fn add_feature(&mut self, name: impl Into<String>, geometry: Geometry<f64>) {
        self.features.push(NamedFeature::new(name, geometry));
    }

    /// Number of features added so far.
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Run the build: quantize, sort, encode all 360×180 cells, assemble.
    ///
    /// All-or-nothing: the first fatal error aborts the build and nothing
    /// is produced.
    pub fn build(self) -> Result<(Artifact, BuildStats)> {
        self.config.validate()?;

        let quantizer = Quantizer::new(self.config.scale);
        let regions = RegionSet::from_features(self.features, &quantizer)?;
        tracing::info!(
            regions = regions.len(),
            scale = self.config.scale,
            max_depth = self.config.max_depth,
            "starting build"
        );

        let grid = grid::assemble(&regions, &self.config)?;

        let mut stats = BuildStats {
            regions: regions.len(),
            blob_bytes: grid.blob.len(),
            ..BuildStats::default()
        };
        for &word in &grid.root_words {
            match tag(word) {
                TAG_EMPTY => stats.roots_empty += 1,
                TAG_OWNED => stats.roots_owned += 1,
                TAG_LEAF => stats.roots_leaf += 1,
                TAG_INTERNAL => stats.roots_internal += 1,
                _ => unreachable!("2-bit tag"),
            }
        }

        let names = regions.names().map(str::to_owned).collect();
        let artifact = Artifact::new(names, grid)?;
        stats.name_table_bytes = artifact.name_table_len();

        tracing::info!(
            roots_empty = stats.roots_empty,
            roots_owned = stats.roots_owned,
            roots_leaf = stats.roots_leaf,
            roots_internal = stats.roots_internal,
            blob_bytes = stats.blob_bytes,
            "build complete"
        );
        Ok((artifact, stats))
    }
}

/// Build an artifact from named features and write it to `output_path`.
pub fn build(
    features: Vec<NamedFeature>,
    output_path: &Path,
    config: &BuildConfig,
) -> Result<BuildStats> {
    let mut builder = IndexBuilder::new(config.clone());
    for feature in features {
        builder.add_feature(feature.name, feature.geometry);
    }
    let (artifact, stats) = builder.build()?;
    artifact.write_to(output_path)?;
    Ok(stats)
}
