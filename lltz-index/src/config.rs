//! Build configuration.

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};

/// Default fixed-point scale factor: grid units per degree.
pub const DEFAULT_SCALE: i64 = 1_000_000;

/// Default maximum quadtree recursion depth below a whole-degree cell.
pub const DEFAULT_MAX_DEPTH: u8 = 4;

/// Configuration for building an index artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Grid units per degree. Every coordinate is multiplied by this and
    /// rounded once, at ingest.
    pub scale: i64,

    /// Maximum recursion depth per whole-degree cell. Depth 4 at the
    /// default scale gives 62,500-unit leaf cells, which fit the u16
    /// cell-local coordinate fields.
    pub max_depth: u8,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl BuildConfig {
    /// Create a config with the default scale and depth.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scale factor.
    pub fn with_scale(mut self, scale: i64) -> Self {
        self.scale = scale;
        self
    }

    /// Set the maximum recursion depth.
    pub fn with_max_depth(mut self, max_depth: u8) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Validate the configuration.
    ///
    /// A scale/depth pair whose leaf cells are wider than 65,535 grid units
    /// is not rejected here (the encoder reports `CoordinateOverflow` with
    /// the offending cell), but it is warned about up front.
    pub fn validate(&self) -> Result<()> {
        if self.scale <= 0 {
            return Err(IndexError::Config(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if self.max_depth > 15 {
            return Err(IndexError::Config(format!(
                "max_depth must be at most 15, got {}",
                self.max_depth
            )));
        }
        let leaf_side = self.scale >> self.max_depth;
        if leaf_side > u16::MAX as i64 {
            tracing::warn!(
                scale = self.scale,
                max_depth = self.max_depth,
                leaf_side = leaf_side,
                "leaf cells exceed the u16 coordinate range; the build will \
                 fail with CoordinateOverflow on any non-trivial leaf"
            );
        }
        Ok(())
    }
}
