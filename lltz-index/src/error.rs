//! Error types for the index compiler.
//!
//! Every error is fatal: the build is deterministic and pure, so retrying
//! without changing the input, scale, or max depth reproduces the same
//! failure. Capacity errors carry the offending cell and region so the
//! input (or depth) can be fixed.

use thiserror::Error;

/// Index build errors.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Input feature has a geometry kind the compiler cannot index.
    #[error("unsupported geometry kind for region {region:?}: {kind}")]
    UnsupportedGeometry { region: String, kind: &'static str },

    /// More regions than a u16 identifier can address.
    #[error("too many regions: {count} (max 65535)")]
    TooManyRegions { count: usize },

    /// A leaf cell has more overlapping regions than its u8 counter holds.
    #[error("too many overlapping regions in leaf cell {cell}: {count} (max 255)")]
    TooManyOverlaps { cell: String, count: usize },

    /// A clipped polygon has more rings than its u8 counter holds.
    #[error("region {region} produced {count} rings in one polygon at cell {cell} (max 255)")]
    TooManyRings {
        cell: String,
        region: u16,
        count: usize,
    },

    /// A clipped ring has more vertices than its u16 counter holds.
    #[error("region {region} produced a ring with {count} vertices at cell {cell} (max 65535); simplify the source geometry")]
    RingTooLarge {
        cell: String,
        region: u16,
        count: usize,
    },

    /// A serialized polygon record exceeds its u16 byte-length prefix.
    #[error("region {region} produced a {len}-byte polygon record (max 65535); simplify the source geometry")]
    PolygonTooLarge { region: u16, len: usize },

    /// A cell-local coordinate fell outside the u16 range. The cells are
    /// too large for the scale factor; increase max_depth.
    #[error("cell-local coordinate {value} out of range [0, 65535] for region {region} at cell {cell}; increase max_depth")]
    CoordinateOverflow {
        cell: String,
        region: u16,
        value: i64,
    },

    /// A child buffer offset does not fit the 30-bit tagged-pointer payload.
    #[error("buffer offset {offset} exceeds the 30-bit tagged-pointer payload")]
    PointerOverflow { offset: usize },

    /// The NUL-separated name table exceeds its u16 length field.
    #[error("name table is {len} bytes (max 65535)")]
    NameTableOverflow { len: usize },

    /// A region name cannot be stored in the NUL-separated name table.
    #[error("region name {name:?} contains a NUL byte")]
    InvalidName { name: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error while writing the artifact.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal invariant violation (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for index build operations.
pub type Result<T> = std::result::Result<T, IndexError>;
