//! Final artifact layout and persistence.
//!
//! ```text
//! magic:          8 bytes, "LLTZ1" zero-padded
//! name_table_len: u16 (LE)
//! name_table:     NUL-separated UTF-8 names, identifier order
//! root_pointers:  360×180 × u32 (LE), row-major (latitude, longitude)
//! blob:           concatenated Leaf/Internal buffers
//! ```
//!
//! The artifact is immutable once written; a build either produces the
//! whole file or nothing.

use crate::error::{IndexError, Result};
use crate::format::MAGIC;
use crate::grid::{GridIndex, GRID_HEIGHT, GRID_WIDTH};
use std::path::Path;

/// An assembled artifact, ready to serialize.
#[derive(Debug, Clone)]
pub struct Artifact {
    names: Vec<String>,
    grid: GridIndex,
}

impl Artifact {
    /// Assemble an artifact from id-ordered names and the merged grid.
    pub fn new(names: Vec<String>, grid: GridIndex) -> Result<Self> {
        if grid.root_words.len() != GRID_WIDTH * GRID_HEIGHT {
            return Err(IndexError::Internal(format!(
                "grid has {} root pointers, expected {}",
                grid.root_words.len(),
                GRID_WIDTH * GRID_HEIGHT
            )));
        }
        for name in &names {
            if name.as_bytes().contains(&0) {
                return Err(IndexError::InvalidName { name: name.clone() });
            }
        }
        let table_len = name_table_len(&names);
        if table_len > u16::MAX as usize {
            return Err(IndexError::NameTableOverflow { len: table_len });
        }
        Ok(Self { names, grid })
    }

    /// Region names in identifier order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Root tagged pointers, row-major (latitude, longitude).
    pub fn root_words(&self) -> &[u32] {
        &self.grid.root_words
    }

    /// The shared blob.
    pub fn blob(&self) -> &[u8] {
        &self.grid.blob
    }

    /// Byte length of the NUL-separated name table.
    pub fn name_table_len(&self) -> usize {
        name_table_len(&self.names)
    }

    /// Serialize the artifact.
    pub fn to_bytes(&self) -> Vec<u8> {
        let table_len = self.name_table_len();
        let mut out = Vec::with_capacity(
            MAGIC.len() + 2 + table_len + 4 * self.grid.root_words.len() + self.grid.blob.len(),
        );
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&(table_len as u16).to_le_bytes());
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                out.push(0);
            }
            out.extend_from_slice(name.as_bytes());
        }
        for word in &self.grid.root_words {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.extend_from_slice(&self.grid.blob);
        out
    }

    /// Write the artifact, creating parent directories as needed.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let bytes = self.to_bytes();
        std::fs::write(path, &bytes)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "artifact written");
        Ok(())
    }
}

fn name_table_len(names: &[String]) -> usize {
    let separators = names.len().saturating_sub(1);
    names.iter().map(|n| n.len()).sum::<usize>() + separators
}
