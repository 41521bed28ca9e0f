//! Tagged pointers and the little-endian wire format.
//!
//! Every node is addressed by a 32-bit tagged pointer: the top 2 bits are
//! the tag, the low 30 bits the payload (region id for Owned, buffer
//! offset for Leaf/Internal, unused for Empty).
//!
//! ```text
//! Internal buffer:
//!   4 × u32 tagged pointers (16 bytes), children in SW, SE, NW, NE order
//!   children's buffers, concatenated in pointer order
//!   (offsets are relative to the start of the children region)
//!
//! Leaf buffer:
//!   entry_count: u8
//!   per entry:
//!     region_id: u16
//!     polygon_count: u8
//!     per polygon:
//!       byte_len: u16            -- length of the record below
//!       ring_count: u8
//!       min_x, max_x, min_y, max_y: u16  -- cell-relative AABB
//!       per ring:
//!         vertex_count: u16
//!         vertex_count × (x: u16, y: u16)
//! ```
//!
//! All integers little-endian. Leaf entries carry enough framing that a
//! consumer can skip a polygon without parsing its rings.

use crate::encode::{LeafEntry, Node};
use crate::error::{IndexError, Result};

/// Artifact magic: format name + version, zero-padded to 8 bytes.
pub const MAGIC: [u8; 8] = *b"LLTZ1\0\0\0";

/// Tag values (top 2 bits of a tagged pointer).
pub const TAG_EMPTY: u8 = 0;
pub const TAG_OWNED: u8 = 1;
pub const TAG_LEAF: u8 = 2;
pub const TAG_INTERNAL: u8 = 3;

/// Bit position of the tag.
pub const TAG_SHIFT: u32 = 30;

/// Mask for the 30-bit payload.
pub const PAYLOAD_MASK: u32 = (1 << TAG_SHIFT) - 1;

/// Pack a tag and payload into a tagged pointer.
#[inline]
pub fn pack(tag: u8, payload: u32) -> u32 {
    ((tag as u32) << TAG_SHIFT) | (payload & PAYLOAD_MASK)
}

/// Tag of a tagged pointer.
#[inline]
pub fn tag(word: u32) -> u8 {
    (word >> TAG_SHIFT) as u8
}

/// Payload of a tagged pointer.
#[inline]
pub fn payload(word: u32) -> u32 {
    word & PAYLOAD_MASK
}

/// Rewrite a Leaf/Internal pointer's payload to `offset`; Empty and Owned
/// pointers carry no offset and pass through unchanged.
pub fn with_offset(word: u32, offset: usize) -> Result<u32> {
    match tag(word) {
        TAG_EMPTY | TAG_OWNED => Ok(word),
        _ => {
            if offset > PAYLOAD_MASK as usize {
                return Err(IndexError::PointerOverflow { offset });
            }
            Ok(word | offset as u32)
        }
    }
}

/// A serialized node: its tagged pointer (offset payload still zero; the
/// parent assigns it) and the buffer it owns. Empty/Owned nodes own no
/// buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedNode {
    pub word: u32,
    pub buffer: Vec<u8>,
}

/// Serialize one node tree into its tagged pointer and owned buffer.
pub fn serialize_node(node: &Node) -> Result<EncodedNode> {
    match node {
        Node::Empty => Ok(EncodedNode {
            word: pack(TAG_EMPTY, 0),
            buffer: Vec::new(),
        }),
        Node::Owned(id) => Ok(EncodedNode {
            word: pack(TAG_OWNED, *id as u32),
            buffer: Vec::new(),
        }),
        Node::Leaf(entries) => Ok(EncodedNode {
            word: pack(TAG_LEAF, 0),
            buffer: serialize_leaf(entries)?,
        }),
        Node::Internal(children) => {
            let encoded: Vec<EncodedNode> = children
                .iter()
                .map(serialize_node)
                .collect::<Result<_>>()?;

            // Pointer table first, then the children's buffers in pointer
            // order. Offsets are assigned strictly after all preceding
            // children's buffers, so they increase monotonically.
            let child_bytes: usize = encoded.iter().map(|e| e.buffer.len()).sum();
            let mut buffer = Vec::with_capacity(16 + child_bytes);
            let mut children_region = Vec::with_capacity(child_bytes);
            for child in &encoded {
                let word = with_offset(child.word, children_region.len())?;
                buffer.extend_from_slice(&word.to_le_bytes());
                children_region.extend_from_slice(&child.buffer);
            }
            buffer.extend_from_slice(&children_region);
            Ok(EncodedNode {
                word: pack(TAG_INTERNAL, 0),
                buffer,
            })
        }
    }
}

/// Serialize a leaf's entries. Counter ranges were enforced when the leaf
/// was built; violations here are internal errors, except the per-polygon
/// byte length, which is only knowable now.
fn serialize_leaf(entries: &[LeafEntry]) -> Result<Vec<u8>> {
    let count: u8 = entries
        .len()
        .try_into()
        .map_err(|_| IndexError::Internal(format!("leaf entry count {}", entries.len())))?;

    let mut buffer = Vec::new();
    buffer.push(count);
    for entry in entries {
        buffer.extend_from_slice(&entry.region.to_le_bytes());
        let polygon_count: u8 = entry.polygons.len().try_into().map_err(|_| {
            IndexError::Internal(format!(
                "polygon count {} for region {}",
                entry.polygons.len(),
                entry.region
            ))
        })?;
        buffer.push(polygon_count);

        for polygon in &entry.polygons {
            let record = polygon_record(entry.region, polygon)?;
            let byte_len: u16 = record.len().try_into().map_err(|_| {
                IndexError::PolygonTooLarge {
                    region: entry.region,
                    len: record.len(),
                }
            })?;
            buffer.extend_from_slice(&byte_len.to_le_bytes());
            buffer.extend_from_slice(&record);
        }
    }
    Ok(buffer)
}

fn polygon_record(region: u16, polygon: &crate::encode::CellPolygon) -> Result<Vec<u8>> {
    let ring_count: u8 = polygon
        .rings
        .len()
        .try_into()
        .map_err(|_| IndexError::Internal(format!("ring count {}", polygon.rings.len())))?;
    let (min_x, max_x, min_y, max_y) = polygon.bounds().ok_or_else(|| {
        IndexError::Internal(format!("empty polygon for region {region}"))
    })?;

    let vertex_bytes: usize = polygon.rings.iter().map(|r| 2 + 4 * r.len()).sum();
    let mut record = Vec::with_capacity(9 + vertex_bytes);
    record.push(ring_count);
    for v in [min_x, max_x, min_y, max_y] {
        record.extend_from_slice(&v.to_le_bytes());
    }
    for ring in &polygon.rings {
        let vertex_count: u16 = ring
            .len()
            .try_into()
            .map_err(|_| IndexError::Internal(format!("ring vertex count {}", ring.len())))?;
        record.extend_from_slice(&vertex_count.to_le_bytes());
        for &(x, y) in ring {
            record.extend_from_slice(&x.to_le_bytes());
            record.extend_from_slice(&y.to_le_bytes());
        }
    }
    Ok(record)
}
