//! Edit-mode visualization tier: buffers, batches and the per-point
//! bitfield encoding consumed by the edit shaders.

use std::sync::Arc;

use bitflags::bitflags;

use crate::curves::HandleType;
use crate::gpu::{Batch, IndexBuf, VertBuf};

bitflags! {
    /// Per-point classification flags of the edit `data` buffer.
    ///
    /// Byte structure for a Bezier knot (the point between the handles):
    ///
    /// ```text
    /// | left type | right type |      | KNOT | ACTIVE | HANDLE | NURBS |
    /// | 7       6 | 5        4 | ...  |    3 |      2 |      1 |     0 |
    /// ```
    ///
    /// Handle points repeat their own handle type in the type bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EditPointFlags: u32 {
        /// NURBS control point.
        const NURBS_CONTROL_POINT = 1;
        /// Bezier handle point (left or right).
        const BEZIER_HANDLE = 1 << 1;
        /// Selected, or adjacent to a selected handle.
        const ACTIVE = 1 << 2;
        /// Bezier control point lying on the curve.
        const BEZIER_KNOT = 1 << 3;
    }
}

/// Bit position of the packed handle-type value.
pub const HANDLE_TYPES_SHIFT: u32 = 4;

/// Encode the `data` value for a Bezier handle point.
pub fn bezier_handle_value(handle_type: HandleType, is_active: bool) -> u32 {
    let mut flags = EditPointFlags::BEZIER_HANDLE;
    if is_active {
        flags |= EditPointFlags::ACTIVE;
    }
    ((handle_type as u32) << HANDLE_TYPES_SHIFT) | flags.bits()
}

/// Cached edit-mode buffers and batches for one geometry.
///
/// Built from the original (non-evaluated) geometry plus the externally
/// supplied deformation map. Dropping a field releases its storage, so
/// `clear` uniformly resets every slot to `None` on every invalidation
/// path.
#[derive(Debug, Default)]
pub struct EditCache {
    /// Deformed control-point positions, with Bezier handle positions
    /// appended (all left handles, then all right handles).
    pub points_pos: Option<Arc<VertBuf>>,
    /// Per-point [`EditPointFlags`] bitfield.
    pub points_data: Option<Arc<VertBuf>>,
    /// Per-point selection weight.
    pub points_selection: Option<Arc<VertBuf>>,
    /// Handle-wire line segments.
    pub handles_ibo: Option<Arc<IndexBuf>>,
    /// Sculpt-cage line strips over the original topology.
    pub sculpt_cage_ibo: Option<Arc<IndexBuf>>,
    /// Evaluated positions for the wireframe lines.
    pub lines_pos: Option<Arc<VertBuf>>,
    /// Wireframe line strips over the evaluated topology.
    pub lines_ibo: Option<Arc<IndexBuf>>,

    /// Point-cloud batch over the edit points.
    pub edit_points: Option<Batch>,
    /// Handle-wire batch.
    pub edit_handles: Option<Batch>,
    /// Sculpt-cage batch.
    pub sculpt_cage: Option<Batch>,
    /// Wireframe-lines batch.
    pub edit_lines: Option<Batch>,
}

impl EditCache {
    /// Release every buffer and batch.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// Ensure EditCache is Send + Sync
static_assertions::assert_impl_all!(EditCache: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bezier_handle_value_encoding() {
        let value = bezier_handle_value(HandleType::Vector, true);
        let flags = EditPointFlags::from_bits_truncate(value);
        assert!(flags.contains(EditPointFlags::BEZIER_HANDLE));
        assert!(flags.contains(EditPointFlags::ACTIVE));
        assert!(!flags.contains(EditPointFlags::BEZIER_KNOT));
        assert_eq!(value >> HANDLE_TYPES_SHIFT, HandleType::Vector as u32);

        let value = bezier_handle_value(HandleType::Free, false);
        assert_eq!(value, EditPointFlags::BEZIER_HANDLE.bits());
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut cache = EditCache::default();
        let mut vbo = VertBuf::with_format(crate::gpu::VertexFormat::from_attribute(
            "pos",
            crate::gpu::ComponentType::F32,
            3,
        ));
        vbo.data_alloc(2);
        cache.points_pos = Some(Arc::new(vbo));
        cache.clear();
        assert!(cache.points_pos.is_none());
    }
}
