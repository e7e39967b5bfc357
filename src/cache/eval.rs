//! Procedural (topology-derived) buffer tiers of one geometry's cache.

use std::sync::Arc;

use crate::cache::attributes::{AttributeRequestSet, MAX_ATTRIBUTES};
use crate::gpu::{Batch, VertBuf};

/// Device resolution (evaluated points per curve) for a subdivision level.
pub fn subdiv_resolution(subdiv: u32) -> usize {
    1 << (3 + subdiv)
}

/// The final tier: device-resolution buffers produced by the external
/// subdivision step, plus the attribute bookkeeping that drives eviction.
#[derive(Debug, Default)]
pub struct FinalCache {
    /// Device-resolution position buffer, `resolution * curves` records
    /// (min 1). Contents are written on the device; the CPU side only
    /// allocates.
    pub position_buf: Option<Arc<VertBuf>>,
    /// Draw batch with a device-generated index buffer.
    pub batch: Option<Batch>,
    /// Device-resolution attribute buffers; allocated only for
    /// point-domain requests.
    pub attribute_bufs: [Option<Arc<VertBuf>>; MAX_ATTRIBUTES],
    /// The currently materialized request set; a request's position is its
    /// buffer slot.
    pub attr_used: AttributeRequestSet,
    /// Every request seen since the last eviction pass.
    pub attr_used_over_time: AttributeRequestSet,
    /// Timestamp of the last pass where `attr_used_over_time` covered
    /// `attr_used`.
    pub last_attr_matching_time: u32,
    /// Subdivision level the tier was built for.
    pub subdiv: u32,
    /// Thickness resolution the tier was built for.
    pub thickness_res: u32,
    /// Evaluated points per curve, `1 << (3 + subdiv)`.
    pub resolution: usize,
}

impl FinalCache {
    /// Release every buffer of the tier. Attribute bookkeeping resets with
    /// the buffers so reconciliation starts from an empty materialized set.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Per-geometry cache of procedural buffers.
///
/// The topology tier is sized by the control-point topology; the final
/// tier by the device resolution. The tiers invalidate independently:
/// topology changes clear everything, subdivision or thickness changes
/// clear only [`FinalCache`].
#[derive(Debug, Default)]
pub struct EvalCache {
    /// Position + normalized arclength parameter, one record per point.
    pub position_parameter_buf: Option<Arc<VertBuf>>,
    /// Total length per curve.
    pub curve_length_buf: Option<Arc<VertBuf>>,
    /// Global start index per curve.
    pub curve_offset_buf: Option<Arc<VertBuf>>,
    /// Segment count per curve.
    pub curve_segment_buf: Option<Arc<VertBuf>>,
    /// Control-point-resolution attribute buffers, slot-indexed by
    /// `final_tier.attr_used`.
    pub attribute_bufs: [Option<Arc<VertBuf>>; MAX_ATTRIBUTES],
    /// The device-resolution tier.
    pub final_tier: FinalCache,
}

impl EvalCache {
    /// Release every tier.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Release the attribute buffers of both tiers and forget the
    /// materialized set. The sole entry point for slot deallocation.
    pub fn discard_attributes(&mut self) {
        self.attribute_bufs = std::array::from_fn(|_| None);
        self.final_tier.attribute_bufs = std::array::from_fn(|_| None);
        self.final_tier.attr_used.clear();
    }
}

// Ensure the cache tiers are Send + Sync
static_assertions::assert_impl_all!(EvalCache: Send, Sync);
static_assertions::assert_impl_all!(FinalCache: Send, Sync);
