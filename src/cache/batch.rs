//! The batch-cache controller: dirty-tagging, the request/consume
//! protocol, attribute reconciliation and age-based eviction.
//!
//! One controller owns all derived data of one geometry. Renderers tag it
//! dirty on geometry changes, request the batches they will draw, and the
//! build pass fills exactly the buffers those batches need.

use std::sync::Arc;

use bitflags::bitflags;
use parking_lot::Mutex;

use crate::cache::attributes::{attr_sampler_name, AttributeRequest, AttributeRequestSet};
use crate::cache::edit::EditCache;
use crate::cache::eval::{subdiv_resolution, EvalCache};
use crate::curves::{AttrDomain, AttrType, AttributeStore, CurvesGeometry, GeometryDeformation};
use crate::extract::{
    build_curve_offset_vbos, build_edit_handles_ibo, build_edit_lines_pos,
    build_edit_points_position_and_data, build_edit_points_selection, build_lines_ibo,
    build_lines_ibo_no_cyclic, build_position_parameter_vbos, BezierPartition,
};
use crate::gpu::{
    Batch, BufferUsage, ComponentType, IndexBuf, PrimitiveTopology, VertBuf, VertexFormat,
};
use crate::material::{AttributeTypeHint, MaterialAttributes};

/// Default eviction window for unused attribute buffers, in frames.
pub const DEFAULT_ATTR_TIMEOUT: u32 = 120;

/// Cache invalidation mode. Only full invalidation is supported; the enum
/// exists so callers state the mode explicitly and new partial modes fail
/// to compile until handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyMode {
    /// Discard every tier on the next validation.
    All,
}

/// A visual batch a renderer can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    /// Point cloud over the edit points (knots and handles).
    EditPoints,
    /// Line strips over the original control polygon, for sculpt-mode
    /// cage display.
    SculptCage,
    /// Handle wires and control polygons of the edit overlay.
    EditHandles,
    /// Line strips over the evaluated points.
    EditLines,
}

bitflags! {
    /// Pending-batch bits, one per [`BatchKind`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct BatchFlags: u32 {
        const EDIT_POINTS = 1;
        const SCULPT_CAGE = 1 << 1;
        const EDIT_HANDLES = 1 << 2;
        const EDIT_LINES = 1 << 3;
    }
}

bitflags! {
    /// Identifies the buffers a batch draws from; also used as the
    /// requested-buffer accumulator of one build pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BufferId: u32 {
        /// Edit point positions with handle blocks.
        const EDIT_POINTS_POS = 1;
        /// Edit point classification bitfield.
        const EDIT_POINTS_DATA = 1 << 1;
        /// Edit point selection weights.
        const EDIT_POINTS_SELECTION = 1 << 2;
        /// Handle-wire index buffer.
        const EDIT_HANDLES_IBO = 1 << 3;
        /// Sculpt-cage index buffer.
        const SCULPT_CAGE_IBO = 1 << 4;
        /// Evaluated positions for the wireframe.
        const EDIT_LINES_POS = 1 << 5;
        /// Wireframe index buffer.
        const EDIT_LINES_IBO = 1 << 6;
    }
}

impl BatchKind {
    fn flag(self) -> BatchFlags {
        match self {
            Self::EditPoints => BatchFlags::EDIT_POINTS,
            Self::SculptCage => BatchFlags::SCULPT_CAGE,
            Self::EditHandles => BatchFlags::EDIT_HANDLES,
            Self::EditLines => BatchFlags::EDIT_LINES,
        }
    }

    /// The buffers this batch draws from.
    pub fn buffers(self) -> BufferId {
        let points = BufferId::EDIT_POINTS_POS
            | BufferId::EDIT_POINTS_DATA
            | BufferId::EDIT_POINTS_SELECTION;
        match self {
            Self::EditPoints => points,
            Self::SculptCage => points | BufferId::SCULPT_CAGE_IBO,
            Self::EditHandles => points | BufferId::EDIT_HANDLES_IBO,
            Self::EditLines => BufferId::EDIT_LINES_POS | BufferId::EDIT_LINES_IBO,
        }
    }
}

/// Derived-data cache of one curves geometry.
///
/// Owned by the geometry it decorates; created on first access, cleared
/// and reused on invalidation, dropped with the geometry.
#[derive(Debug)]
pub struct CurvesBatchCache {
    eval: EvalCache,
    edit: EditCache,
    dirty: bool,
    pending_batches: BatchFlags,
    requested_buffers: BufferId,
    /// Advisory lock around attribute-set merges; see
    /// [`AttributeRequestSet::merge`].
    render_lock: Mutex<()>,
    attr_timeout: u32,
}

impl Default for CurvesBatchCache {
    fn default() -> Self {
        Self {
            eval: EvalCache::default(),
            edit: EditCache::default(),
            dirty: false,
            pending_batches: BatchFlags::empty(),
            requested_buffers: BufferId::empty(),
            render_lock: Mutex::new(()),
            attr_timeout: DEFAULT_ATTR_TIMEOUT,
        }
    }
}

impl CurvesBatchCache {
    /// Create an empty, valid cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the attribute eviction window, in frames.
    pub fn with_attr_timeout(mut self, timeout: u32) -> Self {
        self.attr_timeout = timeout;
        self
    }

    /// Mark the cache for rebuild. Dirty means the next [`validate`]
    /// discards and reinitializes every tier.
    ///
    /// [`validate`]: Self::validate
    pub fn tag_dirty(&mut self, mode: DirtyMode) {
        match mode {
            DirtyMode::All => self.dirty = true,
        }
    }

    /// Whether the cache is waiting for a rebuild.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Discard every tier when dirty, then clear the flag. Idempotent;
    /// must run before any buffer is read or filled.
    pub fn validate(&mut self) {
        if !self.dirty {
            return;
        }
        log::debug!("curves cache dirty, discarding all tiers");
        self.free();
        self.dirty = false;
    }

    /// Release every tier and forget pending requests.
    pub fn free(&mut self) {
        self.eval.clear();
        self.edit.clear();
        self.pending_batches = BatchFlags::empty();
        self.requested_buffers = BufferId::empty();
    }

    /// Request a batch for drawing. Returns true when the batch is missing
    /// and must be filled this pass; its buffers are then recorded as
    /// requested.
    pub fn request_batch(&mut self, kind: BatchKind) -> bool {
        debug_assert!(!self.dirty, "validate() must run before requests");
        if self.batch(kind).is_some() {
            return false;
        }
        self.pending_batches |= kind.flag();
        self.requested_buffers |= kind.buffers();
        true
    }

    /// Record that a requested batch needs this buffer.
    pub fn request_buffer(&mut self, id: BufferId) {
        self.requested_buffers |= id;
    }

    /// Whether any batch requested this buffer in the current pass.
    pub fn is_buffer_requested(&self, id: BufferId) -> bool {
        self.requested_buffers.contains(id)
    }

    /// Fill every requested buffer and assemble the pending batches.
    ///
    /// Buffers nobody requested are skipped; a batch is assembled only
    /// once all of its buffers are filled, so a partially built batch is
    /// never observable.
    pub fn build_requested(&mut self, geometry: &CurvesGeometry, deformation: &GeometryDeformation) {
        debug_assert!(!self.dirty, "validate() must run before building");
        if self.pending_batches.is_empty() {
            self.requested_buffers = BufferId::empty();
            return;
        }
        let partition = BezierPartition::new(geometry);

        if self.is_buffer_requested(BufferId::EDIT_POINTS_POS)
            || self.is_buffer_requested(BufferId::EDIT_POINTS_DATA)
        {
            if self.edit.points_pos.is_none() || self.edit.points_data.is_none() {
                let (pos, data) =
                    build_edit_points_position_and_data(geometry, &partition, deformation);
                self.edit.points_pos = Some(Arc::new(pos));
                self.edit.points_data = Some(Arc::new(data));
            }
        }
        if self.is_buffer_requested(BufferId::EDIT_POINTS_SELECTION)
            && self.edit.points_selection.is_none()
        {
            self.edit.points_selection =
                Some(Arc::new(build_edit_points_selection(geometry, &partition)));
        }
        if self.is_buffer_requested(BufferId::EDIT_HANDLES_IBO) && self.edit.handles_ibo.is_none() {
            self.edit.handles_ibo = Some(Arc::new(build_edit_handles_ibo(geometry, &partition)));
        }
        if self.is_buffer_requested(BufferId::SCULPT_CAGE_IBO) && self.edit.sculpt_cage_ibo.is_none()
        {
            self.edit.sculpt_cage_ibo =
                Some(Arc::new(build_lines_ibo_no_cyclic(geometry.points_by_curve())));
        }
        if self.is_buffer_requested(BufferId::EDIT_LINES_POS) && self.edit.lines_pos.is_none() {
            self.edit.lines_pos = Some(Arc::new(build_edit_lines_pos(geometry)));
        }
        if self.is_buffer_requested(BufferId::EDIT_LINES_IBO) && self.edit.lines_ibo.is_none() {
            self.edit.lines_ibo = Some(Arc::new(build_lines_ibo(
                geometry.evaluated_points_by_curve(),
                geometry.cyclic(),
            )));
        }

        self.assemble_pending();
        self.pending_batches = BatchFlags::empty();
        self.requested_buffers = BufferId::empty();
    }

    fn assemble_pending(&mut self) {
        let edit = &mut self.edit;
        let point_vbos = match (&edit.points_pos, &edit.points_data, &edit.points_selection) {
            (Some(pos), Some(data), Some(selection)) => {
                Some(vec![pos.clone(), data.clone(), selection.clone()])
            }
            _ => None,
        };

        if self.pending_batches.contains(BatchFlags::EDIT_POINTS) && edit.edit_points.is_none() {
            if let Some(vbos) = point_vbos.clone() {
                edit.edit_points = Some(Batch::new(PrimitiveTopology::PointList, vbos, None));
            }
        }
        if self.pending_batches.contains(BatchFlags::SCULPT_CAGE) && edit.sculpt_cage.is_none() {
            if let (Some(vbos), Some(ibo)) = (point_vbos.clone(), edit.sculpt_cage_ibo.clone()) {
                edit.sculpt_cage =
                    Some(Batch::new(PrimitiveTopology::LineStrip, vbos, Some(ibo)));
            }
        }
        if self.pending_batches.contains(BatchFlags::EDIT_HANDLES) && edit.edit_handles.is_none() {
            if let (Some(vbos), Some(ibo)) = (point_vbos, edit.handles_ibo.clone()) {
                edit.edit_handles = Some(Batch::new(PrimitiveTopology::LineList, vbos, Some(ibo)));
            }
        }
        if self.pending_batches.contains(BatchFlags::EDIT_LINES) && edit.edit_lines.is_none() {
            if let (Some(pos), Some(ibo)) = (edit.lines_pos.clone(), edit.lines_ibo.clone()) {
                edit.edit_lines = Some(Batch::new(
                    PrimitiveTopology::LineStrip,
                    vec![pos],
                    Some(ibo),
                ));
            }
        }
    }

    /// The assembled batch of a kind, if built.
    pub fn batch(&self, kind: BatchKind) -> Option<&Batch> {
        match kind {
            BatchKind::EditPoints => self.edit.edit_points.as_ref(),
            BatchKind::SculptCage => self.edit.sculpt_cage.as_ref(),
            BatchKind::EditHandles => self.edit.edit_handles.as_ref(),
            BatchKind::EditLines => self.edit.edit_lines.as_ref(),
        }
    }

    /// The device-resolution draw batch, if built.
    pub fn final_batch(&self) -> Option<&Batch> {
        self.eval.final_tier.batch.as_ref()
    }

    /// Ensure the procedural tiers exist for the given settings, rebuilding
    /// lazily. Returns true when the device-side tessellation pass must run
    /// again (a final-tier buffer was (re)allocated).
    ///
    /// A change of `subdiv` or `thickness_res` clears only the final tier;
    /// the topology tier is sized by the control points and survives.
    pub fn ensure_procedural_data(
        &mut self,
        geometry: &CurvesGeometry,
        material: &MaterialAttributes,
        subdiv: u32,
        thickness_res: u32,
    ) -> bool {
        self.validate();
        let mut need_update = false;

        let final_tier = &mut self.eval.final_tier;
        if final_tier.subdiv != subdiv || final_tier.thickness_res != thickness_res {
            log::debug!(
                "subdiv {} -> {}, thickness {} -> {}: clearing final tier",
                final_tier.subdiv,
                subdiv,
                final_tier.thickness_res,
                thickness_res
            );
            final_tier.clear();
        }
        final_tier.subdiv = subdiv;
        final_tier.thickness_res = thickness_res;
        final_tier.resolution = subdiv_resolution(subdiv);

        if self.eval.position_parameter_buf.is_none() {
            let (pos, lengths) = build_position_parameter_vbos(geometry);
            let (offsets, segments) = build_curve_offset_vbos(geometry);
            self.eval.position_parameter_buf = Some(Arc::new(pos));
            self.eval.curve_length_buf = Some(Arc::new(lengths));
            self.eval.curve_offset_buf = Some(Arc::new(offsets));
            self.eval.curve_segment_buf = Some(Arc::new(segments));
            need_update = true;
        }

        let final_tier = &mut self.eval.final_tier;
        if final_tier.position_buf.is_none() {
            let mut buf = VertBuf::with_format_usage(
                VertexFormat::from_attribute("posTime", ComponentType::F32, 4),
                BufferUsage::STATIC | BufferUsage::DEVICE_ONLY,
            );
            buf.data_alloc(final_tier.resolution * geometry.curves_num());
            final_tier.position_buf = Some(Arc::new(buf));
            need_update = true;
        }
        if final_tier.batch.is_none() {
            let ibo = calc_final_indices(
                geometry.curves_num(),
                final_tier.resolution,
                thickness_res,
            );
            let topology = ibo.topology();
            if let Some(pos) = final_tier.position_buf.clone() {
                final_tier.batch = Some(Batch::new(topology, vec![pos], Some(Arc::new(ibo))));
            }
        }

        need_update |= self.ensure_attributes(geometry, material);
        need_update
    }

    /// Reconcile the material's declared attributes against the
    /// materialized set and fill missing slots.
    fn ensure_attributes(&mut self, geometry: &CurvesGeometry, material: &MaterialAttributes) -> bool {
        let needed = derive_requests(geometry.attributes(), material);

        if !self.eval.final_tier.attr_used.contains_all(&needed) {
            log::debug!(
                "attribute needs changed ({} requested), discarding all slots",
                needed.len()
            );
            self.eval.discard_attributes();
            self.eval
                .final_tier
                .attr_used
                .merge(&needed, &self.render_lock);
        }
        self.eval
            .final_tier
            .attr_used_over_time
            .merge(&needed, &self.render_lock);

        let mut need_update = false;
        let attr_used = self.eval.final_tier.attr_used.clone();
        for (slot, request) in attr_used.iter().enumerate() {
            if self.eval.attribute_bufs[slot].is_none() {
                self.eval.attribute_bufs[slot] =
                    Some(Arc::new(materialize_attribute(geometry, request)));
            }
            // Curve-domain values are one record per curve already; only
            // point-domain attributes get a device-resolution copy.
            if request.domain == AttrDomain::Point
                && self.eval.final_tier.attribute_bufs[slot].is_none()
            {
                let final_tier = &mut self.eval.final_tier;
                let mut buf = VertBuf::with_format_usage(
                    VertexFormat::from_attribute(
                        attr_sampler_name(&request.name),
                        ComponentType::F32,
                        4,
                    ),
                    BufferUsage::STATIC | BufferUsage::DEVICE_ONLY,
                );
                buf.data_alloc(final_tier.resolution * geometry.curves_num());
                final_tier.attribute_bufs[slot] = Some(Arc::new(buf));
                need_update = true;
            }
        }
        need_update
    }

    /// Request one attribute by name outside a material pass, resolving it
    /// like an auto-from-name declaration. No-op when no layer matches.
    pub fn request_attribute(&mut self, geometry: &CurvesGeometry, name: &str) {
        let Some(request) = resolve_auto_request(geometry.attributes(), name) else {
            log::trace!("no attribute layer matches '{name}'");
            return;
        };
        let mut needed = AttributeRequestSet::new();
        needed.add_request(request);

        if !self.eval.final_tier.attr_used.contains_all(&needed) {
            self.eval.discard_attributes();
            self.eval
                .final_tier
                .attr_used
                .merge(&needed, &self.render_lock);
        }
        self.eval
            .final_tier
            .attr_used_over_time
            .merge(&needed, &self.render_lock);
    }

    /// The buffer of an evaluated attribute, and whether it is stored per
    /// point (device resolution) or per curve.
    pub fn evaluated_attribute_buffer(&self, name: &str) -> Option<(Arc<VertBuf>, bool)> {
        let slot = self.eval.final_tier.attr_used.find(name)?;
        let request = self.eval.final_tier.attr_used.iter().nth(slot)?;
        match request.domain {
            AttrDomain::Point => self.eval.final_tier.attribute_bufs[slot]
                .clone()
                .map(|buf| (buf, true)),
            AttrDomain::Curve => self.eval.attribute_bufs[slot].clone().map(|buf| (buf, false)),
        }
    }

    /// Advance the eviction clock.
    ///
    /// When everything requested since the last call covers the
    /// materialized set, the matching timestamp refreshes; once more than
    /// the timeout elapses without a match, every attribute buffer is
    /// dropped. The over-time set resets each call, so it accumulates
    /// exactly one window of requests.
    pub fn free_old(&mut self, ctime: u32) {
        let final_tier = &mut self.eval.final_tier;
        if final_tier
            .attr_used_over_time
            .contains_all(&final_tier.attr_used)
        {
            final_tier.last_attr_matching_time = ctime;
        }
        let idle = ctime.saturating_sub(final_tier.last_attr_matching_time);
        if idle > self.attr_timeout {
            log::debug!("attribute buffers unused for {idle} frames, evicting");
            self.eval.discard_attributes();
        }
        self.eval.final_tier.attr_used_over_time.clear();
    }

    /// The procedural tiers.
    pub fn eval(&self) -> &EvalCache {
        &self.eval
    }

    /// The edit tier.
    pub fn edit(&self) -> &EditCache {
        &self.edit
    }
}

/// Index buffer of the final batch. One extra slot per curve holds the
/// strip restart; contents are generated on the device.
fn calc_final_indices(curves_num: usize, resolution: usize, thickness_res: u32) -> IndexBuf {
    let verts_per_curve = resolution * thickness_res as usize;
    let prim = if thickness_res == 1 {
        PrimitiveTopology::LineStrip
    } else {
        PrimitiveTopology::TriangleStrip
    };
    IndexBuf::device_generated(prim, curves_num as u32, verts_per_curve as u32 + 1)
}

/// Resolve an auto-from-name declaration: curve-domain texture
/// coordinates win, then the point store, then the curve store.
fn resolve_auto_request(store: &AttributeStore, name: &str) -> Option<AttributeRequest> {
    if store.has_uv_layer(name) {
        return Some(AttributeRequest::new(name, AttrType::Float2, AttrDomain::Curve));
    }
    if let Some(data_type) = store.match_attribute(name, AttrDomain::Point) {
        return Some(AttributeRequest::new(name, data_type, AttrDomain::Point));
    }
    if let Some(data_type) = store.match_attribute(name, AttrDomain::Curve) {
        return Some(AttributeRequest::new(name, data_type, AttrDomain::Curve));
    }
    None
}

/// Derive the request set from a material's declared attribute needs.
/// Declarations with no matching layer are skipped.
fn derive_requests(store: &AttributeStore, material: &MaterialAttributes) -> AttributeRequestSet {
    let mut set = AttributeRequestSet::new();
    for attr in &material.attributes {
        let request = match attr.type_hint {
            AttributeTypeHint::AutoFromName => resolve_auto_request(store, &attr.name),
            AttributeTypeHint::Typed(data_type) => {
                if store.match_attribute(&attr.name, AttrDomain::Point) == Some(data_type) {
                    Some(AttributeRequest::new(&attr.name, data_type, AttrDomain::Point))
                } else if store.match_attribute(&attr.name, AttrDomain::Curve) == Some(data_type) {
                    Some(AttributeRequest::new(&attr.name, data_type, AttrDomain::Curve))
                } else {
                    None
                }
            }
        };
        match request {
            Some(request) => set.add_request(request),
            None => log::trace!("material attribute '{}' has no layer, skipped", attr.name),
        }
    }
    set
}

/// Materialize one attribute slot from the generic store as RGBA records,
/// defaulting to transparent-black-with-alpha when the layer is absent.
fn materialize_attribute(geometry: &CurvesGeometry, request: &AttributeRequest) -> VertBuf {
    let len = match request.domain {
        AttrDomain::Point => geometry.points_num(),
        AttrDomain::Curve => geometry.curves_num(),
    };
    let mut buf = VertBuf::with_format_usage(
        VertexFormat::from_attribute(attr_sampler_name(&request.name), ComponentType::F32, 4),
        BufferUsage::STATIC | BufferUsage::TEXTURE_ONLY,
    );
    buf.data_alloc(len);
    let values = geometry.attributes().materialize_color(
        &request.name,
        request.domain,
        len,
        [0.0, 0.0, 0.0, 1.0],
    );
    buf.as_mut_slice::<[f32; 4]>()[..len].copy_from_slice(&values);
    buf
}

// Ensure the controller is Send + Sync
static_assertions::assert_impl_all!(CurvesBatchCache: Send, Sync);
