//! Read-only curve geometry consumed by the cache.
//!
//! [`CurvesGeometry`] is the immutable per-frame view the host hands to
//! the cache: control-point positions, per-curve point ranges, cyclic
//! flags, per-curve interpolation type, Bezier handles, a generic named
//! attribute store, and (when a tessellation step ran) the evaluated
//! positions and ranges.

pub mod attribute_store;
pub mod deformation;

pub use attribute_store::{
    AttrDomain, AttrMeta, AttrType, AttrValues, AttributeLayer, AttributeStore,
};
pub use deformation::GeometryDeformation;

use glam::Vec3;

/// Name of the point selection-weight attribute.
pub const SELECTION_ATTR: &str = ".selection";
/// Name of the left-handle selection attribute.
pub const SELECTION_HANDLE_LEFT_ATTR: &str = ".selection_handle_left";
/// Name of the right-handle selection attribute.
pub const SELECTION_HANDLE_RIGHT_ATTR: &str = ".selection_handle_right";

/// Interpolation kind of a curve.
///
/// Each kind has its own point-count-to-vertex-count expansion rules; the
/// cache partitions curves by type when building edit-mode buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CurveType {
    /// Catmull-Rom interpolation.
    #[default]
    CatmullRom,
    /// Straight segments between points.
    Poly,
    /// Bezier with per-point left/right handles.
    Bezier,
    /// NURBS with control points off the curve.
    Nurbs,
}

impl CurveType {
    /// All curve types, in partition order.
    pub const ALL: [CurveType; 4] = [
        CurveType::CatmullRom,
        CurveType::Poly,
        CurveType::Bezier,
        CurveType::Nurbs,
    ];

    /// Index of this type in [`Self::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Self::CatmullRom => 0,
            Self::Poly => 1,
            Self::Bezier => 2,
            Self::Nurbs => 3,
        }
    }
}

/// Type of one side of a Bezier handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum HandleType {
    /// Freely positioned.
    #[default]
    Free = 0,
    /// Automatically computed for smoothness.
    Auto = 1,
    /// Pointing at the adjacent knot.
    Vector = 2,
    /// Aligned with the opposite handle.
    Align = 3,
}

/// Per-curve point ranges expressed as a shared offsets array.
///
/// `offsets` has one entry per curve plus a trailing total; curve `i`
/// owns points `offsets[i]..offsets[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OffsetRanges {
    offsets: Vec<u32>,
}

impl OffsetRanges {
    /// Build ranges from per-curve point counts.
    pub fn from_counts(counts: &[usize]) -> Self {
        let mut offsets = Vec::with_capacity(counts.len() + 1);
        let mut total = 0u32;
        offsets.push(0);
        for &count in counts {
            total += count as u32;
            offsets.push(total);
        }
        Self { offsets }
    }

    /// Build from a raw offsets array (`len = curves + 1`, monotonic,
    /// starting at 0).
    pub fn from_offsets(offsets: Vec<u32>) -> Self {
        debug_assert!(!offsets.is_empty());
        debug_assert_eq!(offsets.first(), Some(&0));
        debug_assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
        Self { offsets }
    }

    /// Number of curves.
    pub fn curve_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Total number of points across all curves.
    pub fn total_points(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0) as usize
    }

    /// Point index range of curve `i`.
    pub fn points(&self, i: usize) -> std::ops::Range<usize> {
        self.offsets[i] as usize..self.offsets[i + 1] as usize
    }

    /// Global index of curve `i`'s first point.
    pub fn start(&self, i: usize) -> usize {
        self.offsets[i] as usize
    }

    /// Number of points in curve `i`.
    pub fn point_count(&self, i: usize) -> usize {
        (self.offsets[i + 1] - self.offsets[i]) as usize
    }
}

/// Immutable curve geometry view.
///
/// Constructed by the host per frame; the cache never mutates it. The
/// evaluated (tessellated) positions come from the external subdivision
/// step and default to the control points when absent.
#[derive(Debug, Clone)]
pub struct CurvesGeometry {
    positions: Vec<Vec3>,
    offsets: OffsetRanges,
    cyclic: Vec<bool>,
    curve_types: Vec<CurveType>,
    handle_positions_left: Vec<Vec3>,
    handle_positions_right: Vec<Vec3>,
    handle_types_left: Vec<HandleType>,
    handle_types_right: Vec<HandleType>,
    attributes: AttributeStore,
    evaluated_positions: Option<Vec<Vec3>>,
    evaluated_offsets: Option<OffsetRanges>,
}

impl CurvesGeometry {
    /// Create a geometry from positions and per-curve point counts.
    ///
    /// All curves default to non-cyclic Catmull-Rom with no handles and an
    /// empty attribute store.
    pub fn new(positions: Vec<Vec3>, points_per_curve: &[usize]) -> Self {
        let offsets = OffsetRanges::from_counts(points_per_curve);
        debug_assert_eq!(offsets.total_points(), positions.len());
        let curve_count = offsets.curve_count();
        Self {
            positions,
            offsets,
            cyclic: vec![false; curve_count],
            curve_types: vec![CurveType::default(); curve_count],
            handle_positions_left: Vec::new(),
            handle_positions_right: Vec::new(),
            handle_types_left: Vec::new(),
            handle_types_right: Vec::new(),
            attributes: AttributeStore::new(),
            evaluated_positions: None,
            evaluated_offsets: None,
        }
    }

    /// Set per-curve cyclic flags.
    pub fn with_cyclic(mut self, cyclic: Vec<bool>) -> Self {
        debug_assert_eq!(cyclic.len(), self.curves_num());
        self.cyclic = cyclic;
        self
    }

    /// Set per-curve interpolation types.
    pub fn with_curve_types(mut self, types: Vec<CurveType>) -> Self {
        debug_assert_eq!(types.len(), self.curves_num());
        self.curve_types = types;
        self
    }

    /// Set per-point Bezier handle positions and types.
    ///
    /// Arrays cover every point; entries for non-Bezier curves are unused.
    pub fn with_bezier_handles(
        mut self,
        left_positions: Vec<Vec3>,
        right_positions: Vec<Vec3>,
        left_types: Vec<HandleType>,
        right_types: Vec<HandleType>,
    ) -> Self {
        debug_assert_eq!(left_positions.len(), self.points_num());
        debug_assert_eq!(right_positions.len(), self.points_num());
        debug_assert_eq!(left_types.len(), self.points_num());
        debug_assert_eq!(right_types.len(), self.points_num());
        self.handle_positions_left = left_positions;
        self.handle_positions_right = right_positions;
        self.handle_types_left = left_types;
        self.handle_types_right = right_types;
        self
    }

    /// Set the named attribute store.
    pub fn with_attributes(mut self, attributes: AttributeStore) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set the evaluated (tessellated) positions and ranges produced by
    /// the external subdivision step.
    pub fn with_evaluated(mut self, positions: Vec<Vec3>, points_per_curve: &[usize]) -> Self {
        let offsets = OffsetRanges::from_counts(points_per_curve);
        debug_assert_eq!(offsets.total_points(), positions.len());
        debug_assert_eq!(offsets.curve_count(), self.curves_num());
        self.evaluated_positions = Some(positions);
        self.evaluated_offsets = Some(offsets);
        self
    }

    /// Total point count.
    pub fn points_num(&self) -> usize {
        self.positions.len()
    }

    /// Curve count.
    pub fn curves_num(&self) -> usize {
        self.offsets.curve_count()
    }

    /// Control-point positions.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Per-curve point ranges.
    pub fn points_by_curve(&self) -> &OffsetRanges {
        &self.offsets
    }

    /// Per-curve cyclic flags.
    pub fn cyclic(&self) -> &[bool] {
        &self.cyclic
    }

    /// Per-curve interpolation types.
    pub fn curve_types(&self) -> &[CurveType] {
        &self.curve_types
    }

    /// The named attribute store.
    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    /// Left handle positions (empty when no Bezier curves carry handles).
    pub fn handle_positions_left(&self) -> &[Vec3] {
        &self.handle_positions_left
    }

    /// Right handle positions.
    pub fn handle_positions_right(&self) -> &[Vec3] {
        &self.handle_positions_right
    }

    /// Left handle types.
    pub fn handle_types_left(&self) -> &[HandleType] {
        &self.handle_types_left
    }

    /// Right handle types.
    pub fn handle_types_right(&self) -> &[HandleType] {
        &self.handle_types_right
    }

    /// Evaluated positions, falling back to the control points.
    pub fn evaluated_positions(&self) -> &[Vec3] {
        self.evaluated_positions.as_deref().unwrap_or(&self.positions)
    }

    /// Evaluated per-curve ranges, falling back to the control ranges.
    pub fn evaluated_points_by_curve(&self) -> &OffsetRanges {
        self.evaluated_offsets.as_ref().unwrap_or(&self.offsets)
    }

    /// Number of curves of each type, indexed by [`CurveType::index`].
    pub fn curve_type_counts(&self) -> [usize; 4] {
        let mut counts = [0usize; 4];
        for t in &self.curve_types {
            counts[t.index()] += 1;
        }
        counts
    }

    /// Indices of curves with the given type, in curve order.
    pub fn indices_for_type(&self, curve_type: CurveType) -> Vec<usize> {
        // Cheap exit for the common single-type case.
        if self.curve_type_counts()[curve_type.index()] == 0 {
            return Vec::new();
        }
        self.curve_types
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == curve_type)
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of curves whose type differs from the given type.
    pub fn indices_not_of_type(&self, curve_type: CurveType) -> Vec<usize> {
        self.curve_types
            .iter()
            .enumerate()
            .filter(|(_, t)| **t != curve_type)
            .map(|(i, _)| i)
            .collect()
    }
}
