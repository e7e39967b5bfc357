//! Edit-mode buffer construction: deformed control points, the per-point
//! classification bitfield, selection weights and the handle-wire index
//! buffer.
//!
//! Bezier curves contribute two extra vertices per point (the left and
//! right handles), appended after all base points in two contiguous
//! blocks ordered by the curve's position among Bezier curves.

use glam::Vec3;

use crate::cache::edit::{bezier_handle_value, EditPointFlags};
use crate::curves::{
    AttrDomain, CurveType, CurvesGeometry, GeometryDeformation, OffsetRanges, SELECTION_ATTR,
    SELECTION_HANDLE_LEFT_ATTR, SELECTION_HANDLE_RIGHT_ATTR,
};
use crate::gpu::{
    ComponentType, IndexBuf, PrimitiveTopology, TwoRegionIndexBufBuilder, VertBuf, VertexFormat,
};

/// The Bezier curves of a geometry and the destination offsets of their
/// points within the appended handle blocks.
#[derive(Debug, Clone)]
pub struct BezierPartition {
    /// Indices of Bezier curves, in curve order.
    pub curves: Vec<usize>,
    /// Per-Bezier-curve point ranges within the handle blocks.
    pub offsets: OffsetRanges,
}

impl BezierPartition {
    /// Partition the geometry's curves.
    pub fn new(geometry: &CurvesGeometry) -> Self {
        let curves = geometry.indices_for_type(CurveType::Bezier);
        let counts: Vec<usize> = curves
            .iter()
            .map(|&c| geometry.points_by_curve().point_count(c))
            .collect();
        Self {
            curves,
            offsets: OffsetRanges::from_counts(&counts),
        }
    }

    /// Total number of Bezier points.
    pub fn total_points(&self) -> usize {
        self.offsets.total_points()
    }

    /// Whether the geometry has no Bezier curves.
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

/// Build the edit point position and classification buffers.
///
/// Both buffers hold `points + 2 * bezier_points` records: base points
/// first, then all left handles, then all right handles.
pub fn build_edit_points_position_and_data(
    geometry: &CurvesGeometry,
    partition: &BezierPartition,
    deformation: &GeometryDeformation,
) -> (VertBuf, VertBuf) {
    let points_num = geometry.points_num();
    let bezier_points = partition.total_points();
    let size = points_num + bezier_points * 2;

    let mut pos_buf =
        VertBuf::with_format(VertexFormat::from_attribute("pos", ComponentType::F32, 3));
    pos_buf.data_alloc(size);
    // U32 instead of U8: hardware may pad the stride to 4 anyway.
    let mut data_buf =
        VertBuf::with_format(VertexFormat::from_attribute("data", ComponentType::U32, 1));
    data_buf.data_alloc(size);

    let deformed = deformation.positions_or(geometry.positions());
    pos_buf.as_mut_slice::<Vec3>()[..points_num].copy_from_slice(deformed);

    let attributes = geometry.attributes();
    let selection = attributes.materialize_bool(SELECTION_ATTR, AttrDomain::Point, points_num, true);

    let data = data_buf.as_mut_slice::<u32>();
    let points_by_curve = geometry.points_by_curve();

    for (curve, &curve_type) in geometry.curve_types().iter().enumerate() {
        let points = points_by_curve.points(curve);
        match curve_type {
            CurveType::CatmullRom | CurveType::Poly => {
                data[points].fill(0);
            }
            CurveType::Nurbs => {
                let mut flags = EditPointFlags::NURBS_CONTROL_POINT;
                if points.clone().any(|p| selection[p]) {
                    flags |= EditPointFlags::ACTIVE;
                }
                data[points].fill(flags.bits());
            }
            CurveType::Bezier => {
                // Handled below with the destination block offsets.
            }
        }
    }

    if bezier_points > 0 {
        let selection_left = attributes.materialize_bool(
            SELECTION_HANDLE_LEFT_ATTR,
            AttrDomain::Point,
            points_num,
            true,
        );
        let selection_right = attributes.materialize_bool(
            SELECTION_HANDLE_RIGHT_ATTR,
            AttrDomain::Point,
            points_num,
            true,
        );
        let left_types = geometry.handle_types_left();
        let right_types = geometry.handle_types_right();
        debug_assert_eq!(left_types.len(), points_num);
        debug_assert_eq!(right_types.len(), points_num);

        let (base, handles) = data.split_at_mut(points_num);
        let (handle_left, handle_right) = handles.split_at_mut(bezier_points);

        for (dst_curve, &src_curve) in partition.curves.iter().enumerate() {
            let points = points_by_curve.points(src_curve);
            let dst_start = partition.offsets.start(dst_curve);
            for (point_in_curve, point) in points.enumerate() {
                let dst = dst_start + point_in_curve;
                base[point] = EditPointFlags::BEZIER_KNOT.bits();
                let is_active =
                    selection[point] || selection_left[point] || selection_right[point];
                handle_left[dst] = bezier_handle_value(left_types[point], is_active);
                handle_right[dst] = bezier_handle_value(right_types[point], is_active);
            }
        }

        let pos = pos_buf.as_mut_slice::<Vec3>();
        let (_, handle_pos) = pos.split_at_mut(points_num);
        let (left_pos, right_pos) = handle_pos.split_at_mut(bezier_points);
        let left_handles = geometry.handle_positions_left();
        let right_handles = geometry.handle_positions_right();

        for (dst_curve, &src_curve) in partition.curves.iter().enumerate() {
            let points = points_by_curve.points(src_curve);
            let dst_start = partition.offsets.start(dst_curve);
            for (point_in_curve, point) in points.enumerate() {
                let dst = dst_start + point_in_curve;
                left_pos[dst] = left_handles[point];
                right_pos[dst] = right_handles[point];
            }
        }
    }

    (pos_buf, data_buf)
}

/// Build the per-point selection-weight buffer, with the handle weights in
/// the trailing blocks.
pub fn build_edit_points_selection(
    geometry: &CurvesGeometry,
    partition: &BezierPartition,
) -> VertBuf {
    let points_num = geometry.points_num();
    let bezier_points = partition.total_points();
    let size = points_num + bezier_points * 2;

    let mut buf = VertBuf::with_format(VertexFormat::from_attribute(
        "selection",
        ComponentType::F32,
        1,
    ));
    buf.data_alloc(size);

    let attributes = geometry.attributes();
    let base_weights =
        attributes.materialize_float(SELECTION_ATTR, AttrDomain::Point, points_num, 1.0);

    let data = buf.as_mut_slice::<f32>();
    data[..points_num].copy_from_slice(&base_weights);

    if bezier_points > 0 {
        let left = attributes.materialize_float(
            SELECTION_HANDLE_LEFT_ATTR,
            AttrDomain::Point,
            points_num,
            1.0,
        );
        let right = attributes.materialize_float(
            SELECTION_HANDLE_RIGHT_ATTR,
            AttrDomain::Point,
            points_num,
            1.0,
        );
        let points_by_curve = geometry.points_by_curve();
        let (_, handles) = data.split_at_mut(points_num);
        let (left_out, right_out) = handles.split_at_mut(bezier_points);

        for (dst_curve, &src_curve) in partition.curves.iter().enumerate() {
            let points = points_by_curve.points(src_curve);
            let dst_start = partition.offsets.start(dst_curve);
            for (point_in_curve, point) in points.enumerate() {
                let dst = dst_start + point_in_curve;
                left_out[dst] = left[point];
                right_out[dst] = right[point];
            }
        }
    }
    buf
}

/// Build the handle-wire index buffer.
///
/// Region one holds the knot-to-left-handle segments of every Bezier
/// point; region two holds the knot-to-right-handle segments followed by
/// the control polygons of non-Bezier curves (one segment per consecutive
/// point pair, plus a closing segment for cyclic curves with more than
/// two points). The two regions share one allocation and are joined at
/// the end.
pub fn build_edit_handles_ibo(geometry: &CurvesGeometry, partition: &BezierPartition) -> IndexBuf {
    let points_num = geometry.points_num();
    let bezier_points = partition.total_points();
    let vert_len = points_num + 2 * bezier_points;
    let cyclic = geometry.cyclic();
    let points_by_curve = geometry.points_by_curve();

    let other_curves = geometry.indices_not_of_type(CurveType::Bezier);
    let cyclic_other = other_curves.iter().filter(|&&c| cyclic[c]).count();
    // Every control point except the last of each non-Bezier curve starts
    // one segment; one-point curves and two-point cyclic curves leave part
    // of the reservation unused, compacted by the join.
    let other_index_len =
        (points_num - bezier_points - other_curves.len()) * 2 + cyclic_other * 2;
    let first_capacity = 2 * bezier_points;
    let total_capacity = 4 * bezier_points + other_index_len;

    let mut builder = TwoRegionIndexBufBuilder::new(
        PrimitiveTopology::LineList,
        first_capacity,
        total_capacity,
        vert_len,
    );

    for (dst_curve, &src_curve) in partition.curves.iter().enumerate() {
        let points = points_by_curve.points(src_curve);
        let dst_start = partition.offsets.start(dst_curve);
        for (point_in_curve, point) in points.enumerate() {
            let left_vert = (points_num + dst_start + point_in_curve) as u32;
            let right_vert = left_vert + bezier_points as u32;
            builder.add_first_line(left_vert, point as u32);
            builder.add_second_line(right_vert, point as u32);
        }
    }

    for &curve in &other_curves {
        let points = points_by_curve.points(curve);
        if points.len() <= 1 {
            continue;
        }
        for point in points.clone().take(points.len() - 1) {
            builder.add_second_line(point as u32, point as u32 + 1);
        }
        if cyclic[curve] && points.len() > 2 {
            builder.add_second_line(points.start as u32, points.end as u32 - 1);
        }
    }

    builder.join()
}

/// Build the wireframe position buffer over the evaluated points.
pub fn build_edit_lines_pos(geometry: &CurvesGeometry) -> VertBuf {
    let positions = geometry.evaluated_positions();
    let mut buf = VertBuf::with_format(VertexFormat::from_attribute("pos", ComponentType::F32, 3));
    buf.data_alloc(positions.len());
    buf.as_mut_slice::<Vec3>()[..positions.len()].copy_from_slice(positions);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::{AttrValues, AttributeStore, HandleType};

    fn bezier_and_poly_geometry() -> CurvesGeometry {
        // Curve 0: Bezier with 2 points; curve 1: Poly with 3 points.
        let points_num = 5;
        CurvesGeometry::new(
            vec![
                Vec3::ZERO,
                Vec3::X,
                Vec3::new(3.0, 0.0, 0.0),
                Vec3::new(4.0, 0.0, 0.0),
                Vec3::new(5.0, 0.0, 0.0),
            ],
            &[2, 3],
        )
        .with_curve_types(vec![CurveType::Bezier, CurveType::Poly])
        .with_bezier_handles(
            vec![Vec3::new(-0.5, 0.0, 0.0); points_num],
            vec![Vec3::new(0.5, 0.0, 0.0); points_num],
            vec![HandleType::Vector; points_num],
            vec![HandleType::Auto; points_num],
        )
        .with_attributes(AttributeStore::new().with_layer(
            SELECTION_ATTR,
            AttrDomain::Point,
            AttrValues::Bool(vec![true, false, false, false, false]),
        ))
    }

    #[test]
    fn test_partition() {
        let geometry = bezier_and_poly_geometry();
        let partition = BezierPartition::new(&geometry);
        assert_eq!(partition.curves, vec![0]);
        assert_eq!(partition.total_points(), 2);
    }

    #[test]
    fn test_edit_points_layout_and_bitfield() {
        let geometry = bezier_and_poly_geometry();
        let partition = BezierPartition::new(&geometry);
        let (pos_buf, data_buf) = build_edit_points_position_and_data(
            &geometry,
            &partition,
            &GeometryDeformation::identity(),
        );

        // 5 base points + 2 left handles + 2 right handles.
        assert_eq!(pos_buf.len(), 9);
        assert_eq!(data_buf.len(), 9);

        let data = data_buf.as_slice::<u32>();
        // Knots carry only the knot flag, handle bits cleared.
        assert_eq!(data[0], EditPointFlags::BEZIER_KNOT.bits());
        assert_eq!(data[1], EditPointFlags::BEZIER_KNOT.bits());
        // Poly points are zero.
        assert_eq!(&data[2..5], &[0, 0, 0]);

        // Point 0 is selected: both its handle encodings carry the active
        // bit, with the per-side handle types.
        let left0 = data[5];
        let right0 = data[7];
        assert_eq!(left0, bezier_handle_value(HandleType::Vector, true));
        assert_eq!(right0, bezier_handle_value(HandleType::Auto, true));
        // Point 1 is not selected.
        assert_eq!(data[6], bezier_handle_value(HandleType::Vector, false));
        assert_eq!(data[8], bezier_handle_value(HandleType::Auto, false));

        let pos = pos_buf.as_slice::<Vec3>();
        assert_eq!(pos[5], Vec3::new(-0.5, 0.0, 0.0));
        assert_eq!(pos[7], Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_nurbs_marked_active_when_selected() {
        let geometry = CurvesGeometry::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], &[3])
            .with_curve_types(vec![CurveType::Nurbs])
            .with_attributes(AttributeStore::new().with_layer(
                SELECTION_ATTR,
                AttrDomain::Point,
                AttrValues::Bool(vec![false, true, false]),
            ));
        let partition = BezierPartition::new(&geometry);
        let (_, data_buf) = build_edit_points_position_and_data(
            &geometry,
            &partition,
            &GeometryDeformation::identity(),
        );
        let expected = EditPointFlags::NURBS_CONTROL_POINT | EditPointFlags::ACTIVE;
        assert!(data_buf.as_slice::<u32>().iter().all(|&d| d == expected.bits()));
    }

    #[test]
    fn test_selection_weights_with_handle_blocks() {
        let geometry = bezier_and_poly_geometry().with_attributes(
            AttributeStore::new()
                .with_layer(
                    SELECTION_ATTR,
                    AttrDomain::Point,
                    AttrValues::Float(vec![0.25, 0.0, 1.0, 1.0, 1.0]),
                )
                .with_layer(
                    SELECTION_HANDLE_LEFT_ATTR,
                    AttrDomain::Point,
                    AttrValues::Float(vec![0.5, 0.0, 0.0, 0.0, 0.0]),
                ),
        );
        let partition = BezierPartition::new(&geometry);
        let buf = build_edit_points_selection(&geometry, &partition);
        let data = buf.as_slice::<f32>();
        assert_eq!(data[0], 0.25);
        // Left-handle block picks up the handle attribute.
        assert_eq!(data[5], 0.5);
        // Right-handle attribute absent: defaults to 1.0.
        assert_eq!(data[7], 1.0);
    }

    #[test]
    fn test_handles_ibo_regions() {
        let geometry = bezier_and_poly_geometry();
        let partition = BezierPartition::new(&geometry);
        let ibo = build_edit_handles_ibo(&geometry, &partition);

        // Region one: 2 left-handle lines. Region two: 2 right-handle
        // lines + 2 poly segments.
        let indices = ibo.indices().unwrap();
        assert_eq!(indices.len(), 4 + 4 + 4);
        // Left handle vertices start at points_num (5), rights at 7.
        assert_eq!(&indices[..4], &[5, 0, 6, 1]);
        assert_eq!(&indices[4..8], &[7, 0, 8, 1]);
        assert_eq!(&indices[8..], &[2, 3, 3, 4]);
    }

    #[test]
    fn test_handles_ibo_cyclic_closing_segment() {
        let geometry = CurvesGeometry::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], &[3])
            .with_curve_types(vec![CurveType::Nurbs])
            .with_cyclic(vec![true]);
        let partition = BezierPartition::new(&geometry);
        let ibo = build_edit_handles_ibo(&geometry, &partition);
        assert_eq!(ibo.indices(), Some(&[0, 1, 1, 2, 0, 2][..]));
    }

    #[test]
    fn test_handles_ibo_two_point_cyclic_skips_closing() {
        // The closing segment is reserved but skipped; the join compacts.
        let geometry = CurvesGeometry::new(vec![Vec3::ZERO, Vec3::X], &[2])
            .with_curve_types(vec![CurveType::Poly])
            .with_cyclic(vec![true]);
        let partition = BezierPartition::new(&geometry);
        let ibo = build_edit_handles_ibo(&geometry, &partition);
        assert_eq!(ibo.indices(), Some(&[0, 1][..]));
    }
}
