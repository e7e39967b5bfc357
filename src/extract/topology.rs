//! Topology-derived vertex buffers: positions with arclength parameter,
//! per-curve offsets and segment counts.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::curves::{CurvesGeometry, OffsetRanges};
use crate::gpu::{BufferUsage, ComponentType, VertBuf, VertexFormat};
use crate::parallel::{parallel_for, SharedSliceMut};

/// Curves per parallel chunk for the fill loops.
const CURVE_GRAIN: usize = 1024;

/// One record of the position-with-parameter buffer: xyz position plus the
/// normalized arclength parameter along the curve.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PositionAndParameter {
    /// Control-point position.
    pub position: Vec3,
    /// Cumulative segment length divided by total curve length, in [0, 1];
    /// 0 everywhere on zero-length curves.
    pub parameter: f32,
}

/// Fill position+parameter records and per-curve total lengths.
///
/// Each curve accumulates Euclidean distances between consecutive points,
/// then rescales by the reciprocal total so the last point reads exactly
/// 1.0 when the curve has positive length. Curves are independent, so the
/// loop parallelizes across them.
pub fn fill_position_parameter(
    points_by_curve: &OffsetRanges,
    positions: &[Vec3],
    pos_parameter: &mut [PositionAndParameter],
    curve_lengths: &mut [f32],
) {
    debug_assert_eq!(pos_parameter.len(), positions.len());
    debug_assert_eq!(curve_lengths.len(), points_by_curve.curve_count());

    let out_points = SharedSliceMut::new(pos_parameter);
    let out_lengths = SharedSliceMut::new(curve_lengths);

    parallel_for(points_by_curve.curve_count(), CURVE_GRAIN, |range| {
        for curve in range {
            let points = points_by_curve.points(curve);
            let curve_positions = &positions[points.clone()];
            // SAFETY: per-curve output regions are disjoint across chunks.
            let curve_out = unsafe { out_points.slice_mut(points) };

            let mut total_len = 0.0f32;
            for (i, &position) in curve_positions.iter().enumerate() {
                if i > 0 {
                    total_len += curve_positions[i - 1].distance(position);
                }
                curve_out[i] = PositionAndParameter {
                    position,
                    parameter: total_len,
                };
            }
            // SAFETY: one writer per curve index.
            unsafe { *out_lengths.get_mut(curve) = total_len };

            if total_len > 0.0 {
                let factor = 1.0 / total_len;
                for record in curve_out.iter_mut() {
                    record.parameter *= factor;
                }
            }
        }
    });
}

/// Fill per-curve start indices and segment counts (`points - 1`, 0 for
/// single-point curves).
pub fn fill_offsets_and_segment_counts(
    points_by_curve: &OffsetRanges,
    starts: &mut [u32],
    segment_counts: &mut [u16],
) {
    debug_assert_eq!(starts.len(), points_by_curve.curve_count());
    debug_assert_eq!(segment_counts.len(), points_by_curve.curve_count());
    for curve in 0..points_by_curve.curve_count() {
        starts[curve] = points_by_curve.start(curve) as u32;
        segment_counts[curve] = (points_by_curve.point_count(curve).saturating_sub(1)) as u16;
    }
}

/// Build the position+parameter and per-curve length buffers.
pub fn build_position_parameter_vbos(geometry: &CurvesGeometry) -> (VertBuf, VertBuf) {
    let usage = BufferUsage::STATIC | BufferUsage::TEXTURE_ONLY;

    let mut pos_buf = VertBuf::with_format_usage(
        VertexFormat::from_attribute("posTime", ComponentType::F32, 4),
        usage,
    );
    pos_buf.data_alloc(geometry.points_num());

    let mut length_buf = VertBuf::with_format_usage(
        VertexFormat::from_attribute("curveLength", ComponentType::F32, 1),
        usage,
    );
    length_buf.data_alloc(geometry.curves_num());

    let points_num = geometry.points_num();
    let curves_num = geometry.curves_num();
    fill_position_parameter(
        geometry.points_by_curve(),
        geometry.positions(),
        &mut pos_buf.as_mut_slice::<PositionAndParameter>()[..points_num],
        &mut length_buf.as_mut_slice::<f32>()[..curves_num],
    );
    (pos_buf, length_buf)
}

/// Build the per-curve start-index and segment-count buffers.
pub fn build_curve_offset_vbos(geometry: &CurvesGeometry) -> (VertBuf, VertBuf) {
    let usage = BufferUsage::STATIC | BufferUsage::TEXTURE_ONLY;

    let mut offset_buf = VertBuf::with_format_usage(
        VertexFormat::from_attribute("curveOffset", ComponentType::U32, 1),
        usage,
    );
    offset_buf.data_alloc(geometry.curves_num());

    let mut segment_buf = VertBuf::with_format_usage(
        VertexFormat::from_attribute("curveSegments", ComponentType::U16, 1),
        usage,
    );
    segment_buf.data_alloc(geometry.curves_num());

    let curves_num = geometry.curves_num();
    fill_offsets_and_segment_counts(
        geometry.points_by_curve(),
        &mut offset_buf.as_mut_slice::<u32>()[..curves_num],
        &mut segment_buf.as_mut_slice::<u16>()[..curves_num],
    );
    (offset_buf, segment_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn geometry_two_curves() -> CurvesGeometry {
        // Curve A: 3 colinear points with segment lengths 1 and 1.
        // Curve B: a single point.
        CurvesGeometry::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(5.0, 5.0, 5.0),
            ],
            &[3, 1],
        )
    }

    #[test]
    fn test_parameter_normalized_to_unit_range() {
        let geometry = geometry_two_curves();
        let (pos_buf, length_buf) = build_position_parameter_vbos(&geometry);

        let records = pos_buf.as_slice::<PositionAndParameter>();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].parameter, 0.0);
        assert_eq!(records[1].parameter, 0.5);
        assert_eq!(records[2].parameter, 1.0);
        assert_eq!(records[3].parameter, 0.0);
        assert_eq!(records[2].position, Vec3::new(2.0, 0.0, 0.0));

        let lengths = length_buf.as_slice::<f32>();
        assert_eq!(lengths, &[2.0, 0.0]);
    }

    #[test]
    fn test_parameter_non_decreasing() {
        let geometry = CurvesGeometry::new(
            vec![
                Vec3::ZERO,
                Vec3::new(0.5, 0.0, 0.0),
                Vec3::new(0.5, 2.0, 0.0),
                Vec3::new(3.0, 2.0, 1.0),
            ],
            &[4],
        );
        let (pos_buf, _) = build_position_parameter_vbos(&geometry);
        let records = pos_buf.as_slice::<PositionAndParameter>();
        assert!(records.windows(2).all(|w| w[0].parameter <= w[1].parameter));
        assert!((records[3].parameter - 1.0).abs() < 1e-6);
    }

    #[rstest]
    #[case::single_point(vec![Vec3::ONE], 1)]
    #[case::coincident(vec![Vec3::ONE; 3], 3)]
    fn test_zero_length_curve_parameter_is_zero(
        #[case] positions: Vec<Vec3>,
        #[case] count: usize,
    ) {
        let geometry = CurvesGeometry::new(positions, &[count]);
        let (pos_buf, length_buf) = build_position_parameter_vbos(&geometry);
        assert!(pos_buf
            .as_slice::<PositionAndParameter>()
            .iter()
            .all(|r| r.parameter == 0.0));
        assert_eq!(length_buf.as_slice::<f32>()[0], 0.0);
    }

    #[test]
    fn test_offsets_and_segment_counts() {
        let geometry = geometry_two_curves();
        let (offset_buf, segment_buf) = build_curve_offset_vbos(&geometry);
        assert_eq!(offset_buf.as_slice::<u32>(), &[0, 3]);
        assert_eq!(segment_buf.as_slice::<u16>(), &[2, 0]);
    }

    #[test]
    fn test_zero_curves_still_allocates() {
        let geometry = CurvesGeometry::new(Vec::new(), &[]);
        let (pos_buf, length_buf) = build_position_parameter_vbos(&geometry);
        // Minimum-size placeholder, never a null buffer.
        assert_eq!(pos_buf.len(), 1);
        assert_eq!(length_buf.len(), 1);
    }

    #[test]
    fn test_many_curves_parallel_fill() {
        let curves = 4096;
        let mut positions = Vec::with_capacity(curves * 2);
        for i in 0..curves {
            positions.push(Vec3::new(i as f32, 0.0, 0.0));
            positions.push(Vec3::new(i as f32, 3.0, 0.0));
        }
        let geometry = CurvesGeometry::new(positions, &vec![2; curves]);
        let (pos_buf, length_buf) = build_position_parameter_vbos(&geometry);

        let records = pos_buf.as_slice::<PositionAndParameter>();
        for i in 0..curves {
            assert_eq!(records[i * 2].parameter, 0.0);
            assert_eq!(records[i * 2 + 1].parameter, 1.0);
        }
        assert!(length_buf.as_slice::<f32>().iter().all(|&l| l == 3.0));
    }
}
