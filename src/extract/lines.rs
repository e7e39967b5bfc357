//! Line-strip index buffers over per-curve point ranges.
//!
//! Two variants: the non-cyclic layout spends `points + curves` indices
//! (one restart per curve); the cyclic-aware layout spends
//! `points + 2 * curves` (a loop-closing slot plus the restart). The
//! cheaper variant is chosen when no curve is cyclic.

use crate::curves::OffsetRanges;
use crate::gpu::{IndexBuf, IndexBufBuilder, PrimitiveTopology, RESTART_INDEX};
use crate::parallel::{parallel_for, SharedSliceMut};

/// Curves per parallel chunk for the fill loops.
const CURVE_GRAIN: usize = 1024;

/// Build the line-strip index buffer assuming no curve is cyclic.
///
/// Curve `i` occupies the contiguous index range starting at
/// `start(i) + i`, sized `points(i) + 1`; the final slot is the restart
/// sentinel.
pub fn build_lines_ibo_no_cyclic(points_by_curve: &OffsetRanges) -> IndexBuf {
    let points_num = points_by_curve.total_points();
    let curves_num = points_by_curve.curve_count();
    let indices_num = points_num + curves_num;

    let mut builder = IndexBufBuilder::with_len(PrimitiveTopology::LineStrip, indices_num, points_num);
    let out = SharedSliceMut::new(builder.data_mut());

    parallel_for(curves_num, CURVE_GRAIN, |range| {
        for curve in range {
            let points = points_by_curve.points(curve);
            let ibo_start = points.start + curve;
            // SAFETY: per-curve index ranges are disjoint across chunks.
            let ibo_range = unsafe { out.slice_mut(ibo_start..ibo_start + points.len() + 1) };
            for (slot, point) in ibo_range[..points.len()].iter_mut().zip(points.clone()) {
                *slot = point as u32;
            }
            ibo_range[points.len()] = RESTART_INDEX;
        }
    });
    builder.build()
}

/// Build the cyclic-aware line-strip index buffer.
///
/// Curve `i` occupies the contiguous range starting at `start(i) + 2 * i`,
/// sized `points(i) + 2`: the second-to-last slot closes the loop (index
/// of the curve's first point) when the curve is cyclic, else it is a
/// restart; the last slot is always a restart.
pub fn build_lines_ibo_with_cyclic(points_by_curve: &OffsetRanges, cyclic: &[bool]) -> IndexBuf {
    let points_num = points_by_curve.total_points();
    let curves_num = points_by_curve.curve_count();
    debug_assert_eq!(cyclic.len(), curves_num);
    let indices_num = points_num + curves_num * 2;

    let mut builder = IndexBufBuilder::with_len(PrimitiveTopology::LineStrip, indices_num, points_num);
    let out = SharedSliceMut::new(builder.data_mut());

    parallel_for(curves_num, CURVE_GRAIN, |range| {
        for curve in range {
            let points = points_by_curve.points(curve);
            let ibo_start = points.start + curve * 2;
            // SAFETY: per-curve index ranges are disjoint across chunks.
            let ibo_range = unsafe { out.slice_mut(ibo_start..ibo_start + points.len() + 2) };
            for (slot, point) in ibo_range[..points.len()].iter_mut().zip(points.clone()) {
                *slot = point as u32;
            }
            ibo_range[points.len()] = if cyclic[curve] {
                points.start as u32
            } else {
                RESTART_INDEX
            };
            ibo_range[points.len() + 1] = RESTART_INDEX;
        }
    });
    builder.build()
}

/// Build the line-strip index buffer, choosing the cheaper non-cyclic
/// layout when no curve is cyclic.
pub fn build_lines_ibo(points_by_curve: &OffsetRanges, cyclic: &[bool]) -> IndexBuf {
    if cyclic.iter().any(|&c| c) {
        build_lines_ibo_with_cyclic(points_by_curve, cyclic)
    } else {
        build_lines_ibo_no_cyclic(points_by_curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cyclic_layout() {
        let offsets = OffsetRanges::from_counts(&[3, 1]);
        let ibo = build_lines_ibo_no_cyclic(&offsets);
        assert_eq!(ibo.len(), 3 + 1 + 2);
        assert_eq!(
            ibo.indices(),
            Some(&[0, 1, 2, RESTART_INDEX, 3, RESTART_INDEX][..])
        );
    }

    #[test]
    fn test_cyclic_layout() {
        let offsets = OffsetRanges::from_counts(&[3, 2]);
        let ibo = build_lines_ibo_with_cyclic(&offsets, &[true, false]);
        assert_eq!(ibo.len(), 5 + 2 * 2);
        assert_eq!(
            ibo.indices(),
            Some(&[0, 1, 2, 0, RESTART_INDEX, 3, 4, RESTART_INDEX, RESTART_INDEX][..])
        );
    }

    #[test]
    fn test_variants_agree_for_all_non_cyclic() {
        let offsets = OffsetRanges::from_counts(&[4, 2, 3]);
        let cyclic = vec![false; 3];
        let plain = build_lines_ibo_no_cyclic(&offsets);
        let aware = build_lines_ibo_with_cyclic(&offsets, &cyclic);

        // Identical index sequence up to the absent loop-closing slot.
        let plain = plain.indices().unwrap();
        let aware = aware.indices().unwrap();
        let filtered: Vec<u32> = {
            let mut out = Vec::new();
            let mut at = 0;
            for curve in 0..3 {
                let n = offsets.point_count(curve);
                out.extend_from_slice(&aware[at..at + n]);
                assert_eq!(aware[at + n], RESTART_INDEX);
                out.push(aware[at + n + 1]);
                at += n + 2;
            }
            out
        };
        assert_eq!(plain, &filtered[..]);
    }

    #[test]
    fn test_selection_rule() {
        let offsets = OffsetRanges::from_counts(&[2, 2]);
        let none_cyclic = build_lines_ibo(&offsets, &[false, false]);
        assert_eq!(none_cyclic.len(), 4 + 2);

        let some_cyclic = build_lines_ibo(&offsets, &[false, true]);
        assert_eq!(some_cyclic.len(), 4 + 4);
    }

    #[test]
    fn test_empty_geometry() {
        let offsets = OffsetRanges::from_counts(&[]);
        let ibo = build_lines_ibo(&offsets, &[]);
        assert_eq!(ibo.len(), 0);
    }
}
