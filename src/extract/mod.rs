//! Deterministic buffer-content construction from curve topology.
//!
//! Everything in this module is a pure function of its inputs: no caching,
//! no request tracking. The cache layer decides *when* to call these; the
//! builders only decide *what* the buffer contents are.

pub mod edit;
pub mod lines;
pub mod topology;

pub use edit::{
    build_edit_handles_ibo, build_edit_lines_pos, build_edit_points_position_and_data,
    build_edit_points_selection, BezierPartition,
};
pub use lines::{build_lines_ibo, build_lines_ibo_no_cyclic, build_lines_ibo_with_cyclic};
pub use topology::{
    build_curve_offset_vbos, build_position_parameter_vbos, fill_offsets_and_segment_counts,
    fill_position_parameter, PositionAndParameter,
};
