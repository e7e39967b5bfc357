//! The derived-data cache tiers and their controller.

pub mod attributes;
pub mod batch;
pub mod edit;
pub mod eval;

pub use attributes::{
    attr_sampler_name, AttributeRequest, AttributeRequestSet, MAX_ATTRIBUTES,
};
pub use batch::{BatchKind, BufferId, CurvesBatchCache, DirtyMode, DEFAULT_ATTR_TIMEOUT};
pub use edit::{bezier_handle_value, EditCache, EditPointFlags, HANDLE_TYPES_SHIFT};
pub use eval::{subdiv_resolution, EvalCache, FinalCache};
