//! Narrow graphics-buffer model consumed by the cache.
//!
//! Buffer creation, upload and draw submission belong to the host
//! renderer; this module provides the CPU-side stand-ins the cache fills:
//! typed vertex buffers, index buffers with primitive restart, and draw
//! batches. Freeing is dropping — every tier releases its buffers on every
//! exit path by owning them as `Option`s.

pub mod batch;
pub mod format;
pub mod index_buffer;
pub mod vertex_buffer;

pub use batch::Batch;
pub use format::{safe_attr_name, ComponentType, FormatAttribute, VertexFormat};
pub use index_buffer::{
    IndexBuf, IndexBufBuilder, PrimitiveTopology, TwoRegionIndexBufBuilder, RESTART_INDEX,
};
pub use vertex_buffer::{BufferUsage, VertBuf};
