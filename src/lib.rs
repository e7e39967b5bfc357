//! # Curve Draw Cache
//!
//! Derived-data cache turning curve/hair geometry into GPU-ready vertex
//! and index buffers, kept coherent as the geometry, requested attributes,
//! subdivision settings and edit-mode selection change over time.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`CurvesBatchCache`] - Per-geometry cache controller: dirty-tagging,
//!   the batch request/consume protocol, attribute reconciliation and
//!   age-based eviction
//! - [`extract`] - Deterministic buffer construction from curve topology
//! - [`curves`] - The immutable geometry view the host hands in
//! - [`gpu`] - CPU-side vertex/index buffer and batch types
//!
//! ## Example
//!
//! ```
//! use curve_draw_cache::{BatchKind, CurvesBatchCache, DirtyMode};
//! use curve_draw_cache::curves::{CurvesGeometry, GeometryDeformation};
//! use glam::Vec3;
//!
//! let geometry = CurvesGeometry::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], &[3]);
//! let mut cache = CurvesBatchCache::new();
//!
//! cache.validate();
//! if cache.request_batch(BatchKind::EditPoints) {
//!     cache.build_requested(&geometry, &GeometryDeformation::identity());
//! }
//! assert!(cache.batch(BatchKind::EditPoints).is_some());
//!
//! // Geometry changed: everything rebuilds on the next pass.
//! cache.tag_dirty(DirtyMode::All);
//! cache.validate();
//! assert!(cache.batch(BatchKind::EditPoints).is_none());
//! ```

pub mod cache;
pub mod curves;
pub mod error;
pub mod extract;
pub mod gpu;
pub mod material;
pub mod parallel;

// Re-export main types for convenience
pub use cache::{
    AttributeRequest, AttributeRequestSet, BatchKind, BufferId, CurvesBatchCache, DirtyMode,
    EditPointFlags, MAX_ATTRIBUTES,
};
pub use curves::{CurveType, CurvesGeometry, GeometryDeformation, HandleType, OffsetRanges};
pub use error::CacheError;
pub use gpu::{Batch, IndexBuf, PrimitiveTopology, VertBuf, VertexFormat, RESTART_INDEX};
pub use material::{MaterialAttribute, MaterialAttributes};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
