//! Draw batches: a primitive topology plus the buffers it draws from.

use std::sync::Arc;

use super::index_buffer::{IndexBuf, PrimitiveTopology};
use super::vertex_buffer::VertBuf;

/// A GPU draw batch.
///
/// Batches reference their buffers via `Arc` so several batches can share
/// one buffer (the edit-point position buffer feeds the points, cage and
/// handle batches). A batch is only constructed once every buffer it needs
/// has been filled; partially built batches are never exposed.
pub struct Batch {
    topology: PrimitiveTopology,
    vertex_buffers: Vec<Arc<VertBuf>>,
    index_buffer: Option<Arc<IndexBuf>>,
}

impl Batch {
    /// Create a batch from filled buffers.
    pub fn new(
        topology: PrimitiveTopology,
        vertex_buffers: Vec<Arc<VertBuf>>,
        index_buffer: Option<Arc<IndexBuf>>,
    ) -> Self {
        debug_assert!(!vertex_buffers.is_empty() || index_buffer.is_some());
        Self {
            topology,
            vertex_buffers,
            index_buffer,
        }
    }

    /// The primitive topology.
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Vertex buffers in binding order.
    pub fn vertex_buffers(&self) -> &[Arc<VertBuf>] {
        &self.vertex_buffers
    }

    /// The index buffer, if indexed.
    pub fn index_buffer(&self) -> Option<&Arc<IndexBuf>> {
        self.index_buffer.as_ref()
    }

    /// Whether this batch uses indexed drawing.
    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("topology", &self.topology)
            .field("vertex_buffer_count", &self.vertex_buffers.len())
            .field("indexed", &self.is_indexed())
            .finish()
    }
}

// Ensure Batch is Send + Sync
static_assertions::assert_impl_all!(Batch: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::format::{ComponentType, VertexFormat};

    #[test]
    fn test_batch_shares_buffers() {
        let mut vbo = VertBuf::with_format(VertexFormat::from_attribute(
            "pos",
            ComponentType::F32,
            3,
        ));
        vbo.data_alloc(3);
        let vbo = Arc::new(vbo);

        let points = Batch::new(PrimitiveTopology::PointList, vec![vbo.clone()], None);
        let ibo = Arc::new(IndexBuf::device_generated(PrimitiveTopology::LineStrip, 1, 4));
        let lines = Batch::new(PrimitiveTopology::LineStrip, vec![vbo.clone()], Some(ibo));

        assert!(!points.is_indexed());
        assert!(lines.is_indexed());
        assert_eq!(Arc::strong_count(&vbo), 3);
    }
}
