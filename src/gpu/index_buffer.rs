//! Index buffers and builders, with primitive-restart support.
//!
//! Strip topologies use [`RESTART_INDEX`] as a sentinel: the renderer ends
//! the current strip and starts a new one without an extra draw call.
//!
//! [`TwoRegionIndexBufBuilder`] replaces the pattern of two builders
//! aliasing one allocation through a raw copy: a single allocation holds
//! two independent logical ranges, joined explicitly at the end.

/// Primitive topology describing how indices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is a separate point.
    PointList,
    /// Every two indices form a line.
    LineList,
    /// Indices form a connected strip of lines.
    #[default]
    LineStrip,
    /// Every three indices form a triangle.
    TriangleList,
    /// Indices form a connected strip of triangles.
    TriangleStrip,
}

/// Primitive-restart sentinel value.
pub const RESTART_INDEX: u32 = u32::MAX;

#[derive(Debug, Clone)]
enum IndexData {
    /// Indices built on the CPU.
    Cpu(Vec<u32>),
    /// Indices generated on the device from per-curve counts; the CPU side
    /// only records the parameters of the generation pass.
    DeviceGenerated {
        curve_count: u32,
        verts_per_curve: u32,
    },
}

/// An index buffer: topology plus index storage.
#[derive(Debug, Clone)]
pub struct IndexBuf {
    prim: PrimitiveTopology,
    data: IndexData,
}

impl IndexBuf {
    /// An index buffer whose contents are generated on the device
    /// (`curve_count * verts_per_curve` indices).
    pub fn device_generated(
        prim: PrimitiveTopology,
        curve_count: u32,
        verts_per_curve: u32,
    ) -> Self {
        Self {
            prim,
            data: IndexData::DeviceGenerated {
                curve_count,
                verts_per_curve,
            },
        }
    }

    /// The primitive topology.
    pub fn topology(&self) -> PrimitiveTopology {
        self.prim
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        match &self.data {
            IndexData::Cpu(indices) => indices.len(),
            IndexData::DeviceGenerated {
                curve_count,
                verts_per_curve,
            } => (*curve_count as usize) * (*verts_per_curve as usize),
        }
    }

    /// Whether the buffer holds no indices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// CPU-side indices, if this buffer was built on the CPU.
    pub fn indices(&self) -> Option<&[u32]> {
        match &self.data {
            IndexData::Cpu(indices) => Some(indices),
            IndexData::DeviceGenerated { .. } => None,
        }
    }
}

// Ensure IndexBuf is Send + Sync
static_assertions::assert_impl_all!(IndexBuf: Send, Sync);

/// Builder for CPU-side index buffers.
///
/// Two fill styles are supported:
/// - pre-sized ([`with_len`](Self::with_len)): the exact index count is
///   known up front and slots are written in place, possibly in parallel
///   over disjoint ranges;
/// - appending ([`with_capacity`](Self::with_capacity) +
///   [`add_line`](Self::add_line)): indices are pushed incrementally.
#[derive(Debug)]
pub struct IndexBufBuilder {
    prim: PrimitiveTopology,
    vertex_len: usize,
    data: Vec<u32>,
}

impl IndexBufBuilder {
    /// Create a builder with `index_len` pre-allocated, zero-filled slots.
    pub fn with_len(prim: PrimitiveTopology, index_len: usize, vertex_len: usize) -> Self {
        Self {
            prim,
            vertex_len,
            data: vec![0u32; index_len],
        }
    }

    /// Create an empty builder with capacity for `index_len` indices.
    pub fn with_capacity(prim: PrimitiveTopology, index_len: usize, vertex_len: usize) -> Self {
        Self {
            prim,
            vertex_len,
            data: Vec::with_capacity(index_len),
        }
    }

    /// Writable view of the pre-sized slots.
    pub fn data_mut(&mut self) -> &mut [u32] {
        &mut self.data
    }

    /// Append one index.
    pub fn add_index(&mut self, index: u32) {
        debug_assert!(index == RESTART_INDEX || (index as usize) < self.vertex_len);
        self.data.push(index);
    }

    /// Append the two indices of a line segment.
    pub fn add_line(&mut self, v1: u32, v2: u32) {
        self.add_index(v1);
        self.add_index(v2);
    }

    /// Number of indices written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether no indices have been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Finalize into an [`IndexBuf`].
    pub fn build(self) -> IndexBuf {
        debug_assert!(self
            .data
            .iter()
            .all(|&i| i == RESTART_INDEX || (i as usize) < self.vertex_len));
        IndexBuf {
            prim: self.prim,
            data: IndexData::Cpu(self.data),
        }
    }
}

/// Builder holding two independent logical index ranges in one allocation.
///
/// The first region has a fixed capacity; the second starts immediately
/// after it. [`join`](Self::join) compacts the gap left by an under-filled
/// first region so the final buffer is contiguous, preserving region
/// order. Used for the edit-handle wires, where Bezier-handle edges and
/// general-curve edges must stay in separate index ranges.
#[derive(Debug)]
pub struct TwoRegionIndexBufBuilder {
    prim: PrimitiveTopology,
    vertex_len: usize,
    data: Vec<u32>,
    first_capacity: usize,
    first_len: usize,
    second_len: usize,
}

impl TwoRegionIndexBufBuilder {
    /// Create a builder with `first_capacity` slots reserved for the first
    /// region out of `total_capacity` overall.
    pub fn new(
        prim: PrimitiveTopology,
        first_capacity: usize,
        total_capacity: usize,
        vertex_len: usize,
    ) -> Self {
        debug_assert!(first_capacity <= total_capacity);
        Self {
            prim,
            vertex_len,
            data: vec![0u32; total_capacity],
            first_capacity,
            first_len: 0,
            second_len: 0,
        }
    }

    /// Append a line segment to the first region.
    pub fn add_first_line(&mut self, v1: u32, v2: u32) {
        debug_assert!(self.first_len + 2 <= self.first_capacity);
        debug_assert!((v1 as usize) < self.vertex_len && (v2 as usize) < self.vertex_len);
        self.data[self.first_len] = v1;
        self.data[self.first_len + 1] = v2;
        self.first_len += 2;
    }

    /// Append a line segment to the second region.
    pub fn add_second_line(&mut self, v1: u32, v2: u32) {
        let at = self.first_capacity + self.second_len;
        debug_assert!(at + 2 <= self.data.len());
        debug_assert!((v1 as usize) < self.vertex_len && (v2 as usize) < self.vertex_len);
        self.data[at] = v1;
        self.data[at + 1] = v2;
        self.second_len += 2;
    }

    /// Indices written to the first region so far.
    pub fn first_len(&self) -> usize {
        self.first_len
    }

    /// Indices written to the second region so far.
    pub fn second_len(&self) -> usize {
        self.second_len
    }

    /// Join the two regions and finalize into an [`IndexBuf`].
    pub fn join(mut self) -> IndexBuf {
        if self.first_len < self.first_capacity {
            // Close the gap between the regions.
            self.data
                .copy_within(self.first_capacity..self.first_capacity + self.second_len, self.first_len);
        }
        self.data.truncate(self.first_len + self.second_len);
        IndexBuf {
            prim: self.prim,
            data: IndexData::Cpu(self.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presized_builder() {
        let mut builder = IndexBufBuilder::with_len(PrimitiveTopology::LineStrip, 4, 3);
        builder.data_mut().copy_from_slice(&[0, 1, 2, RESTART_INDEX]);
        let ibo = builder.build();
        assert_eq!(ibo.indices(), Some(&[0, 1, 2, RESTART_INDEX][..]));
        assert_eq!(ibo.topology(), PrimitiveTopology::LineStrip);
    }

    #[test]
    fn test_appending_builder() {
        let mut builder = IndexBufBuilder::with_capacity(PrimitiveTopology::LineList, 4, 10);
        builder.add_line(0, 1);
        builder.add_line(8, 9);
        assert_eq!(builder.build().indices(), Some(&[0, 1, 8, 9][..]));
    }

    #[test]
    fn test_two_region_join_compacts_gap() {
        // First region sized for 2 lines but only 1 written.
        let mut builder = TwoRegionIndexBufBuilder::new(PrimitiveTopology::LineList, 4, 8, 6);
        builder.add_first_line(0, 1);
        builder.add_second_line(2, 3);
        builder.add_second_line(4, 5);
        let ibo = builder.join();
        assert_eq!(ibo.indices(), Some(&[0, 1, 2, 3, 4, 5][..]));
    }

    #[test]
    fn test_two_region_join_full_first_region() {
        let mut builder = TwoRegionIndexBufBuilder::new(PrimitiveTopology::LineList, 2, 4, 4);
        builder.add_first_line(0, 1);
        builder.add_second_line(2, 3);
        assert_eq!(builder.join().indices(), Some(&[0, 1, 2, 3][..]));
    }

    #[test]
    fn test_device_generated_len() {
        let ibo = IndexBuf::device_generated(PrimitiveTopology::LineStrip, 10, 16);
        assert_eq!(ibo.len(), 160);
        assert!(ibo.indices().is_none());
    }
}
