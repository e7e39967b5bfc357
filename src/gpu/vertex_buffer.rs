//! CPU-modeled vertex buffer resource.
//!
//! [`VertBuf`] stands in for the device buffer object: a vertex format
//! plus owned record storage, filled through typed views. Upload and draw
//! submission are external concerns; downstream code treats the storage
//! as the bytes that would be handed to the device.

use bitflags::bitflags;
use bytemuck::Pod;

use crate::error::CacheError;

use super::format::VertexFormat;

bitflags! {
    /// Usage flags for vertex buffers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Written once by the CPU, read many times.
        const STATIC = 1 << 0;
        /// Lives only in device memory; CPU contents are a staging copy.
        const DEVICE_ONLY = 1 << 1;
        /// Sampled as a buffer texture rather than bound as a vertex input.
        const TEXTURE_ONLY = 1 << 2;
    }
}

impl Default for BufferUsage {
    fn default() -> Self {
        Self::STATIC
    }
}

/// A vertex buffer: format, usage and owned record storage.
pub struct VertBuf {
    format: VertexFormat,
    usage: BufferUsage,
    len: usize,
    data: Vec<u8>,
}

impl VertBuf {
    /// Create an unallocated buffer with the given format.
    pub fn with_format(format: VertexFormat) -> Self {
        Self::with_format_usage(format, BufferUsage::STATIC)
    }

    /// Create an unallocated buffer with the given format and usage.
    pub fn with_format_usage(format: VertexFormat, usage: BufferUsage) -> Self {
        Self {
            format,
            usage,
            len: 0,
            data: Vec::new(),
        }
    }

    /// Allocate storage for `len` records, discarding previous contents.
    ///
    /// A zero-sized request still allocates one record so downstream
    /// consumers never see a null buffer.
    pub fn data_alloc(&mut self, len: usize) {
        let alloc_len = len.max(1);
        self.len = alloc_len;
        self.data = vec![0u8; alloc_len * self.format.stride()];
    }

    /// Number of allocated records.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether storage has been allocated.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The vertex format.
    pub fn format(&self) -> &VertexFormat {
        &self.format
    }

    /// The usage flags.
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Raw byte view of the storage.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Typed read view of the records.
    ///
    /// The record type's size must equal the format stride.
    pub fn as_slice<T: Pod>(&self) -> &[T] {
        self.check_record::<T>().expect("typed view of vertex buffer");
        bytemuck::cast_slice(&self.data)
    }

    /// Typed write view of the records.
    pub fn as_mut_slice<T: Pod>(&mut self) -> &mut [T] {
        self.check_record::<T>().expect("typed view of vertex buffer");
        bytemuck::cast_slice_mut(&mut self.data)
    }

    /// Fallible typed read view.
    pub fn try_as_slice<T: Pod>(&self) -> Result<&[T], CacheError> {
        self.check_record::<T>()?;
        Ok(bytemuck::cast_slice(&self.data))
    }

    fn check_record<T: Pod>(&self) -> Result<(), CacheError> {
        let requested = std::mem::size_of::<T>();
        let stride = self.format.stride();
        if requested != stride {
            return Err(CacheError::RecordSizeMismatch { requested, stride });
        }
        if self.data.is_empty() {
            let name = self
                .format
                .attributes
                .first()
                .map(|a| a.name.clone())
                .unwrap_or_default();
            return Err(CacheError::NotAllocated(name));
        }
        Ok(())
    }
}

impl std::fmt::Debug for VertBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertBuf")
            .field("len", &self.len)
            .field("stride", &self.format.stride())
            .field("usage", &self.usage)
            .finish()
    }
}

// Ensure VertBuf is Send + Sync
static_assertions::assert_impl_all!(VertBuf: Send, Sync);
