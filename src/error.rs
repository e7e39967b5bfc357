//! Cache error types.

use thiserror::Error;

/// Errors that can occur while building draw data.
///
/// Internal contract violations (invalid curve offsets, out-of-range
/// indices) are defects and panic via `debug_assert!`/`unreachable!`
/// rather than surfacing here; this type only covers the fallible
/// buffer/format surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// A typed view was requested with a record size that does not match
    /// the buffer's vertex format stride.
    #[error("record size {requested} does not match format stride {stride}")]
    RecordSizeMismatch {
        /// Size of the requested record type in bytes.
        requested: usize,
        /// Stride of the buffer's vertex format in bytes.
        stride: usize,
    },
    /// A buffer was used before its storage was allocated.
    #[error("buffer `{0}` used before allocation")]
    NotAllocated(String),
    /// Too many attributes were requested for the fixed slot table.
    #[error("attribute request table full ({0} slots)")]
    TooManyAttributes(usize),
}
